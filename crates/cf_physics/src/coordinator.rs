// crates/cf_physics/src/coordinator.rs

//! 多模型锁步耦合
//!
//! 每个耦合步：
//!
//! 1. 各实例报告在当前状态下的稳定步长；
//! 2. 取最小值，再截断到下一个输出时刻或结束时刻；
//! 3. 所有实例以同一步长推进；
//! 4. 到达输出时刻时通知观察者。

use cf_config::{EngineConfig, TimeConfig};

use crate::error::{PhysicsError, PhysicsResult};
use crate::ode::{IvpSolver, OdeSystem};

/// 参与锁步耦合的实例
pub trait CoupledInstance {
    /// 实例名称
    fn name(&self) -> &str;

    /// 在时刻 `time` 的当前状态下的稳定步长
    fn stable_time_step(&mut self, time: f64) -> PhysicsResult<f64>;

    /// 从 `time` 推进 `dt`
    fn advance(&mut self, time: f64, dt: f64) -> PhysicsResult<()>;

    /// 当前状态向量
    fn state(&self) -> &[f64];
}

/// 输出观察者（导出、绘图等）
pub trait StepObserver {
    /// 到达输出时刻
    fn on_output(&mut self, time: f64, instances: &[&dyn CoupledInstance]);
}

impl<F: FnMut(f64, &[&dyn CoupledInstance])> StepObserver for F {
    fn on_output(&mut self, time: f64, instances: &[&dyn CoupledInstance]) {
        self(time, instances)
    }
}

/// 把 ODE 系统、状态向量与求解器组合为耦合实例
pub struct OdeInstance<S: OdeSystem> {
    name: String,
    system: S,
    state: Vec<f64>,
    solver: IvpSolver,
    rate: Vec<f64>,
    step_cap: f64,
}

impl<S: OdeSystem> OdeInstance<S> {
    /// 创建实例
    ///
    /// `step_cap` 为每个耦合步开始时的时间步上限。
    pub fn new(
        name: impl Into<String>,
        system: S,
        state: Vec<f64>,
        solver: IvpSolver,
        step_cap: f64,
    ) -> PhysicsResult<Self> {
        PhysicsError::check_size("state", system.dimension(), state.len())?;
        let n = state.len();
        Ok(Self {
            name: name.into(),
            system,
            state,
            solver,
            rate: vec![0.0; n],
            step_cap,
        })
    }

    /// 按配置创建
    pub fn from_config(
        name: impl Into<String>,
        system: S,
        state: Vec<f64>,
        engine: &EngineConfig,
        time: &TimeConfig,
    ) -> PhysicsResult<Self> {
        Self::new(name, system, state, IvpSolver::from_config(time), engine.max_time_step)
    }

    /// ODE 系统
    pub fn system(&self) -> &S {
        &self.system
    }

    /// 拆出系统与状态
    pub fn into_parts(self) -> (S, Vec<f64>) {
        (self.system, self.state)
    }
}

impl<S: OdeSystem> CoupledInstance for OdeInstance<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn stable_time_step(&mut self, time: f64) -> PhysicsResult<f64> {
        self.system.set_max_time_step(self.step_cap);
        self.system.rate_of_change(time, &self.state, &mut self.rate)?;
        Ok(self.system.max_time_step())
    }

    fn advance(&mut self, time: f64, dt: f64) -> PhysicsResult<()> {
        self.solver
            .solve(&mut self.system, time, &mut self.state, time + dt, Some(dt))?;
        Ok(())
    }

    fn state(&self) -> &[f64] {
        &self.state
    }
}

/// 锁步耦合统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorReport {
    /// 耦合步数
    pub steps: usize,
    /// 输出次数（含起始时刻）
    pub outputs: usize,
    /// 结束时间
    pub final_time: f64,
    /// 最小耦合步长
    pub min_dt: f64,
    /// 最大耦合步长
    pub max_dt: f64,
}

/// 锁步耦合驱动器
pub struct LockStepCoordinator<'a> {
    instances: Vec<Box<dyn CoupledInstance + 'a>>,
    observers: Vec<Box<dyn StepObserver + 'a>>,
    time: TimeConfig,
}

impl<'a> LockStepCoordinator<'a> {
    /// 创建驱动器
    pub fn new(time: TimeConfig) -> PhysicsResult<Self> {
        time.validate()?;
        Ok(Self {
            instances: Vec::new(),
            observers: Vec::new(),
            time,
        })
    }

    /// 加入实例
    pub fn add_instance(&mut self, instance: impl CoupledInstance + 'a) -> &mut Self {
        self.instances.push(Box::new(instance));
        self
    }

    /// 加入观察者
    pub fn add_observer(&mut self, observer: impl StepObserver + 'a) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// 实例数
    pub fn n_instances(&self) -> usize {
        self.instances.len()
    }

    /// 第 i 个实例
    pub fn instance(&self, i: usize) -> Option<&dyn CoupledInstance> {
        self.instances.get(i).map(|b| b.as_ref() as &dyn CoupledInstance)
    }

    fn notify(&mut self, time: f64) {
        let views: Vec<&dyn CoupledInstance> = self
            .instances
            .iter()
            .map(|b| b.as_ref() as &dyn CoupledInstance)
            .collect();
        for observer in &mut self.observers {
            observer.on_output(time, &views);
        }
    }

    /// 从起始时间运行到结束时间
    pub fn run(&mut self) -> PhysicsResult<CoordinatorReport> {
        let start = self.time.start;
        let end = self.time.end;
        let interval = self.time.output_interval;
        let min_step = self.time.min_time_step;

        let mut report = CoordinatorReport {
            min_dt: f64::INFINITY,
            max_dt: 0.0,
            ..Default::default()
        };
        let mut t = start;
        let mut k_output = 1usize;
        let mut next_output = start + interval;

        self.notify(t);
        report.outputs += 1;

        while t < end {
            let mut dt = f64::INFINITY;
            for instance in &mut self.instances {
                let step = instance.stable_time_step(t)?;
                dt = dt.min(step);
                if step.is_nan() {
                    dt = f64::NAN;
                    break;
                }
            }
            if dt.is_nan() || dt < min_step {
                return Err(PhysicsError::TimeStepCollapse {
                    time: t,
                    dt,
                    min: min_step,
                });
            }

            let target = next_output.min(end);
            let landed = t + dt >= target;
            if landed {
                dt = target - t;
            }

            for instance in &mut self.instances {
                instance.advance(t, dt)?;
            }
            t = if landed { target } else { t + dt };
            report.steps += 1;
            report.min_dt = report.min_dt.min(dt);
            report.max_dt = report.max_dt.max(dt);

            if landed {
                log::info!("耦合步 {}: t = {:.6}, dt = {:.3e}", report.steps, t, dt);
                self.notify(t);
                report.outputs += 1;
                if target >= next_output {
                    k_output += 1;
                    next_output = start + k_output as f64 * interval;
                }
            }
        }

        report.final_time = t;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::{ForwardEuler, Heun};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// dy/dt = -λy，稳定步长固定
    struct Relax {
        lambda: f64,
        stable: f64,
        cap: f64,
    }

    impl OdeSystem for Relax {
        fn dimension(&self) -> usize {
            1
        }
        fn rate_of_change(&mut self, _t: f64, state: &[f64], rate: &mut [f64]) -> PhysicsResult<()> {
            rate[0] = -self.lambda * state[0];
            self.cap = self.cap.min(self.stable);
            Ok(())
        }
        fn max_time_step(&self) -> f64 {
            self.cap
        }
        fn set_max_time_step(&mut self, dt: f64) {
            self.cap = dt;
        }
    }

    fn relax(lambda: f64, stable: f64) -> Relax {
        Relax {
            lambda,
            stable,
            cap: f64::INFINITY,
        }
    }

    #[test]
    fn test_lock_step_outputs() {
        let time = TimeConfig {
            start: 0.0,
            end: 1.0,
            output_interval: 0.25,
            ..Default::default()
        };
        let times = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&times);

        let mut coordinator = LockStepCoordinator::new(time).unwrap();
        coordinator
            .add_instance(
                OdeInstance::new("fast", relax(1.0, 0.1), vec![1.0], IvpSolver::new(Box::new(Heun::default()), 1e-12), 1.0)
                    .unwrap(),
            )
            .add_instance(
                OdeInstance::new("slow", relax(0.5, 0.3), vec![2.0], IvpSolver::new(Box::new(ForwardEuler::default()), 1e-12), 1.0)
                    .unwrap(),
            )
            .add_observer(move |t: f64, instances: &[&dyn CoupledInstance]| {
                assert_eq!(instances.len(), 2);
                recorded.borrow_mut().push(t);
            });

        let report = coordinator.run().unwrap();
        assert_eq!(*times.borrow(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(report.outputs, 5);
        assert_eq!(report.final_time, 1.0);
        assert!(report.max_dt <= 0.1 + 1e-15);
        // 每个输出区间 0.25 = 0.1 + 0.1 + 0.05
        assert_eq!(report.steps, 12);

        let fast = coordinator.instance(0).unwrap().state()[0];
        assert!((fast - (-1.0f64).exp()).abs() < 5e-3);
    }

    #[test]
    fn test_end_between_outputs() {
        let time = TimeConfig {
            start: 0.0,
            end: 0.7,
            output_interval: 0.5,
            ..Default::default()
        };
        let times = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&times);
        let mut coordinator = LockStepCoordinator::new(time).unwrap();
        coordinator
            .add_instance(
                OdeInstance::new("a", relax(1.0, 0.2), vec![1.0], IvpSolver::new(Box::new(Heun::default()), 1e-12), 1.0)
                    .unwrap(),
            )
            .add_observer(move |t: f64, _: &[&dyn CoupledInstance]| recorded.borrow_mut().push(t));

        let report = coordinator.run().unwrap();
        assert_eq!(*times.borrow(), vec![0.0, 0.5, 0.7]);
        assert_eq!(report.final_time, 0.7);
    }

    #[test]
    fn test_collapse_detected() {
        let mut coordinator = LockStepCoordinator::new(TimeConfig::default()).unwrap();
        coordinator.add_instance(
            OdeInstance::new("stuck", relax(1.0, 0.0), vec![1.0], IvpSolver::new(Box::new(Heun::default()), 1e-12), 1.0)
                .unwrap(),
        );
        assert!(matches!(
            coordinator.run(),
            Err(PhysicsError::TimeStepCollapse { .. })
        ));
    }
}
