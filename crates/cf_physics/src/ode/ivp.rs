// crates/cf_physics/src/ode/ivp.rs

//! 初值问题驱动器
//!
//! 起点先施加一次状态约束。每个子步：
//!
//! 1. 用请求步长重置系统的步长上限；
//! 2. 求 `f(t, y)`，系统在求值中可调低上限；
//! 3. 取系统给出的步长，最后一步截断到恰好落在 `t1`；
//! 4. 调用积分器推进一步；
//! 5. 在新时刻施加状态约束。

use cf_config::TimeConfig;

use super::integrator::{create_integrator, OneStepIntegrator};
use super::system::OdeSystem;
use crate::error::{PhysicsError, PhysicsResult};

/// 剩余区间小于该相对值时视为已到达终点
const END_TOLERANCE: f64 = 1e-12;

/// 一次求解的统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IvpReport {
    /// 子步数
    pub steps: usize,
    /// 各子步步长
    pub dt_history: Vec<f64>,
    /// 结束时间
    pub final_time: f64,
}

impl IvpReport {
    /// 最小子步长
    pub fn min_dt(&self) -> Option<f64> {
        self.dt_history.iter().copied().reduce(f64::min)
    }

    /// 最大子步长
    pub fn max_dt(&self) -> Option<f64> {
        self.dt_history.iter().copied().reduce(f64::max)
    }
}

/// 初值问题求解器
pub struct IvpSolver {
    integrator: Box<dyn OneStepIntegrator>,
    min_time_step: f64,
    rate: Vec<f64>,
}

impl std::fmt::Debug for IvpSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IvpSolver")
            .field("integrator", &self.integrator.name())
            .field("min_time_step", &self.min_time_step)
            .finish()
    }
}

impl IvpSolver {
    /// 使用给定积分器创建
    pub fn new(integrator: Box<dyn OneStepIntegrator>, min_time_step: f64) -> Self {
        Self {
            integrator,
            min_time_step,
            rate: Vec::new(),
        }
    }

    /// 按时间配置创建
    pub fn from_config(config: &TimeConfig) -> Self {
        Self::new(
            create_integrator(config.integrator, config.parallel_chunk),
            config.min_time_step,
        )
    }

    /// 积分器
    pub fn integrator(&self) -> &dyn OneStepIntegrator {
        self.integrator.as_ref()
    }

    /// 从 `t0` 积分到 `t1`
    ///
    /// `dt_request` 为每个子步的步长上限；`None` 时沿用系统当前的上限。
    pub fn solve(
        &mut self,
        system: &mut dyn OdeSystem,
        t0: f64,
        state: &mut [f64],
        t1: f64,
        dt_request: Option<f64>,
    ) -> PhysicsResult<IvpReport> {
        if !(t1 >= t0) || !t0.is_finite() || !t1.is_finite() {
            return Err(PhysicsError::InvalidInterval { t0, t1 });
        }
        let n = system.dimension();
        PhysicsError::check_size("state", n, state.len())?;
        self.rate.resize(n, 0.0);

        let cap = dt_request.unwrap_or_else(|| system.max_time_step());
        let tolerance = END_TOLERANCE * t1.abs().max(1.0);
        let mut report = IvpReport::default();
        let mut t = t0;
        system.constrain_state(t, state)?;

        while t1 - t > tolerance {
            system.set_max_time_step(cap);
            system.rate_of_change(t, state, &mut self.rate)?;

            let max_dt = system.max_time_step();
            if !(max_dt >= self.min_time_step) {
                return Err(PhysicsError::TimeStepCollapse {
                    time: t,
                    dt: max_dt,
                    min: self.min_time_step,
                });
            }

            let last = t + max_dt >= t1;
            let dt = if last { t1 - t } else { max_dt };
            self.integrator.step(system, t, dt, state, &self.rate)?;

            t = if last { t1 } else { t + dt };
            system.constrain_state(t, state)?;
            report.steps += 1;
            report.dt_history.push(dt);
            log::trace!("{}: t={:.6e}, dt={:.3e}", self.integrator.name(), t, dt);
        }

        report.final_time = t1;
        log::debug!(
            "{}: [{:.6}, {:.6}] 用 {} 个子步完成",
            self.integrator.name(),
            t0,
            t1,
            report.steps
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::integrator::{ForwardEuler, Heun};

    /// 常数变化率、可设置步长上限的系统
    struct Constant {
        max_dt: f64,
        evaluations: usize,
    }

    impl OdeSystem for Constant {
        fn dimension(&self) -> usize {
            1
        }
        fn rate_of_change(&mut self, _t: f64, _state: &[f64], rate: &mut [f64]) -> PhysicsResult<()> {
            self.evaluations += 1;
            rate[0] = 1.0;
            Ok(())
        }
        fn max_time_step(&self) -> f64 {
            self.max_dt
        }
        fn set_max_time_step(&mut self, dt: f64) {
            self.max_dt = dt;
        }
    }

    #[test]
    fn test_last_step_lands_on_end() {
        let mut system = Constant {
            max_dt: 1.0,
            evaluations: 0,
        };
        let mut solver = IvpSolver::new(Box::new(ForwardEuler::default()), 1e-12);
        let mut state = [0.0];
        let report = solver
            .solve(&mut system, 0.0, &mut state, 10.0, Some(3.0))
            .unwrap();

        assert_eq!(report.steps, 4);
        assert_eq!(report.dt_history, vec![3.0, 3.0, 3.0, 1.0]);
        assert_eq!(report.final_time, 10.0);
        assert!((state[0] - 10.0).abs() < 1e-12);
        assert_eq!(system.evaluations, 4);
    }

    #[test]
    fn test_uses_system_step_without_request() {
        let mut system = Constant {
            max_dt: 0.5,
            evaluations: 0,
        };
        let mut solver = IvpSolver::new(Box::new(Heun::default()), 1e-12);
        let mut state = [0.0];
        let report = solver.solve(&mut system, 1.0, &mut state, 2.0, None).unwrap();
        assert_eq!(report.steps, 2);
        assert_eq!(report.max_dt(), Some(0.5));
        // Heun 每步两次求值
        assert_eq!(system.evaluations, 4);
    }

    #[test]
    fn test_empty_interval() {
        let mut system = Constant {
            max_dt: 1.0,
            evaluations: 0,
        };
        let mut solver = IvpSolver::new(Box::new(ForwardEuler::default()), 1e-12);
        let report = solver.solve(&mut system, 5.0, &mut [0.0], 5.0, None).unwrap();
        assert_eq!(report.steps, 0);
        assert!(solver.solve(&mut system, 5.0, &mut [0.0], 4.0, None).is_err());
    }

    #[test]
    fn test_step_collapse() {
        let mut system = Constant {
            max_dt: 0.0,
            evaluations: 0,
        };
        let mut solver = IvpSolver::new(Box::new(ForwardEuler::default()), 1e-12);
        let r = solver.solve(&mut system, 0.0, &mut [0.0], 1.0, None);
        assert!(matches!(r, Err(PhysicsError::TimeStepCollapse { .. })));
    }

    #[test]
    fn test_nan_step_rejected() {
        let mut system = Constant {
            max_dt: 1.0,
            evaluations: 0,
        };
        let mut solver = IvpSolver::new(Box::new(ForwardEuler::default()), 1e-12);
        let r = solver.solve(&mut system, 0.0, &mut [0.0], 1.0, Some(f64::NAN));
        assert!(matches!(r, Err(PhysicsError::TimeStepCollapse { .. })));
    }

    /// 状态上限为 `0.5·t` 的系统，记录每次约束的时刻
    struct Clamped {
        constrained_at: Vec<f64>,
    }

    impl OdeSystem for Clamped {
        fn dimension(&self) -> usize {
            1
        }
        fn rate_of_change(&mut self, _t: f64, _state: &[f64], rate: &mut [f64]) -> PhysicsResult<()> {
            rate[0] = 1.0;
            Ok(())
        }
        fn max_time_step(&self) -> f64 {
            0.25
        }
        fn set_max_time_step(&mut self, _dt: f64) {}
        fn constrain_state(&mut self, time: f64, state: &mut [f64]) -> PhysicsResult<()> {
            self.constrained_at.push(time);
            state[0] = state[0].min(0.5 * time);
            Ok(())
        }
    }

    #[test]
    fn test_constraint_applied_at_start_and_after_each_step() {
        let mut system = Clamped {
            constrained_at: Vec::new(),
        };
        let mut solver = IvpSolver::new(Box::new(ForwardEuler::default()), 1e-12);
        let mut state = [3.0];
        let report = solver.solve(&mut system, 0.0, &mut state, 1.0, None).unwrap();

        assert_eq!(report.steps, 4);
        assert_eq!(system.constrained_at, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!((state[0] - 0.5).abs() < 1e-12);
    }
}
