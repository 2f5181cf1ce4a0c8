// crates/cf_physics/src/ode/integrator.rs

//! 显式单步积分器
//!
//! ## 前向欧拉
//!
//! ```text
//! y^{n+1} = y^n + Δt f(t, y^n)
//! ```
//!
//! ## 改进欧拉 / Heun（预测-校正）
//!
//! ```text
//! y*      = y^n + Δt f(t, y^n)
//! y^{n+1} = y^n + Δt/2 (f(t, y^n) + f(t+Δt, y*))
//! ```
//!
//! 两者的向量更新都可以按块分给 rayon 线程。
//! 驱动器已在步首求过 `f(t, y^n)`（用于确定步长），以 `rate` 参数传入，积分器不再重复计算。

use cf_config::IntegratorKind;
use rayon::prelude::*;

use super::system::OdeSystem;
use crate::error::{PhysicsError, PhysicsResult};

/// 单步积分器
pub trait OneStepIntegrator: Send {
    /// 名称
    fn name(&self) -> &'static str;

    /// 精度阶数
    fn order(&self) -> u8;

    /// 每步求值次数
    fn stages(&self) -> u8;

    /// 从 `(time, state)` 推进一步 `dt`，`rate` 为 `f(time, state)`
    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        time: f64,
        dt: f64,
        state: &mut [f64],
        rate: &[f64],
    ) -> PhysicsResult<()>;
}

/// `y += a * x`，可按块并行
fn axpy(y: &mut [f64], a: f64, x: &[f64], chunk: Option<usize>) {
    match chunk {
        Some(size) => y
            .par_chunks_mut(size)
            .zip(x.par_chunks(size))
            .for_each(|(yc, xc)| {
                for (yi, xi) in yc.iter_mut().zip(xc) {
                    *yi += a * xi;
                }
            }),
        None => {
            for (yi, xi) in y.iter_mut().zip(x) {
                *yi += a * xi;
            }
        }
    }
}

/// 前向欧拉
#[derive(Debug, Clone, Default)]
pub struct ForwardEuler {
    chunk: Option<usize>,
}

impl ForwardEuler {
    /// 创建积分器；`chunk` 为并行分块大小，`None` 表示串行
    pub fn new(chunk: Option<usize>) -> Self {
        Self { chunk }
    }
}

impl OneStepIntegrator for ForwardEuler {
    fn name(&self) -> &'static str {
        "ForwardEuler"
    }

    fn order(&self) -> u8 {
        1
    }

    fn stages(&self) -> u8 {
        1
    }

    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        _time: f64,
        dt: f64,
        state: &mut [f64],
        rate: &[f64],
    ) -> PhysicsResult<()> {
        PhysicsError::check_size("state", system.dimension(), state.len())?;
        PhysicsError::check_size("rate", state.len(), rate.len())?;
        axpy(state, dt, rate, self.chunk);
        Ok(())
    }
}

/// 改进欧拉 (Heun)
#[derive(Debug, Clone, Default)]
pub struct Heun {
    chunk: Option<usize>,
    predictor: Vec<f64>,
    corrector_rate: Vec<f64>,
}

impl Heun {
    /// 创建积分器；`chunk` 为并行分块大小，`None` 表示串行
    pub fn new(chunk: Option<usize>) -> Self {
        Self {
            chunk,
            predictor: Vec::new(),
            corrector_rate: Vec::new(),
        }
    }

    fn ensure_size(&mut self, n: usize) {
        if self.predictor.len() != n {
            self.predictor.resize(n, 0.0);
            self.corrector_rate.resize(n, 0.0);
        }
    }
}

impl OneStepIntegrator for Heun {
    fn name(&self) -> &'static str {
        "Heun"
    }

    fn order(&self) -> u8 {
        2
    }

    fn stages(&self) -> u8 {
        2
    }

    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        time: f64,
        dt: f64,
        state: &mut [f64],
        rate: &[f64],
    ) -> PhysicsResult<()> {
        let n = system.dimension();
        PhysicsError::check_size("state", n, state.len())?;
        PhysicsError::check_size("rate", n, rate.len())?;
        self.ensure_size(n);

        // 预测
        self.predictor.copy_from_slice(state);
        axpy(&mut self.predictor, dt, rate, self.chunk);
        system.rate_of_change(time + dt, &self.predictor, &mut self.corrector_rate)?;

        // 校正
        let half = 0.5 * dt;
        axpy(state, half, rate, self.chunk);
        axpy(state, half, &self.corrector_rate, self.chunk);
        Ok(())
    }
}

/// 按类型创建积分器
pub fn create_integrator(kind: IntegratorKind, chunk: Option<usize>) -> Box<dyn OneStepIntegrator> {
    match kind {
        IntegratorKind::ForwardEuler => Box::new(ForwardEuler::new(chunk)),
        IntegratorKind::Heun => Box::new(Heun::new(chunk)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dy/dt = -y
    struct Decay;

    impl OdeSystem for Decay {
        fn dimension(&self) -> usize {
            3
        }
        fn rate_of_change(&mut self, _t: f64, state: &[f64], rate: &mut [f64]) -> PhysicsResult<()> {
            for (r, y) in rate.iter_mut().zip(state) {
                *r = -y;
            }
            Ok(())
        }
        fn max_time_step(&self) -> f64 {
            f64::INFINITY
        }
        fn set_max_time_step(&mut self, _dt: f64) {}
    }

    fn one_step(integrator: &mut dyn OneStepIntegrator, dt: f64) -> Vec<f64> {
        let mut system = Decay;
        let mut state = vec![1.0, 2.0, 4.0];
        let mut rate = vec![0.0; 3];
        system.rate_of_change(0.0, &state, &mut rate).unwrap();
        integrator.step(&mut system, 0.0, dt, &mut state, &rate).unwrap();
        state
    }

    #[test]
    fn test_forward_euler_step() {
        let state = one_step(&mut ForwardEuler::default(), 0.1);
        assert!((state[0] - 0.9).abs() < 1e-15);
        assert!((state[2] - 3.6).abs() < 1e-15);
    }

    #[test]
    fn test_heun_step() {
        // y1 = y0 (1 - dt + dt²/2)
        let state = one_step(&mut Heun::default(), 0.1);
        assert!((state[0] - 0.905).abs() < 1e-15);
        assert!((state[1] - 1.81).abs() < 1e-14);
    }

    #[test]
    fn test_chunked_matches_serial() {
        let serial = one_step(&mut Heun::new(None), 0.2);
        let chunked = one_step(&mut Heun::new(Some(1)), 0.2);
        assert_eq!(serial, chunked);
    }

    #[test]
    fn test_create_integrator() {
        let euler = create_integrator(IntegratorKind::ForwardEuler, None);
        assert_eq!(euler.order(), 1);
        let heun = create_integrator(IntegratorKind::Heun, Some(64));
        assert_eq!(heun.name(), "Heun");
        assert_eq!(heun.stages(), 2);
    }

    #[test]
    fn test_size_mismatch() {
        let mut system = Decay;
        let mut state = vec![1.0; 2];
        let rate = vec![0.0; 2];
        let r = ForwardEuler::default().step(&mut system, 0.0, 0.1, &mut state, &rate);
        assert!(matches!(r, Err(PhysicsError::StateSize { .. })));
    }
}
