// crates/cf_physics/src/ode/system.rs

//! 常微分方程系统接口

use crate::error::PhysicsResult;

/// 显式积分的常微分方程系统 `dy/dt = f(t, y)`
///
/// `max_time_step` 由系统在求值过程中维护：驱动器每个子步开始时用
/// `set_max_time_step` 重置上限，`rate_of_change` 可以把它调低。
pub trait OdeSystem {
    /// 状态向量长度
    fn dimension(&self) -> usize;

    /// 计算变化率
    fn rate_of_change(&mut self, time: f64, state: &[f64], rate: &mut [f64]) -> PhysicsResult<()>;

    /// 当前允许的最大时间步长
    fn max_time_step(&self) -> f64;

    /// 设置时间步长上限
    fn set_max_time_step(&mut self, dt: f64);

    /// 把时刻 `time` 的强约束（如 Dirichlet 值）直接写入状态
    ///
    /// 驱动器在起点和每个子步之后调用；默认不做任何修改。
    fn constrain_state(&mut self, _time: f64, _state: &mut [f64]) -> PhysicsResult<()> {
        Ok(())
    }
}

impl<S: OdeSystem + ?Sized> OdeSystem for &mut S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn rate_of_change(&mut self, time: f64, state: &[f64], rate: &mut [f64]) -> PhysicsResult<()> {
        (**self).rate_of_change(time, state, rate)
    }

    fn max_time_step(&self) -> f64 {
        (**self).max_time_step()
    }

    fn set_max_time_step(&mut self, dt: f64) {
        (**self).set_max_time_step(dt)
    }

    fn constrain_state(&mut self, time: f64, state: &mut [f64]) -> PhysicsResult<()> {
        (**self).constrain_state(time, state)
    }
}
