// crates/cf_physics/src/ode/mod.rs

//! 显式时间推进层
//!
//! - [`OdeSystem`]: 方程系统接口
//! - [`OneStepIntegrator`]: 单步积分器（前向欧拉、Heun）
//! - [`IvpSolver`]: 初值问题驱动器

pub mod integrator;
pub mod ivp;
pub mod system;

pub use integrator::{create_integrator, ForwardEuler, Heun, OneStepIntegrator};
pub use ivp::{IvpReport, IvpSolver};
pub use system::OdeSystem;
