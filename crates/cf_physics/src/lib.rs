// crates/cf_physics/src/lib.rs

//! CoastFE 物理引擎层
//!
//! 在 `cf_mesh` 的网格之上提供时间相关有限元近似与显式时间推进。
//!
//! # 组成
//!
//! - [`model`]: 物理模型回调接口 [`PhysicsModel`]
//! - [`approximation`]: 近似引擎，挂载模型数据并执行边界与单元循环
//! - [`ode`]: ODE 系统接口、前向欧拉/Heun 积分器、初值问题驱动器
//! - [`fe_system`]: 把近似引擎包装为 ODE 系统
//! - [`coordinator`]: 多模型锁步耦合
//! - [`models`]: 参考模型（扩散）
//!
//! # 使用流程
//!
//! ```rust
//! use cf_config::{EngineConfig, TimeConfig};
//! use cf_mesh::RectMeshGenerator;
//! use cf_physics::prelude::*;
//!
//! let mut mesh = RectMeshGenerator::square(4, 1.0).build().unwrap();
//! let model = DiffusionModel::new(0.1).with_initial(|p| p.x);
//! let mut engine = TimeDependentApproximation::new(model, EngineConfig::default());
//! engine.initialize(&mut mesh).unwrap();
//!
//! let mut system = FeOdeSystem::new(&mesh, engine).unwrap();
//! let mut state = system.initial_state().unwrap();
//! let mut solver = IvpSolver::from_config(&TimeConfig::default());
//! let report = solver.solve(&mut system, 0.0, &mut state, 0.1, None).unwrap();
//! assert_eq!(report.final_time, 0.1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod approximation;
pub mod coordinator;
pub mod error;
pub mod fe_system;
pub mod model;
pub mod models;
pub mod ode;

/// 层级标识
pub const LAYER: u8 = 3;

pub use approximation::TimeDependentApproximation;
pub use coordinator::{
    CoordinatorReport, CoupledInstance, LockStepCoordinator, OdeInstance, StepObserver,
};
pub use error::{PhysicsError, PhysicsResult};
pub use fe_system::FeOdeSystem;
pub use model::{NodeDataAccess, PhysicsModel};
pub use models::DiffusionModel;
pub use ode::{
    create_integrator, ForwardEuler, Heun, IvpReport, IvpSolver, OdeSystem, OneStepIntegrator,
};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::approximation::TimeDependentApproximation;
    pub use crate::coordinator::{CoupledInstance, LockStepCoordinator, OdeInstance};
    pub use crate::error::{PhysicsError, PhysicsResult};
    pub use crate::fe_system::FeOdeSystem;
    pub use crate::model::{NodeDataAccess, PhysicsModel};
    pub use crate::models::DiffusionModel;
    pub use crate::ode::{IvpReport, IvpSolver, OdeSystem};
}
