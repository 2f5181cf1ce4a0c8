// crates/cf_config/src/lib.rs

//! CoastFE Config Layer
//!
//! 配置层，提供点定位树、近似引擎与时间推进的参数。
//! 所有数值使用 f64，可通过 serde 与 JSON 互转。
//!
//! # 模块概览
//!
//! - [`index_config`]: 点定位树参数与保护阈值常量
//! - [`engine_config`]: 单元循环方式、时间步上限
//! - [`time_config`]: 积分器、起止时间、输出间隔
//! - [`simulation`]: 汇总配置（文件读写）
//! - [`error`]: 配置错误类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine_config;
pub mod error;
pub mod index_config;
pub mod simulation;
pub mod time_config;

pub use engine_config::{ElementLoopMode, EngineConfig};
pub use error::ConfigError;
pub use index_config::{
    SpatialIndexConfig, SplitAxis, DEFAULT_OBJECTS_PER_LEAF, DEGENERATE_SPLIT_DEPTH,
    MAX_TREE_DEPTH, MIN_CELL_SIZE,
};
pub use simulation::SimulationConfig;
pub use time_config::{IntegratorKind, TimeConfig};
