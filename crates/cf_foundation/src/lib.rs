// crates/cf_foundation/src/lib.rs

//! CoastFE Foundation Layer
//!
//! 基础层，提供整个项目共享的基础抽象。
//!
//! # 模块概览
//!
//! - [`index`]: 稠密强类型索引（节点/单元）
//! - [`error`]: 统一错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: cf_cli        ─> 驱动程序
//! Layer 3: cf_physics    ─> 近似引擎、ODE 积分、锁步耦合
//! Layer 2: cf_mesh       ─> 几何、网格分解、点定位树、模型数据
//! Layer 1: cf_foundation ─> 索引、错误 (本层)
//!          cf_config     ─> 配置
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;

/// 层级标识
pub const LAYER: u8 = 1;

pub use error::{CfError, CfResult};
pub use index::{ElementIndex, ElementTag, Idx, NodeIndex, NodeTag, INVALID_INDEX};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{CfError, CfResult};
    pub use crate::index::{element, node, ElementIndex, Idx, NodeIndex};
}
