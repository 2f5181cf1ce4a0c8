// crates/cf_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `CfError` 枚举和 `CfResult` 类型别名。
//! 网格、物理层的错误都可以转换为 `CfError` 向上传播。
//!
//! # 示例
//!
//! ```
//! use cf_foundation::error::{CfError, CfResult};
//!
//! fn check(n: usize) -> CfResult<()> {
//!     if n >= 4 {
//!         return Err(CfError::index_out_of_bounds("node", n, 4));
//!     }
//!     Ok(())
//! }
//! assert!(check(2).is_ok());
//! assert!(check(9).is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type CfResult<T> = Result<T, CfError>;

/// CoastFE 错误类型
#[derive(Error, Debug)]
pub enum CfError {
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 无效网格拓扑或几何
    #[error("无效的网格: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 数值错误
    #[error("数值错误: {message}")]
    Numerical {
        /// 具体错误信息
        message: String,
    },

    /// 状态机使用错误
    #[error("无效状态: {message}")]
    InvalidState {
        /// 具体错误信息
        message: String,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// IO 错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl CfError {
    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 数值错误
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// 状态错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}
