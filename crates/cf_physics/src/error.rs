// crates/cf_physics/src/error.rs

//! 物理引擎错误类型
//!
//! 网格与配置层错误通过 `#[from]` 直接包装；
//! 所有错误可转换为 `cf_foundation::CfError`。

use cf_config::ConfigError;
use cf_foundation::CfError;
use cf_mesh::MeshError;
use thiserror::Error;

/// 物理模块结果类型
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// 物理引擎错误
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// 引擎尚未初始化对应的模型数据
    #[error("近似引擎未初始化: {operation} 需要先调用 {requires}")]
    NotInitialized {
        /// 被调用的操作
        operation: &'static str,
        /// 需要先完成的初始化步骤
        requires: &'static str,
    },

    /// 重复初始化
    #[error("近似引擎重复初始化: {what}")]
    AlreadyInitialized {
        /// 初始化步骤
        what: &'static str,
    },

    /// 网格与初始化时不一致
    #[error("网格不匹配: 初始化时 {entity} 数 {expected}, 当前 {actual}")]
    MeshMismatch {
        /// 节点或单元
        entity: &'static str,
        /// 初始化时数量
        expected: usize,
        /// 当前数量
        actual: usize,
    },

    /// 状态向量长度不符
    #[error("状态向量长度不匹配: {name} 期望 {expected}, 实际 {actual}")]
    StateSize {
        /// 向量名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 时间步长崩溃（非有限或低于下限）
    #[error("时间步长崩溃: t={time:.6e}, dt={dt:.3e} (下限 {min:.3e})")]
    TimeStepCollapse {
        /// 当前时间
        time: f64,
        /// 系统给出的步长
        dt: f64,
        /// 允许的最小步长
        min: f64,
    },

    /// 积分区间无效
    #[error("积分区间无效: [{t0}, {t1}]")]
    InvalidInterval {
        /// 起点
        t0: f64,
        /// 终点
        t1: f64,
    },

    /// 网格错误
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PhysicsError {
    /// 检查向量长度
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> PhysicsResult<()> {
        if expected != actual {
            Err(Self::StateSize {
                name,
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }
}

/// 转换到 Foundation 层错误
impl From<PhysicsError> for CfError {
    fn from(err: PhysicsError) -> Self {
        match err {
            PhysicsError::Mesh(e) => e.into(),
            PhysicsError::Config(e) => e.into(),
            PhysicsError::StateSize {
                name,
                expected,
                actual,
            } => CfError::size_mismatch(name, expected, actual),
            collapse @ PhysicsError::TimeStepCollapse { .. } => {
                CfError::numerical(collapse.to_string())
            }
            other => CfError::invalid_state(other.to_string()),
        }
    }
}
