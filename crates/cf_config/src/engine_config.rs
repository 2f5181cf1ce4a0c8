// crates/cf_config/src/engine_config.rs

//! 有限元近似引擎配置

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 单元循环执行方式
///
/// # 策略说明
///
/// - `Colored`: 单元按共享节点着色，同一颜色的单元互不共享节点，
///   批内并行、批间串行。累加无竞争且结果可复现。
/// - `Sequential`: 按单元顺序串行执行，逐位可复现。
/// - `Unordered`: 所有单元一次性并行，节点残差的累加顺序不确定，
///   浮点求和结果可能随调度变化。仅用于与旧行为对比。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementLoopMode {
    /// 着色分批并行
    #[default]
    Colored,
    /// 串行
    Sequential,
    /// 无序并行
    Unordered,
}

/// 近似引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 单元循环方式
    #[serde(default)]
    pub element_loop: ElementLoopMode,

    /// 时间步上限 [s]，每个耦合步开始时重置为该值
    #[serde(default = "default_max_time_step")]
    pub max_time_step: f64,

    /// 边界条件是否逐节点并行施加
    #[serde(default = "default_parallel_boundary")]
    pub parallel_boundary: bool,
}

fn default_max_time_step() -> f64 { 1.0 }
fn default_parallel_boundary() -> bool { true }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            element_loop: ElementLoopMode::default(),
            max_time_step: default_max_time_step(),
            parallel_boundary: default_parallel_boundary(),
        }
    }
}

impl EngineConfig {
    /// 串行确定性配置（用于需要逐位复现的测试）
    pub fn deterministic() -> Self {
        Self {
            element_loop: ElementLoopMode::Sequential,
            parallel_boundary: false,
            ..Self::default()
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_time_step > 0.0) || !self.max_time_step.is_finite() {
            return Err(ConfigError::invalid_value(
                "engine.max_time_step",
                self.max_time_step,
                "时间步上限必须为有限正数",
            ));
        }
        Ok(())
    }
}
