// crates/cf_config/src/time_config.rs

//! 时间推进配置

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 单步积分器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// 前向欧拉（一阶）
    ForwardEuler,
    /// 改进欧拉 / Heun（二阶，预测-校正）
    #[default]
    Heun,
}

/// 时间推进配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 起始时间 [s]
    #[serde(default)]
    pub start: f64,

    /// 结束时间 [s]
    #[serde(default = "default_end")]
    pub end: f64,

    /// 输出间隔 [s]
    #[serde(default = "default_output_interval")]
    pub output_interval: f64,

    /// 积分器
    #[serde(default)]
    pub integrator: IntegratorKind,

    /// 最小允许子步长 [s]，低于此值视为步长崩溃
    #[serde(default = "default_min_time_step")]
    pub min_time_step: f64,

    /// 状态向量更新的并行分块大小；`None` 表示串行更新
    #[serde(default)]
    pub parallel_chunk: Option<usize>,
}

fn default_end() -> f64 { 10.0 }
fn default_output_interval() -> f64 { 1.0 }
fn default_min_time_step() -> f64 { 1e-12 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: default_end(),
            output_interval: default_output_interval(),
            integrator: IntegratorKind::default(),
            min_time_step: default_min_time_step(),
            parallel_chunk: None,
        }
    }
}

impl TimeConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.end >= self.start) {
            return Err(ConfigError::invalid_value(
                "time.end",
                self.end,
                "结束时间不能早于起始时间",
            ));
        }
        if !(self.output_interval > 0.0) {
            return Err(ConfigError::invalid_value(
                "time.output_interval",
                self.output_interval,
                "输出间隔必须为正",
            ));
        }
        if !(self.min_time_step > 0.0) {
            return Err(ConfigError::invalid_value(
                "time.min_time_step",
                self.min_time_step,
                "最小步长必须为正",
            ));
        }
        if self.parallel_chunk == Some(0) {
            return Err(ConfigError::invalid_value(
                "time.parallel_chunk",
                0,
                "分块大小必须为正",
            ));
        }
        Ok(())
    }
}
