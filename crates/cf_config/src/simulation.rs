// crates/cf_config/src/simulation.rs

//! SimulationConfig - 一次模拟运行的完整配置
//!
//! 以 JSON 文件保存，所有字段都有默认值，缺省字段按默认值补齐。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine_config::EngineConfig;
use crate::error::ConfigError;
use crate::index_config::SpatialIndexConfig;
use crate::time_config::TimeConfig;

/// 模拟配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 点定位树
    #[serde(default)]
    pub index: SpatialIndexConfig,

    /// 近似引擎
    #[serde(default)]
    pub engine: EngineConfig,

    /// 时间推进
    #[serde(default)]
    pub time: TimeConfig,
}

impl SimulationConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index.validate()?;
        self.engine.validate()?;
        self.time.validate()?;
        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_config::ElementLoopMode;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = SimulationConfig::from_json(
            r#"{"engine": {"element_loop": "sequential"}, "time": {"end": 3.5}}"#,
        )
        .unwrap();
        assert_eq!(config.engine.element_loop, ElementLoopMode::Sequential);
        assert_eq!(config.time.end, 3.5);
        assert_eq!(config.index.min_objects_per_leaf, 100);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            SimulationConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(SimulationConfig::from_json(r#"{"time": {"start": 2.0, "end": 1.0}}"#).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("cf_config_roundtrip_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sim.json");

        let mut config = SimulationConfig::default();
        config.time.end = 42.0;
        config.save_to_file(&path).unwrap();

        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded.time.end, 42.0);
        let _ = std::fs::remove_file(&path);
    }
}
