// crates/cf_config/src/error.rs

//! 配置层错误类型

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 构造无效值错误
    pub fn invalid_value(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for cf_foundation::CfError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(io) => cf_foundation::CfError::Io(io),
            other => cf_foundation::CfError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid_value("time.end", -1.0, "必须大于起始时间");
        assert!(err.to_string().contains("time.end"));
    }

    #[test]
    fn test_config_error_to_foundation() {
        let err: cf_foundation::CfError = ConfigError::Parse("bad".into()).into();
        assert!(matches!(err, cf_foundation::CfError::Config { .. }));
    }
}
