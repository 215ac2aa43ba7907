//! 统一错误处理模块
//!
//! 命令行与基础设施层共用的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("读取输入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("无效的输入: {0}")]
    InvalidInput(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = AppError::InvalidInput("expected object".to_string());
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.to_string(), "无效的输入: expected object");

        let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.code(), "JSON_ERROR");
    }
}
