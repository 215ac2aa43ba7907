//! 文档校验错误类型

use crate::outcome::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// render 前校验未通过，携带全部失败规则
    #[error("{document} document has errors")]
    Invalid {
        document: String,
        fields: FieldErrors,
    },

    #[error("无效的正则表达式 '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("快照没有数据: {0}")]
    MissingData(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DocumentError {
    /// 获取字段错误（仅 Invalid 有）
    pub fn fields(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;
