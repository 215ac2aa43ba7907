//! 规则类型定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 规则类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    // 存在性检查
    Required,

    // 数值边界
    Min,
    Max,

    // 字符串长度
    MinLength,
    MaxLength,

    // 正则匹配（整串）
    Pattern,

    // 自定义谓词
    Custom,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "required",
            Self::Min => "min",
            Self::Max => "max",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Pattern => "pattern",
            Self::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}
