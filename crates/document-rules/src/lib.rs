//! 文档校验
//!
//! 在托管文档数据库客户端之上提供声明式的字段校验：
//! - 规则集构建（必填、数值边界、长度、正则、自定义谓词）
//! - 短路校验与穷尽校验
//! - 写入前的时间戳归一化与 render
//! - 快照解码与内存集合

pub mod document;
pub mod error;
pub mod kinds;
pub mod models;
pub mod outcome;
pub mod rules;
pub mod storage;
pub mod timestamp;

pub use document::{BaseAttributes, DocumentAttributes, ValidatedDocument};
pub use error::{DocumentError, Result};
pub use kinds::RuleKind;
pub use models::{Emails, Gender, User, UserDocument};
pub use outcome::{FieldErrors, Outcome, RuleFailure};
pub use rules::{Bound, Rule, RuleSet};
pub use storage::{FromSnapshot, MemoryCollection, Snapshot, decode, encode};
pub use timestamp::{DateObject, DateValue, Timestamp, to_date_value, to_timestamp};
