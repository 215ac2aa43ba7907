//! 规则评估结果模型

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 谓词返回值
///
/// 自定义规则的谓词可以返回任何能转换为 `Outcome` 的值：
/// `()`、`None`、`false`、空字符串表示通过，`true` 表示失败（布尔标记），
/// 非空字符串表示失败并携带该消息。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Pass,
    Flag,
    Message(String),
}

impl Outcome {
    /// 转换为失败结果，通过时返回 None
    pub fn into_failure(self) -> Option<RuleFailure> {
        match self {
            Self::Pass => None,
            Self::Flag => Some(RuleFailure::Flag),
            Self::Message(message) => Some(RuleFailure::Message(message)),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Self::Pass
    }
}

impl From<bool> for Outcome {
    fn from(failed: bool) -> Self {
        if failed { Self::Flag } else { Self::Pass }
    }
}

impl From<String> for Outcome {
    fn from(message: String) -> Self {
        if message.is_empty() {
            Self::Pass
        } else {
            Self::Message(message)
        }
    }
}

impl From<&str> for Outcome {
    fn from(message: &str) -> Self {
        message.to_string().into()
    }
}

impl<T: Into<Outcome>> From<Option<T>> for Outcome {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<RuleFailure> for Outcome {
    fn from(failure: RuleFailure) -> Self {
        match failure {
            RuleFailure::Flag => Self::Flag,
            RuleFailure::Message(message) => Self::Message(message),
        }
    }
}

/// 单条规则的失败结果
///
/// 序列化为 JSON `true`（布尔标记）或错误消息字符串。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleFailure {
    Flag,
    Message(String),
}

impl RuleFailure {
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Flag => None,
            Self::Message(message) => Some(message),
        }
    }
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "true"),
            Self::Message(message) => write!(f, "{}", message),
        }
    }
}

impl Serialize for RuleFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flag => serializer.serialize_bool(true),
            Self::Message(message) => serializer.serialize_str(message),
        }
    }
}

impl<'de> Deserialize<'de> for RuleFailure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Message(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Ok(Self::Flag),
            Repr::Flag(false) => Err(serde::de::Error::custom(
                "规则失败标记只能为 true",
            )),
            Repr::Message(message) => Ok(Self::Message(message)),
        }
    }
}

/// 规则名 -> 失败结果，保持规则遇到的先后顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, RuleFailure>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅包含一条失败的结果
    pub fn single(name: impl Into<String>, failure: RuleFailure) -> Self {
        let mut errors = Self::new();
        errors.insert(name, failure);
        errors
    }

    pub fn insert(&mut self, name: impl Into<String>, failure: RuleFailure) {
        self.0.insert(name.into(), failure);
    }

    pub fn get(&self, name: &str) -> Option<&RuleFailure> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleFailure)> {
        self.0.iter().map(|(name, failure)| (name.as_str(), failure))
    }

    pub fn into_inner(self) -> IndexMap<String, RuleFailure> {
        self.0
    }
}

impl IntoIterator for FieldErrors {
    type Item = (String, RuleFailure);
    type IntoIter = indexmap::map::IntoIter<String, RuleFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, RuleFailure)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, RuleFailure)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
