//! 规则集
//!
//! 以插入顺序保存命名的校验谓词，提供 require / min / max / min_length /
//! max_length / pattern / 自定义规则的构建方法。
//!
//! 规则集采用消费式构建：每个构建方法取得 `self` 并返回新的规则集，
//! 构建完成后通常放进 `Arc` 在同类文档间只读共享。

use crate::error::{DocumentError, Result};
use crate::kinds::RuleKind;
use crate::outcome::{FieldErrors, Outcome, RuleFailure};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use tracing::{debug, trace, warn};

/// 可用于 `min` / `max` 的数值类型
///
/// 统一转换为 f64 比较，超过 2^53 的 64 位整数会损失精度。
pub trait Bound: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_bound {
    ($($t:ty),*) => {
        $(
            impl Bound for $t {
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_bound!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

type Predicate<A> = Box<dyn Fn(&A) -> Outcome + Send + Sync>;

/// 单条命名规则
pub struct Rule<A> {
    name: String,
    kind: RuleKind,
    predicate: Predicate<A>,
}

impl<A> Rule<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// 对属性执行规则，通过时返回 None
    pub fn evaluate(&self, attributes: &A) -> Option<RuleFailure> {
        (self.predicate)(attributes).into_failure()
    }
}

impl<A> fmt::Debug for Rule<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// 规则集
pub struct RuleSet<A> {
    rules: IndexMap<String, Rule<A>>,
}

impl<A: 'static> RuleSet<A> {
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// 注册规则，同名规则原位覆盖
    fn register(mut self, name: &str, kind: RuleKind, predicate: Predicate<A>) -> Self {
        let rule = Rule {
            name: name.to_string(),
            kind,
            predicate,
        };

        if self.rules.insert(name.to_string(), rule).is_some() {
            debug!(rule = %name, kind = %kind, "规则已覆盖");
        } else {
            trace!(rule = %name, kind = %kind, "规则已注册");
        }

        self
    }

    /// 自定义规则
    ///
    /// 谓词返回 `()`、`None`、`false` 或空字符串时通过；
    /// 返回 `true` 时以布尔标记失败；返回非空字符串时以该消息失败。
    pub fn add<F, O>(self, name: &str, predicate: F) -> Self
    where
        F: Fn(&A) -> O + Send + Sync + 'static,
        O: Into<Outcome>,
    {
        self.register(
            name,
            RuleKind::Custom,
            Box::new(move |attributes| predicate(attributes).into()),
        )
    }

    /// 可失败的自定义规则
    ///
    /// 谓词返回 `Err` 时不会向上传播：有 `fallback` 则以它作为失败消息，
    /// 否则视为通过。
    pub fn try_add<F, O, E>(self, name: &str, predicate: F, fallback: Option<&str>) -> Self
    where
        F: Fn(&A) -> std::result::Result<O, E> + Send + Sync + 'static,
        O: Into<Outcome>,
        E: fmt::Display,
    {
        let rule_name = name.to_string();
        let fallback = fallback.map(str::to_string);

        self.register(
            name,
            RuleKind::Custom,
            Box::new(move |attributes| match predicate(attributes) {
                Ok(outcome) => outcome.into(),
                Err(e) => {
                    warn!(rule = %rule_name, error = %e, "自定义规则执行失败");
                    fallback.clone().map(Outcome::Message).unwrap_or_default()
                }
            }),
        )
    }

    /// 必填规则：访问器返回 None 时失败
    pub fn require<T, F>(self, name: &str, accessor: F, message: Option<&str>) -> Self
    where
        T: ?Sized + 'static,
        F: for<'a> Fn(&'a A) -> Option<&'a T> + Send + Sync + 'static,
    {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} is required", name));

        self.register(
            name,
            RuleKind::Required,
            Box::new(move |attributes| match accessor(attributes) {
                Some(_) => Outcome::Pass,
                None => Outcome::Message(message.clone()),
            }),
        )
    }

    /// 数值下界：字段缺失时通过，否则要求 `value >= min`
    pub fn min<N, F>(self, name: &str, min: impl Bound, accessor: F, message: Option<&str>) -> Self
    where
        N: Bound + 'static,
        F: Fn(&A) -> Option<N> + Send + Sync + 'static,
    {
        let min = min.to_f64();
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} must be at least {}", name, min));

        self.register(
            name,
            RuleKind::Min,
            Box::new(move |attributes| {
                bounded(accessor(attributes).map(Bound::to_f64), |v: f64| v >= min, &message)
            }),
        )
    }

    /// 数值上界：字段缺失时通过，否则要求 `value <= max`
    pub fn max<N, F>(self, name: &str, max: impl Bound, accessor: F, message: Option<&str>) -> Self
    where
        N: Bound + 'static,
        F: Fn(&A) -> Option<N> + Send + Sync + 'static,
    {
        let max = max.to_f64();
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} must be at most {}", name, max));

        self.register(
            name,
            RuleKind::Max,
            Box::new(move |attributes| {
                bounded(accessor(attributes).map(Bound::to_f64), |v: f64| v <= max, &message)
            }),
        )
    }

    /// 最小长度（按字符计）：字段缺失时通过
    pub fn min_length<F>(self, name: &str, min: usize, accessor: F, message: Option<&str>) -> Self
    where
        F: for<'a> Fn(&'a A) -> Option<&'a str> + Send + Sync + 'static,
    {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} must be at least {} characters", name, min));

        self.register(
            name,
            RuleKind::MinLength,
            Box::new(move |attributes| {
                bounded(
                    accessor(attributes).map(|s| s.chars().count()),
                    |len| len >= min,
                    &message,
                )
            }),
        )
    }

    /// 最大长度（按字符计）：字段缺失时通过
    pub fn max_length<F>(self, name: &str, max: usize, accessor: F, message: Option<&str>) -> Self
    where
        F: for<'a> Fn(&'a A) -> Option<&'a str> + Send + Sync + 'static,
    {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} must be at most {} characters", name, max));

        self.register(
            name,
            RuleKind::MaxLength,
            Box::new(move |attributes| {
                bounded(
                    accessor(attributes).map(|s| s.chars().count()),
                    |len| len <= max,
                    &message,
                )
            }),
        )
    }

    /// 正则规则：字段缺失时通过，否则整串必须匹配
    ///
    /// 模式在注册时编译为 `\A(?:pattern)\z`，部分匹配不算通过。
    pub fn pattern<F>(
        self,
        name: &str,
        pattern: &str,
        accessor: F,
        message: Option<&str>,
    ) -> Result<Self>
    where
        F: for<'a> Fn(&'a A) -> Option<&'a str> + Send + Sync + 'static,
    {
        let regex = Regex::new(&format!(r"\A(?:{})\z", pattern)).map_err(|source| {
            DocumentError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} must match the required pattern", name));

        Ok(self.register(
            name,
            RuleKind::Pattern,
            Box::new(move |attributes| {
                bounded(accessor(attributes), |s| regex.is_match(s), &message)
            }),
        ))
    }
}

impl<A> RuleSet<A> {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Rule<A>> {
        self.rules.get(name)
    }

    pub fn kind(&self, name: &str) -> Option<RuleKind> {
        self.rules.get(name).map(Rule::kind)
    }

    /// 按插入顺序返回规则名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Rule<A>> {
        self.rules.values()
    }

    /// 短路求值：按插入顺序的逆序执行，返回遇到的第一条失败
    pub fn evaluate_first(&self, attributes: &A) -> Option<FieldErrors> {
        self.iter().rev().find_map(|rule| {
            rule.evaluate(attributes).map(|failure| {
                debug!(rule = %rule.name, kind = %rule.kind, %failure, "规则未通过");
                FieldErrors::single(rule.name.clone(), failure)
            })
        })
    }

    /// 穷尽求值：按插入顺序执行全部规则，收集所有失败
    pub fn evaluate_all(&self, attributes: &A) -> Option<FieldErrors> {
        let mut errors = FieldErrors::new();

        for rule in self.iter() {
            if let Some(failure) = rule.evaluate(attributes) {
                debug!(rule = %rule.name, kind = %rule.kind, %failure, "规则未通过");
                errors.insert(rule.name.clone(), failure);
            }
        }

        if errors.is_empty() { None } else { Some(errors) }
    }
}

impl<A: 'static> Default for RuleSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for RuleSet<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.values()).finish()
    }
}

/// 可选字段的边界检查：缺失通过，存在时不满足条件则以 message 失败
fn bounded<T>(value: Option<T>, check: impl FnOnce(T) -> bool, message: &str) -> Outcome {
    match value {
        None => Outcome::Pass,
        Some(v) => {
            if check(v) {
                Outcome::Pass
            } else {
                Outcome::Message(message.to_string())
            }
        }
    }
}
