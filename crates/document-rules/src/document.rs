//! 带校验的文档
//!
//! 将一份属性与一套共享规则绑定，提供短路校验、穷尽校验、
//! 时间戳刷新，以及写入存储前的 render。

use crate::error::{DocumentError, Result};
use crate::outcome::FieldErrors;
use crate::rules::RuleSet;
use crate::timestamp::{DateObject, to_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 所有文档共有的基础字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// 文档属性
///
/// 每种文档定义自己的属性结构体，并通过该 trait 暴露基础字段。
pub trait DocumentAttributes: 'static {
    /// 文档类型名，出现在校验错误消息中
    const NAME: &'static str;

    fn base(&self) -> &BaseAttributes;

    fn base_mut(&mut self) -> &mut BaseAttributes;
}

impl DocumentAttributes for BaseAttributes {
    const NAME: &'static str = "Base";

    fn base(&self) -> &BaseAttributes {
        self
    }

    fn base_mut(&mut self) -> &mut BaseAttributes {
        self
    }
}

/// 带校验的文档
pub struct ValidatedDocument<A> {
    attributes: A,
    rules: Arc<RuleSet<A>>,
}

impl<A: DocumentAttributes> ValidatedDocument<A> {
    pub fn new(attributes: A, rules: Arc<RuleSet<A>>) -> Self {
        Self { attributes, rules }
    }

    /// 不带任何规则的文档
    pub fn without_rules(attributes: A) -> Self {
        Self::new(attributes, Arc::new(RuleSet::new()))
    }

    /// 新建文档，创建与更新时间都标记为 "now"
    pub fn create(mut attributes: A, rules: Arc<RuleSet<A>>) -> Self {
        let base = attributes.base_mut();
        base.created_on = Some(DateObject::Now);
        base.updated_on = Some(DateObject::Now);
        Self::new(attributes, rules)
    }

    pub fn attributes(&self) -> &A {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut A {
        &mut self.attributes
    }

    pub fn into_attributes(self) -> A {
        self.attributes
    }

    pub fn rules(&self) -> &Arc<RuleSet<A>> {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: Arc<RuleSet<A>>) {
        self.rules = rules;
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.base().id.as_deref()
    }

    /// 创建时间，"now" 与服务端占位符按当前时间展示
    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        self.attributes
            .base()
            .created_on
            .as_ref()
            .and_then(DateObject::to_datetime)
    }

    /// 更新时间，展示规则同 `created_on`
    pub fn updated_on(&self) -> Option<DateTime<Utc>> {
        self.attributes
            .base()
            .updated_on
            .as_ref()
            .and_then(DateObject::to_datetime)
    }

    /// 短路校验：按注册顺序的逆序返回第一条失败的规则
    pub fn validate(&self) -> Option<FieldErrors> {
        self.rules.evaluate_first(&self.attributes)
    }

    /// 穷尽校验：返回所有失败的规则
    pub fn validate_all(&self) -> Option<FieldErrors> {
        self.rules.evaluate_all(&self.attributes)
    }

    /// 刷新时间戳
    ///
    /// 创建时间转为存储层表示，更新时间总是置为服务端占位符。
    pub fn update_timestamps(&mut self) {
        let base = self.attributes.base_mut();
        base.created_on = Some(to_timestamp(base.created_on.as_ref()));
        base.updated_on = Some(DateObject::ServerTimestamp);
    }

    /// 校验并刷新时间戳，返回可交给存储层的属性
    #[instrument(skip_all, fields(document = A::NAME, id = ?self.id()))]
    pub fn render(&mut self) -> Result<&A> {
        if let Some(fields) = self.validate_all() {
            warn!(failed = fields.len(), "文档校验未通过");
            return Err(DocumentError::Invalid {
                document: A::NAME.to_string(),
                fields,
            });
        }

        self.update_timestamps();
        debug!("文档已渲染");
        Ok(&self.attributes)
    }
}

impl<A: DocumentAttributes + Clone> Clone for ValidatedDocument<A> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            rules: Arc::clone(&self.rules),
        }
    }
}

impl<A: DocumentAttributes + std::fmt::Debug> std::fmt::Debug for ValidatedDocument<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedDocument")
            .field("attributes", &self.attributes)
            .field("rules", &self.rules)
            .finish()
    }
}
