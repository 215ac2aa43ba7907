//! 用户文档

use crate::document::{BaseAttributes, DocumentAttributes, ValidatedDocument};
use crate::error::Result;
use crate::rules::RuleSet;
use crate::storage::{FromSnapshot, Snapshot, decode};
use crate::timestamp::DateObject;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

/// 用户邮箱格式
pub const EMAIL_PATTERN: &str = r"^([a-zA-Z0-9_\-\.]+)@([a-zA-Z0-9_\-\.]+)\.([a-zA-Z]{2,5})$";

/// 所有用户文档共享的规则表
static USER_RULES: LazyLock<Arc<RuleSet<User>>> = LazyLock::new(|| {
    let rules = RuleSet::<User>::new()
        .require("firstName required", |u| u.first_name.as_deref(), None)
        .min_length("firstName minLength", 3, |u| u.first_name.as_deref(), None)
        .max_length("firstName maxLength", 50, |u| u.first_name.as_deref(), None)
        .require("lastName required", |u| u.last_name.as_deref(), None)
        .min_length("lastName minLength", 3, |u| u.last_name.as_deref(), None)
        .max_length("lastName maxLength", 50, |u| u.last_name.as_deref(), None)
        .require("uid required", |u| u.uid.as_deref(), None)
        .require("gender required", |u| u.gender.as_ref(), None)
        .pattern(
            "email pattern",
            EMAIL_PATTERN,
            |u| u.emails.as_ref()?.primary.as_deref(),
            None,
        )
        // 常量模式，编译失败属于编码错误
        .expect("EMAIL_PATTERN 必须是合法的正则表达式");

    Arc::new(rules)
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

/// 用户属性
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub base: BaseAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<DateObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Emails>,
}

impl DocumentAttributes for User {
    const NAME: &'static str = "User";

    fn base(&self) -> &BaseAttributes {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseAttributes {
        &mut self.base
    }
}

/// 用户文档
///
/// 通过 Deref 直接使用 `ValidatedDocument` 的校验与 render。
#[derive(Debug, Clone)]
pub struct UserDocument {
    document: ValidatedDocument<User>,
}

impl UserDocument {
    /// 未设置性别时默认为 Unknown
    pub fn new(mut attributes: User) -> Self {
        attributes.gender.get_or_insert(Gender::Unknown);
        Self {
            document: ValidatedDocument::new(attributes, Self::shared_rules()),
        }
    }

    /// 新建用户，时间戳标记为 "now"
    pub fn create(mut attributes: User) -> Self {
        attributes.gender.get_or_insert(Gender::Unknown);
        Self {
            document: ValidatedDocument::create(attributes, Self::shared_rules()),
        }
    }

    pub fn shared_rules() -> Arc<RuleSet<User>> {
        Arc::clone(&USER_RULES)
    }

    pub fn into_document(self) -> ValidatedDocument<User> {
        self.document
    }

    /// 展示名：优先使用 preferred_name，其次 first_name，再接 last_name
    pub fn display_name(&self) -> String {
        let user = self.attributes();
        let given = user
            .preferred_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(user.first_name.as_deref().filter(|s| !s.is_empty()));

        given
            .into_iter()
            .chain(user.last_name.as_deref().filter(|s| !s.is_empty()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn birthdate(&self) -> Option<DateTime<Utc>> {
        self.attributes()
            .birthdate
            .as_ref()
            .and_then(DateObject::to_datetime)
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birthdate().map(|d| d.year())
    }

    /// 出生月份，从 0 开始
    pub fn birth_month(&self) -> Option<u32> {
        self.birthdate().map(|d| d.month0())
    }

    /// 出生那天是星期几，0 为星期日
    pub fn birth_day(&self) -> Option<u32> {
        self.birthdate().map(|d| d.weekday().num_days_from_sunday())
    }

    /// 指定日期时的周岁
    pub fn age_at(&self, on: DateTime<Utc>) -> Option<u32> {
        let birthdate = self.birthdate()?;
        let mut age = on.year() - birthdate.year();
        if (on.month(), on.day()) < (birthdate.month(), birthdate.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    pub fn age(&self) -> Option<u32> {
        self.age_at(Utc::now())
    }
}

impl Deref for UserDocument {
    type Target = ValidatedDocument<User>;

    fn deref(&self) -> &Self::Target {
        &self.document
    }
}

impl DerefMut for UserDocument {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.document
    }
}

impl FromSnapshot for UserDocument {
    fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        decode::<User>(snapshot).map(Self::new)
    }
}
