//! 时间戳模型与归一化
//!
//! 文档中的时间字段可能是四种形态之一：具体日期、"now" 标记、
//! 存储层已解析的时间戳、以及等待服务端写入的占位符。
//! 这里提供两个方向的转换：写入前转为存储层表示（`to_timestamp`），
//! 展示前转为统一的日期值（`to_date_value`）。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// "now" 标记的存储形式
pub const NOW_MARKER: &str = "now";

/// 服务端时间戳占位符的存储形式
pub const SERVER_TIMESTAMP_SENTINEL: &str = "__server_timestamp__";

/// 存储层时间戳（秒 + 纳秒）
///
/// 反序列化同样经过 `new`，纳秒部分总是小于 1 秒。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawTimestamp")]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

#[derive(Deserialize)]
struct RawTimestamp {
    seconds: i64,
    nanos: u32,
}

impl From<RawTimestamp> for Timestamp {
    fn from(raw: RawTimestamp) -> Self {
        Self::new(raw.seconds, raw.nanos)
    }
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: seconds.saturating_add(i64::from(nanos / 1_000_000_000)),
            nanos: nanos % 1_000_000_000,
        }
    }

    pub fn now() -> Self {
        Self::from_date(Utc::now())
    }

    pub fn from_date(date: DateTime<Utc>) -> Self {
        Self {
            seconds: date.timestamp(),
            nanos: date.timestamp_subsec_nanos(),
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanos: (millis.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// 毫秒数，溢出时饱和到 i64 边界（此时 `DateValue::to_datetime` 返回 None）
    pub fn to_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanos / 1_000_000))
    }

    /// 超出 chrono 可表示范围时返回 None
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// 文档中的时间字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateObject {
    /// 具体日期
    Date(DateTime<Utc>),
    /// 使用当前服务端时间
    Now,
    /// 存储层已解析的时间戳
    Timestamp(Timestamp),
    /// 等待服务端写入的占位符，视为已经是当前时间
    ServerTimestamp,
}

impl DateObject {
    /// 将服务端占位符解析为写入时刻，其他形态保持不变
    pub fn resolve(self, at: Timestamp) -> Self {
        match self {
            Self::ServerTimestamp => Self::Timestamp(at),
            other => other,
        }
    }

    /// 以具体日期展示，"now" 与占位符取当前时间
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        to_date_value(self).to_datetime()
    }
}

impl From<DateTime<Utc>> for DateObject {
    fn from(date: DateTime<Utc>) -> Self {
        Self::Date(date)
    }
}

impl From<Timestamp> for DateObject {
    fn from(timestamp: Timestamp) -> Self {
        Self::Timestamp(timestamp)
    }
}

impl Serialize for DateObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Date(date) => {
                serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::Now => serializer.serialize_str(NOW_MARKER),
            Self::Timestamp(timestamp) => timestamp.serialize(serializer),
            Self::ServerTimestamp => serializer.serialize_str(SERVER_TIMESTAMP_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for DateObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Timestamp(Timestamp),
            Millis(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Timestamp(timestamp) => Ok(Self::Timestamp(timestamp)),
            Repr::Millis(millis) => DateTime::from_timestamp_millis(millis)
                .map(Self::Date)
                .ok_or_else(|| serde::de::Error::custom(format!("时间超出范围: {}", millis))),
            Repr::Text(text) => match text.as_str() {
                NOW_MARKER => Ok(Self::Now),
                SERVER_TIMESTAMP_SENTINEL => Ok(Self::ServerTimestamp),
                _ => DateTime::parse_from_rfc3339(&text)
                    .map(|date| Self::Date(date.with_timezone(&Utc)))
                    .map_err(|e| {
                        serde::de::Error::custom(format!("无法解析日期时间 '{}': {}", text, e))
                    }),
            },
        }
    }
}

/// 统一的日期值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Date(DateTime<Utc>),
    Millis(i64),
    Now,
}

impl DateValue {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Millis(millis) => DateTime::from_timestamp_millis(*millis),
            Self::Now => Some(Utc::now()),
        }
    }
}

/// 归一化为日期值
///
/// 已解析的时间戳转为毫秒数，"now" 与服务端占位符都转为 `DateValue::Now`，
/// 具体日期原样返回。
pub fn to_date_value(value: &DateObject) -> DateValue {
    match value {
        DateObject::Date(date) => DateValue::Date(*date),
        DateObject::Now | DateObject::ServerTimestamp => DateValue::Now,
        DateObject::Timestamp(timestamp) => DateValue::Millis(timestamp.to_millis()),
    }
}

/// 转为存储层表示
///
/// 缺失或 "now" 转为服务端占位符；具体日期每次都重新派生时间戳；
/// 已解析的时间戳与占位符原样返回。
pub fn to_timestamp(value: Option<&DateObject>) -> DateObject {
    match value {
        None | Some(DateObject::Now) => DateObject::ServerTimestamp,
        Some(DateObject::Date(date)) => DateObject::Timestamp(Timestamp::from_date(*date)),
        Some(DateObject::Timestamp(timestamp)) => DateObject::Timestamp(*timestamp),
        Some(DateObject::ServerTimestamp) => DateObject::ServerTimestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn new_year_2010() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_to_timestamp_variants() {
        assert_eq!(to_timestamp(None), DateObject::ServerTimestamp);
        assert_eq!(to_timestamp(Some(&DateObject::Now)), DateObject::ServerTimestamp);
        assert_eq!(
            to_timestamp(Some(&DateObject::ServerTimestamp)),
            DateObject::ServerTimestamp
        );

        let date = new_year_2010();
        assert_eq!(
            to_timestamp(Some(&DateObject::Date(date))),
            DateObject::Timestamp(Timestamp::from_date(date))
        );

        let resolved = DateObject::Timestamp(Timestamp::new(42, 7));
        assert_eq!(to_timestamp(Some(&resolved)), resolved);
    }

    #[test]
    fn test_to_timestamp_from_same_date_is_stable() {
        let date = DateObject::Date(new_year_2010());
        assert_eq!(to_timestamp(Some(&date)), to_timestamp(Some(&date)));
        assert_eq!(date, DateObject::Date(new_year_2010()));
    }

    #[test]
    fn test_to_date_value() {
        let date = new_year_2010();
        assert_eq!(to_date_value(&DateObject::Date(date)), DateValue::Date(date));
        assert_eq!(to_date_value(&DateObject::Now), DateValue::Now);
        assert_eq!(to_date_value(&DateObject::ServerTimestamp), DateValue::Now);
        assert_eq!(
            to_date_value(&DateObject::Timestamp(Timestamp::from_date(date))),
            DateValue::Millis(date.timestamp_millis())
        );
        assert_eq!(
            DateValue::Millis(date.timestamp_millis()).to_datetime(),
            Some(date)
        );
    }

    #[test]
    fn test_millis_roundtrip_before_epoch() {
        let timestamp = Timestamp::from_millis(-1500);
        assert_eq!(timestamp.seconds(), -2);
        assert_eq!(timestamp.nanos(), 500_000_000);
        assert_eq!(timestamp.to_millis(), -1500);
    }

    #[test]
    fn test_timestamp_new_normalizes_nanos() {
        let timestamp = Timestamp::new(1, 2_500_000_000);
        assert_eq!(timestamp.seconds(), 3);
        assert_eq!(timestamp.nanos(), 500_000_000);
    }

    #[test]
    fn test_out_of_range_timestamp_has_no_date() {
        let far = Timestamp::new(i64::MAX, 999_999_999);
        assert_eq!(far.to_millis(), i64::MAX);
        assert_eq!(far.to_date(), None);

        let value = to_date_value(&DateObject::Timestamp(far));
        assert_eq!(value, DateValue::Millis(i64::MAX));
        assert_eq!(value.to_datetime(), None);

        let past = Timestamp::new(i64::MIN, 0);
        assert_eq!(past.to_millis(), i64::MIN);
        assert_eq!(DateObject::Timestamp(past).to_datetime(), None);
    }

    #[test]
    fn test_deserialize_normalizes_nanos() {
        let parsed: Timestamp =
            serde_json::from_value(json!({"seconds": 1, "nanos": 2_500_000_000u32})).unwrap();
        assert_eq!(parsed, Timestamp::new(3, 500_000_000));
        assert_eq!(parsed.nanos(), 500_000_000);
    }

    #[test]
    fn test_resolve_only_touches_sentinel() {
        let at = Timestamp::new(100, 0);
        assert_eq!(
            DateObject::ServerTimestamp.resolve(at),
            DateObject::Timestamp(at)
        );
        assert_eq!(DateObject::Now.resolve(at), DateObject::Now);
    }

    #[test]
    fn test_storage_format() {
        let date = new_year_2010();

        assert_eq!(serde_json::to_value(DateObject::Now).unwrap(), json!("now"));
        assert_eq!(
            serde_json::to_value(DateObject::ServerTimestamp).unwrap(),
            json!(SERVER_TIMESTAMP_SENTINEL)
        );
        assert_eq!(
            serde_json::to_value(DateObject::Timestamp(Timestamp::new(5, 6))).unwrap(),
            json!({"seconds": 5, "nanos": 6})
        );
        assert_eq!(
            serde_json::to_value(DateObject::Date(date)).unwrap(),
            json!("2010-01-01T00:00:00.000Z")
        );

        let parsed: DateObject = serde_json::from_value(json!("2010-01-01T00:00:00Z")).unwrap();
        assert_eq!(parsed, DateObject::Date(date));

        let parsed: DateObject = serde_json::from_value(json!(date.timestamp_millis())).unwrap();
        assert_eq!(parsed, DateObject::Date(date));

        let parsed: DateObject = serde_json::from_value(json!({"seconds": 5, "nanos": 6})).unwrap();
        assert_eq!(parsed, DateObject::Timestamp(Timestamp::new(5, 6)));

        assert!(serde_json::from_value::<DateObject>(json!("yesterday")).is_err());
    }
}
