//! 存储层对接
//!
//! 快照解码（存储数据 -> 类型化属性）、编码（属性 -> JSON 文档），
//! 以及一个内存集合，用于测试和命令行工具模拟托管文档数据库。

use crate::document::{DocumentAttributes, ValidatedDocument};
use crate::error::{DocumentError, Result};
use crate::timestamp::Timestamp;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 文档快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    id: String,
    data: Option<Value>,
}

impl Snapshot {
    pub fn new(id: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// 从快照构造文档
pub trait FromSnapshot: Sized {
    fn from_snapshot(snapshot: &Snapshot) -> Result<Self>;
}

/// 将快照数据解码为属性
///
/// 存储中的时间戳按 `DateObject` 的存储格式还原；数据中没有 id 时使用快照 id。
pub fn decode<A>(snapshot: &Snapshot) -> Result<A>
where
    A: DocumentAttributes + DeserializeOwned,
{
    let data = snapshot
        .data()
        .ok_or_else(|| DocumentError::MissingData(snapshot.id().to_string()))?;

    let mut attributes: A = serde_json::from_value(data.clone())?;
    attributes
        .base_mut()
        .id
        .get_or_insert_with(|| snapshot.id().to_string());

    Ok(attributes)
}

/// 将属性编码为存储文档
pub fn encode<A: Serialize>(attributes: &A) -> Result<Value> {
    Ok(serde_json::to_value(attributes)?)
}

/// 内存集合
///
/// 写入前强制 render，并把服务端时间戳占位符解析为写入时刻。
#[derive(Clone)]
pub struct MemoryCollection {
    name: String,
    documents: Arc<DashMap<String, Value>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Arc::new(DashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 写入文档，返回文档 id
    ///
    /// 文档没有 id 时生成 UUID v4。校验失败时返回 `DocumentError::Invalid`，不写入。
    /// 写入成功后文档中的 id 与时间戳与存储内容一致：服务端占位符解析为写入时刻。
    #[instrument(skip_all, fields(collection = %self.name, document = A::NAME))]
    pub fn put<A>(&self, document: &mut ValidatedDocument<A>) -> Result<String>
    where
        A: DocumentAttributes + Serialize,
    {
        document.render()?;

        let written_at = Timestamp::now();
        let base = document.attributes_mut().base_mut();
        base.created_on = base.created_on.take().map(|d| d.resolve(written_at));
        base.updated_on = base.updated_on.take().map(|d| d.resolve(written_at));
        let id = base
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let value = encode(document.attributes())?;
        if self.documents.insert(id.clone(), value).is_some() {
            debug!(id = %id, "文档已覆盖");
        }
        info!(id = %id, "文档已写入");

        Ok(id)
    }

    /// 读取快照，不存在时快照数据为空
    pub fn get(&self, id: &str) -> Snapshot {
        Snapshot::new(id, self.documents.get(id).map(|v| v.value().clone()))
    }

    /// 读取并解码文档
    pub fn load<D: FromSnapshot>(&self, id: &str) -> Result<D> {
        D::from_snapshot(&self.get(id))
    }

    pub fn delete(&self, id: &str) -> bool {
        self.documents.remove(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents.iter().map(|r| r.key().clone()).collect()
    }
}
