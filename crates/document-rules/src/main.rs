//! docval 命令行
//!
//! 从文件或标准输入读取用户文档（单个对象或数组），逐个校验并输出 JSON 报告。
//! 任一文档校验失败时以退出码 1 结束。

use anyhow::Result;
use docval_shared::{
    config::{AppConfig, ValidationConfig},
    error::AppError,
    observability,
};
use document_rules::{
    DocumentError, FieldErrors, FromSnapshot, MemoryCollection, Snapshot, UserDocument,
};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::process::ExitCode;
use tracing::{info, warn};

/// 单个文档的校验结果
#[derive(Debug, Serialize)]
struct Report {
    id: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stored: Option<Value>,
}

impl Report {
    fn failed(id: &str, error: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            valid: false,
            errors: None,
            error: Some(error.to_string()),
            stored: None,
        }
    }
}

fn main() -> Result<ExitCode> {
    let (config, config_error) = match AppConfig::load("docval") {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    observability::init(&config.observability)?;
    if let Some(e) = config_error {
        warn!("Failed to load config, using defaults: {}", e);
    }

    info!(
        environment = %config.environment,
        exhaustive = config.validation.exhaustive,
        render = config.validation.render,
        "Configuration loaded"
    );

    let path = std::env::args().nth(1);
    let snapshots = match load_input(path.as_deref()) {
        Ok(snapshots) => snapshots,
        Err(e) => {
            eprintln!("{}: {}", e.code(), e);
            return Ok(ExitCode::from(2));
        }
    };

    let collection = MemoryCollection::new(config.validation.collection.clone());
    let reports: Vec<Report> = snapshots
        .iter()
        .map(|snapshot| check(snapshot, &config.validation, &collection))
        .collect();

    let invalid = reports.iter().filter(|r| !r.valid).count();
    info!(total = reports.len(), invalid, "Validation finished");

    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(if invalid == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// 读取输入并拆分为快照
///
/// 文档自带 "id" 时使用它，否则按位置生成 `input-{i}`。
fn load_input(path: Option<&str>) -> Result<Vec<Snapshot>, AppError> {
    let raw = match path {
        Some(path) if path != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let documents = match serde_json::from_str(&raw)? {
        Value::Array(items) => items,
        value @ Value::Object(_) => vec![value],
        other => {
            return Err(AppError::InvalidInput(format!(
                "expected an object or an array of objects, got {}",
                other
            )));
        }
    };

    Ok(documents
        .into_iter()
        .enumerate()
        .map(|(i, data)| {
            let id = data
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("input-{}", i));
            Snapshot::new(id, Some(data))
        })
        .collect())
}

fn check(snapshot: &Snapshot, config: &ValidationConfig, collection: &MemoryCollection) -> Report {
    let mut doc = match UserDocument::from_snapshot(snapshot) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(id = snapshot.id(), error = %e, "文档解码失败");
            return Report::failed(snapshot.id(), e);
        }
    };

    let errors = if config.exhaustive {
        doc.validate_all()
    } else {
        doc.validate()
    };

    if errors.is_some() || !config.render {
        return Report {
            id: snapshot.id().to_string(),
            valid: errors.is_none(),
            errors,
            error: None,
            stored: None,
        };
    }

    match collection.put(&mut *doc) {
        Ok(id) => Report {
            stored: collection.get(&id).data().cloned(),
            id,
            valid: true,
            errors: None,
            error: None,
        },
        Err(DocumentError::Invalid { fields, .. }) => Report {
            id: snapshot.id().to_string(),
            valid: false,
            errors: Some(fields),
            error: None,
            stored: None,
        },
        Err(e) => Report::failed(snapshot.id(), e),
    }
}
