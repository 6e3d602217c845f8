use crate::error::{AppError, FileError};
use crate::models::page::DocumentInput;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 支持的输入格式
fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("json") | Some("toml")
    )
}

/// 从 JSON / TOML 文件加载一份文档
///
/// 文件中没有 `name` 时使用文件名（不含扩展名）
pub async fn load_document(path: &Path) -> Result<DocumentInput> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
        .with_context(|| format!("无法读取输入文件: {}", path.display()))?;

    let mut value: serde_json::Value = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => {
            let table: toml::Table = toml::from_str(&content)
                .map_err(|e| AppError::parse_failed(path.display().to_string(), e))?;
            serde_json::to_value(table)?
        }
        _ => serde_json::from_str(&content)
            .map_err(|e| AppError::parse_failed(path.display().to_string(), e))?,
    };

    if value.get("name").is_none() {
        let stem = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("name".to_string(), serde_json::Value::String(stem));
        }
    }

    let document: DocumentInput = serde_json::from_value(value)
        .map_err(|e| AppError::parse_failed(path.display().to_string(), e))
        .with_context(|| format!("无法解析输入文件: {}", path.display()))?;

    Ok(document)
}

/// 列出文件夹中的输入文件（按文件名排序，保证处理顺序稳定）
async fn list_input_files(folder_path: &str) -> Result<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        })
        .into());
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_supported(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// 从文件夹中加载所有输入文档
///
/// 单个文件加载失败只记录警告，不影响其他文件
pub async fn load_all_documents(folder_path: &str) -> Result<Vec<DocumentInput>> {
    let mut documents = Vec::new();

    for path in list_input_files(folder_path).await? {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_document(&path).await {
            Ok(document) => {
                tracing::info!("成功加载 {} 页", document.pages.len());
                documents.push(document);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(documents)
}
