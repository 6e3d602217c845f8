//! 丢弃记录写入服务 - 业务能力层
//!
//! 只负责"写 reject 日志"能力，不关心流程

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::workflow::RejectedSpan;

/// 丢弃记录写入服务
///
/// 职责：
/// - 将被丢弃的题目追加写入日志文件
/// - 每行一条：文档、页码、题号、原因、题干预览
/// - 不关心流程顺序
pub struct RejectWriter {
    reject_file_path: String,
}

impl RejectWriter {
    /// 使用指定文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            reject_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.reject_file_path
    }

    /// 追加写入一份文档的丢弃记录
    pub fn write(&self, document: &str, rejects: &[RejectedSpan]) -> Result<()> {
        if rejects.is_empty() {
            return Ok(());
        }

        debug!(
            "写入丢弃记录: 文档 {} | {} 条 → {}",
            document,
            rejects.len(),
            self.reject_file_path
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.reject_file_path)
            .with_context(|| format!("无法打开 {}", self.reject_file_path))?;

        for reject in rejects {
            let line = format!(
                "文档 {} | 第 {} 页 | 题号 {} | {} | {}\n",
                document, reject.page, reject.question_no, reject.reason, reject.preview
            );
            file.write_all(line.as_bytes())?;
        }

        Ok(())
    }
}
