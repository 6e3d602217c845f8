//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文档的处理和结果输出。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、校验配置、创建输出目录
//! 2. **批量加载**：扫描并加载所有待处理的文档（`Vec<DocumentInput>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量，引擎在阻塞线程池中运行
//! 4. **分批处理**：将文档分批次处理，每批完成后再开始下一批
//! 5. **结果输出**：每份文档写出 `<name>_mcqs.json`，丢弃记录写入 reject 日志
//! 6. **全局统计**：汇总所有文档的处理结果

use crate::config::Config;
use crate::models::DocumentInput;
use crate::orchestrator::document_processor::{DocumentProcessor, DocumentReport};
use crate::services::RejectWriter;
use crate::utils::logging;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    processor: Arc<DocumentProcessor>,
    reject_writer: Option<RejectWriter>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file, &config.engine)?;

        logging::log_startup(config.max_concurrent_documents, &config.engine);

        let processor = DocumentProcessor::new(&config.engine).context("引擎配置无效")?;

        tokio::fs::create_dir_all(&config.output_folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", config.output_folder))?;

        let reject_writer = config
            .reject_log_file
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(|path| RejectWriter::with_path(path));

        Ok(Self {
            config,
            processor: Arc::new(processor),
            reject_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        // 加载所有待处理的文档
        let all_documents = self.load_documents().await?;

        if all_documents.is_empty() {
            warn!("⚠️ 没有找到待处理的文档，程序结束");
            return Ok(ProcessingStats::default());
        }

        let total_documents = all_documents.len();
        logging::log_documents_loaded(total_documents, self.batch_size());

        // 处理所有文档
        let stats = self.process_all_documents(all_documents).await?;

        // 输出最终统计
        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            stats.records,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    fn batch_size(&self) -> usize {
        self.config.max_concurrent_documents.max(1)
    }

    /// 加载文档
    async fn load_documents(&self) -> Result<Vec<DocumentInput>> {
        info!("\n📁 正在扫描待处理的文档...");
        crate::models::load_all_documents(&self.config.input_folder).await
    }

    /// 处理所有文档
    async fn process_all_documents(&self, all_documents: Vec<DocumentInput>) -> Result<ProcessingStats> {
        let batch_size = self.batch_size();
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_documents = all_documents.len();
        let total_batches = total_documents.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total: total_documents,
            ..Default::default()
        };

        // 分批处理
        for (batch_index, batch_documents) in all_documents.chunks(batch_size).enumerate() {
            let batch_start = batch_index * batch_size;
            let batch_num = batch_index + 1;

            let names: Vec<&str> = batch_documents.iter().map(|d| d.name.as_str()).collect();
            logging::log_batch_start(batch_num, total_batches, &names);

            // 处理本批
            let batch_result = self
                .process_batch(batch_documents, batch_start, semaphore.clone())
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;
            stats.records += batch_result.records;

            logging::log_batch_complete(
                batch_num,
                batch_result.success,
                batch_result.success + batch_result.failed,
                batch_result.records,
            );
        }

        Ok(stats)
    }

    /// 处理单个批次
    ///
    /// 结果按输入顺序汇报
    async fn process_batch(
        &self,
        batch_documents: &[DocumentInput],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut batch_handles = Vec::new();

        // 为本批创建并发任务
        for (idx, document) in batch_documents.iter().enumerate() {
            let document_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let processor = Arc::clone(&self.processor);
            let document = document.clone();

            // 引擎是同步的 CPU 计算，放到阻塞线程池
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                processor.process(&document, document_index)
            });
            batch_handles.push(handle);
        }

        // 等待本批所有任务完成
        let outcomes = join_all(batch_handles).await;
        let mut result = BatchResult::default();

        for (idx, outcome) in outcomes.into_iter().enumerate() {
            let document_index = batch_start + idx + 1;
            let name = &batch_documents[idx].name;

            match outcome {
                Ok(Ok(report)) => match self.write_report(&report).await {
                    Ok(path) => {
                        info!(
                            "[文档 {}] 💾 已写出 {} 道题 → {}",
                            document_index,
                            report.records.len(),
                            path.display()
                        );
                        result.success += 1;
                        result.records += report.records.len();
                    }
                    Err(e) => {
                        error!("[文档 {}] ❌ 写出结果失败: {:#}", document_index, e);
                        result.failed += 1;
                    }
                },
                Ok(Err(e)) => {
                    error!("[文档 {}] ❌ {} 处理失败: {}", document_index, name, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[文档 {}] 任务执行失败: {}", document_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }

    /// 写出一份文档的结果
    async fn write_report(&self, report: &DocumentReport) -> Result<PathBuf> {
        let path = output_path(&self.config.output_folder, &report.name);
        let json = serde_json::to_string_pretty(&report.records)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("无法写入文件: {}", path.display()))?;

        if let Some(writer) = &self.reject_writer {
            if let Err(e) = writer.write(&report.name, &report.rejects) {
                warn!("⚠️ 写入丢弃记录失败 ({}): {:#}", writer.path(), e);
            }
        }

        self.append_summary(report).await?;
        Ok(path)
    }

    /// 在日志文件中追加一行文档摘要
    async fn append_summary(&self, report: &DocumentReport) -> Result<()> {
        let stats = &report.stats;
        let line = format!(
            "{} | 题目 {} | 四个选项 {} | 有答案 {} | 丢弃 {} | 答案页回填 {}\n",
            report.name,
            stats.extracted,
            stats.with_four_options,
            stats.with_answers,
            stats.dropped_total(),
            stats.answers_resolved
        );

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.output_log_file)
            .await
            .with_context(|| format!("无法打开日志文件: {}", self.config.output_log_file))?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

/// 输出文件路径：`<output>/<name>_mcqs.json`
pub fn output_path(output_folder: &str, name: &str) -> PathBuf {
    Path::new(output_folder).join(format!("{}_mcqs.json", name))
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// 写出的题目总数
    pub records: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
    records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let path = output_path("out", "ssc_2023");
        assert_eq!(path, Path::new("out").join("ssc_2023_mcqs.json"));
    }
}
