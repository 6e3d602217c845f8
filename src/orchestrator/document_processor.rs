//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个文档的所有页面，是文档级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **输入校验**：文档为空、页码非法、坐标非法时直接返回错误
//! 2. **版式判断**：每份文档判断一次（或按配置每页判断）
//! 3. **页面调度**：答案页单独收集，其余页面交给 `PageFlow`
//! 4. **答案回填**：解析答案页并回填缺失的答案
//! 5. **去重排序**：合并分栏边界上的重复题目
//! 6. **统计输出**：记录抽取/丢弃/回填数量，打印样例
//!
//! 引擎本身是同步的，不持有任何跨文档的状态

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::AppResult;
use crate::models::{AnswerKeyMap, DocumentInput, McqRecord, PageInput};
use crate::services::{
    AnswerKeyResolver, Deduplicator, LayoutClassifier, LayoutDecision, SegmentStats,
    TokenReconstructor,
};
use crate::utils::logging::preview_text;
use crate::workflow::{PageCtx, PageFlow, RejectedSpan};

/// 日志中展示的样例题目数量
const SAMPLE_PREVIEW_COUNT: usize = 3;

/// 文档处理统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub pages_total: usize,
    pub pages_processed: usize,
    /// 空白页
    pub pages_blank: usize,
    /// 不在页码范围内
    pub pages_out_of_range: usize,
    pub answer_key_pages: usize,
    /// 分出的题目段数
    pub spans: usize,
    /// 去重后的题目数
    pub extracted: usize,
    pub with_four_options: usize,
    pub with_answers: usize,
    /// 按原因统计的丢弃数量
    pub dropped: BTreeMap<&'static str, usize>,
    pub answer_key_entries: usize,
    pub answers_resolved: usize,
    pub duplicates_removed: usize,
    pub segment: SegmentStats,
}

impl ExtractionStats {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// 单个文档的处理结果
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub name: String,
    pub records: Vec<McqRecord>,
    pub rejects: Vec<RejectedSpan>,
    pub answer_key: AnswerKeyMap,
    /// 文档级的版式判断
    pub layout: LayoutDecision,
    pub stats: ExtractionStats,
}

/// 单个文档处理器
pub struct DocumentProcessor {
    config: EngineConfig,
    classifier: LayoutClassifier,
    reconstructor: TokenReconstructor,
    page_flow: PageFlow,
    resolver: AnswerKeyResolver,
    deduplicator: Deduplicator,
}

impl DocumentProcessor {
    /// 创建处理器，配置非法时返回错误
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            config: config.clone(),
            classifier: LayoutClassifier::new(config)?,
            reconstructor: TokenReconstructor::new(config.line_tolerance),
            page_flow: PageFlow::new(config)?,
            resolver: AnswerKeyResolver::new(config)?,
            deduplicator: Deduplicator::new(config.dedup_prefix_len, config.sort_order),
        })
    }

    /// 只返回题目列表
    pub fn extract(&self, document: &DocumentInput) -> AppResult<Vec<McqRecord>> {
        Ok(self.process(document, 0)?.records)
    }

    /// 处理一份文档
    ///
    /// # 参数
    /// - `document`: 文档数据
    /// - `document_index`: 文档序号（用于日志）
    pub fn process(&self, document: &DocumentInput, document_index: usize) -> AppResult<DocumentReport> {
        document.validate()?;

        log_document_start(document_index, document);

        let layout = self
            .classifier
            .classify_document(document, self.config.sample_page);
        let document_text = if self.config.classify_each_page {
            document.full_text()
        } else {
            String::new()
        };

        let mut stats = ExtractionStats {
            pages_total: document.pages.len(),
            ..Default::default()
        };
        let mut records = Vec::new();
        let mut rejects = Vec::new();
        let mut answer_text = String::new();

        for page in &document.pages {
            if page.is_blank() {
                stats.pages_blank += 1;
                continue;
            }

            // 答案页不受页码范围限制
            if self.classifier.is_answer_key_page(page) {
                debug!("[文档 {}] 第 {} 页是答案页", document_index, page.page_number);
                stats.answer_key_pages += 1;
                answer_text.push_str(&self.page_text(page));
                answer_text.push('\n');
                continue;
            }

            if !self.config.includes_page(page.page_number) {
                stats.pages_out_of_range += 1;
                continue;
            }

            let page_layout = if self.config.classify_each_page {
                self.classifier.classify_page(page, &document_text)
            } else {
                layout.clone()
            };
            let ctx = PageCtx::new(&document.name, document_index, page.page_number, page_layout);

            let outcome = self.page_flow.run(page, &ctx);
            stats.pages_processed += 1;
            stats.spans += outcome.spans;
            stats.segment += outcome.segment;
            for reject in &outcome.rejects {
                *stats.dropped.entry(reject.reason.kind()).or_insert(0) += 1;
            }
            records.extend(outcome.records);
            rejects.extend(outcome.rejects);
        }

        let answer_key = self.resolver.parse(&answer_text);
        stats.answer_key_entries = answer_key.len();
        stats.answers_resolved = AnswerKeyResolver::resolve(&mut records, &answer_key);

        let before = records.len();
        let records = self.deduplicator.deduplicate(records);
        stats.duplicates_removed = before - records.len();

        stats.extracted = records.len();
        stats.with_four_options = records.iter().filter(|r| r.has_full_options()).count();
        stats.with_answers = records.iter().filter(|r| r.answer.is_some()).count();

        log_document_complete(document_index, &document.name, &stats);
        log_sample_preview(document_index, &records);

        Ok(DocumentReport {
            name: document.name.clone(),
            records,
            rejects,
            answer_key,
            layout,
            stats,
        })
    }

    /// 答案页文字；没有文本层时按单栏重组词元
    fn page_text(&self, page: &PageInput) -> String {
        if page.full_text.trim().is_empty() {
            self.reconstructor.reconstruct(&page.tokens, None).join("\n")
        } else {
            page.full_text.clone()
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_document_start(document_index: usize, document: &DocumentInput) {
    info!("[文档 {}] 开始处理", document_index);
    info!("[文档 {}] 名称: {}", document_index, document.name);
    info!("[文档 {}] 页数: {}", document_index, document.pages.len());
}

fn log_document_complete(document_index: usize, name: &str, stats: &ExtractionStats) {
    info!(
        "[文档 {}] 题目统计: 抽取 {}, 四个选项 {}, 有答案 {}, 丢弃 {}",
        document_index,
        stats.extracted,
        stats.with_four_options,
        stats.with_answers,
        stats.dropped_total()
    );
    for (reason, count) in &stats.dropped {
        debug!("[文档 {}]   丢弃原因 {}: {}", document_index, reason, count);
    }
    if stats.answer_key_pages > 0 {
        info!(
            "[文档 {}] 答案页 {} 页, {} 条答案, 回填 {} 题",
            document_index, stats.answer_key_pages, stats.answer_key_entries, stats.answers_resolved
        );
    }
    if stats.extracted == 0 {
        warn!("[文档 {}] ⚠️ {} 没有抽取到任何题目", document_index, name);
    }
    info!("[文档 {}] ✅ 文档处理完成", document_index);
}

fn log_sample_preview(document_index: usize, records: &[McqRecord]) {
    for record in records.iter().take(SAMPLE_PREVIEW_COUNT) {
        info!("[文档 {}]   {}", document_index, record);
        for (key, text) in &record.options {
            debug!("[文档 {}]     ({}) {}", document_index, key, preview_text(text, 60));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, IngestionError};
    use crate::models::{AnswerMark, OptionKey};

    fn text_page(no: u32, text: &str) -> PageInput {
        PageInput {
            page_number: no,
            full_text: text.to_string(),
            tokens: Vec::new(),
            page_width: 600.0,
            page_height: 800.0,
        }
    }

    #[test]
    fn test_answer_key_page_is_excluded_and_resolved() {
        let document = DocumentInput::new(
            "paper",
            vec![
                text_page(
                    1,
                    "1. Which planet is known as the red planet?\n(a) Mars (b) Venus\n(c) Jupiter (d) Saturn\n2. Which is the largest ocean on earth?\n(a) Pacific (b) Atlantic\n(c) Indian (d) Arctic\nAns. (a)",
                ),
                text_page(2, "ANSWER KEY\n1.(a) 2.(c) 3.(b)"),
            ],
        );
        let processor = DocumentProcessor::new(&EngineConfig::default()).unwrap();
        let report = processor.process(&document, 1).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.stats.answer_key_pages, 1);
        assert_eq!(report.stats.answer_key_entries, 3);
        // 行内答案优先于答案页
        assert_eq!(report.records[1].answer, Some(AnswerMark::Key(OptionKey::A)));
        assert_eq!(report.records[0].answer, Some(AnswerMark::Key(OptionKey::A)));
        assert_eq!(report.stats.answers_resolved, 1);
        assert!(report.layout.has_answer_key);
    }

    #[test]
    fn test_page_range_is_honoured() {
        let document = DocumentInput::new(
            "paper",
            vec![
                text_page(1, "1. First page question text\n(a) x (b) y"),
                text_page(2, "2. Second page question text\n(a) x (b) y"),
            ],
        );
        let config = EngineConfig {
            first_page: Some(2),
            ..EngineConfig::default()
        };
        let report = DocumentProcessor::new(&config)
            .unwrap()
            .process(&document, 1)
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].page, 2);
        assert_eq!(report.stats.pages_out_of_range, 1);
    }

    #[test]
    fn test_drop_counts_by_reason() {
        let document = DocumentInput::new(
            "paper",
            vec![text_page(
                1,
                "1. Only one option in this question\n(a) alone\n2. Short\n(a) x (b) y\n3. No options for this one at all",
            )],
        );
        let report = DocumentProcessor::new(&EngineConfig::default())
            .unwrap()
            .process(&document, 1)
            .unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.stats.dropped_total(), 3);
        assert_eq!(report.stats.dropped["too_few_options"], 1);
        assert_eq!(report.stats.dropped["question_too_short"], 1);
        assert_eq!(report.stats.dropped["no_options"], 1);
        assert_eq!(report.rejects.len(), 3);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        let processor = DocumentProcessor::new(&EngineConfig::default()).unwrap();
        let err = processor
            .process(&DocumentInput::new("empty", Vec::new()), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Ingestion(IngestionError::EmptyDocument { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            min_options: 0,
            ..EngineConfig::default()
        };
        assert!(DocumentProcessor::new(&config).is_err());
    }
}
