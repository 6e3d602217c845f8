//! 页面处理流程 - 流程层
//!
//! 核心职责：定义"一页"的完整处理流程
//!
//! 流程顺序：
//! 1. 词元重组 → 按栏生成文字流（左栏在前）
//! 2. 每栏分题
//! 3. 每题抽取选项和答案，不合格的记入丢弃列表

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::AppResult;
use crate::models::{McqRecord, PageInput};
use crate::services::{
    DropReason, OptionExtractor, QuestionSegmenter, SegmentStats, TextCleaner, TokenReconstructor,
};
use crate::utils::logging::preview_text;
use crate::workflow::page_ctx::PageCtx;

/// 被丢弃的一段题目
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedSpan {
    pub page: u32,
    pub question_no: u32,
    pub reason: DropReason,
    /// 原文预览（截断）
    pub preview: String,
}

/// 一页的处理结果
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    /// 按栏顺序排列的题目
    pub records: Vec<McqRecord>,
    pub rejects: Vec<RejectedSpan>,
    /// 分出的题目段数
    pub spans: usize,
    pub segment: SegmentStats,
}

/// 页面处理流程
///
/// - 编排一页的重组、分题、抽取
/// - 不判断版式（由文档处理器决定后传入）
/// - 不做去重和答案页回填
pub struct PageFlow {
    reconstructor: TokenReconstructor,
    segmenter: QuestionSegmenter,
    extractor: OptionExtractor,
    cleaner: TextCleaner,
}

impl PageFlow {
    /// 创建新的页面处理流程
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        Ok(Self {
            reconstructor: TokenReconstructor::new(config.line_tolerance),
            segmenter: QuestionSegmenter::new(config)?,
            extractor: OptionExtractor::new(config),
            cleaner: TextCleaner::new(config.strip_emphasis),
        })
    }

    pub fn run(&self, page: &PageInput, ctx: &PageCtx) -> PageOutcome {
        let mut outcome = PageOutcome::default();
        let style = ctx.layout.option_style;

        for mut stream in self.reconstructor.column_streams(page, ctx.layout.columns) {
            if stream.is_empty() {
                continue;
            }
            stream.text = self.cleaner.strip_markup(&stream.text);

            let segmented = self.segmenter.segment(&stream, style);
            outcome.segment += segmented.stats;
            outcome.spans += segmented.spans.len();
            if let Some(marker) = segmented.marker {
                debug!("{} 第 {} 栏题号形式: {:?}", ctx, stream.column, marker);
            }
            if segmented.stats.reanchored > 0 {
                debug!(
                    "{} 第 {} 栏题号重新起算 {} 次",
                    ctx, stream.column, segmented.stats.reanchored
                );
            }

            for span in &segmented.spans {
                match self.extractor.extract(span, style) {
                    Ok(record) => outcome.records.push(record),
                    Err(reason) => {
                        debug!("{} 题 {} 被丢弃: {}", ctx, span.question_no, reason);
                        outcome.rejects.push(RejectedSpan {
                            page: span.page,
                            question_no: span.question_no,
                            reason,
                            preview: preview_text(&span.raw_text, 80),
                        });
                    }
                }
            }
        }

        if outcome.spans > 0 && outcome.records.is_empty() {
            warn!("{} ⚠️ 分出 {} 段但没有有效题目", ctx, outcome.spans);
        } else {
            debug!(
                "{} ✓ {} 道题, 丢弃 {} 段",
                ctx,
                outcome.records.len(),
                outcome.rejects.len()
            );
        }

        outcome
    }
}
