//! 版式判断服务 - 业务能力层
//!
//! 每份文档判断一次：单栏还是双栏、选项用哪种标记、有没有答案页

use crate::config::{ColumnPolicy, EngineConfig};
use crate::error::{AppError, AppResult};
use crate::models::{DocumentInput, PageInput};
use crate::services::token_reconstructor::{ColumnLayout, TokenReconstructor};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// 选项标记样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionStyle {
    /// `(a)`
    Parenthesized,
    /// `a)`
    RightParen,
    /// `a.`
    Dotted,
}

impl OptionStyle {
    /// 任意位置的选项标记，第 1 组为字母
    pub fn marker_pattern(self) -> &'static str {
        match self {
            OptionStyle::Parenthesized => r"\(\s*([a-dA-D])\s*\)",
            OptionStyle::RightParen => r"(?:^|[\s:;,])([a-dA-D])\)",
            OptionStyle::Dotted => r"(?:^|[\s:;,])([a-dA-D])\.\s",
        }
    }

    /// 编译好的任意位置标记
    pub fn marker_regex(self) -> &'static Regex {
        match self {
            OptionStyle::Parenthesized => &PAREN_MARKER,
            OptionStyle::RightParen => &RIGHT_PAREN_MARKER,
            OptionStyle::Dotted => &DOTTED_MARKER,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OptionStyle::Parenthesized => "(a) (b) (c) (d)",
            OptionStyle::RightParen => "a) b) c) d)",
            OptionStyle::Dotted => "a. b. c. d.",
        }
    }
}

static PAREN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(OptionStyle::Parenthesized.marker_pattern()).expect("valid regex"));
static RIGHT_PAREN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(OptionStyle::RightParen.marker_pattern()).expect("valid regex"));
static DOTTED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(OptionStyle::Dotted.marker_pattern()).expect("valid regex"));

/// 样式是按哪条规则得出的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleRule {
    Detected(OptionStyle),
    /// 都没有命中时的默认值
    Default,
}

/// 检测顺序即优先级
static STYLE_RULES: Lazy<Vec<(OptionStyle, Regex)>> = Lazy::new(|| {
    vec![
        (
            OptionStyle::Parenthesized,
            Regex::new(r"(?m)^[ \t]*\([a-dA-D]\)").expect("valid regex"),
        ),
        (
            OptionStyle::RightParen,
            Regex::new(r"(?m)^[ \t]*[a-dA-D]\)").expect("valid regex"),
        ),
        (
            OptionStyle::Dotted,
            Regex::new(r"(?m)^[ \t]*[a-dA-D]\.\s").expect("valid regex"),
        ),
    ]
});

/// 一份文档（或一页）的版式判断结果
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDecision {
    pub columns: ColumnLayout,
    pub option_style: OptionStyle,
    pub style_rule: StyleRule,
    pub has_answer_key: bool,
    /// 中线左侧（忽略带之外）的词元数
    pub left_tokens: usize,
    pub right_tokens: usize,
}

impl LayoutDecision {
    pub fn is_multi_column(&self) -> bool {
        matches!(self.columns, ColumnLayout::Double { .. })
    }
}

/// 版式判断服务
///
/// 职责：
/// - 根据中线两侧的词元数量判断分栏
/// - 按优先级检测选项样式
/// - 检测答案页标题
/// - 判断只做一次，不在处理中途修正
pub struct LayoutClassifier {
    column_policy: ColumnPolicy,
    dead_zone: f64,
    min_tokens_per_side: usize,
    answer_key_header: Regex,
    reconstructor: TokenReconstructor,
}

impl LayoutClassifier {
    /// 创建新的版式判断服务
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        let answer_key_header = Regex::new(&format!("(?i){}", config.answer_key_header))
            .map_err(|e| AppError::invalid_pattern("answer_key_header", e))?;

        Ok(Self {
            column_policy: config.column_policy,
            dead_zone: config.column_dead_zone,
            min_tokens_per_side: config.min_tokens_per_side,
            answer_key_header,
            reconstructor: TokenReconstructor::new(config.line_tolerance),
        })
    }

    /// 页面是否是答案页
    pub fn is_answer_key_page(&self, page: &PageInput) -> bool {
        self.answer_key_header.is_match(&page.text())
    }

    /// 判断分栏
    ///
    /// 两侧都必须超过最小词元数才算双栏；不明确时按单栏处理
    pub fn detect_columns(&self, page: &PageInput) -> (ColumnLayout, usize, usize) {
        let mid = page.page_width / 2.0;
        let left = page
            .tokens
            .iter()
            .filter(|t| t.x < mid - self.dead_zone)
            .count();
        let right = page
            .tokens
            .iter()
            .filter(|t| t.x > mid + self.dead_zone)
            .count();

        let layout = match self.column_policy {
            ColumnPolicy::ForceSingle => ColumnLayout::Single,
            ColumnPolicy::ForceDouble => ColumnLayout::Double { boundary: mid },
            ColumnPolicy::Detect => {
                if left > self.min_tokens_per_side && right > self.min_tokens_per_side {
                    ColumnLayout::Double { boundary: mid }
                } else {
                    ColumnLayout::Single
                }
            }
        };

        (layout, left, right)
    }

    /// 检测选项样式，按 `(a)` → `a)` → `a.` 的顺序取第一个命中的
    pub fn detect_option_style(&self, text: &str) -> (OptionStyle, StyleRule) {
        for (style, rule) in STYLE_RULES.iter() {
            if rule.is_match(text) {
                return (*style, StyleRule::Detected(*style));
            }
        }
        (OptionStyle::Parenthesized, StyleRule::Default)
    }

    /// 判断单页版式；`document_text` 用于答案页检测
    pub fn classify_page(&self, page: &PageInput, document_text: &str) -> LayoutDecision {
        let (columns, left_tokens, right_tokens) = self.detect_columns(page);

        // 没有文本层时按检测出的分栏重组词元，行首规则才有意义
        let sample_text = if page.full_text.trim().is_empty() {
            self.reconstructor
                .reconstruct(&page.tokens, columns.boundary())
                .join("\n")
        } else {
            page.full_text.clone()
        };
        let (option_style, style_rule) = self.detect_option_style(&sample_text);

        let decision = LayoutDecision {
            columns,
            option_style,
            style_rule,
            has_answer_key: self.answer_key_header.is_match(document_text),
            left_tokens,
            right_tokens,
        };

        debug!(
            "第 {} 页版式: {:?}, 左 {} / 右 {} 个词元",
            page.page_number, decision.columns, left_tokens, right_tokens
        );

        decision
    }

    /// 判断整份文档的版式（使用样本页）
    pub fn classify_document(&self, document: &DocumentInput, sample_page: usize) -> LayoutDecision {
        let document_text = document.full_text();
        let page = document
            .pages
            .get(sample_page)
            .or_else(|| document.pages.first());

        let decision = match page {
            Some(page) => self.classify_page(page, &document_text),
            None => LayoutDecision {
                columns: ColumnLayout::Single,
                option_style: OptionStyle::Parenthesized,
                style_rule: StyleRule::Default,
                has_answer_key: false,
                left_tokens: 0,
                right_tokens: 0,
            },
        };

        log_decision(&document.name, &decision);
        decision
    }
}

fn log_decision(name: &str, decision: &LayoutDecision) {
    info!("🔍 [{}] 版式检测结果", name);
    if decision.is_multi_column() {
        info!("   ✓ 双栏版式");
    } else {
        info!("   ✓ 单栏版式");
    }
    match decision.style_rule {
        StyleRule::Detected(style) => info!("   ✓ 选项样式: {}", style.label()),
        StyleRule::Default => info!("   ✓ 选项样式: {} (默认)", decision.option_style.label()),
    }
    if decision.has_answer_key {
        info!("   ✓ 发现答案页");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionedToken;

    fn page_with(left: usize, right: usize) -> PageInput {
        let mut tokens = Vec::new();
        for i in 0..left {
            tokens.push(PositionedToken::new("l", 40.0, i as f64 * 10.0));
        }
        for i in 0..right {
            tokens.push(PositionedToken::new("r", 500.0, i as f64 * 10.0));
        }
        // 落在忽略带内的词元不计数
        tokens.push(PositionedToken::new("mid", 300.0, 0.0));
        PageInput {
            page_number: 1,
            full_text: String::new(),
            tokens,
            page_width: 600.0,
            page_height: 800.0,
        }
    }

    fn classifier() -> LayoutClassifier {
        LayoutClassifier::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_sparse_page_is_single_column() {
        let (layout, left, right) = classifier().detect_columns(&page_with(5, 3));
        assert_eq!(layout, ColumnLayout::Single);
        assert_eq!((left, right), (5, 3));
    }

    #[test]
    fn test_dense_page_is_double_column() {
        let (layout, _, _) = classifier().detect_columns(&page_with(30, 25));
        assert_eq!(layout, ColumnLayout::Double { boundary: 300.0 });
    }

    #[test]
    fn test_one_sided_page_is_single_column() {
        let (layout, _, _) = classifier().detect_columns(&page_with(80, 2));
        assert_eq!(layout, ColumnLayout::Single);
    }

    #[test]
    fn test_forced_policies() {
        let config = EngineConfig {
            column_policy: ColumnPolicy::ForceDouble,
            ..EngineConfig::default()
        };
        let c = LayoutClassifier::new(&config).unwrap();
        assert!(matches!(
            c.detect_columns(&page_with(1, 1)).0,
            ColumnLayout::Double { .. }
        ));
    }

    #[test]
    fn test_option_style_priority() {
        let c = classifier();
        let (style, rule) = c.detect_option_style("1. Q\n(a) x\na) y");
        assert_eq!(style, OptionStyle::Parenthesized);
        assert_eq!(rule, StyleRule::Detected(OptionStyle::Parenthesized));

        let (style, _) = c.detect_option_style("1. Q\na) x\nb) y");
        assert_eq!(style, OptionStyle::RightParen);

        let (style, _) = c.detect_option_style("1. Q\na. x\nb. y");
        assert_eq!(style, OptionStyle::Dotted);

        let (style, rule) = c.detect_option_style("no options at all");
        assert_eq!(style, OptionStyle::Parenthesized);
        assert_eq!(rule, StyleRule::Default);
    }

    #[test]
    fn test_answer_key_header_is_case_insensitive() {
        let c = classifier();
        let mut page = page_with(0, 0);
        page.full_text = "Answer-Sheet\n1.(a) 2.(b)".to_string();
        assert!(c.is_answer_key_page(&page));
        page.full_text = "answer key".to_string();
        assert!(c.is_answer_key_page(&page));
        page.full_text = "1. What is the answer?".to_string();
        assert!(!c.is_answer_key_page(&page));
    }
}
