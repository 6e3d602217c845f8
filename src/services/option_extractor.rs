//! 选项抽取服务 - 业务能力层
//!
//! 把一段题目文本拆成题干、A-D 选项和行内答案

use crate::config::EngineConfig;
use crate::models::{AnswerMark, McqRecord, OptionKey, QuestionSpan};
use crate::services::layout_classifier::OptionStyle;
use crate::services::text_cleaner::TextCleaner;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// `Ans. (d)`、`Answer: b`、`**Ans** (c)`
static INLINE_ANSWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s*])Ans(?:wer)?\s*[.:\-]*\s*(?:\(\s*([a-d])\s*\)|([a-d])\b)")
        .expect("valid regex")
});

/// 选项排布方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionLayout {
    /// 每个选项单独一行
    Vertical,
    /// 选项挤在同一行或两行里
    Inline,
    None,
}

/// 题目被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// 一个选项标记都没有
    NoOptions,
    TooFewOptions { found: usize, required: usize },
    QuestionTooShort { len: usize, min: usize },
}

impl DropReason {
    /// 统计用的分类名
    pub fn kind(&self) -> &'static str {
        match self {
            DropReason::NoOptions => "no_options",
            DropReason::TooFewOptions { .. } => "too_few_options",
            DropReason::QuestionTooShort { .. } => "question_too_short",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NoOptions => write!(f, "没有选项"),
            DropReason::TooFewOptions { found, required } => {
                write!(f, "选项不足: {} 个, 至少需要 {} 个", found, required)
            }
            DropReason::QuestionTooShort { len, min } => {
                write!(f, "题干过短: {} 个字符, 需要超过 {} 个", len, min)
            }
        }
    }
}

/// 文本中的一个选项标记
#[derive(Debug, Clone, Copy)]
struct OptionMarker {
    key: OptionKey,
    /// 标记本身的起点（不含前导空白）
    start: usize,
    /// 标记之后选项正文的起点
    end: usize,
    at_line_start: bool,
}

/// 选项抽取服务
///
/// 职责：
/// - 识别并截掉行内答案
/// - 判断选项是竖排还是横排
/// - 抽取并清洗选项和题干
/// - 按阈值校验，不合格的给出丢弃原因
pub struct OptionExtractor {
    cleaner: TextCleaner,
    max_option_len: usize,
    min_question_len: usize,
    min_options: usize,
}

impl OptionExtractor {
    /// 创建新的选项抽取服务
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            cleaner: TextCleaner::new(config.strip_emphasis),
            max_option_len: config.max_option_len,
            min_question_len: config.min_question_len,
            min_options: config.min_options,
        }
    }

    /// 找出行内答案，返回 (答案, 截断位置)
    pub fn find_inline_answer(text: &str) -> Option<(OptionKey, usize)> {
        let caps = INLINE_ANSWER.captures(text)?;
        let letter = caps.get(1).or_else(|| caps.get(2))?;
        let key = letter.as_str().chars().next().and_then(OptionKey::from_char)?;
        let start = caps.get(0)?.start();
        Some((key, start))
    }

    fn find_markers(text: &str, style: OptionStyle) -> Vec<OptionMarker> {
        style
            .marker_regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let letter = caps.get(1)?;
                let key = letter.as_str().chars().next().and_then(OptionKey::from_char)?;
                // `(a)` 以括号开头，其他样式以字母开头
                let start = match style {
                    OptionStyle::Parenthesized => whole.start(),
                    OptionStyle::RightParen | OptionStyle::Dotted => letter.start(),
                };
                Some(OptionMarker {
                    key,
                    start,
                    end: whole.end(),
                    at_line_start: is_line_start(text, start),
                })
            })
            .collect()
    }

    /// 判断选项排布
    ///
    /// 行首标记至少 2 个且不少于行内标记的两倍时按竖排处理
    pub fn detect_layout(text: &str, style: OptionStyle) -> OptionLayout {
        let markers = Self::find_markers(text, style);
        Self::choose_layout(&markers)
    }

    fn choose_layout(markers: &[OptionMarker]) -> OptionLayout {
        let vertical = markers.iter().filter(|m| m.at_line_start).count();
        let inline = markers.len() - vertical;

        if vertical >= 2 && vertical >= 2 * inline {
            OptionLayout::Vertical
        } else if !markers.is_empty() {
            OptionLayout::Inline
        } else {
            OptionLayout::None
        }
    }

    /// 抽取一道题
    pub fn extract(&self, span: &QuestionSpan, style: OptionStyle) -> Result<McqRecord, DropReason> {
        let mut text: &str = &span.raw_text;

        let mut answer = None;
        if let Some((key, cut)) = Self::find_inline_answer(text) {
            answer = Some(key);
            text = &text[..cut];
        }

        let markers = Self::find_markers(text, style);
        let layout = Self::choose_layout(&markers);
        let chosen: Vec<OptionMarker> = match layout {
            OptionLayout::Vertical => markers.into_iter().filter(|m| m.at_line_start).collect(),
            OptionLayout::Inline => markers,
            OptionLayout::None => return Err(DropReason::NoOptions),
        };

        let mut options: BTreeMap<OptionKey, String> = BTreeMap::new();
        for (i, marker) in chosen.iter().enumerate() {
            let end = chosen.get(i + 1).map(|m| m.start).unwrap_or(text.len());
            if options.contains_key(&marker.key) || marker.end > end {
                continue;
            }
            let option = self.cleaner.clean(&text[marker.end..end]);
            let len = option.chars().count();
            if len == 0 || len > self.max_option_len {
                continue;
            }
            options.insert(marker.key, option);
        }

        let question = chosen
            .first()
            .map(|m| self.cleaner.clean(&text[..m.start]))
            .unwrap_or_default();

        let question_len = question.chars().count();
        if question_len <= self.min_question_len {
            return Err(DropReason::QuestionTooShort {
                len: question_len,
                min: self.min_question_len,
            });
        }
        if options.len() < self.min_options {
            return Err(DropReason::TooFewOptions {
                found: options.len(),
                required: self.min_options,
            });
        }

        // 行内答案必须是已有的选项
        let answer = answer
            .filter(|key| options.contains_key(key))
            .map(AnswerMark::Key);

        Ok(McqRecord {
            question_no: span.question_no,
            question,
            options,
            answer,
            page: span.page,
        })
    }
}

/// 位置之前到行首只有空格或制表符
fn is_line_start(text: &str, pos: usize) -> bool {
    let before = text[..pos].trim_end_matches([' ', '\t']);
    before.is_empty() || before.ends_with('\n')
}
