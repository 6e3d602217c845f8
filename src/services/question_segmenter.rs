//! 分题服务 - 业务能力层
//!
//! 按行首题号把一栏文字切成一段一段的题目，
//! 题干里的 `1. Cobra 2. Python` 一类小列表不能被当成新题

use crate::config::{EngineConfig, NumberRange};
use crate::error::{AppError, AppResult};
use crate::models::{ColumnStream, MarkerForm, QuestionSpan};
use crate::services::layout_classifier::OptionStyle;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static NUMERIC_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(\d{1,4})[.)]\s+").expect("valid regex"));

static ANSWER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ans(?:wer)?(?:\s*[.:\-)(\[]|\s+[a-d]\b)").expect("valid regex")
});

/// 一个候选题号标记
#[derive(Debug, Clone, Copy)]
struct Candidate {
    number: u32,
    /// 标记所在位置（行首）
    start: usize,
    /// 标记之后正文开始的位置
    content_start: usize,
}

/// 分题统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    pub candidates: usize,
    pub accepted: usize,
    /// 超出范围或跳跃过大的题号
    pub out_of_range: usize,
    /// 后面紧跟 `Ans` 的标记（解析里的编号）
    pub answer_lines: usize,
    /// 并入当前题的小列表编号
    pub merged_sub_items: usize,
    /// 跳跃过大但被重新作为起点的题号
    pub reanchored: usize,
}

impl std::ops::AddAssign for SegmentStats {
    fn add_assign(&mut self, other: Self) {
        self.candidates += other.candidates;
        self.accepted += other.accepted;
        self.out_of_range += other.out_of_range;
        self.answer_lines += other.answer_lines;
        self.merged_sub_items += other.merged_sub_items;
        self.reanchored += other.reanchored;
    }
}

/// 分题结果
#[derive(Debug, Clone, Default)]
pub struct SegmentOutcome {
    pub spans: Vec<QuestionSpan>,
    /// 实际命中的题号形式，没有任何候选时为 None
    pub marker: Option<MarkerForm>,
    pub stats: SegmentStats,
}

/// 分题服务
///
/// 职责：
/// - 找出行首的题号标记（数字形式或带前缀形式）
/// - 过滤不合理的题号、解析中的编号
/// - 把题干中的小列表并回当前题（有限向前看）
/// - 不解析选项内容
pub struct QuestionSegmenter {
    prefixed: Option<Regex>,
    prefer_prefixed: bool,
    range: NumberRange,
    max_number_jump: Option<u32>,
    small_list_merge: bool,
    small_list_threshold: u32,
    merge_lookahead: usize,
}

impl QuestionSegmenter {
    /// 创建新的分题服务
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        let prefixed = match config.question_prefix.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => {
                let pattern = format!(
                    r"(?m)^[ \t]*{}\s*(\d{{1,4}})[.):]?\s+",
                    regex::escape(prefix)
                );
                Some(
                    Regex::new(&pattern)
                        .map_err(|e| AppError::invalid_pattern("question_prefix", e))?,
                )
            }
            _ => None,
        };

        Ok(Self {
            prefixed,
            prefer_prefixed: config.prefer_prefixed,
            range: config.question_no_range,
            max_number_jump: config.max_number_jump,
            small_list_merge: config.small_list_merge,
            small_list_threshold: config.small_list_threshold,
            merge_lookahead: config.merge_lookahead.max(1),
        })
    }

    /// 按指定形式收集候选标记
    fn candidates(&self, text: &str, form: MarkerForm) -> Vec<Candidate> {
        let re = match form {
            MarkerForm::Numeric => &*NUMERIC_MARKER,
            MarkerForm::Prefixed => match &self.prefixed {
                Some(re) => re,
                None => return Vec::new(),
            },
        };

        re.captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let number = caps.get(1)?.as_str().parse().ok()?;
                Some(Candidate {
                    number,
                    start: whole.start(),
                    content_start: whole.end(),
                })
            })
            .collect()
    }

    /// 主形式没有候选时才使用备选形式
    fn find_candidates(&self, text: &str) -> (Option<MarkerForm>, Vec<Candidate>) {
        let order = if self.prefer_prefixed {
            [MarkerForm::Prefixed, MarkerForm::Numeric]
        } else {
            [MarkerForm::Numeric, MarkerForm::Prefixed]
        };

        for form in order {
            let found = self.candidates(text, form);
            if !found.is_empty() {
                return (Some(form), found);
            }
        }
        (None, Vec::new())
    }

    /// 切分一栏文字
    pub fn segment(&self, stream: &ColumnStream, style: OptionStyle) -> SegmentOutcome {
        let text = stream.text.as_str();
        let (marker, candidates) = self.find_candidates(text);
        let option_marker = style.marker_regex();

        let mut stats = SegmentStats {
            candidates: candidates.len(),
            ..Default::default()
        };

        let segment_end = |i: usize| {
            candidates
                .get(i + 1)
                .map(|c| c.start)
                .unwrap_or(text.len())
        };

        let mut accepted: Vec<Candidate> = Vec::new();
        let mut i = 0;

        while i < candidates.len() {
            let candidate = candidates[i];
            let running = accepted.last().map(|c| c.number);

            // (a) 题号范围
            if !self.range.contains(candidate.number) {
                stats.out_of_range += 1;
                i += 1;
                continue;
            }
            if let (Some(current), Some(jump)) = (running, self.max_number_jump) {
                if candidate.number > current.saturating_add(jump) {
                    if self.starts_new_run(text, &candidates, i, accepted.len(), option_marker) {
                        stats.reanchored += 1;
                    } else {
                        stats.out_of_range += 1;
                        i += 1;
                        continue;
                    }
                }
            }

            // (b) 解析中的编号
            let body = text[candidate.content_start..segment_end(i)].trim_start();
            if starts_with_answer(body) {
                stats.answer_lines += 1;
                i += 1;
                continue;
            }

            // (c) 题干中的小列表
            if let Some(current) = accepted.last() {
                if self.small_list_merge && candidate.number <= self.small_list_threshold {
                    let current_body = &text[current.content_start..candidate.start];
                    if !option_marker.is_match(current_body) {
                        if let Some(last) = self.merge_ahead(
                            text,
                            current.content_start,
                            &candidates,
                            i,
                            option_marker,
                        ) {
                            stats.merged_sub_items += last - i + 1;
                            i = last + 1;
                            continue;
                        }
                    }
                }
            }

            accepted.push(candidate);
            i += 1;
        }

        stats.accepted = accepted.len();

        let spans: Vec<QuestionSpan> = accepted
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let end = accepted.get(k + 1).map(|n| n.start).unwrap_or(text.len());
                QuestionSpan {
                    question_no: c.number,
                    raw_text: text[c.content_start..end].trim().to_string(),
                    page: stream.page,
                }
            })
            .collect();

        debug!(
            "第 {} 页第 {} 栏: {} 个候选, {} 道题, 并入小列表 {} 项",
            stream.page,
            stream.column,
            stats.candidates,
            spans.len(),
            stats.merged_sub_items
        );

        SegmentOutcome {
            spans,
            marker,
            stats,
        }
    }

    /// 跳跃过大的候选能否作为新的起点
    ///
    /// 栏首常是上一栏小列表的尾巴（如 `3. Squirrel`），此时第一个题号不可信：
    /// - 当前只接受了一个题号，且该候选自带选项，则重新起算
    /// - 下一个候选紧接着递增（不超过跳跃上限），也重新起算
    fn starts_new_run(
        &self,
        text: &str,
        candidates: &[Candidate],
        i: usize,
        accepted: usize,
        option_marker: &Regex,
    ) -> bool {
        let candidate = candidates[i];
        let end = candidates
            .get(i + 1)
            .map(|c| c.start)
            .unwrap_or(text.len());

        if accepted == 1 && option_marker.is_match(&text[candidate.content_start..end]) {
            return true;
        }

        let jump = self.max_number_jump.unwrap_or(u32::MAX);
        candidates.get(i + 1).map_or(false, |next| {
            next.number > candidate.number && next.number <= candidate.number.saturating_add(jump)
        })
    }

    /// 从第 `from` 个候选开始向前看，最多看 `merge_lookahead` 个
    ///
    /// 连续的小编号合并后出现选项标记时，返回最后一个被合并的候选下标
    fn merge_ahead(
        &self,
        text: &str,
        current_start: usize,
        candidates: &[Candidate],
        from: usize,
        option_marker: &Regex,
    ) -> Option<usize> {
        let limit = (from + self.merge_lookahead).min(candidates.len());

        for j in from..limit {
            if candidates[j].number > self.small_list_threshold {
                return None;
            }
            let end = candidates
                .get(j + 1)
                .map(|c| c.start)
                .unwrap_or(text.len());
            if option_marker.is_match(&text[current_start..end]) {
                return Some(j);
            }
        }

        None
    }
}

/// 正文是否是答案行：`Ans.` / `Ans:` / `Ans (b)` / `Answer: b`
///
/// `Answer the following` 或 `Ansel Adams` 这类题干不算
fn starts_with_answer(body: &str) -> bool {
    ANSWER_LINE.is_match(body)
}
