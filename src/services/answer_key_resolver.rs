//! 答案页解析服务 - 业务能力层

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::models::{AnswerKeyMap, AnswerMark, McqRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// `12.(c)`、`12. c`、`12.(*)`
static KEY_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,4})\s*\.\s*(?:\(\s*([a-dA-D*])\s*\)|([a-dA-D*])(?:[\s,;]|$))")
        .expect("valid regex")
});

/// 答案页解析服务
///
/// 职责：
/// - 从答案页标题之后的文字中读出 题号 → 答案
/// - 给没有行内答案的题目回填答案
pub struct AnswerKeyResolver {
    header: Regex,
}

impl AnswerKeyResolver {
    /// 创建新的答案页解析服务
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        let header = Regex::new(&format!("(?i){}", config.answer_key_header))
            .map_err(|e| AppError::invalid_pattern("answer_key_header", e))?;
        Ok(Self { header })
    }

    /// 解析答案页文字；没有标题时返回空表
    ///
    /// 同一题号出现多次时以第一次为准
    pub fn parse(&self, text: &str) -> AnswerKeyMap {
        let mut map = AnswerKeyMap::new();

        let Some(header) = self.header.find(text) else {
            return map;
        };

        for caps in KEY_ENTRY.captures_iter(&text[header.end()..]) {
            let Some(number) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
                continue;
            };
            let Some(mark) = caps
                .get(2)
                .or_else(|| caps.get(3))
                .and_then(|m| AnswerMark::parse(m.as_str()))
            else {
                continue;
            };
            map.entry(number).or_insert(mark);
        }

        debug!("答案页解析出 {} 条答案", map.len());
        map
    }

    /// 回填答案，返回回填的数量
    ///
    /// 已有行内答案的题目保持不变；回填的答案不检查是否在选项中
    pub fn resolve(records: &mut [McqRecord], key: &AnswerKeyMap) -> usize {
        if key.is_empty() {
            return 0;
        }

        let mut filled = 0;
        for record in records.iter_mut().filter(|r| r.answer.is_none()) {
            if let Some(mark) = key.get(&record.question_no) {
                record.answer = Some(*mark);
                filled += 1;
            }
        }

        info!("📝 从答案页回填 {} 个答案", filled);
        filled
    }
}
