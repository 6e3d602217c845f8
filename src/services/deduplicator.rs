//! 去重服务 - 业务能力层
//!
//! 分栏边界附近的题目可能被抽取两次，按 (题号, 题干前缀) 合并

use crate::config::SortOrder;
use crate::models::McqRecord;
use std::collections::HashMap;
use tracing::debug;

/// 去重服务
///
/// 职责：
/// - 按题号和规范化后的题干前缀识别重复
/// - 保留选项最多的一条，并把其他副本上的答案补过来
/// - 按配置排序，结果可重复执行
pub struct Deduplicator {
    prefix_len: usize,
    sort_order: SortOrder,
}

impl Deduplicator {
    /// 创建新的去重服务
    pub fn new(prefix_len: usize, sort_order: SortOrder) -> Self {
        Self {
            prefix_len,
            sort_order,
        }
    }

    /// 去重键：题号 + 小写并合并空白后的前缀
    pub fn key(&self, record: &McqRecord) -> (u32, String) {
        let normalized = record
            .question
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let prefix: String = normalized.chars().take(self.prefix_len).collect();
        (record.question_no, prefix)
    }

    /// 去重并排序
    pub fn deduplicate(&self, records: Vec<McqRecord>) -> Vec<McqRecord> {
        let total = records.len();
        let mut index: HashMap<(u32, String), usize> = HashMap::new();
        let mut kept: Vec<McqRecord> = Vec::with_capacity(total);

        for record in records {
            let key = self.key(&record);
            match index.get(&key) {
                Some(&slot) => {
                    let existing = &mut kept[slot];
                    if record.options.len() > existing.options.len() {
                        let carried = existing.answer;
                        *existing = record;
                        if existing.answer.is_none() {
                            existing.answer = carried;
                        }
                    } else if existing.answer.is_none() {
                        existing.answer = record.answer;
                    }
                }
                None => {
                    index.insert(key, kept.len());
                    kept.push(record);
                }
            }
        }

        match self.sort_order {
            SortOrder::PageThenNumber => kept.sort_by_key(|r| (r.page, r.question_no)),
            SortOrder::NumberOnly => kept.sort_by_key(|r| r.question_no),
            SortOrder::Extraction => {}
        }

        if kept.len() < total {
            debug!("去重: {} → {} 道题", total, kept.len());
        }

        kept
    }
}
