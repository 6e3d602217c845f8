//! 词元重组服务 - 业务能力层
//!
//! 把一页上的定位词元按栏拆开，再按"先上后下、先左后右"拼成文字行

use crate::models::{ColumnStream, PageInput, PositionedToken};
use std::cmp::Ordering;
use tracing::debug;

/// 同一视觉行上的词元
#[derive(Debug, Clone)]
pub struct LogicalLine<'a> {
    /// 行参考高度（首个词元的 top）
    pub top: f64,
    pub tokens: Vec<&'a PositionedToken>,
}

impl LogicalLine<'_> {
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 一页的分栏方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnLayout {
    Single,
    /// 以 x 坐标为界，`x < boundary` 属于左栏
    Double { boundary: f64 },
}

impl ColumnLayout {
    pub fn boundary(self) -> Option<f64> {
        match self {
            ColumnLayout::Single => None,
            ColumnLayout::Double { boundary } => Some(boundary),
        }
    }
}

/// 词元重组服务
///
/// 职责：
/// - 按分界线把词元分成左右两栏
/// - 每栏按 (top, x0) 排序后按垂直距离分行
/// - 不关心题目结构
pub struct TokenReconstructor {
    line_tolerance: f64,
}

impl TokenReconstructor {
    /// 创建新的重组服务
    pub fn new(line_tolerance: f64) -> Self {
        Self { line_tolerance }
    }

    /// 重组一页的词元，每栏返回一段以换行分隔的文字
    ///
    /// 空栏返回空字符串而不是错误
    pub fn reconstruct(&self, tokens: &[PositionedToken], boundary: Option<f64>) -> Vec<String> {
        match boundary {
            None => vec![self.partition_text(tokens.iter().collect())],
            Some(boundary) => {
                let (left, right): (Vec<&PositionedToken>, Vec<&PositionedToken>) =
                    tokens.iter().partition(|t| t.x < boundary);
                vec![self.partition_text(left), self.partition_text(right)]
            }
        }
    }

    /// 把一组词元分行
    pub fn group_lines<'a>(&self, mut tokens: Vec<&'a PositionedToken>) -> Vec<LogicalLine<'a>> {
        tokens.sort_by(|a, b| match a.y.total_cmp(&b.y) {
            Ordering::Equal => a.x.total_cmp(&b.x),
            other => other,
        });

        let mut lines: Vec<LogicalLine<'a>> = Vec::new();
        for token in tokens {
            match lines.last_mut() {
                Some(line) if (token.y - line.top).abs() <= self.line_tolerance => {
                    line.tokens.push(token);
                }
                _ => lines.push(LogicalLine {
                    top: token.y,
                    tokens: vec![token],
                }),
            }
        }

        lines
    }

    fn partition_text(&self, tokens: Vec<&PositionedToken>) -> String {
        self.group_lines(tokens)
            .iter()
            .map(LogicalLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 生成一页的栏文字流，左栏在前
    ///
    /// 页面没有词元时退回到页面自带的文本层
    pub fn column_streams(&self, page: &PageInput, layout: ColumnLayout) -> Vec<ColumnStream> {
        if page.tokens.is_empty() {
            debug!("第 {} 页没有词元，使用页面文本", page.page_number);
            return vec![ColumnStream {
                page: page.page_number,
                column: 0,
                text: page.full_text.clone(),
            }];
        }

        self.reconstruct(&page.tokens, layout.boundary())
            .into_iter()
            .enumerate()
            .map(|(column, text)| ColumnStream {
                page: page.page_number,
                column,
                text,
            })
            .collect()
    }
}
