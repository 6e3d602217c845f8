//! 页面处理上下文
//!
//! 封装"我正在处理哪份文档的第几页、用什么版式"这一信息

use std::fmt::Display;

use crate::services::LayoutDecision;

/// 页面处理上下文
#[derive(Debug, Clone)]
pub struct PageCtx {
    /// 文档名
    pub document: String,

    /// 文档在本次批量中的序号（仅用于日志显示）
    pub document_index: usize,

    /// 页码（从 1 开始）
    pub page_number: u32,

    /// 本页使用的版式判断
    pub layout: LayoutDecision,
}

impl PageCtx {
    /// 创建新的页面上下文
    pub fn new(
        document: impl Into<String>,
        document_index: usize,
        page_number: u32,
        layout: LayoutDecision,
    ) -> Self {
        Self {
            document: document.into(),
            document_index,
            page_number,
            layout,
        }
    }
}

impl Display for PageCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文档#{} {} 第 {} 页]",
            self.document_index, self.document, self.page_number
        )
    }
}
