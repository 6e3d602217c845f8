//! 输入模型：文档、页面与定位词元
//!
//! 由外部的文档读取方（文本层 / OCR / Markdown 转换）生成，引擎只读

use crate::error::IngestionError;
use serde::{Deserialize, Serialize};

/// 页面上的一个词元（单词或一段文字）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    pub text: String,
    /// 左边界 x0
    pub x: f64,
    /// 上边界 top
    pub y: f64,
}

impl PositionedToken {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// 单页输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInput {
    /// 页码（从 1 开始）
    pub page_number: u32,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub tokens: Vec<PositionedToken>,
    pub page_width: f64,
    pub page_height: f64,
}

impl PageInput {
    /// 页面文字；没有文本层时用词元拼接
    pub fn text(&self) -> String {
        if self.full_text.trim().is_empty() {
            self.tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            self.full_text.clone()
        }
    }

    /// 页面是否没有任何内容
    pub fn is_blank(&self) -> bool {
        self.full_text.trim().is_empty() && self.tokens.is_empty()
    }

    /// 校验页面数据，非法数据属于输入方故障
    pub fn validate(&self, document: &str) -> Result<(), IngestionError> {
        if self.page_number == 0 {
            return Err(IngestionError::InvalidPageNumber {
                document: document.to_string(),
                page: self.page_number,
            });
        }

        let size_ok = self.page_width.is_finite()
            && self.page_height.is_finite()
            && self.page_width > 0.0
            && self.page_height >= 0.0;
        if !size_ok {
            return Err(IngestionError::InvalidPageSize {
                document: document.to_string(),
                page: self.page_number,
                width: self.page_width,
                height: self.page_height,
            });
        }

        if let Some(bad) = self
            .tokens
            .iter()
            .find(|t| !t.x.is_finite() || !t.y.is_finite())
        {
            return Err(IngestionError::InvalidToken {
                document: document.to_string(),
                page: self.page_number,
                text: bad.text.clone(),
            });
        }

        Ok(())
    }
}

/// 一份完整的试卷文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub name: String,
    pub pages: Vec<PageInput>,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, pages: Vec<PageInput>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// 整个文档的文本（用于答案页检测）
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(PageInput::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 校验整个文档
    pub fn validate(&self) -> Result<(), IngestionError> {
        if self.pages.is_empty() {
            return Err(IngestionError::EmptyDocument {
                document: self.name.clone(),
            });
        }

        for page in &self.pages {
            page.validate(&self.name)?;
        }

        if self.pages.iter().all(PageInput::is_blank) {
            return Err(IngestionError::NoContent {
                document: self.name.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(no: u32) -> PageInput {
        PageInput {
            page_number: no,
            full_text: "1. Question".to_string(),
            tokens: vec![PositionedToken::new("1.", 10.0, 10.0)],
            page_width: 600.0,
            page_height: 800.0,
        }
    }

    #[test]
    fn test_validate_ok() {
        let doc = DocumentInput::new("paper", vec![page(1), page(2)]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_document() {
        let doc = DocumentInput::new("paper", Vec::new());
        assert!(matches!(
            doc.validate(),
            Err(IngestionError::EmptyDocument { .. })
        ));
    }

    #[test]
    fn test_validate_page_zero() {
        let doc = DocumentInput::new("paper", vec![page(0)]);
        assert!(matches!(
            doc.validate(),
            Err(IngestionError::InvalidPageNumber { page: 0, .. })
        ));
    }

    #[test]
    fn test_validate_non_finite_token() {
        let mut p = page(1);
        p.tokens.push(PositionedToken::new("bad", f64::NAN, 3.0));
        let doc = DocumentInput::new("paper", vec![p]);
        assert!(matches!(
            doc.validate(),
            Err(IngestionError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_validate_blank_document() {
        let mut p = page(1);
        p.full_text.clear();
        p.tokens.clear();
        let doc = DocumentInput::new("paper", vec![p]);
        assert!(matches!(doc.validate(), Err(IngestionError::NoContent { .. })));
    }

    #[test]
    fn test_deserialize_defaults() {
        // full_text 与 tokens 可以省略
        let json = r#"{"page_number": 3, "page_width": 595.0, "page_height": 842.0}"#;
        let p: PageInput = serde_json::from_str(json).unwrap();
        assert_eq!(p.page_number, 3);
        assert!(p.tokens.is_empty());
        assert!(p.is_blank());
    }
}
