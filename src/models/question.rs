use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 选项字母
///
/// 排序即 A,B,C,D 的规范顺序，与解析顺序无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    /// 从字母解析（大小写均可）
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(OptionKey::A),
            'B' => Some(OptionKey::B),
            'C' => Some(OptionKey::C),
            'D' => Some(OptionKey::D),
            _ => None,
        }
    }

    /// 从字符串解析（只接受单个字母）
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            OptionKey::A => 'A',
            OptionKey::B => 'B',
            OptionKey::C => 'C',
            OptionKey::D => 'D',
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 正确答案
///
/// 答案页中的 `*` 表示该题作废或有争议，原样保留
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnswerMark {
    Key(OptionKey),
    Disputed,
}

impl AnswerMark {
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim() == "*" {
            return Some(AnswerMark::Disputed);
        }
        OptionKey::parse(s).map(AnswerMark::Key)
    }
}

impl fmt::Display for AnswerMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerMark::Key(k) => write!(f, "{}", k),
            AnswerMark::Disputed => write!(f, "*"),
        }
    }
}

impl TryFrom<String> for AnswerMark {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AnswerMark::parse(&value).ok_or_else(|| format!("非法答案标记: {}", value))
    }
}

impl From<AnswerMark> for String {
    fn from(mark: AnswerMark) -> Self {
        mark.to_string()
    }
}

/// 题号 → 答案，来自试卷末尾的答案页
pub type AnswerKeyMap = BTreeMap<u32, AnswerMark>;

/// 最终输出的一道选择题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqRecord {
    pub question_no: u32,
    pub question: String,
    pub options: BTreeMap<OptionKey, String>,
    #[serde(default)]
    pub answer: Option<AnswerMark>,
    pub page: u32,
}

impl McqRecord {
    /// 四个选项是否齐全
    pub fn has_full_options(&self) -> bool {
        self.options.len() == OptionKey::ALL.len()
    }
}

impl fmt::Display for McqRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 截断题干以便显示（最多80个字符）
        let preview = if self.question.chars().count() > 80 {
            self.question.chars().take(80).collect::<String>() + "..."
        } else {
            self.question.clone()
        };

        write!(f, "[第 {} 页] Q{}: {}", self.page, self.question_no, preview)?;
        match self.answer {
            Some(answer) => write!(f, " [答案: {}]", answer),
            None => write!(f, " [答案: 未知]"),
        }
    }
}

/// 题号标记的形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerForm {
    /// `12.` / `12)`
    Numeric,
    /// 带前缀，如 `Q.12`
    Prefixed,
}

/// 一个题号标记所覆盖的原始文本，尚未解析选项
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSpan {
    pub question_no: u32,
    pub raw_text: String,
    pub page: u32,
}

/// 一栏文字，按阅读顺序排列
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStream {
    pub page: u32,
    /// 0 = 左栏，1 = 右栏
    pub column: usize,
    pub text: String,
}

impl ColumnStream {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
