//! 文本清洗服务 - 业务能力层
//!
//! 只负责去掉选项和题干里夹带的噪声：出处标注、页脚、下一节的标题

use once_cell::sync::Lazy;
use regex::Regex;

/// 常见考试出处缩写
const EXAM_ACRONYMS: &str =
    r"UPPCL|UPRVUNL|YCT|SSC|CPO|PGT|TGT|TRE|DSSSB|EMRS|ARO|BPSC|UPSC|RRB|NTPC|IBPS|CGL|CHSL|MTS|KVS|NVS|RPSC|HPSC|MPPSC";

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// 行尾出处：大写缩写 + 日期，可带班次，如 `UPPCL Executive Assistant 23.11.2022, Shift-II`
static SOURCE_TAG_DATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\s*\b[A-Z]{2,}[A-Za-z\s.,\-:()]*?\d{1,2}[-./]\d{1,2}[-./]\d{2,4}(?:[,\s]*Shift[-\s]*[IVX]+)?[\s,.;]*$",
    )
    .expect("valid regex")
});

/// 行尾出处：已知考试缩写 + 年份，如 `BPSC TRE 2023`
static SOURCE_TAG_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\s*\b(?:\d+[a-z]*\s+)?(?:{})\b[A-Za-z\s.,\-:()]*?(?:19|20)\d{{2}}(?:[,\s]*Shift[-\s]*[IVX]+)?[\s,.;]*$",
        EXAM_ACRONYMS
    ))
    .expect("valid regex")
});

/// 单独的班次标注
static SHIFT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]*\bShift[-\s]*[IVX]+\b[\s,.;]*$").expect("valid regex"));

/// 页脚：`YCT 151 / 592`、`Page 3 of 10`
static PAGE_FOOTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:YCT\s+\d+\s*/\s*\d+|page\s+\d+\s+of\s+\d+)\b").expect("valid regex")
});

/// 后一节标题串入最后一个选项
static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:Self[-\s]*Practice|Classroom\s+Practice|Previous\s+Years?)\s+Questions\s*:.*$")
        .expect("valid regex")
});

/// 文本清洗服务
///
/// 职责：
/// - 合并空白
/// - 去掉行尾出处标注和班次
/// - 去掉页脚和串入的下一节标题
/// - 不判断文本是否有效（由选项抽取服务决定）
#[derive(Debug, Clone, Default)]
pub struct TextCleaner {
    strip_emphasis: bool,
}

impl TextCleaner {
    /// 创建新的清洗服务
    pub fn new(strip_emphasis: bool) -> Self {
        Self { strip_emphasis }
    }

    /// 去掉 Markdown 的加粗标记（整栏文字在分题之前调用）
    pub fn strip_markup(&self, text: &str) -> String {
        if self.strip_emphasis {
            EMPHASIS.replace_all(text, "").into_owned()
        } else {
            text.to_string()
        }
    }

    /// 合并空白为单个空格并去掉首尾空白
    pub fn normalize_whitespace(text: &str) -> String {
        WHITESPACE.replace_all(text.trim(), " ").into_owned()
    }

    /// 清洗一个选项或题干
    pub fn clean(&self, text: &str) -> String {
        let text = Self::normalize_whitespace(&self.strip_markup(text));
        let text = SECTION_HEADER.replace(&text, "");
        let text = PAGE_FOOTER.replace_all(&text, " ");
        let mut text = Self::normalize_whitespace(&text);

        // 出处标注可能叠在一起，反复剥离直到不再变化
        for _ in 0..4 {
            let stripped = strip_trailing_tags(&text);
            if stripped == text {
                break;
            }
            text = stripped;
        }

        text.trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .trim()
            .to_string()
    }
}

fn strip_trailing_tags(text: &str) -> String {
    let text = SOURCE_TAG_DATED.replace(text, "");
    let text = SOURCE_TAG_YEAR.replace(&text, "");
    let text = SHIFT_TAG.replace(&text, "");
    text.trim_end().to_string()
}
