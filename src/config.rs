use crate::error::{AppError, AppResult, ConfigError};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// 版式配置（取代原来五套几乎重复的解析脚本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutProfile {
    /// 自动检测分栏、选项样式和答案页
    #[default]
    Adaptive,
    /// 双栏真题汇编（YCT 一类），题干中常有 1. 2. 3. 小列表
    TwoColumn,
    /// `Q.1` 形式的题号，`(A)` 形式的选项，单栏
    Prefixed,
    /// Markdown 转换得到的文本，带 `**` 加粗标记
    Markdown,
    /// OCR 得到的单栏文本，噪声较多
    Ocr,
}

impl LayoutProfile {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "adaptive" => Some(LayoutProfile::Adaptive),
            "two_column" | "columns" => Some(LayoutProfile::TwoColumn),
            "prefixed" | "gate" => Some(LayoutProfile::Prefixed),
            "markdown" | "ml" => Some(LayoutProfile::Markdown),
            "ocr" => Some(LayoutProfile::Ocr),
            _ => None,
        }
    }
}

/// 分栏策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// 按词元分布检测
    Detect,
    ForceSingle,
    ForceDouble,
}

/// 最终输出的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// 先按页码，再按题号
    #[default]
    PageThenNumber,
    NumberOnly,
    /// 保持抽取顺序（左栏在右栏之前）
    Extraction,
}

/// 题号可接受范围（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl NumberRange {
    pub fn contains(&self, n: u32) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

impl Default for NumberRange {
    fn default() -> Self {
        Self { min: 1, max: 999 }
    }
}

/// 抽取引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub profile: LayoutProfile,
    pub column_policy: ColumnPolicy,
    /// 分栏检测时中线两侧的忽略带宽度
    pub column_dead_zone: f64,
    /// 判定为双栏时每侧至少需要的词元数
    pub min_tokens_per_side: usize,
    /// 同一行词元允许的垂直偏差
    pub line_tolerance: f64,
    pub question_no_range: NumberRange,
    /// 相对当前题号的最大跳跃，超过视为正文
    pub max_number_jump: Option<u32>,
    /// 题号前缀，如 `Q.`
    pub question_prefix: Option<String>,
    /// 是否优先匹配带前缀的题号
    pub prefer_prefixed: bool,
    pub small_list_merge: bool,
    /// 小列表合并阈值，题号不大于该值才会尝试合并
    pub small_list_threshold: u32,
    /// 小列表合并最多向前看的标记数
    pub merge_lookahead: usize,
    /// 选项文本最大长度（字符）
    pub max_option_len: usize,
    /// 题干最小长度（字符），必须严格大于
    pub min_question_len: usize,
    pub min_options: usize,
    /// 答案页标题（不区分大小写）
    pub answer_key_header: String,
    pub dedup_prefix_len: usize,
    pub sort_order: SortOrder,
    /// 去掉 Markdown 的 `*` 加粗标记
    pub strip_emphasis: bool,
    /// 每页单独判断版式
    pub classify_each_page: bool,
    /// 用于版式判断的样本页（从 0 开始）
    pub sample_page: usize,
    /// 处理的页码范围（从 1 开始，闭区间）
    pub first_page: Option<u32>,
    pub last_page: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_profile(LayoutProfile::Adaptive)
    }
}

impl EngineConfig {
    /// 按版式生成默认配置
    pub fn for_profile(profile: LayoutProfile) -> Self {
        let base = Self {
            profile,
            column_policy: ColumnPolicy::Detect,
            column_dead_zone: 50.0,
            min_tokens_per_side: 20,
            line_tolerance: 3.0,
            question_no_range: NumberRange::default(),
            max_number_jump: Some(100),
            question_prefix: Some("Q.".to_string()),
            prefer_prefixed: false,
            small_list_merge: true,
            small_list_threshold: 10,
            merge_lookahead: 5,
            max_option_len: 500,
            min_question_len: 10,
            min_options: 2,
            answer_key_header: r"ANSWER[-\s]*(?:SHEET|KEY)".to_string(),
            dedup_prefix_len: 30,
            sort_order: SortOrder::PageThenNumber,
            strip_emphasis: false,
            classify_each_page: false,
            sample_page: 0,
            first_page: None,
            last_page: None,
        };

        match profile {
            LayoutProfile::Adaptive => base,
            LayoutProfile::TwoColumn => Self {
                column_policy: ColumnPolicy::ForceDouble,
                min_question_len: 15,
                min_options: 3,
                ..base
            },
            LayoutProfile::Prefixed => Self {
                column_policy: ColumnPolicy::ForceSingle,
                prefer_prefixed: true,
                small_list_merge: false,
                dedup_prefix_len: 50,
                ..base
            },
            LayoutProfile::Markdown => Self {
                column_policy: ColumnPolicy::ForceSingle,
                line_tolerance: 5.0,
                strip_emphasis: true,
                min_question_len: 5,
                ..base
            },
            LayoutProfile::Ocr => Self {
                column_policy: ColumnPolicy::ForceSingle,
                line_tolerance: 5.0,
                min_options: 3,
                dedup_prefix_len: 50,
                ..base
            },
        }
    }

    /// 从 TOML 表构造：先取 `profile` 对应的默认值，再用表中显式给出的字段覆盖
    pub fn from_table(table: toml::Table) -> AppResult<Self> {
        let profile: LayoutProfile = match table.get("profile") {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e| AppError::parse_failed("engine.profile", e))?,
            None => LayoutProfile::default(),
        };

        let mut merged = match toml::Value::try_from(Self::for_profile(profile)) {
            Ok(toml::Value::Table(defaults)) => defaults,
            Ok(_) => toml::Table::new(),
            Err(e) => return Err(AppError::parse_failed("engine", e)),
        };
        for (key, value) in table {
            merged.insert(key, value);
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e| AppError::parse_failed("engine", e))
    }

    /// 页码是否在处理范围内
    pub fn includes_page(&self, page: u32) -> bool {
        self.first_page.map_or(true, |first| page >= first)
            && self.last_page.map_or(true, |last| page <= last)
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.question_no_range.min > self.question_no_range.max {
            return Err(invalid("question_no_range", "min 大于 max"));
        }
        if !(self.line_tolerance.is_finite() && self.line_tolerance >= 0.0) {
            return Err(invalid("line_tolerance", "必须是非负数"));
        }
        if !(self.column_dead_zone.is_finite() && self.column_dead_zone >= 0.0) {
            return Err(invalid("column_dead_zone", "必须是非负数"));
        }
        if self.min_options == 0 || self.min_options > 4 {
            return Err(invalid("min_options", "必须在 1 到 4 之间"));
        }
        if self.dedup_prefix_len == 0 {
            return Err(invalid("dedup_prefix_len", "必须大于 0"));
        }
        if let (Some(first), Some(last)) = (self.first_page, self.last_page) {
            if first > last {
                return Err(invalid("first_page", "起始页大于结束页"));
            }
        }
        regex::Regex::new(&self.answer_key_header)
            .map_err(|e| AppError::invalid_pattern("answer_key_header", e))?;
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的文档数量
    pub max_concurrent_documents: usize,
    /// 输入文档目录（JSON / TOML）
    pub input_folder: String,
    /// 输出目录
    pub output_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 被丢弃的题目写入该文件，为空则不写
    pub reject_log_file: Option<String>,
    #[serde(deserialize_with = "deserialize_engine")]
    pub engine: EngineConfig,
}

fn deserialize_engine<'de, D>(deserializer: D) -> Result<EngineConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let table = toml::Table::deserialize(deserializer)?;
    EngineConfig::from_table(table).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 4,
            input_folder: "input_pages".to_string(),
            output_folder: "output_json".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            reject_log_file: None,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载，缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        Self::load_toml(path, None)
    }

    /// `profile` 不为空时替换 `[engine]` 中的版式，其余显式字段保留
    fn load_toml(path: &Path, profile: Option<LayoutProfile>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let mut table: toml::Table = toml::from_str(&content)
            .map_err(|e| AppError::parse_failed(path.display().to_string(), e))?;

        if let Some(profile) = profile {
            let value = toml::Value::try_from(profile)
                .map_err(|e| AppError::parse_failed("LAYOUT_PROFILE", e))?;
            let engine = table
                .entry("engine")
                .or_insert(toml::Value::Table(toml::Table::new()));
            if let Some(engine) = engine.as_table_mut() {
                engine.insert("profile".to_string(), value);
            }
        }

        let config: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e| AppError::parse_failed(path.display().to_string(), e))?;
        config.engine.validate()?;
        Ok(config)
    }

    /// 读取环境变量；`MCQ_CONFIG` 指向的 TOML 文件作为基础
    ///
    /// `LAYOUT_PROFILE` 只替换版式，配置文件里显式写出的引擎字段仍然生效
    pub fn from_env() -> AppResult<Self> {
        let profile = match std::env::var("LAYOUT_PROFILE") {
            Ok(value) => Some(LayoutProfile::from_str(&value).ok_or_else(|| {
                AppError::Config(ConfigError::EnvVarParseFailed {
                    var_name: "LAYOUT_PROFILE".to_string(),
                    value: value.clone(),
                    expected_type: "LayoutProfile".to_string(),
                })
            })?),
            Err(_) => None,
        };

        let base = match (std::env::var("MCQ_CONFIG"), profile) {
            (Ok(path), _) => Self::load_toml(Path::new(&path), profile)?,
            (Err(_), Some(profile)) => Self {
                engine: EngineConfig::for_profile(profile),
                ..Self::default()
            },
            (Err(_), None) => Self::default(),
        };

        let config = Self {
            max_concurrent_documents: parse_env("MAX_CONCURRENT_DOCUMENTS")?
                .unwrap_or(base.max_concurrent_documents)
                .max(1),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(base.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(base.output_folder),
            verbose_logging: parse_env("VERBOSE_LOGGING")?.unwrap_or(base.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(base.output_log_file),
            reject_log_file: std::env::var("REJECT_LOG_FILE").ok().or(base.reject_log_file),
            engine: base.engine,
        };
        config.engine.validate()?;
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            })
        }),
        Err(_) => Ok(None),
    }
}
