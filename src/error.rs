use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文档不可用（引擎无法恢复）
    #[error("输入错误: {0}")]
    Ingestion(#[from] IngestionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入文档错误
///
/// 只有这一类错误会穿过引擎边界，解析阶段的异常都在本地丢弃
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 文档没有任何页面
    #[error("文档 {document} 没有任何页面")]
    EmptyDocument { document: String },
    /// 文档既没有文本也没有定位词元
    #[error("文档 {document} 没有可用的文本内容")]
    NoContent { document: String },
    /// 页码非法（页码从 1 开始）
    #[error("文档 {document} 含有非法页码 {page}")]
    InvalidPageNumber { document: String, page: u32 },
    /// 页面尺寸非法
    #[error("文档 {document} 第 {page} 页尺寸非法: {width}x{height}")]
    InvalidPageSize {
        document: String,
        page: u32,
        width: f64,
        height: f64,
    },
    /// 词元坐标非法
    #[error("文档 {document} 第 {page} 页词元 '{text}' 坐标非法")]
    InvalidToken {
        document: String,
        page: u32,
        text: String,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 输入文件解析失败
    #[error("解析文件失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 正则表达式非法
    #[error("配置项 {field} 的正则表达式非法: {source}")]
    InvalidPattern {
        field: String,
        source: regex::Error,
    },
    /// 取值不合理
    #[error("配置项 {field} 取值不合理: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::ParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::ParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件解析错误
    pub fn parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建正则配置错误
    pub fn invalid_pattern(field: impl Into<String>, source: regex::Error) -> Self {
        AppError::Config(ConfigError::InvalidPattern {
            field: field.into(),
            source,
        })
    }

    /// 是否为输入文档错误
    pub fn is_ingestion(&self) -> bool {
        matches!(self, AppError::Ingestion(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
