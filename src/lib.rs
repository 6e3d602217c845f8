//! # MCQ Extractor
//!
//! 从试卷页面（文本层 / 定位词元）中抽取选择题的 Rust 程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 输入文档、页面、词元以及输出的 `McqRecord`
//! - `models/loaders` - 从 JSON / TOML 文件加载文档
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只做一件事
//! - `TokenReconstructor` - 词元按栏重组成文字行
//! - `LayoutClassifier` - 分栏、选项样式、答案页检测
//! - `QuestionSegmenter` - 按题号分题
//! - `OptionExtractor` / `TextCleaner` - 抽取并清洗选项、题干、行内答案
//! - `AnswerKeyResolver` - 解析答案页并回填
//! - `Deduplicator` - 去重排序
//! - `RejectWriter` - 写丢弃记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一页"的完整处理流程
//! - `PageCtx` - 上下文封装（文档 + 页码 + 版式）
//! - `PageFlow` - 流程编排（重组 → 分题 → 抽取）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/document_processor` - 单个文档处理器（抽取引擎）
//! - `orchestrator/batch_processor` - 批量文档处理器，管理并发和输出
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, EngineConfig, LayoutProfile, SortOrder};
pub use error::{AppError, AppResult};
pub use models::{
    AnswerKeyMap, AnswerMark, DocumentInput, McqRecord, OptionKey, PageInput, PositionedToken,
};
pub use orchestrator::{App, DocumentProcessor, DocumentReport, ExtractionStats};
pub use workflow::{PageCtx, PageFlow};

/// 用给定配置抽取一份文档中的全部选择题
pub fn extract_mcqs(document: &DocumentInput, config: &EngineConfig) -> AppResult<Vec<McqRecord>> {
    DocumentProcessor::new(config)?.extract(document)
}
