//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载文档（Vec<DocumentInput>）
//! - 控制并发数量（Semaphore + spawn_blocking）
//! - 写出 JSON 结果和丢弃记录
//! - 输出全局统计信息
//!
//! ### `document_processor` - 单个文档处理器（抽取引擎）
//! - 校验输入
//! - 判断版式，区分答案页和题目页
//! - 创建并复用 PageFlow
//! - 答案回填、去重排序
//! - 输出单个文档的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<DocumentInput>)
//!     ↓
//! document_processor (处理 Vec<PageInput>)
//!     ↓
//! workflow::PageFlow (处理单页)
//!     ↓
//! services (能力层：重组 / 分题 / 抽取 / 答案 / 去重)
//! ```

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats};
pub use document_processor::{DocumentProcessor, DocumentReport, ExtractionStats};
