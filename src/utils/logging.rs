//! 日志工具模块
//!
//! tracing 初始化、批处理进度输出，以及日志文件的表头

use anyhow::{Context, Result};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

const RULE: usize = 60;

/// 初始化 tracing 输出
///
/// 优先使用 `RUST_LOG`；未设置时按 `verbose` 选择 debug 或 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 页码范围的可读形式
fn page_range(engine: &EngineConfig) -> Option<String> {
    if engine.first_page.is_none() && engine.last_page.is_none() {
        return None;
    }
    Some(format!(
        "{} - {}",
        engine.first_page.map_or("开头".to_string(), |p| p.to_string()),
        engine.last_page.map_or("结尾".to_string(), |p| p.to_string())
    ))
}

/// 写日志文件表头（覆盖旧文件）
///
/// 表头记下本次使用的版式，之后每份文档追加一行摘要
pub fn init_log_file(log_file_path: &str, engine: &EngineConfig) -> Result<()> {
    let mut header = format!(
        "{}\n选择题抽取日志 - {}\n版式: {:?} | 排序: {:?} | 至少 {} 个选项\n",
        "=".repeat(RULE),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        engine.profile,
        engine.sort_order,
        engine.min_options
    );
    if let Some(range) = page_range(engine) {
        header.push_str(&format!("页码范围: {}\n", range));
    }
    header.push_str(&format!("{}\n\n", "=".repeat(RULE)));

    fs::write(log_file_path, header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize, engine: &EngineConfig) {
    info!("{}", "=".repeat(RULE));
    info!("🚀 程序启动 - 选择题批量抽取模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("🧩 版式配置: {:?} (分栏 {:?})", engine.profile, engine.column_policy);
    if let Some(range) = page_range(engine) {
        info!("📄 页码范围: {}", range);
    }
    info!("{}", "=".repeat(RULE));
}

/// 记录文档加载信息
pub fn log_documents_loaded(total: usize, batch_size: usize) {
    info!("✓ 找到 {} 个待处理的文档", total);
    info!("📋 每批 {} 个，共 {} 批", batch_size, total.div_ceil(batch_size.max(1)));
}

/// 记录批次开始信息，列出本批的文档名
pub fn log_batch_start(batch_num: usize, total_batches: usize, names: &[&str]) {
    info!("\n{}", "=".repeat(RULE));
    info!("📦 第 {}/{} 批: {}", batch_num, total_batches, names.join(", "));
    info!("{}", "=".repeat(RULE));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, attempted: usize, records: usize) {
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}，题目 {} 道",
        batch_num, success, attempted, records
    );
    if success < attempted {
        warn!("⚠️ 第 {} 批有 {} 个文档失败", batch_num, attempted - success);
    }
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, records: usize, log_file_path: &str) {
    let average = if success > 0 {
        records as f64 / success as f64
    } else {
        0.0
    };

    info!("\n{}", "=".repeat(RULE));
    info!(
        "📊 抽取完成 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 文档: 成功 {}/{}，失败 {}", success, total, failed);
    info!("📝 题目: 共 {} 道，平均每份 {:.1} 道", records, average);
    info!("📄 摘要: {}", log_file_path);
    info!("{}", "=".repeat(RULE));
}

/// 单行预览：空白折叠成一个空格，超过 `max_chars` 个字符时截断
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutProfile;

    #[test]
    fn test_preview_text() {
        assert_eq!(preview_text("short", 10), "short");
        assert_eq!(preview_text("abcdef", 3), "abc…");
        assert_eq!(preview_text("Which\n of   the\tfollowing", 40), "Which of the following");
        // 按字符而不是字节截断
        assert_eq!(preview_text("选择题抽取", 2), "选择…");
    }

    #[test]
    fn test_log_file_header_records_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let engine = EngineConfig {
            first_page: Some(3),
            ..EngineConfig::for_profile(LayoutProfile::TwoColumn)
        };
        init_log_file(&path.to_string_lossy(), &engine).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("选择题抽取日志"));
        assert!(content.contains("版式: TwoColumn"));
        assert!(content.contains("页码范围: 3 - 结尾"));
    }

    #[test]
    fn test_page_range_absent_without_limits() {
        assert_eq!(page_range(&EngineConfig::default()), None);
    }
}
