//! 日志工具模块

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// 默认级别 info，可用 RUST_LOG 覆盖（例如 RUST_LOG=ecourts_case_report=debug）。
/// 重复调用是安全的（测试里每个用例都可能先调一次）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ecourts_case_report=info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
