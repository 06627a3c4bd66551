//! 日志初始化：`tracing-subscriber`，级别由环境变量`RUST_LOG`控制

use tracing_subscriber::EnvFilter;

/// 初始化全局日志。`RUST_LOG`未设置时使用`default_directive`（如`"info"`）。
/// 重复调用不会出错，只有第一次生效
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
