use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    let level = if verbose {
        "debug".to_string()
    } else {
        level.to_lowercase()
    };

    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("funding_scanner={},warn", level)))
}

/// 開啟（必要時建立）附加寫入的日誌檔；失敗時警告並回傳 None
fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("⚠️  Cannot create log directory {}: {}", parent.display(), e);
            return None;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eprintln!("⚠️  Cannot open log file {}: {}", path.display(), e))
        .ok()
}

/// 初始化終端與檔案日誌；檔案無法開啟時只輸出到終端
pub fn init_cli_logger(level: &str, verbose: bool, log_file: Option<&Path>) {
    let file = log_file.and_then(open_log_file);

    let file_layer = file.map(|f| {
        tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(f))
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(build_filter(level, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(file_layer)
        .init();
}

pub fn init_json_logger(level: &str) {
    tracing_subscriber::registry()
        .with(build_filter(level, false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
