use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging.
///
/// Log lines go to stderr (stdout belongs to the interactive shell),
/// filtered by `RUST_LOG` (default `info`). Setting `PALAVER_LOG_FILE`
/// additionally appends plain-text logs to that file for debugging
/// long-running sessions.
pub fn init_tracing() {
    let file_logging = std::env::var("PALAVER_LOG_FILE").ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    if let Some(log_path) = file_logging {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .expect("Failed to open log file");

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true);

        registry.with(file_layer).init();
        eprintln!("File logging enabled: {log_path}");
    } else {
        registry.init();
    }
}
