// logsleuth-analyzer - util/logging.rs
//
// Structured logging setup for embedders of this library. The engine itself
// never installs a global subscriber on its own; `init` exists for binaries
// and integration tests that want the same defaults the teacher's
// application used, on top of this crate's tracing spans.
//
// Priority: RUST_LOG env var > explicit level override > default "info".

use tracing_subscriber::EnvFilter;

/// Initialise a process-wide tracing subscriber with sane defaults.
///
/// Safe to call more than once; subsequent calls are no-ops (tracing's
/// global subscriber can only be set once per process).
pub fn init(level_override: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if let Some(level) = level_override {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .compact()
        .try_init();
}
