//! Diagnostic logging into the per-user debug log.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: timestamped diagnostics appended to
//!   `~/.claude/logs/hooks-debug.log`. Filtered via `RUST_LOG`, default
//!   `qc_gate=debug`. Never written to stderr, which carries verdict text.
//!
//! - **Audit log (`io/audit`)**: one JSON line per override use. Always written
//!   when the location is writable, unaffected by `RUST_LOG`.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing into `log_path`.
///
/// Any failure (no home directory, permission denied, subscriber already set)
/// leaves logging disabled; it never aborts the caller.
pub fn init(log_path: Option<&Path>) {
    let Some(file) = log_path.and_then(open_log) else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qc_gate=debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_timer(ChronoLocal::new("[%Y-%m-%d %H:%M:%S]".to_string()))
                .compact(),
        )
        .try_init();
}

fn open_log(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
