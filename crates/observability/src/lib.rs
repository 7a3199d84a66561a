//! Process-wide logging setup shared by the library crates and the binary.

/// Tracing subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, ParseLogFormatError};

/// Install the default JSON subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(None, LogFormat::Json);
}

/// JSON subscriber with an explicit default level. `RUST_LOG` still wins when set.
pub fn init_with_level(level: &str) {
    tracing::init(Some(level), LogFormat::Json);
}

/// Like [`init_with_level`], with a chosen output format (the CLI uses `pretty`).
pub fn init_with(level: &str, format: LogFormat) {
    tracing::init(Some(level), format);
}
