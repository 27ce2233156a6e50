//! Tracing and logging setup shared by the binaries.

/// Initialize process-wide logging at `level` (overridden by `RUST_LOG`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(level: &str) {
    tracing::init(level);
}

/// Subscriber configuration (filters, formatting).
pub mod tracing;
