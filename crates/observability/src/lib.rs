//! Process-wide tracing setup shared by the binaries.

pub mod tracing;

pub use tracing::LogFormat;

/// Initialize tracing/logging using `RUST_LOG` and `LOG_FORMAT`.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init();
}
