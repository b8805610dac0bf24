//! Process-wide logging setup.

pub mod logging;

/// Initialize structured logging for the process.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    logging::init(logging::DEFAULT_FILTER);
}
