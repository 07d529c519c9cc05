//! Process-wide logger setup for the `mdnsd-cli` demo binary.
//!
//! The engine library itself only calls the `log` macros; this module is
//! where a binary actually wires up an appender, mirroring the teacher's
//! `logging` module's role of being the one place that configures the
//! subscriber.

use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};

/// Initializes the global logger at `level` (e.g. `"info"`, `"debug"`).
/// Logs to stderr; intended to be called once, near the top of `main`.
pub fn init_logging(level: &str) -> Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    Logger::try_with_str(level)?
        .log_to_file(FileSpec::default().suppress_timestamp())
        .duplicate_to_stderr(Duplicate::All)
        .write_mode(flexi_logger::WriteMode::BufferAndFlush)
        .start()
}
