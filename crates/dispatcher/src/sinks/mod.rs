//! Sink implementations
//!
//! Contains CsvFileSink and LogSink.

mod file;
mod log;

pub use self::file::CsvFileSink;
pub use self::log::LogSink;
