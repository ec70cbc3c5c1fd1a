//! Layered error definitions
//!
//! Categorized by source: input / configuration / worker / io

use std::path::PathBuf;

use thiserror::Error;

use crate::{DeviceId, SessionId};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Input Errors =====
    /// Malformed row in an input file (1-based line number)
    #[error("parse error in {} at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Input file contained no data rows
    #[error("no data rows for '{input}' in {}", .path.display())]
    EmptyInput { input: String, path: PathBuf },

    /// Expected resampled stream is absent
    #[error(
        "missing sensor stream for device '{device}' in session '{session}': {} not found",
        .path.display()
    )]
    MissingSensorStream {
        session: SessionId,
        device: DeviceId,
        path: PathBuf,
    },

    // ===== Configuration Errors =====
    /// Missing or invalid configuration option
    #[error("configuration error at '{field}': {message}")]
    Configuration {
        field: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Worker Errors =====
    /// Session worker panicked
    #[error("worker for session '{session}' panicked: {message}")]
    WorkerPanicked { session: SessionId, message: String },

    /// Session stopped by a shutdown request before committing
    #[error("session '{session}' cancelled")]
    Cancelled { session: SessionId },

    // ===== General Errors =====
    /// IO error with the file it happened on
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContractError {
    /// Create parse error
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create empty input error
    pub fn empty_input(input: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::EmptyInput {
            input: input.into(),
            path: path.into(),
        }
    }

    /// Create missing sensor stream error
    pub fn missing_stream(
        session: impl Into<SessionId>,
        device: impl Into<DeviceId>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::MissingSensorStream {
            session: session.into(),
            device: device.into(),
            path: path.into(),
        }
    }

    /// Create configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create IO error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short stable name of the error kind (used in reports and metrics labels)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::EmptyInput { .. } => "empty_input",
            Self::MissingSensorStream { .. } => "missing_sensor_stream",
            Self::Configuration { .. } => "configuration",
            Self::WorkerPanicked { .. } => "worker_panicked",
            Self::Cancelled { .. } => "cancelled",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_cites_line() {
        let err = ContractError::parse("raw/left_arm.txt", 10, "invalid float 'abc'");
        let msg = err.to_string();
        assert!(msg.contains("raw/left_arm.txt"), "got: {msg}");
        assert!(msg.contains("line 10"), "got: {msg}");
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_missing_stream_names_session_and_device() {
        let err = ContractError::missing_stream("S07_Brownie", "imu_left", "out/x.csv");
        let msg = err.to_string();
        assert!(msg.contains("S07_Brownie"));
        assert!(msg.contains("imu_left"));
    }

    #[test]
    fn test_worker_errors_name_session() {
        let err = ContractError::WorkerPanicked {
            session: "S02".into(),
            message: "index out of bounds".into(),
        };
        assert!(err.to_string().contains("'S02' panicked"), "got: {err}");
        assert_eq!(err.kind(), "worker_panicked");

        let err = ContractError::Cancelled {
            session: "S03".into(),
        };
        assert_eq!(err.kind(), "cancelled");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ContractError::io("a/b.txt", io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.kind(), "io");
    }
}
