pub mod core;
pub mod engine;
pub mod export_cmd;
pub mod source;
pub mod storage;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The document stream could not be established or broke mid-scroll.
    #[error("search source {endpoint} unavailable: {reason}")]
    SourceUnavailable { endpoint: String, reason: String },
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Message(String),
}

impl ExportError {
    /// Process exit code for a fatal error. Source and output failures get
    /// their own codes so wrappers can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExportError::SourceUnavailable { .. } => 2,
            ExportError::Output { .. } => 3,
            ExportError::Config(_) | ExportError::Message(_) => 1,
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Placeholder written for absent timestamps and fields.
pub const NOT_AVAILABLE: &str = "N/A";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_for_fatal_kinds() {
        let source = ExportError::SourceUnavailable {
            endpoint: "http://localhost:9200".into(),
            reason: "connection refused".into(),
        };
        let output = ExportError::Output {
            path: PathBuf::from("out.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(source.exit_code(), 2);
        assert_eq!(output.exit_code(), 3);
        assert_eq!(ExportError::Config("bad".into()).exit_code(), 1);
    }

    #[test]
    fn test_output_error_names_path() {
        let err = ExportError::Output {
            path: PathBuf::from("/tmp/x.csv"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x.csv"));
        assert!(msg.contains("disk full"));
    }
}
