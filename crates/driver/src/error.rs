//! Driver errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// A compile or link phase was requested without `-o <file>`
    #[error("no output file given (expected `-o <file>`)")]
    MissingOutputPath,

    /// A compile phase was requested without a source file
    #[error("no input file given")]
    MissingInputPath,

    /// An external tool ran and exited non-zero.
    ///
    /// The tool has already written its own diagnostics, so the driver
    /// only forwards the status.
    #[error("{tool} exited with status {code}")]
    ToolFailed { tool: &'static str, code: i32 },

    #[error("failed to run {tool} (`{program}`): {source}")]
    Spawn {
        tool: &'static str,
        program: String,
        #[source]
        source: io::Error,
    },

    /// A redirection target could not be opened or created
    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {}", .path.display(), .message)]
    Config { path: PathBuf, message: String },
}

impl DriverError {
    /// Process exit status the driver should terminate with
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::ToolFailed { code, .. } => *code,
            _ => 1,
        }
    }

    /// Whether the driver should print this error itself.
    ///
    /// Tool failures are silent: the tool's stderr was passed through.
    pub fn is_reported_by_tool(&self) -> bool {
        matches!(self, DriverError::ToolFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_keeps_status() {
        let err = DriverError::ToolFailed {
            tool: "linker",
            code: 42,
        };
        assert_eq!(err.exit_code(), 42);
        assert!(err.is_reported_by_tool());
        assert_eq!(err.to_string(), "linker exited with status 42");
    }

    #[test]
    fn test_driver_errors_exit_with_one() {
        let err = DriverError::MissingOutputPath;
        assert_eq!(err.exit_code(), 1);
        assert!(!err.is_reported_by_tool());

        let err = DriverError::Io {
            path: PathBuf::from("out/prog.o"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing directory"),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "out/prog.o: missing directory");
    }
}
