//! Running external tools
//!
//! The dispatcher never touches `std::process` directly. It builds
//! [`ToolCommand`]s and hands them to a [`ToolInvoker`], which reports the
//! exit status. [`ProcessInvoker`] is the real implementation; tests swap
//! in a recorder.

use crate::error::DriverError;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Stage name used in logs and errors (`frontend`, `linker`, ...)
    pub tool: &'static str,
    pub program: String,
    pub args: Vec<String>,
    /// File connected to standard input
    pub stdin: Option<PathBuf>,
    /// File that receives standard output, created or truncated
    pub stdout: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(tool: &'static str, program: impl Into<String>) -> Self {
        ToolCommand {
            tool,
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            stdout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin_from(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn stdout_to(mut self, path: impl AsRef<Path>) -> Self {
        self.stdout = Some(path.as_ref().to_path_buf());
        self
    }
}

/// Shell-like rendering, for logs only
impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(path) = &self.stdin {
            write!(f, " < {}", path.display())?;
        }
        if let Some(path) = &self.stdout {
            write!(f, " > {}", path.display())?;
        }
        Ok(())
    }
}

/// Runs a tool to completion and returns its exit code
pub trait ToolInvoker {
    fn run(&mut self, command: &ToolCommand) -> Result<i32, DriverError>;
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for &mut T {
    fn run(&mut self, command: &ToolCommand) -> Result<i32, DriverError> {
        (**self).run(command)
    }
}

/// Spawns tools as child processes and waits for each one.
///
/// Stderr is always inherited so tool diagnostics reach the user as-is.
/// A tool killed by a signal reports `128 + signal`, as a shell would.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessInvoker;

impl ToolInvoker for ProcessInvoker {
    fn run(&mut self, command: &ToolCommand) -> Result<i32, DriverError> {
        let mut process = Command::new(&command.program);
        process.args(&command.args);

        if let Some(path) = &command.stdin {
            let file = File::open(path).map_err(|source| DriverError::Io {
                path: path.clone(),
                source,
            })?;
            process.stdin(Stdio::from(file));
        }
        if let Some(path) = &command.stdout {
            let file = File::create(path).map_err(|source| DriverError::Io {
                path: path.clone(),
                source,
            })?;
            process.stdout(Stdio::from(file));
        }

        debug!(tool = command.tool, "running {}", command);
        let status = process.status().map_err(|source| DriverError::Spawn {
            tool: command.tool,
            program: command.program.clone(),
            source,
        })?;

        Ok(exit_code(status))
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
