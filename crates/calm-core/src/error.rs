//! Error types for calm invocations

use std::fmt;
use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for calm operations
pub type Result<T> = std::result::Result<T, CalmError>;

/// Exit code reported when the launcher itself fails before or while starting the child.
pub const LAUNCHER_FAILURE_CODE: i32 = 1;

/// How a child process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with the given status code
    Exited(i32),
    /// Killed by the given signal number
    Signaled(i32),
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match status.code() {
            Some(code) => ExitOutcome::Exited(code),
            None => ExitOutcome::Signaled(status.signal().unwrap_or(0)),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }

    /// Shell-style exit code: the status itself, or 128 + signal number.
    pub fn code(&self) -> i32 {
        match *self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(signal) => 128 + signal,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with code {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "was killed by signal {}", signal),
        }
    }
}

/// Errors that can occur during a calm invocation
#[derive(Error, Debug)]
pub enum CalmError {
    #[error("could not parse memory limit {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("could not create cgroup {path}: {reason}")]
    CgroupCreation { path: String, reason: String },

    #[error("could not add process {pid} to cgroup {path}: {reason}")]
    CgroupEnrollment {
        path: String,
        pid: i32,
        reason: String,
    },

    #[error("could not look up configured user {user}: {reason}")]
    UserLookup { user: String, reason: String },

    #[error("could not start command {command}: {source}")]
    ProcessStart {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command {command} {outcome}")]
    ChildExit {
        command: String,
        outcome: ExitOutcome,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invocation already launched")]
    AlreadyLaunched,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CalmError {
    /// Process exit code the launcher should report for this error.
    ///
    /// A child that ran and failed passes its own code through; every
    /// launcher-side failure maps to [`LAUNCHER_FAILURE_CODE`].
    pub fn exit_code(&self) -> i32 {
        match self {
            CalmError::ChildExit { outcome, .. } => outcome.code(),
            _ => LAUNCHER_FAILURE_CODE,
        }
    }

    /// The child ran to completion; this is its result, not a launcher defect.
    pub fn is_child_exit(&self) -> bool {
        matches!(self, CalmError::ChildExit { .. })
    }
}
