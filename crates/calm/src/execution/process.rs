//! Privilege-dropped process launch
//!
//! The UID/GID are attached to the [`Command`] before it is spawned, so the
//! credential switch happens in the child between fork and exec. When the
//! launcher runs as root, supplementary groups are cleared in the same step.

use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use calm_core::{CalmError, ExitOutcome, Result};
use log::debug;

use crate::execution::identity::LaunchIdentity;

/// Program and arguments to launch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name, looked up in `PATH` when it has no `/`
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Command line for messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Standard streams handed to the child as-is
#[derive(Debug)]
pub struct StdStreams {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

impl StdStreams {
    /// The launcher's own stdin, stdout and stderr
    pub fn inherit() -> Self {
        Self {
            stdin: Stdio::inherit(),
            stdout: Stdio::inherit(),
            stderr: Stdio::inherit(),
        }
    }
}

impl Default for StdStreams {
    fn default() -> Self {
        Self::inherit()
    }
}

/// Process launcher
pub struct ProcessLauncher;

impl ProcessLauncher {
    /// Build the child without starting it.
    pub fn prepare(
        command: &CommandSpec,
        identity: LaunchIdentity,
        streams: StdStreams,
    ) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(streams.stdin)
            .stdout(streams.stdout)
            .stderr(streams.stderr)
            .gid(identity.gid)
            .uid(identity.uid);
        cmd
    }

    /// Start a prepared child.
    pub fn start(cmd: &mut Command, command: &CommandSpec) -> Result<Child> {
        let child = cmd.spawn().map_err(|source| CalmError::ProcessStart {
            command: command.program.clone(),
            source,
        })?;
        debug!("Started {} as pid {}", command.command_line(), child.id());
        Ok(child)
    }

    /// Block until the child terminates.
    pub fn wait(mut child: Child) -> Result<ExitOutcome> {
        let status = child.wait()?;
        Ok(ExitOutcome::from_status(status))
    }
}
