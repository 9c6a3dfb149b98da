//! calm: run a command inside a cgroup as an unprivileged user
//!
//! One invocation builds a resource spec from the settings, enrolls the
//! launcher itself into a fresh cgroup v1 scope, then starts the command under
//! the configured user. The child inherits the scope at fork time.
//!
//! # Example
//!
//! ```ignore
//! use calm::{Calm, CommandSpec, Settings, StdStreams};
//!
//! let settings = Settings {
//!     memory: "1G".to_string(),
//!     user: "nobody".to_string(),
//!     ..Default::default()
//! };
//! let command = CommandSpec::new("echo", vec!["hello".to_string()]);
//! Calm::new().run(&settings, &command, StdStreams::inherit())?;
//! ```

pub mod controller;
pub mod execution;

pub use calm_cgroup::{
    CgroupScopes, Controller, CpuLimit, Hierarchy, ResourceBudget, ResourceSpec, ScopePath,
};
pub use calm_core::{self as core, CalmError, ExitOutcome, Result, util};

pub use controller::{Calm, Settings, Stage};
pub use execution::{
    CommandSpec, LaunchIdentity, ProcessLauncher, StdStreams, SystemUsers, UserResolver,
};
