//! Execution layer: identity resolution and privilege-dropped launch
//!
//! The child is built with its credential attached before it is started, so
//! it never runs under the launcher's own identity.

pub mod identity;
pub mod process;

pub use identity::{LaunchIdentity, SystemUsers, UserResolver};
pub use process::{CommandSpec, ProcessLauncher, StdStreams};
