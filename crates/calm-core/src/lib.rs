//! calm-core: shared types, errors, and host helpers for calm
//!
//! This crate provides the foundational types used by the other calm crates:
//! - Error type, Result alias, and the child exit outcome
//! - Host queries (effective UID/GID, visible CPU count)

pub mod error;
pub mod util;

pub use error::{CalmError, ExitOutcome, Result};
