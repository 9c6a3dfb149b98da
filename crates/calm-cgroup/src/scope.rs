//! Per-invocation cgroup scopes and process enrollment

use std::fmt;
use std::path::PathBuf;

use calm_core::{CalmError, Result};
use log::{debug, info};
use nix::unistd::{Pid, getpid};

use crate::limits::ResourceSpec;

/// Scope path of the form `/<group>/<group>-<pid>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePath {
    group: String,
    pid: Pid,
}

impl ScopePath {
    pub fn new(group: &str, pid: Pid) -> Result<Self> {
        if group.is_empty() || group == "." || group == ".." || group.contains('/') {
            return Err(CalmError::InvalidConfig(format!(
                "cgroup group name must be a single path component, got {:?}",
                group
            )));
        }
        Ok(Self {
            group: group.to_string(),
            pid,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Name of the leaf directory, `<group>-<pid>`
    pub fn leaf(&self) -> String {
        format!("{}-{}", self.group, self.pid)
    }

    /// Path relative to a controller mount
    pub fn relative(&self) -> PathBuf {
        PathBuf::from(&self.group).join(self.leaf())
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.group, self.leaf())
    }
}

/// Kernel operations needed to confine the launcher.
///
/// `create_scope` reports failures as [`CalmError::CgroupCreation`] and
/// `add_process` as [`CalmError::CgroupEnrollment`].
pub trait CgroupScopes {
    /// Create the scope with every limit in `spec` applied.
    fn create_scope(&self, scope: &ScopePath, spec: &ResourceSpec) -> Result<()>;

    /// Move `pid` into an existing scope.
    fn add_process(&self, scope: &ScopePath, pid: Pid) -> Result<()>;
}

impl<T: CgroupScopes + ?Sized> CgroupScopes for &T {
    fn create_scope(&self, scope: &ScopePath, spec: &ResourceSpec) -> Result<()> {
        (**self).create_scope(scope, spec)
    }

    fn add_process(&self, scope: &ScopePath, pid: Pid) -> Result<()> {
        (**self).add_process(scope, pid)
    }
}

/// Enroll the calling process into `/<group>/<group>-<pid>` with `spec` applied.
///
/// Children spawned afterwards inherit the membership, so this must run before
/// any fork.
pub fn enroll<C: CgroupScopes + ?Sized>(
    cgroups: &C,
    group: &str,
    spec: &ResourceSpec,
) -> Result<ScopePath> {
    enroll_pid(cgroups, group, spec, getpid())
}

/// Same as [`enroll`] for an explicit process
pub fn enroll_pid<C: CgroupScopes + ?Sized>(
    cgroups: &C,
    group: &str,
    spec: &ResourceSpec,
    pid: Pid,
) -> Result<ScopePath> {
    let scope = ScopePath::new(group, pid)?;

    debug!("Creating cgroup scope {} with {:?}", scope, spec);
    cgroups.create_scope(&scope, spec)?;

    cgroups.add_process(&scope, pid)?;
    info!("Process {} enrolled in cgroup {}", pid, scope);

    // TODO: set notify_on_release and a release_agent that removes the scope once empty
    Ok(scope)
}
