//! Cgroup v1 hierarchy backed by the controller mounts under a cgroup root

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use calm_core::{CalmError, Result};
use log::debug;
use nix::unistd::Pid;

use crate::limits::ResourceSpec;
use crate::scope::{CgroupScopes, ScopePath};

const CGROUP_V1_ROOT: &str = "/sys/fs/cgroup";

/// Environment variable that redirects the cgroup root
pub const CGROUP_ROOT_ENV: &str = "CALM_CGROUP_ROOT";

/// v1 controllers a scope is created in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Memory,
    Cpu,
    Cpuset,
}

impl Controller {
    pub const ALL: [Controller; 3] = [Controller::Memory, Controller::Cpu, Controller::Cpuset];

    /// Directory name of the controller mount
    pub fn name(&self) -> &'static str {
        match self {
            Controller::Memory => "memory",
            Controller::Cpu => "cpu",
            Controller::Cpuset => "cpuset",
        }
    }

    /// Whether `spec` sets limits owned by this controller
    fn required_by(&self, spec: &ResourceSpec) -> bool {
        match self {
            Controller::Memory => spec.memory_limit.is_some(),
            Controller::Cpu | Controller::Cpuset => spec.cpu.is_some(),
        }
    }
}

/// Cgroup v1 interface rooted at a directory of controller mounts
#[derive(Debug, Clone)]
pub struct Hierarchy {
    root: PathBuf,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    /// Hierarchy at `$CALM_CGROUP_ROOT`, or `/sys/fs/cgroup`
    pub fn new() -> Self {
        let root = std::env::var(CGROUP_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CGROUP_V1_ROOT));
        Self { root }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `controller` is mounted as its own v1 hierarchy
    pub fn is_mounted(&self, controller: Controller) -> bool {
        self.controller_root(controller).is_dir()
    }

    /// Controllers available under the root
    pub fn mounted_controllers(&self) -> Vec<Controller> {
        Controller::ALL
            .into_iter()
            .filter(|c| self.is_mounted(*c))
            .collect()
    }

    fn controller_root(&self, controller: Controller) -> PathBuf {
        self.root.join(controller.name())
    }

    fn scope_dir(&self, controller: Controller, scope: &ScopePath) -> PathBuf {
        self.controller_root(controller).join(scope.relative())
    }

    /// Controllers to build `scope` in. Every mounted controller takes part;
    /// an unmounted one is only an error when `spec` needs it.
    fn controllers_for(&self, scope: &ScopePath, spec: &ResourceSpec) -> Result<Vec<Controller>> {
        let controllers = self.mounted_controllers();
        for controller in Controller::ALL {
            if !controllers.contains(&controller) && controller.required_by(spec) {
                return Err(creation_error(
                    scope,
                    format!(
                        "{} controller is not mounted at {}",
                        controller.name(),
                        self.controller_root(controller).display()
                    ),
                ));
            }
        }
        if controllers.is_empty() {
            return Err(creation_error(
                scope,
                format!("no cgroup v1 controllers mounted under {}", self.root.display()),
            ));
        }
        Ok(controllers)
    }

    fn create_in(&self, controller: Controller, scope: &ScopePath) -> Result<PathBuf> {
        let controller_root = self.controller_root(controller);
        let group_dir = controller_root.join(scope.group());
        let leaf_dir = group_dir.join(scope.leaf());

        match fs::create_dir(&group_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(io_creation_error(scope, &group_dir, "create", e)),
        }
        // A reused group may have been left with empty cpuset values.
        if controller == Controller::Cpuset {
            self.seed_cpuset(scope, &controller_root, &group_dir)?;
        }

        // A leftover leaf from a crashed run with the same PID is not reused.
        fs::create_dir(&leaf_dir).map_err(|e| io_creation_error(scope, &leaf_dir, "create", e))?;
        if controller == Controller::Cpuset {
            self.seed_cpuset(scope, &group_dir, &leaf_dir)?;
        }

        debug!("Created {}", leaf_dir.display());
        Ok(leaf_dir)
    }

    /// Copy empty `cpuset.cpus`/`cpuset.mems` from the parent; v1 refuses tasks otherwise.
    fn seed_cpuset(&self, scope: &ScopePath, parent: &Path, child: &Path) -> Result<()> {
        for file in ["cpuset.cpus", "cpuset.mems"] {
            let current = read_trimmed(&child.join(file))
                .map_err(|e| io_creation_error(scope, &child.join(file), "read", e))?;
            if !current.is_empty() {
                continue;
            }
            let inherited = read_trimmed(&parent.join(file))
                .map_err(|e| io_creation_error(scope, &parent.join(file), "read", e))?;
            write_file(&child.join(file), &inherited)
                .map_err(|e| io_creation_error(scope, &child.join(file), "write", e))?;
        }
        Ok(())
    }

    fn apply_limits(
        &self,
        controller: Controller,
        scope: &ScopePath,
        dir: &Path,
        spec: &ResourceSpec,
    ) -> Result<()> {
        let mut writes: Vec<(&str, String)> = Vec::new();
        match controller {
            Controller::Memory => {
                if let Some(limit) = spec.memory_limit {
                    writes.push(("memory.limit_in_bytes", limit.to_string()));
                }
            }
            Controller::Cpu => {
                if let Some(cpu) = &spec.cpu {
                    writes.push(("cpu.cfs_period_us", cpu.period_us.to_string()));
                    writes.push(("cpu.cfs_quota_us", cpu.quota_us.to_string()));
                }
            }
            Controller::Cpuset => {
                if let Some(cpu) = &spec.cpu {
                    writes.push(("cpuset.cpus", cpu.cpus.clone()));
                    writes.push(("cpuset.mems", cpu.mems.clone()));
                }
            }
        }

        for (file, value) in writes {
            let path = dir.join(file);
            write_file(&path, &value).map_err(|e| io_creation_error(scope, &path, "write", e))?;
        }
        Ok(())
    }
}

impl CgroupScopes for Hierarchy {
    fn create_scope(&self, scope: &ScopePath, spec: &ResourceSpec) -> Result<()> {
        for controller in self.controllers_for(scope, spec)? {
            let dir = self.create_in(controller, scope)?;
            self.apply_limits(controller, scope, &dir, spec)?;
        }
        Ok(())
    }

    fn add_process(&self, scope: &ScopePath, pid: Pid) -> Result<()> {
        let dirs: Vec<PathBuf> = Controller::ALL
            .into_iter()
            .map(|c| self.scope_dir(c, scope))
            .filter(|dir| dir.is_dir())
            .collect();

        if dirs.is_empty() {
            return Err(CalmError::CgroupEnrollment {
                path: scope.to_string(),
                pid: pid.as_raw(),
                reason: "scope does not exist in any controller".to_string(),
            });
        }

        for dir in dirs {
            let procs = dir.join("cgroup.procs");
            write_file(&procs, &pid.as_raw().to_string()).map_err(|e| {
                CalmError::CgroupEnrollment {
                    path: scope.to_string(),
                    pid: pid.as_raw(),
                    reason: format!("failed to write {}: {}", procs.display(), e),
                }
            })?;
        }
        Ok(())
    }
}

fn creation_error(scope: &ScopePath, reason: String) -> CalmError {
    CalmError::CgroupCreation {
        path: scope.to_string(),
        reason,
    }
}

fn io_creation_error(scope: &ScopePath, path: &Path, action: &str, e: io::Error) -> CalmError {
    creation_error(
        scope,
        format!("failed to {} {}: {}", action, path.display(), e),
    )
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    write!(file, "{}", content)
}

/// Contents of a control file; a missing file reads as empty.
fn read_trimmed(path: &Path) -> io::Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.trim().to_string()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}
