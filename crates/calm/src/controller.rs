//! Invocation pipeline: spec, enrollment, identity, launch

use calm_cgroup::{CgroupScopes, Hierarchy, ResourceBudget, ResourceSpec, ScopePath, enroll};
use calm_core::{CalmError, Result, util};
use log::{debug, info};

use crate::execution::identity::{SystemUsers, UserResolver};
use crate::execution::process::{CommandSpec, ProcessLauncher, StdStreams};

/// Cgroup group name used when none is configured
pub const DEFAULT_GROUP: &str = "calm";

/// User the child runs as when none is configured
pub const DEFAULT_USER: &str = "root";

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Memory limit such as `"512M"`; `"0"` is unlimited
    pub memory: String,
    /// Percentage of total CPU capacity; `0` is unlimited
    pub cpu_percent: u32,
    /// Username the child runs as
    pub user: String,
    /// Cgroup group name; the scope is `/<group>/<group>-<pid>`
    pub group: String,
}

impl Default for Settings {
    fn default() -> Self {
        let budget = ResourceBudget::default();
        Self {
            memory: budget.memory,
            cpu_percent: budget.cpu_percent,
            user: DEFAULT_USER.to_string(),
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

impl Settings {
    pub fn budget(&self) -> ResourceBudget {
        ResourceBudget {
            memory: self.memory.clone(),
            cpu_percent: self.cpu_percent,
        }
    }
}

/// Progress of an invocation. Every transition happens once; any failure
/// ends in [`Stage::Failed`] without undoing earlier steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unconfigured,
    SpecBuilt,
    Enrolled,
    IdentityResolved,
    Running,
    Terminated,
    Failed,
}

/// A single launch
pub struct Calm<C = Hierarchy, R = SystemUsers> {
    cgroups: C,
    users: R,
    cores: usize,
    stage: Stage,
    scope: Option<ScopePath>,
    failure: Option<String>,
}

impl Calm {
    /// Invocation against the system cgroup hierarchy and user database
    pub fn new() -> Self {
        Self::with_backends(Hierarchy::new(), SystemUsers)
    }
}

impl Default for Calm {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CgroupScopes, R: UserResolver> Calm<C, R> {
    pub fn with_backends(cgroups: C, users: R) -> Self {
        Self {
            cgroups,
            users,
            cores: util::cpu_count(),
            stage: Stage::Unconfigured,
            scope: None,
            failure: None,
        }
    }

    /// Override the core count the CPU budget is scaled by
    pub fn cores(mut self, cores: usize) -> Self {
        self.cores = cores.max(1);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Scope the launcher joined, once enrolled
    pub fn scope(&self) -> Option<&ScopePath> {
        self.scope.as_ref()
    }

    /// Message of the error that moved the invocation to [`Stage::Failed`]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Run `command` under `settings` and wait for it.
    ///
    /// A child that exits non-zero or is killed comes back as
    /// [`CalmError::ChildExit`] with the invocation in [`Stage::Terminated`].
    pub fn run(
        &mut self,
        settings: &Settings,
        command: &CommandSpec,
        streams: StdStreams,
    ) -> Result<()> {
        if self.stage != Stage::Unconfigured {
            return Err(CalmError::AlreadyLaunched);
        }

        let result = self.advance(settings, command, streams);
        if let Err(e) = &result {
            if !e.is_child_exit() {
                self.stage = Stage::Failed;
                self.failure = Some(e.to_string());
            }
        }
        result
    }

    fn advance(
        &mut self,
        settings: &Settings,
        command: &CommandSpec,
        streams: StdStreams,
    ) -> Result<()> {
        debug!(
            "Memory limits: {}\tCPU limits: {}%\tUser: {}",
            settings.memory, settings.cpu_percent, settings.user
        );

        let spec = ResourceSpec::from_budget(&settings.budget(), self.cores)?;
        if spec.is_unlimited() {
            debug!("No limits set, the scope only groups the process");
        }
        self.stage = Stage::SpecBuilt;

        let scope = enroll(&self.cgroups, &settings.group, &spec)?;
        self.scope = Some(scope);
        self.stage = Stage::Enrolled;

        let identity = self.users.resolve(&settings.user)?;
        debug!(
            "Resolved user {} to uid={} gid={}",
            settings.user, identity.uid, identity.gid
        );
        self.stage = Stage::IdentityResolved;

        let mut cmd = ProcessLauncher::prepare(command, identity, streams);
        let child = ProcessLauncher::start(&mut cmd, command)?;
        self.stage = Stage::Running;

        let outcome = ProcessLauncher::wait(child)?;
        self.stage = Stage::Terminated;
        info!("{} {}", command.command_line(), outcome);

        if outcome.success() {
            Ok(())
        } else {
            Err(CalmError::ChildExit {
                command: command.program.clone(),
                outcome,
            })
        }
    }
}
