//! Translation of a resource budget into cgroup limits
//!
//! Memory sizes use decimal units: `1G` is 10^9 bytes and `1M` is 10^6 bytes.
//! CPU budgets are a percentage of the whole machine, so `cpu = 50` on an
//! eight core host allows four cores worth of time per period.

use calm_core::{CalmError, Result};
use log::warn;

/// CFS period used for every CPU limit (one second).
pub const CPU_PERIOD_US: u64 = 1_000_000;

/// Logical CPUs the scope is pinned to.
pub const PINNED_CPUS: &str = "0";

/// Memory nodes the scope is pinned to. A v1 cpuset rejects tasks until this is set.
pub const PINNED_MEMS: &str = "0";

const GIGABYTE: u64 = 1_000_000_000;
const MEGABYTE: u64 = 1_000_000;

/// User-facing resource budget, as read from settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBudget {
    /// Memory ceiling such as `"2G"` or `"512M"`; `"0"` means unlimited
    pub memory: String,
    /// Percentage of total machine CPU capacity; `0` means unlimited
    pub cpu_percent: u32,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        Self {
            memory: "0".to_string(),
            cpu_percent: 0,
        }
    }
}

/// Fixed parts of a CPU limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuPolicy {
    pub period_us: u64,
    pub cpus: String,
    pub mems: String,
}

impl Default for CpuPolicy {
    fn default() -> Self {
        Self {
            period_us: CPU_PERIOD_US,
            cpus: PINNED_CPUS.to_string(),
            mems: PINNED_MEMS.to_string(),
        }
    }
}

/// CFS bandwidth and cpuset values for a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuLimit {
    pub period_us: u64,
    /// May exceed `period_us` when the budget spans more than one core
    pub quota_us: u64,
    pub cpus: String,
    pub mems: String,
}

/// Kernel-facing limits. `None` leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpec {
    pub memory_limit: Option<u64>,
    pub cpu: Option<CpuLimit>,
}

impl ResourceSpec {
    /// Build a spec for `cores` visible CPUs with the default [`CpuPolicy`].
    pub fn from_budget(budget: &ResourceBudget, cores: usize) -> Result<Self> {
        Self::from_budget_with(budget, cores, &CpuPolicy::default())
    }

    pub fn from_budget_with(
        budget: &ResourceBudget,
        cores: usize,
        policy: &CpuPolicy,
    ) -> Result<Self> {
        let memory = parse_memory_limit(&budget.memory)?;

        let max_percent = (cores as u64).saturating_mul(100);
        if u64::from(budget.cpu_percent) > max_percent {
            warn!(
                "CPU budget {}% exceeds the {}% available on {} cores",
                budget.cpu_percent, max_percent, cores
            );
        }

        Ok(Self {
            memory_limit: (memory != 0).then_some(memory),
            cpu: cpu_limit(budget.cpu_percent, cores, policy),
        })
    }

    pub fn is_unlimited(&self) -> bool {
        self.memory_limit.is_none() && self.cpu.is_none()
    }
}

/// Parse a memory limit (`"0"`, `"<N>G"`, `"<N>M"`, case-insensitive) into bytes.
pub fn parse_memory_limit(input: &str) -> Result<u64> {
    if input == "0" {
        return Ok(0);
    }

    let upper = input.to_uppercase();
    let (digits, multiplier) = if let Some(digits) = upper.strip_suffix('G') {
        (digits, GIGABYTE)
    } else if let Some(digits) = upper.strip_suffix('M') {
        (digits, MEGABYTE)
    } else {
        return Err(parse_error(input, "expected a G or M suffix"));
    };

    // u64 parsing also rejects a leading '-'.
    let count: u64 = digits
        .parse()
        .map_err(|e| parse_error(input, &format!("invalid number: {}", e)))?;

    count
        .checked_mul(multiplier)
        .ok_or_else(|| parse_error(input, "value overflows a byte count"))
}

/// CPU limit for `percent` of `cores` CPUs, or `None` when `percent` is zero.
pub fn cpu_limit(percent: u32, cores: usize, policy: &CpuPolicy) -> Option<CpuLimit> {
    if percent == 0 {
        return None;
    }

    let quota_us = policy
        .period_us
        .saturating_mul(cores as u64)
        .saturating_mul(u64::from(percent))
        / 100;

    Some(CpuLimit {
        period_us: policy.period_us,
        quota_us,
        cpus: policy.cpus.clone(),
        mems: policy.mems.clone(),
    })
}

fn parse_error(input: &str, reason: &str) -> CalmError {
    CalmError::Parse {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
