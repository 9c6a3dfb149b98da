//! calm-cgroup: resource budgets and cgroup v1 scopes
//!
//! Turns a user-facing [`ResourceBudget`] into a kernel-facing [`ResourceSpec`]
//! and enrolls the calling process into a per-invocation scope that carries it.
//! Enrollment goes through the [`CgroupScopes`] trait; [`Hierarchy`] is the
//! implementation backed by a mounted v1 hierarchy.

pub mod cgroup;
pub mod limits;
pub mod scope;

pub use cgroup::{Controller, Hierarchy};
pub use limits::{
    CpuLimit, CpuPolicy, ResourceBudget, ResourceSpec, CPU_PERIOD_US, PINNED_CPUS, PINNED_MEMS,
    cpu_limit, parse_memory_limit,
};
pub use scope::{CgroupScopes, ScopePath, enroll, enroll_pid};
