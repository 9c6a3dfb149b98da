//! Enrollment tests against a directory laid out like a v1 cgroup mount.
//!
//! Tests that touch the real hierarchy need root and a v1 mount. Run them with:
//!   sudo cargo test -p calm-cgroup -- --ignored

use std::fs;
use std::path::Path;

use calm_cgroup::{Hierarchy, ResourceBudget, ResourceSpec, enroll};
use calm_core::CalmError;

fn fake_mounts(root: &Path) {
    for controller in ["memory", "cpu", "cpuset"] {
        fs::create_dir_all(root.join(controller)).unwrap();
    }
    fs::write(root.join("cpuset/cpuset.cpus"), "0-3").unwrap();
    fs::write(root.join("cpuset/cpuset.mems"), "0").unwrap();
}

#[test]
fn budget_to_enrolled_scope() {
    let tmp = tempfile::tempdir().unwrap();
    fake_mounts(tmp.path());
    let hierarchy = Hierarchy::with_root(tmp.path());

    let budget = ResourceBudget {
        memory: "2G".to_string(),
        cpu_percent: 50,
    };
    let spec = ResourceSpec::from_budget(&budget, 4).unwrap();
    let scope = enroll(&hierarchy, "calm-test", &spec).unwrap();

    let pid = std::process::id().to_string();
    assert_eq!(scope.to_string(), format!("/calm-test/calm-test-{}", pid));

    let memory_dir = tmp.path().join("memory").join(scope.relative());
    assert_eq!(
        fs::read_to_string(memory_dir.join("memory.limit_in_bytes")).unwrap(),
        "2000000000"
    );
    assert_eq!(
        fs::read_to_string(memory_dir.join("cgroup.procs")).unwrap(),
        pid
    );

    let cpu_dir = tmp.path().join("cpu").join(scope.relative());
    assert_eq!(
        fs::read_to_string(cpu_dir.join("cpu.cfs_quota_us")).unwrap(),
        "2000000"
    );
}

#[test]
fn second_enrollment_with_same_pid_fails() {
    let tmp = tempfile::tempdir().unwrap();
    fake_mounts(tmp.path());
    let hierarchy = Hierarchy::with_root(tmp.path());
    let spec = ResourceSpec::default();

    enroll(&hierarchy, "calm", &spec).unwrap();
    let err = enroll(&hierarchy, "calm", &spec).unwrap_err();
    assert!(matches!(err, CalmError::CgroupCreation { .. }));
}

#[test]
fn unparseable_budget_never_reaches_the_hierarchy() {
    let budget = ResourceBudget {
        memory: "12K".to_string(),
        cpu_percent: 0,
    };
    let err = ResourceSpec::from_budget(&budget, 1).unwrap_err();
    assert!(matches!(err, CalmError::Parse { .. }));
}

/// Enroll this test process into the real v1 hierarchy.
#[test]
#[ignore]
fn enroll_into_real_hierarchy() {
    let hierarchy = Hierarchy::with_root("/sys/fs/cgroup");
    if !hierarchy.is_mounted(calm_cgroup::Controller::Memory) {
        eprintln!("cgroup v1 memory controller not mounted, skipping");
        return;
    }

    let spec = ResourceSpec {
        memory_limit: Some(512_000_000),
        cpu: None,
    };
    let scope = enroll(&hierarchy, "calm-itest", &spec).unwrap();

    let procs = fs::read_to_string(
        Path::new("/sys/fs/cgroup/memory")
            .join(scope.relative())
            .join("cgroup.procs"),
    )
    .unwrap();
    assert!(procs.lines().any(|l| l == std::process::id().to_string()));
}
