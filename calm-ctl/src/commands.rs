use calm::{Controller, Hierarchy, util};
use log::info;

pub fn check_requirements() {
    info!("Checking calm requirements");
    println!("Checking calm requirements...\n");

    if util::is_root() {
        println!("[✓] Running as root");
    } else {
        println!("[✗] NOT running as root (needed to create cgroups and switch users)");
    }

    let hierarchy = Hierarchy::new();
    let mounted = hierarchy.mounted_controllers();
    for controller in Controller::ALL {
        let path = hierarchy.root().join(controller.name());
        if mounted.contains(&controller) {
            println!(
                "[✓] cgroup v1 {} controller at {}",
                controller.name(),
                path.display()
            );
        } else {
            println!(
                "[✗] cgroup v1 {} controller NOT mounted at {}",
                controller.name(),
                path.display()
            );
        }
    }

    println!("\nSystem info:");
    println!("  UID: {}", util::get_uid());
    println!("  GID: {}", util::get_gid());
    println!("  CPUs: {}", util::cpu_count());
}
