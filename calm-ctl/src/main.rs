//! calm - run a program using cgroup resource limits

mod cli;
mod commands;
mod config;
mod logging;
mod runner;

use clap::Parser;
use cli::Cli;
use commands::check_requirements;
use config::Layer;
use console::style;
use log::debug;
use runner::{RunConfig, run_calm};

fn main() {
    let cli = Cli::parse();

    logging::init_logger(cli.debug);

    if cli.check {
        check_requirements();
        return;
    }

    let config = RunConfig {
        command: cli.command,
        flags: Layer {
            memory: cli.memory,
            cpu: cli.cpu,
            user: cli.user,
            group: cli.group,
        },
        config_path: cli.config,
    };

    if let Err(e) = run_calm(config) {
        if e.is_child_exit() {
            debug!("{}", e);
        } else {
            eprintln!("{} {}", style("error:").red().bold(), e);
        }
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_requirements_runs() {
        check_requirements();
    }

    #[test]
    fn parses_command_with_its_own_flags() {
        let cli =
            Cli::try_parse_from(["calm", "-m", "1G", "--cpu", "50", "ls", "-la", "/tmp"]).unwrap();
        assert_eq!(cli.memory.as_deref(), Some("1G"));
        assert_eq!(cli.cpu, Some(50));
        assert_eq!(cli.command, vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn parses_user_and_group() {
        let cli = Cli::try_parse_from([
            "calm", "-u", "nobody", "--group", "batch", "echo", "hello",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("nobody"));
        assert_eq!(cli.group.as_deref(), Some("batch"));
        assert_eq!(cli.command, vec!["echo", "hello"]);
        assert!(!cli.debug);
    }

    #[test]
    fn command_is_required_without_check() {
        assert!(Cli::try_parse_from(["calm"]).is_err());
        let cli = Cli::try_parse_from(["calm", "--check"]).unwrap();
        assert!(cli.check);
        assert!(cli.command.is_empty());
    }

    #[test]
    fn rejects_negative_cpu() {
        assert!(Cli::try_parse_from(["calm", "--cpu", "-5", "true"]).is_err());
    }
}
