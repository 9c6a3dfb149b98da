use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calm")]
#[command(version, about = "Run a program using cgroup resource limits", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Half of the machine's CPU time and 2 GB of memory, as nobody
    calm --cpu 50 --memory 2G --user nobody make -j8

    # Settings from /etc/calm.json, overridden by CALM_MEMORY/CALM_CPU/CALM_USER
    CALM_MEMORY=512M calm google-chrome

    # Check whether this host can run calm
    calm --check
")]
pub struct Cli {
    /// Command to run, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "check"
    )]
    pub command: Vec<String>,

    /// Memory limit, decimal units (512M, 2G); 0 for unlimited
    #[arg(short, long, value_name = "SIZE")]
    pub memory: Option<String>,

    /// CPU limit as a percentage of all cores combined; 0 for unlimited
    #[arg(short, long, value_name = "PERCENT")]
    pub cpu: Option<u32>,

    /// User to run the command as
    #[arg(short, long, value_name = "USER")]
    pub user: Option<String>,

    /// Cgroup group name; the scope is /<NAME>/<NAME>-<pid>
    #[arg(long, value_name = "NAME")]
    pub group: Option<String>,

    /// Settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print debug output to stderr
    #[arg(long)]
    pub debug: bool,

    /// Check host requirements and exit
    #[arg(long)]
    pub check: bool,
}
