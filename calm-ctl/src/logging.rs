use console::style;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

/// Initialize the stderr logger. `--debug` lowers the default filter to
/// `debug`; an explicit `RUST_LOG` still wins.
pub fn init_logger(debug: bool) {
    let env = Env::default().default_filter_or(if debug { "debug" } else { "warn" });

    Builder::from_env(env)
        .format(move |buf, record| {
            let level = match record.level() {
                Level::Error => style("ERROR").red().bold(),
                Level::Warn => style("WARN ").yellow().bold(),
                Level::Info => style("INFO ").green(),
                Level::Debug => style("DEBUG").yellow(),
                Level::Trace => style("TRACE").dim(),
            };
            if debug {
                writeln!(
                    buf,
                    "{} {} {}",
                    level,
                    style(record.target()).dim(),
                    record.args()
                )
            } else {
                writeln!(buf, "{} {}", level, record.args())
            }
        })
        .init();
}
