use calm::{Calm, CalmError, CommandSpec, Result, StdStreams};
use log::{debug, info};
use std::path::PathBuf;

use crate::config::{self, Layer};

/// Everything the command line contributes to one launch
pub struct RunConfig {
    pub command: Vec<String>,
    pub flags: Layer,
    pub config_path: Option<PathBuf>,
}

pub fn run_calm(run: RunConfig) -> Result<()> {
    let file = Layer::from_file(run.config_path.as_deref())?;
    let env = Layer::from_env(|key| std::env::var(key).ok())?;
    let settings = config::resolve([file, env, run.flags]);
    debug!("Resolved settings: {:?}", settings);

    let mut words = run.command.into_iter();
    let program = words
        .next()
        .ok_or_else(|| CalmError::InvalidConfig("no command given".to_string()))?;
    let command = CommandSpec::new(program, words.collect());

    info!("Executing: {}", command.command_line());
    Calm::new().run(&settings, &command, StdStreams::inherit())
}
