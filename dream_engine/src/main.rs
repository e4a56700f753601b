use anyhow::Result;
use env_logger::{Builder, Env};

mod cli;
mod runtime;

fn main() -> Result<()> {
    let options = cli::parse()?;
    let default_filter = if options.verbose { "debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();
    runtime::execute(options)
}
