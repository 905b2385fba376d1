use anyhow::Result;
use argh::FromArgs;
use deep_sea_shell::{Config, Environment, builtin, console};
use std::path::Path;

/// Deep Sea Shell: runs dss scripts, or starts an interactive console.
#[derive(FromArgs)]
struct Args {
    /// report statements whose keyword is not a defined command
    #[argh(switch)]
    strict: bool,

    /// cap on drain generations per submitted script, 0 for no cap
    #[argh(option)]
    max_generations: Option<usize>,

    /// name shown in the console prompt
    #[argh(option)]
    name: Option<String>,

    /// scripts to run in order; the console starts when none are given
    #[argh(positional)]
    scripts: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = Config::from_env();
    if args.strict {
        config.report_unknown_commands = true;
    }
    if let Some(limit) = args.max_generations {
        config.max_generations = (limit > 0).then_some(limit);
    }
    if let Some(name) = args.name {
        config.cli_name = name;
    }
    let name = config.cli_name.clone();

    let mut env = Environment::with_config(config);
    let id = env.init();
    let executor = env.executor_by_id(id)?;

    if args.scripts.is_empty() {
        console::run(executor, &name)?;
        return Ok(());
    }

    for script in &args.scripts {
        if let Err(e) = builtin::run_file(executor, Path::new(script)) {
            log::error!("{}: {}", script, e);
            eprintln!("\nerror: {}\n", e);
        }
    }
    Ok(())
}
