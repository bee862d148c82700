use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use pabook::{display::failure, run_shell, App, Cli, Config, Result};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    debug!("Logger initialized");
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().or_else(Config::default_path);
    let stored_config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut app = App::new(stored_config, cli.path_overrides(), config_path);
    match cli.command {
        Some(command) => app.run(command),
        None => run_shell(&mut app),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);
    info!("Application starting up");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            failure(format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
