//! cmdeng - run command lines through a command engine.

mod cli;
mod logging;

use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cli::{Cli, Input};
use cmd_engine::config::Config;
use cmd_engine::shell::{RunSummary, Shell};
use tracing::{error, info};

fn main() -> ExitCode {
    logging::init_stderr_logging();

    match run() {
        Ok(summary) if summary.success() => ExitCode::SUCCESS,
        Ok(summary) => {
            info!(failed = summary.failed, "Some commands failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<RunSummary> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);

    let mut shell = Shell::new(&config).context("Failed to register built-in commands")?;
    info!(
        level = config.session.level,
        commands = shell.engine().len(),
        "Shell ready"
    );

    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();

    let summary = match cli.input() {
        Input::Commands(lines) => shell.run_lines(lines, &mut out, &mut err)?,
        Input::Script(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            shell.run_lines(content.lines(), &mut out, &mut err)?
        }
        Input::Stdin => shell
            .run_reader(io::stdin().lock(), &mut out, &mut err)
            .context("Failed to read stdin")?,
    };

    Ok(summary)
}
