//! Command-line argument parsing for `cmdeng`.
//!
//! Uses clap to parse CLI arguments.

use clap::Parser;
use cmd_engine::config::Config;
use std::path::PathBuf;

/// Where the shell reads its command lines from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Lines given with `--command`.
    Commands(Vec<String>),
    /// A script file.
    Script(PathBuf),
    /// Standard input.
    Stdin,
}

/// Run command lines through a command engine.
#[derive(Parser, Debug)]
#[command(name = "cmdeng")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "CMDENG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Authorization level for the session (overrides config)
    #[arg(short = 'l', long, value_name = "LEVEL", allow_negative_numbers = true)]
    pub level: Option<i32>,

    /// Command line to run; may be given several times
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    pub commands: Vec<String>,

    /// Script with one command per line (use "-" for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "commands")]
    pub script: Option<String>,

    /// Stop at the first failing line
    #[arg(long)]
    pub stop_on_error: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies CLI overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(level) = self.level {
            config.session.level = level;
        }
        if self.stop_on_error {
            config.session.stop_on_error = true;
        }
    }

    /// Returns where command lines should be read from.
    pub fn input(&self) -> Input {
        if !self.commands.is_empty() {
            return Input::Commands(self.commands.clone());
        }

        match self.script.as_deref() {
            None | Some("-") => Input::Stdin,
            Some(path) => Input::Script(PathBuf::from(path)),
        }
    }
}
