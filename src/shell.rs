//! Line-oriented shell built on [`Engine`].
//!
//! The shell owns an engine with a few built-in commands and a [`Session`]
//! that handlers write their output into. Hosts can register more commands
//! through [`Shell::engine`].

use std::io::{self, BufRead, Write};

use anyhow::bail;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::{CommandInfo, Engine, HandlerResult};
use crate::error::EngineError;

/// Context handed to every shell command.
#[derive(Debug, Default)]
pub struct Session {
    /// Authorization level of the session.
    pub level: i32,
    /// Lines produced by the last command.
    pub output: Vec<String>,
    /// Commands available at `level`, refreshed before each dispatch.
    pub catalog: Vec<CommandInfo>,
    /// Set by `exit`; the runner stops reading lines.
    pub finished: bool,
}

impl Session {
    /// Creates a session running at `level`.
    pub fn new(level: i32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Appends a line of output.
    pub fn print(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }
}

/// A built-in shell command.
struct Builtin {
    name: &'static str,
    help: &'static str,
    handler: fn(&mut Session, &[String]) -> HandlerResult,
}

static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "help",
        help: "List available commands, or show help for one",
        handler: handle_help,
    },
    Builtin {
        name: "echo",
        help: "Print the arguments",
        handler: handle_echo,
    },
    Builtin {
        name: "level",
        help: "Show the session's authorization level",
        handler: handle_level,
    },
    Builtin {
        name: "exit",
        help: "End the session",
        handler: handle_exit,
    },
];

/// Handle `help [name]`.
fn handle_help(session: &mut Session, args: &[String]) -> HandlerResult {
    match args {
        [] => {
            let lines: Vec<String> = session
                .catalog
                .iter()
                .map(|info| format!("  {:<10} - {}", info.name, info.help))
                .collect();
            session.print("Available commands:");
            session.output.extend(lines);
            Ok(())
        }
        [name] => {
            let Some(info) = session.catalog.iter().find(|info| &info.name == name) else {
                bail!("no help for \"{name}\"");
            };
            let line = format!("{} - {}", info.name, info.help);
            session.print(line);
            Ok(())
        }
        _ => bail!("Usage: help [command]"),
    }
}

/// Handle `echo <args...>`.
fn handle_echo(session: &mut Session, args: &[String]) -> HandlerResult {
    session.print(args.join(" "));
    Ok(())
}

/// Handle `level`.
fn handle_level(session: &mut Session, _args: &[String]) -> HandlerResult {
    let line = session.level.to_string();
    session.print(line);
    Ok(())
}

/// Handle `exit`.
fn handle_exit(session: &mut Session, _args: &[String]) -> HandlerResult {
    session.finished = true;
    Ok(())
}

/// Totals from a run over several lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines dispatched, blank lines excluded.
    pub executed: usize,
    /// Lines that returned an error.
    pub failed: usize,
    /// Whether the run ended through `exit`.
    pub exited: bool,
}

impl RunSummary {
    /// Returns true if no line failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Command shell: an engine, its session, and the runner settings.
pub struct Shell {
    engine: Engine<Session>,
    session: Session,
    stop_on_error: bool,
}

impl Shell {
    /// Creates a shell with the built-in commands, applying config overrides.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        let engine: Engine<Session> = Engine::new();

        for name in config.commands.keys() {
            if !BUILTINS.iter().any(|b| b.name == name) {
                warn!(command = %name, "Config overrides unknown command; ignoring");
            }
        }

        for builtin in BUILTINS {
            let overrides = config.command(builtin.name).cloned().unwrap_or_default();
            if overrides.disabled {
                debug!(command = builtin.name, "Built-in command disabled by config");
                continue;
            }

            engine.add_command(
                builtin.name,
                overrides.help.unwrap_or_else(|| builtin.help.to_string()),
                builtin.handler,
                overrides.min_level.unwrap_or(0),
            )?;
        }

        Ok(Self {
            engine,
            session: Session::new(config.session.level),
            stop_on_error: config.session.stop_on_error,
        })
    }

    /// The engine commands are dispatched through.
    pub fn engine(&self) -> &Engine<Session> {
        &self.engine
    }

    /// The session handed to every command.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Executes one line and returns the output it produced.
    ///
    /// Blank lines are skipped and produce no output.
    pub fn run_line(&mut self, line: &str) -> Result<Vec<String>, EngineError> {
        self.session.output.clear();
        self.session.catalog = self.engine.commands_for(self.session.level);

        let level = self.session.level;
        match self.engine.exec_string(&mut self.session, level, line) {
            Ok(()) | Err(EngineError::EmptyCommand) => {
                Ok(std::mem::take(&mut self.session.output))
            }
            Err(err) => Err(err),
        }
    }

    /// Executes `lines` in order, writing output to `out` and errors to `err`.
    ///
    /// Stops after `exit`, or at the first failure when `stop_on_error` is set.
    pub fn run_lines<I, S, O, E>(
        &mut self,
        lines: I,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<RunSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        O: Write,
        E: Write,
    {
        let mut summary = RunSummary::default();
        for line in lines {
            if !self.step(line.as_ref(), &mut summary, out, err)? {
                break;
            }
        }

        out.flush()?;
        Ok(summary)
    }

    /// Like [`Shell::run_lines`], reading lines from `reader` as they arrive.
    ///
    /// A read error, including invalid UTF-8, ends the run and is returned.
    pub fn run_reader<R, O, E>(
        &mut self,
        reader: R,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<RunSummary>
    where
        R: BufRead,
        O: Write,
        E: Write,
    {
        let mut summary = RunSummary::default();
        for line in reader.lines() {
            if !self.step(&line?, &mut summary, out, err)? {
                break;
            }
        }

        out.flush()?;
        Ok(summary)
    }

    /// Runs one line for a runner. Returns false when the runner should stop.
    fn step<O, E>(
        &mut self,
        line: &str,
        summary: &mut RunSummary,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<bool>
    where
        O: Write,
        E: Write,
    {
        if line.trim().is_empty() {
            return Ok(true);
        }

        summary.executed += 1;
        match self.run_line(line) {
            Ok(output) => {
                for text in output {
                    writeln!(out, "{text}")?;
                }
            }
            Err(e) => {
                summary.failed += 1;
                debug!(category = e.category(), line, "Command failed");
                writeln!(err, "error: {e}")?;
                if self.stop_on_error {
                    return Ok(false);
                }
            }
        }

        if self.session.finished {
            summary.exited = true;
            return Ok(false);
        }
        Ok(true)
    }
}
