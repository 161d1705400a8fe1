//! Command registry and dispatch.
//!
//! The [`Engine`] maps command names to handlers, each gated by a minimum
//! caller level. Lines can be dispatched pre-tokenized with [`Engine::exec`]
//! or raw with [`Engine::exec_string`].
//!
//! The context type `C` is chosen by the host and passed to handlers
//! untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::tokenizer::Tokenizer;

/// Result returned by command handlers.
pub type HandlerResult = anyhow::Result<()>;

/// Function invoked when its command is dispatched.
pub type HandlerFn<C> = dyn Fn(&mut C, &[String]) -> HandlerResult + Send + Sync;

/// A registered command. Immutable once stored.
struct CommandEntry<C> {
    handler: Arc<HandlerFn<C>>,
    min_level: i32,
    help: String,
}

// Manual impl: a derive would require `C: Clone`.
impl<C> Clone for CommandEntry<C> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            min_level: self.min_level,
            help: self.help.clone(),
        }
    }
}

/// Snapshot of a registered command's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Command name.
    pub name: String,
    /// Help text as registered.
    pub help: String,
    /// Minimum caller level.
    pub min_level: i32,
}

/// Registry of command handlers.
pub struct Engine<C> {
    commands: RwLock<HashMap<String, CommandEntry<C>>>,
    tokenizer: Tokenizer,
}

impl<C> Engine<C> {
    /// Creates an engine with no commands.
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(HashMap::new()),
            tokenizer: Tokenizer::new(),
        }
    }

    /// Registers `handler` under `name`.
    ///
    /// Callers with a level of at least `min_level` may run it. Fails without
    /// touching the registry if `name` is empty or already registered.
    pub fn add_command<F>(
        &self,
        name: impl Into<String>,
        help: impl Into<String>,
        handler: F,
        min_level: i32,
    ) -> Result<()>
    where
        F: Fn(&mut C, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(EngineError::InvalidName);
        }

        let mut commands = self.commands.write();
        if commands.contains_key(&name) {
            return Err(EngineError::AlreadyRegistered(name));
        }

        debug!(command = %name, min_level, "Registering command");
        commands.insert(
            name,
            CommandEntry {
                handler: Arc::new(handler),
                min_level,
                help: help.into(),
            },
        );
        Ok(())
    }

    /// Removes the command registered under `name`.
    pub fn remove_command(&self, name: &str) -> Result<()> {
        match self.commands.write().remove(name) {
            Some(_) => {
                debug!(command = %name, "Removed command");
                Ok(())
            }
            None => Err(EngineError::NotRegistered(name.to_string())),
        }
    }

    /// Executes an already tokenized command.
    ///
    /// `args[0]` names the command and the rest is handed to the handler.
    /// Errors returned by the handler come back as [`EngineError::Handler`]
    /// holding the handler's own error value.
    pub fn exec(&self, ctx: &mut C, level: i32, args: &[String]) -> Result<()> {
        let (name, rest) = args.split_first().ok_or(EngineError::EmptyCommand)?;

        // Clone the entry out so the lock is released before the handler runs.
        let entry = self
            .commands
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::CommandNotFound(name.clone()))?;

        if level < entry.min_level {
            return Err(EngineError::InsufficientPrivilege {
                command: name.clone(),
                level,
                required: entry.min_level,
            });
        }

        trace!(command = %name, args = rest.len(), level, "Dispatching command");
        (entry.handler)(ctx, rest).map_err(EngineError::Handler)
    }

    /// Tokenizes `line` and executes the result.
    pub fn exec_string(&self, ctx: &mut C, level: i32, line: &str) -> Result<()> {
        let args = self.tokenizer.tokenize(line)?;
        self.exec(ctx, level, &args)
    }

    /// Returns true if a command is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.read().contains_key(name)
    }

    /// Returns the help text registered for `name`.
    pub fn help(&self, name: &str) -> Option<String> {
        self.commands.read().get(name).map(|e| e.help.clone())
    }

    /// Returns the minimum level registered for `name`.
    pub fn min_level(&self, name: &str) -> Option<i32> {
        self.commands.read().get(name).map(|e| e.min_level)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    /// Returns true if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }

    /// Lists all registered commands, sorted by name.
    pub fn commands(&self) -> Vec<CommandInfo> {
        let mut infos: Vec<CommandInfo> = self
            .commands
            .read()
            .iter()
            .map(|(name, entry)| CommandInfo {
                name: name.clone(),
                help: entry.help.clone(),
                min_level: entry.min_level,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Lists the commands a caller at `level` is allowed to run.
    pub fn commands_for(&self, level: i32) -> Vec<CommandInfo> {
        let mut infos = self.commands();
        infos.retain(|info| level >= info.min_level);
        infos
    }
}

impl<C> Default for Engine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.commands().into_iter().map(|c| c.name).collect();
        f.debug_struct("Engine").field("commands", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Records the args each handler call received.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Vec<String>>,
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn recording_engine(min_level: i32) -> Engine<Recorder> {
        let engine = Engine::new();
        engine
            .add_command(
                "test",
                "help",
                |ctx: &mut Recorder, args: &[String]| {
                    ctx.calls.push(args.to_vec());
                    if args.first().map(String::as_str) == Some("bad") {
                        anyhow::bail!("bad");
                    }
                    Ok(())
                },
                min_level,
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_new_engine_is_empty() {
        let engine: Engine<()> = Engine::new();
        assert!(engine.is_empty());
        assert_eq!(engine.len(), 0);
        assert!(engine.commands().is_empty());
    }

    #[test]
    fn test_add_command() {
        let engine: Engine<()> = Engine::new();
        engine.add_command("test", "help", |_, _| Ok(()), 0).unwrap();

        assert!(engine.contains("test"));
        assert_eq!(engine.help("test"), Some("help".to_string()));
        assert_eq!(engine.min_level("test"), Some(0));
    }

    #[test]
    fn test_duplicate_add_keeps_original() {
        let engine: Engine<()> = Engine::new();
        engine.add_command("test", "first", |_, _| Ok(()), 1).unwrap();

        let err = engine
            .add_command("test", "second", |_, _| Err(anyhow::anyhow!("replaced")), 5)
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyRegistered(ref n) if n == "test"));

        assert_eq!(engine.help("test"), Some("first".to_string()));
        assert_eq!(engine.min_level("test"), Some(1));
        assert!(engine.exec(&mut (), 1, &args(&["test"])).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let engine: Engine<()> = Engine::new();
        let err = engine.add_command("", "help", |_, _| Ok(()), 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidName));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let engine: Engine<()> = Engine::new();
        engine.add_command("test", "help", |_, _| Ok(()), 0).unwrap();
        engine.add_command("TEST", "help", |_, _| Ok(()), 0).unwrap();
        assert_eq!(engine.len(), 2);

        let err = engine.exec(&mut (), 0, &args(&["Test"])).unwrap_err();
        assert!(matches!(err, EngineError::CommandNotFound(_)));
    }

    #[test]
    fn test_remove_command() {
        let engine: Engine<()> = Engine::new();

        let err = engine.remove_command("test").unwrap_err();
        assert!(matches!(err, EngineError::NotRegistered(ref n) if n == "test"));

        engine.add_command("test", "help", |_, _| Ok(()), 0).unwrap();
        engine.remove_command("test").unwrap();
        assert!(!engine.contains("test"));

        let err = engine.exec_string(&mut (), 10, "test").unwrap_err();
        assert!(matches!(err, EngineError::CommandNotFound(_)));
    }

    #[test]
    fn test_remove_absent_leaves_registry() {
        let engine: Engine<()> = Engine::new();
        engine.add_command("keep", "help", |_, _| Ok(()), 0).unwrap();

        assert!(engine.remove_command("other").is_err());
        assert_eq!(engine.len(), 1);
        assert!(engine.contains("keep"));
    }

    #[test]
    fn test_readd_after_remove() {
        let engine: Engine<()> = Engine::new();
        engine.add_command("test", "old", |_, _| Ok(()), 0).unwrap();
        engine.remove_command("test").unwrap();
        engine.add_command("test", "new", |_, _| Ok(()), 3).unwrap();

        assert_eq!(engine.help("test"), Some("new".to_string()));
        assert_eq!(engine.min_level("test"), Some(3));
    }

    #[test]
    fn test_exec_table() {
        let engine = recording_engine(0);

        struct Case {
            level: i32,
            args: Vec<String>,
            error_expected: bool,
            handler_called: bool,
        }
        let cases = vec![
            Case { level: 0, args: args(&[]), error_expected: true, handler_called: false },
            Case { level: 0, args: args(&["nope"]), error_expected: true, handler_called: false },
            Case { level: -1, args: args(&["test"]), error_expected: true, handler_called: false },
            Case { level: 0, args: args(&["test"]), error_expected: false, handler_called: true },
            Case { level: 0, args: args(&["test", "good"]), error_expected: false, handler_called: true },
            Case { level: 0, args: args(&["test", "bad"]), error_expected: true, handler_called: true },
        ];

        for (i, case) in cases.iter().enumerate() {
            let mut ctx = Recorder::default();
            let result = engine.exec(&mut ctx, case.level, &case.args);
            assert_eq!(result.is_err(), case.error_expected, "case {i}");

            if case.handler_called {
                assert_eq!(ctx.calls, vec![case.args[1..].to_vec()], "case {i}");
            } else {
                assert!(ctx.calls.is_empty(), "case {i}");
            }
        }
    }

    #[test]
    fn test_exec_empty_args() {
        let engine = recording_engine(0);
        let err = engine.exec(&mut Recorder::default(), 0, &[]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyCommand));
    }

    #[test]
    fn test_authorization_boundary() {
        let engine = recording_engine(5);
        let mut ctx = Recorder::default();

        engine.exec(&mut ctx, 5, &args(&["test"])).unwrap();
        engine.exec(&mut ctx, 6, &args(&["test"])).unwrap();
        assert_eq!(ctx.calls.len(), 2);

        let err = engine.exec(&mut ctx, 4, &args(&["test"])).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientPrivilege { level: 4, required: 5, .. }
        ));
        assert_eq!(ctx.calls.len(), 2);
    }

    #[test]
    fn test_negative_level_denied_for_positive_minimum() {
        let engine = recording_engine(1);
        let mut ctx = Recorder::default();
        let err = engine.exec(&mut ctx, -3, &args(&["test"])).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientPrivilege { .. }));
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn test_handler_error_passthrough() {
        #[derive(Debug, PartialEq, Eq, thiserror::Error)]
        #[error("disk full")]
        struct DiskFull;

        let engine: Engine<()> = Engine::new();
        engine
            .add_command("write", "help", |_, _| Err(DiskFull.into()), 0)
            .unwrap();

        let err = engine.exec(&mut (), 0, &args(&["write"])).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        let inner = err.as_handler_error().unwrap();
        assert_eq!(inner.downcast_ref::<DiskFull>(), Some(&DiskFull));

        let err = engine.exec_string(&mut (), 0, "write").unwrap_err();
        assert!(matches!(err, EngineError::Handler(ref e) if e.is::<DiskFull>()));
    }

    #[test]
    fn test_exec_string_table() {
        let engine = recording_engine(0);

        let cases: Vec<(i32, &str, bool, Option<Vec<String>>)> = vec![
            (0, "\"", true, None),
            (0, "", true, None),
            (0, "nope", true, None),
            (-1, "test", true, None),
            (0, "test", false, Some(args(&[]))),
            (0, "test good", false, Some(args(&["good"]))),
            (0, "test bad", true, Some(args(&["bad"]))),
        ];

        for (i, (level, line, error_expected, expected_args)) in cases.into_iter().enumerate() {
            let mut ctx = Recorder::default();
            let result = engine.exec_string(&mut ctx, level, line);
            assert_eq!(result.is_err(), error_expected, "case {i}");

            match expected_args {
                Some(expected) => assert_eq!(ctx.calls, vec![expected], "case {i}"),
                None => assert!(ctx.calls.is_empty(), "case {i}"),
            }
        }
    }

    #[test]
    fn test_exec_string_error_kinds() {
        let engine = recording_engine(0);
        let mut ctx = Recorder::default();

        let err = engine.exec_string(&mut ctx, 0, "\"").unwrap_err();
        assert!(matches!(err, EngineError::Syntax(_)));

        let err = engine.exec_string(&mut ctx, 0, "").unwrap_err();
        assert!(matches!(err, EngineError::EmptyCommand));

        let err = engine.exec_string(&mut ctx, 0, "  \t ").unwrap_err();
        assert!(matches!(err, EngineError::EmptyCommand));

        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn test_exec_string_matches_exec() {
        let engine = recording_engine(0);

        let mut direct = Recorder::default();
        engine.exec(&mut direct, 0, &args(&["test", "good"])).unwrap();

        let mut parsed = Recorder::default();
        engine.exec_string(&mut parsed, 0, "test good").unwrap();

        assert_eq!(direct.calls, parsed.calls);
    }

    #[test]
    fn test_exec_string_strips_quotes() {
        let engine = recording_engine(0);
        let mut ctx = Recorder::default();
        engine
            .exec_string(&mut ctx, 0, r#"test "two words" 'single' plain"#)
            .unwrap();
        assert_eq!(ctx.calls, vec![args(&["two words", "single", "plain"])]);
    }

    #[test]
    fn test_exec_string_keeps_hash_arguments() {
        let engine = recording_engine(0);

        let mut parsed = Recorder::default();
        engine.exec_string(&mut parsed, 0, "test #rust now").unwrap();
        assert_eq!(parsed.calls, vec![args(&["#rust", "now"])]);

        let mut direct = Recorder::default();
        engine.exec(&mut direct, 0, &args(&["test", "#rust", "now"])).unwrap();
        assert_eq!(parsed.calls, direct.calls);
    }

    #[test]
    fn test_commands_sorted_and_filtered() {
        let engine: Engine<()> = Engine::new();
        engine.add_command("zap", "zap it", |_, _| Ok(()), 10).unwrap();
        engine.add_command("echo", "print", |_, _| Ok(()), 0).unwrap();
        engine.add_command("kick", "kick user", |_, _| Ok(()), 5).unwrap();

        let names: Vec<String> = engine.commands().into_iter().map(|c| c.name).collect();
        assert_eq!(names, args(&["echo", "kick", "zap"]));

        let visible = engine.commands_for(5);
        assert_eq!(
            visible,
            vec![
                CommandInfo { name: "echo".to_string(), help: "print".to_string(), min_level: 0 },
                CommandInfo { name: "kick".to_string(), help: "kick user".to_string(), min_level: 5 },
            ]
        );
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine<()>>();
        assert_send_sync::<Engine<std::rc::Rc<()>>>();
    }
}
