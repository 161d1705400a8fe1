//! cmd-engine - a command registry and dispatcher.
//!
//! Commands are registered on an [`Engine`] under a name, with help text and
//! a minimum authorization level. Callers dispatch either an argument vector
//! or a raw line, which is split shell-style first.
//!
//! ```
//! use cmd_engine::Engine;
//!
//! let engine: Engine<Vec<String>> = Engine::new();
//! engine
//!     .add_command("greet", "Say hello", |out: &mut Vec<String>, args: &[String]| {
//!         out.push(format!("hello {}", args.join(" ")));
//!         Ok(())
//!     }, 0)
//!     .unwrap();
//!
//! let mut out = Vec::new();
//! engine.exec_string(&mut out, 0, "greet 'big world'").unwrap();
//! assert_eq!(out, vec!["hello big world"]);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod shell;
pub mod tokenizer;

pub use engine::{CommandInfo, Engine, HandlerFn, HandlerResult};
pub use error::{ConfigError, EngineError};
pub use tokenizer::{TokenizeError, Tokenizer};
