//! Deep Sea Shell: a small line-oriented scripting engine.
//!
//! Scripts are lists of statements, one per line, each a keyword followed by
//! space-separated arguments. Every script submitted to an [`Executor`] becomes
//! a [`Task`] that runs in two passes: a preprocessor pass whose commands may
//! rewrite the script (aliases, sourcing other files), then a command pass over
//! the rewritten text. Tasks queued while a task runs are drained generation by
//! generation, so nested scripts never run re-entrantly.
//!
//! Commands are contributed by definers, which re-register them at the start of
//! each pass. An [`Environment`] owns the definers shared by its executors
//! together with the error table used to describe failing status codes.
//!
//! ```
//! use deep_sea_shell::{Environment, MemWriter};
//!
//! let out = MemWriter::new();
//! let mut env = Environment::new();
//! env.init();
//! let id = env.spawn_executor_with(|b| b.stdout(out.clone()));
//! let ex = env.executor_by_id(id).unwrap();
//! ex.exec("alias_def WHO world\nout hello $WHO").unwrap();
//! assert_eq!(out.contents(), "hello world\n");
//! ```

pub mod builtin;
pub mod command;
pub mod config;
pub mod console;
pub mod delegate;
pub mod diagnostic;
pub mod env;
pub mod error_table;
pub mod executor;
pub mod io_adapters;
pub mod task;
pub mod text;
pub mod vars;

pub use command::{Command, Definer, Handler, StatusCode};
pub use config::Config;
pub use delegate::Delegate;
pub use diagnostic::{Diagnostic, EngineError};
pub use env::Environment;
pub use error_table::{ErrorKey, ErrorTable};
pub use executor::{Executor, ExecutorBuilder, Pass, RunId};
pub use io_adapters::MemWriter;
pub use task::Task;
pub use vars::{Alias, Value, Vars};
