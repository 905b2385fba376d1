use crate::command::{INTERNAL_FAILURE, StatusCode};
use crate::diagnostic::EngineError;
use crate::error_table::{ErrorKey, codes};
use crate::executor::Executor;
use crate::task::Task;
use crate::text;
use crate::vars::{AUTO_PREPROCESSOR_VAR, Alias, Value};
use anyhow::{Context, Result};
use std::cmp::Reverse;
use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Variable holding the defined aliases.
pub const ALIAS_VAR: &str = "alias";

/// Prefix marking an alias reference in a script, as in `$NAME`.
pub const ALIAS_DEREF: &str = "$";

/// Keyword of the preprocessor that applies aliases.
pub const ALIAS_USE: &str = "alias";

/// Status returned by `src` when the script cannot be read.
pub const SCRIPT_UNREADABLE: StatusCode = 2;

const NULL_ENVIRONMENT: &str = "internal interpreter error, critical data unexpectedly returned null.\n\nnote: this error requires the attention of a developer";

/// Built-in commands shipped with the shell.
///
/// Builtins are plain types whose associated functions describe the command
/// and run it. A builtin returns `Err` for unexpected I/O failures; those are
/// logged and reported as [`INTERNAL_FAILURE`].
pub(crate) trait BuiltinCommand {
    /// Keyword of the command, e.g. "out" or "cd".
    fn name() -> &'static str;

    /// One-line manual shown by `help`.
    fn description() -> &'static str;

    /// Accepted argument count as `(min, max)`.
    fn arity() -> (Option<usize>, Option<usize>);

    /// Executes the command. 0 for success, non-zero for a described failure.
    fn execute(executor: &mut Executor, args: &[String]) -> Result<StatusCode>;
}

fn run<T: BuiltinCommand>(executor: &mut Executor, args: &[String]) -> StatusCode {
    match T::execute(executor, args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}: {:#}", T::name(), e);
            INTERNAL_FAILURE
        }
    }
}

fn define<T: BuiltinCommand + 'static>(executor: &mut Executor) -> Result<(), EngineError> {
    let (min, max) = T::arity();
    executor.define_command(run::<T>, T::name(), T::description(), min, max)?;
    Ok(())
}

/// Defines `src`, `alias_def` and `alias` for the preprocessor pass.
pub fn preprocessor_definer(executor: &mut Executor) -> Result<(), EngineError> {
    define::<Src>(executor)?;
    define::<AliasDef>(executor)?;
    define::<AliasApply>(executor)?;
    Ok(())
}

/// Defines `out`, `cd`, `ls` and `help` for the command pass.
pub fn command_definer(executor: &mut Executor) -> Result<(), EngineError> {
    define::<Out>(executor)?;
    define::<Cd>(executor)?;
    define::<Ls>(executor)?;
    define::<Help>(executor)?;
    Ok(())
}

/// Error messages of the built-in commands.
pub fn error_key() -> ErrorKey {
    ErrorKey::from([
        (Out::name().to_string(), codes([(1, NULL_ENVIRONMENT)])),
        (
            Src::name().to_string(),
            codes([
                (1, NULL_ENVIRONMENT),
                (
                    SCRIPT_UNREADABLE,
                    "failed to queue script, file does not exist",
                ),
            ]),
        ),
        (AliasDef::name().to_string(), codes([(1, NULL_ENVIRONMENT)])),
        (
            AliasApply::name().to_string(),
            codes([(
                1,
                "automatic command failure, no aliases are defined\n\nhelp: did you mean \"alias_def\"?",
            )]),
        ),
        (Cd::name().to_string(), codes([(1, "file does not exist")])),
        (Ls::name().to_string(), codes([(1, NULL_ENVIRONMENT)])),
        (
            Help::name().to_string(),
            codes([(1, "no command with that name is defined")]),
        ),
    ])
}

/// Write the arguments to the output, separated by spaces, with a trailing newline.
pub struct Out;

impl BuiltinCommand for Out {
    fn name() -> &'static str {
        "out"
    }

    fn description() -> &'static str {
        "outputs to console"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (Some(1), None)
    }

    fn execute(executor: &mut Executor, args: &[String]) -> Result<StatusCode> {
        writeln!(executor.stdout(), "{}", args.join(" "))?;
        Ok(0)
    }
}

/// Change the process working directory.
pub struct Cd;

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn description() -> &'static str {
        "changes the current directory"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (Some(1), Some(1))
    }

    fn execute(_executor: &mut Executor, args: &[String]) -> Result<StatusCode> {
        let target = Path::new(&args[0]);
        if !target.exists() {
            return Ok(1);
        }

        let canonical = fs::canonicalize(target)
            .with_context(|| format!("cd: can't canonicalize {}", target.display()))?;
        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        Ok(0)
    }
}

/// List the entries of the current directory.
pub struct Ls;

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn description() -> &'static str {
        "lists all files and directories in the current directory (.)"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (Some(0), Some(0))
    }

    fn execute(executor: &mut Executor, _args: &[String]) -> Result<StatusCode> {
        let mut entries = fs::read_dir(".")
            .context("ls: can't read current directory")?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .context("ls: can't read directory entry")?;
        entries.sort();

        let out = executor.stdout();
        for path in entries {
            writeln!(out, "{}", path.display())?;
        }
        Ok(0)
    }
}

/// Queue the script at a path as a new task.
pub struct Src;

impl BuiltinCommand for Src {
    fn name() -> &'static str {
        "src"
    }

    fn description() -> &'static str {
        "runs a dss script at path <path>"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (Some(1), Some(1))
    }

    fn execute(executor: &mut Executor, args: &[String]) -> Result<StatusCode> {
        match read_script(Path::new(&args[0])) {
            Some(script) => {
                executor.queue_task(Task::new(script));
                Ok(0)
            }
            None => Ok(SCRIPT_UNREADABLE),
        }
    }
}

fn read_script(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .with_context(|| format!("src: can't read {}", path.display()))
        .map_err(|e| log::debug!("{:#}", e))
        .ok()
}

/// Run the script file at `path` on `executor`.
///
/// The path is used as is, so it may contain spaces. An unreadable file is
/// reported the way `src` reports it and nothing runs.
pub fn run_file(executor: &mut Executor, path: &Path) -> Result<StatusCode, EngineError> {
    match read_script(path) {
        Some(script) => {
            executor.exec(script)?;
            Ok(0)
        }
        None => {
            executor.report_status(Src::name(), SCRIPT_UNREADABLE, 0);
            Ok(SCRIPT_UNREADABLE)
        }
    }
}

/// Define (or redefine) an alias and switch on automatic alias substitution.
pub struct AliasDef;

impl BuiltinCommand for AliasDef {
    fn name() -> &'static str {
        "alias_def"
    }

    fn description() -> &'static str {
        "creates an alias: alias_def <id> <value...>"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (Some(2), None)
    }

    fn execute(executor: &mut Executor, args: &[String]) -> Result<StatusCode> {
        let vars = executor.vars_mut();
        vars.append_unique(AUTO_PREPROCESSOR_VAR, ALIAS_USE);

        let id = args[0].as_str();
        let alias = Alias::new(id, args[1..].concat());
        let var = vars.get_or_create(ALIAS_VAR);
        let same_id = |value: &Value| matches!(value, Value::Alias(a) if a.id == id);
        if !var.replace_where(same_id, alias.clone()) {
            var.append_unique(alias);
        }
        Ok(0)
    }
}

/// Substitute every `$id` in the running script with the alias value.
///
/// Longer ids are substituted first so that `$AB` is never consumed by an
/// alias named `A`.
pub struct AliasApply;

impl BuiltinCommand for AliasApply {
    fn name() -> &'static str {
        ALIAS_USE
    }

    fn description() -> &'static str {
        "applies aliases"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (None, None)
    }

    fn execute(executor: &mut Executor, _args: &[String]) -> Result<StatusCode> {
        let Some(var) = executor.vars_mut().get_mut(ALIAS_VAR) else {
            return Ok(1);
        };
        var.sort_by_key(|value| Reverse(value.as_alias().map_or(0, |a| a.id.len())));
        let aliases: Vec<Alias> = var.aliases().cloned().collect();

        let Some(task) = executor.current_task_mut() else {
            return Ok(1);
        };
        for alias in &aliases {
            let reference = format!("{}{}", ALIAS_DEREF, alias.id);
            text::replace_all(task.script_mut(), &reference, &alias.replacement);
        }
        Ok(0)
    }
}

/// Print the commands loaded for the current pass.
pub struct Help;

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn description() -> &'static str {
        "lists the available commands, or describes one: help [name]"
    }

    fn arity() -> (Option<usize>, Option<usize>) {
        (Some(0), Some(1))
    }

    fn execute(executor: &mut Executor, args: &[String]) -> Result<StatusCode> {
        let wanted = args.first();
        let lines: Vec<String> = executor
            .commands()
            .iter()
            .filter(|c| wanted.is_none_or(|name| c.name() == name.as_str()))
            .map(|c| format!("{} - {}", c.name(), c.description()))
            .collect();
        if lines.is_empty() {
            return Ok(1);
        }

        let out = executor.stdout();
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        Ok(0)
    }
}
