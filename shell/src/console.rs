//! Interactive read-line front-end over an [`Executor`].

use crate::executor::Executor;
use crate::text;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::env;

/// Line that ends the console loop.
pub const EXIT_KEYWORD: &str = "exit";

/// What the console loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Script run before the first prompt.
pub fn startup_script() -> String {
    format!("alias_def __VERSION__ {}", env!("CARGO_PKG_VERSION"))
}

/// Prompt of the form `<cwd> <name> >>> `.
pub fn prompt(name: &str) -> String {
    let cwd = env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "?".to_string());
    format!("{} {} >>> ", cwd, name)
}

/// Runs one line of console input.
///
/// Engine errors are printed and the console keeps going. Diagnostics were
/// already rendered by the executor, so they are dropped here.
pub fn handle_line(executor: &mut Executor, line: &str) -> Flow {
    let trimmed = line.trim();
    if trimmed == EXIT_KEYWORD {
        return Flow::Exit;
    }
    if trimmed.is_empty() || text::is_comment(trimmed) {
        return Flow::Continue;
    }

    if let Err(e) = executor.exec(line) {
        log::error!("console: {}", e);
        eprintln!("\nerror: {}\n", e);
    }
    executor.take_diagnostics();
    Flow::Continue
}

/// Read-eval loop until `exit`, Ctrl-C or Ctrl-D.
pub fn run(executor: &mut Executor, name: &str) -> rustyline::Result<()> {
    if let Flow::Exit = handle_line(executor, &startup_script()) {
        return Ok(());
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(&prompt(name)) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    rl.add_history_entry(line.as_str())?;
                }
                if handle_line(executor, &line) == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}
