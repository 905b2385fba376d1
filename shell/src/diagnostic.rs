use crate::command::StatusCode;
use crate::executor::RunId;
use std::io::Write;
use thiserror::Error;

/// Generic message used when a failing command has no registered error text.
pub const UNKNOWN_ERROR: &str = "an unnamed critical exception occurred";

/// Errors that stop an engine operation as a whole.
///
/// Per-statement problems are never reported this way; see [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The drain loop produced more task generations than allowed.
    #[error("drain depth exceeded: tasks kept queueing new tasks for {limit} generations")]
    DrainDepthExceeded { limit: usize },

    /// A command was defined with `min_args > max_args`.
    #[error("command `{name}` requires at least {min} argument(s) but accepts at most {max}")]
    InvalidArity { name: String, min: usize, max: usize },

    /// No executor with this id exists in the environment.
    #[error("no executor with run id {0}")]
    UnknownExecutor(RunId),
}

/// A problem with one statement. Execution continues after it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("too many arguments for `{command}`: expected at most {limit}, got {given}")]
    TooManyArguments {
        command: String,
        line: usize,
        limit: usize,
        given: usize,
    },

    #[error("too few arguments for `{command}`: expected at least {limit}, got {given}")]
    TooFewArguments {
        command: String,
        line: usize,
        limit: usize,
        given: usize,
    },

    /// A handler returned a non-zero status code.
    #[error("{message}")]
    CommandFailed {
        command: String,
        line: usize,
        code: StatusCode,
        message: String,
    },

    #[error("`{command}`: command does not exist or is not defined")]
    UnknownCommand { command: String, line: usize },

    /// A definer could not populate the registry.
    #[error("{reason}")]
    DefinerFailed { reason: String },
}

impl Diagnostic {
    /// Zero-based statement index the diagnostic refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Diagnostic::TooManyArguments { line, .. }
            | Diagnostic::TooFewArguments { line, .. }
            | Diagnostic::CommandFailed { line, .. }
            | Diagnostic::UnknownCommand { line, .. } => Some(*line),
            Diagnostic::DefinerFailed { .. } => None,
        }
    }

    /// Keyword of the statement the diagnostic refers to, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Diagnostic::TooManyArguments { command, .. }
            | Diagnostic::TooFewArguments { command, .. }
            | Diagnostic::CommandFailed { command, .. }
            | Diagnostic::UnknownCommand { command, .. } => Some(command),
            Diagnostic::DefinerFailed { .. } => None,
        }
    }

    /// Render the diagnostic the way the console shows it.
    ///
    /// Lines are printed one-based.
    pub fn render(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "\nerror: a critical exception occurred")?;
        if let Some(line) = self.line() {
            write!(out, " on line {}", line + 1)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_one_based_line() {
        let diagnostic = Diagnostic::CommandFailed {
            command: "cd".to_string(),
            line: 2,
            code: 1,
            message: "file does not exist".to_string(),
        };
        let mut out = Vec::new();
        diagnostic.render(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nerror: a critical exception occurred on line 3\nfile does not exist\n"
        );
    }

    #[test]
    fn test_arity_message_names_command_and_limit() {
        let diagnostic = Diagnostic::TooManyArguments {
            command: "cd".to_string(),
            line: 0,
            limit: 1,
            given: 3,
        };
        let text = diagnostic.to_string();
        assert!(text.contains("`cd`"));
        assert!(text.contains("at most 1"));
        assert_eq!(diagnostic.line(), Some(0));
        assert_eq!(diagnostic.command(), Some("cd"));
    }

    #[test]
    fn test_definer_failure_has_no_line() {
        let diagnostic = Diagnostic::DefinerFailed {
            reason: "broken".to_string(),
        };
        let mut out = Vec::new();
        diagnostic.render(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nerror: a critical exception occurred\nbroken\n"
        );
    }
}
