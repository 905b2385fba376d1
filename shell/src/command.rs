use crate::delegate::Delegate;
use crate::diagnostic::{Diagnostic, EngineError};
use crate::executor::{Executor, RunId};
use std::fmt;
use std::rc::Rc;

/// Status code returned by command handlers.
///
/// A value of 0 indicates success; any other value is looked up in the
/// error table under the command's name.
pub type StatusCode = u32;

/// Code returned when a handler hits an internal failure it cannot describe.
pub const INTERNAL_FAILURE: StatusCode = 1;

/// Object-safe contract for the callbacks behind a [`Command`].
///
/// Implemented for every `Fn(&mut Executor, &[String]) -> StatusCode`, so plain
/// functions and closures can be registered directly.
pub trait Handler {
    /// Run the command with the arguments that follow its keyword.
    fn call(&self, executor: &mut Executor, args: &[String]) -> StatusCode;
}

impl<F> Handler for F
where
    F: Fn(&mut Executor, &[String]) -> StatusCode,
{
    fn call(&self, executor: &mut Executor, args: &[String]) -> StatusCode {
        self(executor, args)
    }
}

/// Callback that populates an executor's command registry at the start of a pass.
///
/// Definers register commands through [`Executor::define_command`].
pub trait Definer {
    fn define(&self, executor: &mut Executor) -> Result<(), EngineError>;
}

impl<F> Definer for F
where
    F: Fn(&mut Executor) -> Result<(), EngineError>,
{
    fn define(&self, executor: &mut Executor) -> Result<(), EngineError> {
        self(executor)
    }
}

pub type HandlerDelegate = Delegate<dyn Handler>;
pub type DefinerDelegate = Delegate<dyn Definer>;

/// A named, arity-checked group of handlers bound to one executor.
///
/// Commands are rebuilt by the definers at the start of every pass; nothing
/// about a command survives from one pass to the next.
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    min_args: Option<usize>,
    max_args: Option<usize>,
    handlers: HandlerDelegate,
    parent: RunId,
}

impl Command {
    pub(crate) fn new(
        handler: Rc<dyn Handler>,
        name: impl Into<String>,
        description: impl Into<String>,
        min_args: Option<usize>,
        max_args: Option<usize>,
        parent: RunId,
    ) -> Result<Self, EngineError> {
        let name = name.into();
        if let (Some(min), Some(max)) = (min_args, max_args) {
            if min > max {
                return Err(EngineError::InvalidArity { name, min, max });
            }
        }
        let mut handlers = HandlerDelegate::new();
        handlers.connect(handler);
        Ok(Self {
            name,
            description: description.into(),
            min_args,
            max_args,
            handlers,
            parent,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn min_args(&self) -> Option<usize> {
        self.min_args
    }

    pub fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    /// Run id of the executor this command was defined on.
    pub fn parent(&self) -> RunId {
        self.parent
    }

    /// Attach another handler. Each handler contributes one status code.
    pub fn connect(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.connect(Rc::new(handler));
        self
    }

    /// Try to run this command for the statement `tokens`.
    ///
    /// Returns an empty list when the keyword is not this command's name. An
    /// empty list is also returned when the arguments violate the declared
    /// arity; in that case a diagnostic has been reported to `executor`.
    /// Otherwise every handler is called and its status codes are returned in
    /// connection order.
    pub fn attempt_parse_and_exec(
        &self,
        executor: &mut Executor,
        tokens: &[String],
        line: usize,
    ) -> Vec<StatusCode> {
        let Some((keyword, args)) = tokens.split_first() else {
            return Vec::new();
        };
        if *keyword != self.name {
            return Vec::new();
        }

        let given = args.len();
        if let Some(limit) = self.max_args {
            if given > limit {
                executor.report(Diagnostic::TooManyArguments {
                    command: self.name.clone(),
                    line,
                    limit,
                    given,
                });
                return Vec::new();
            }
        }
        if let Some(limit) = self.min_args {
            if given < limit {
                executor.report(Diagnostic::TooFewArguments {
                    command: self.name.clone(),
                    line,
                    limit,
                    given,
                });
                return Vec::new();
            }
        }

        if executor.id() != self.parent {
            log::warn!(
                "command `{}` belongs to executor {} but was invoked on executor {}",
                self.name,
                self.parent,
                executor.id()
            );
            return Vec::new();
        }

        log::trace!("line {}: running `{}` with {:?}", line, self.name, args);
        self.handlers.call(|handler| handler.call(executor, args))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("handlers", &self.handlers.len())
            .field("parent", &self.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use std::cell::Cell;

    fn quiet_executor(id: RunId) -> Executor {
        Executor::builder(id).stderr(MemWriter::new()).build()
    }

    fn tokens(line: &str) -> Vec<String> {
        crate::text::tokens(line)
    }

    fn counting(calls: Rc<Cell<usize>>, code: StatusCode) -> impl Handler {
        move |_: &mut Executor, _: &[String]| {
            calls.set(calls.get() + 1);
            code
        }
    }

    #[test]
    fn test_non_matching_keyword_is_not_a_match() {
        let calls = Rc::new(Cell::new(0));
        let command = Command::new(Rc::new(counting(calls.clone(), 0)), "out", "", None, None, 0)
            .unwrap();
        let mut ex = quiet_executor(0);

        assert!(command.attempt_parse_and_exec(&mut ex, &tokens("ls"), 0).is_empty());
        assert!(command.attempt_parse_and_exec(&mut ex, &[], 0).is_empty());
        assert_eq!(calls.get(), 0);
        assert!(ex.diagnostics().is_empty());
    }

    #[test]
    fn test_arity_violations_skip_handler() {
        let calls = Rc::new(Cell::new(0));
        let command = Command::new(
            Rc::new(counting(calls.clone(), 0)),
            "pair",
            "takes two",
            Some(2),
            Some(2),
            0,
        )
        .unwrap();
        let mut ex = quiet_executor(0);

        assert!(command.attempt_parse_and_exec(&mut ex, &tokens("pair a"), 4).is_empty());
        assert!(command.attempt_parse_and_exec(&mut ex, &tokens("pair a b c"), 5).is_empty());
        assert_eq!(calls.get(), 0);
        assert_eq!(
            ex.diagnostics(),
            &[
                Diagnostic::TooFewArguments {
                    command: "pair".to_string(),
                    line: 4,
                    limit: 2,
                    given: 1,
                },
                Diagnostic::TooManyArguments {
                    command: "pair".to_string(),
                    line: 5,
                    limit: 2,
                    given: 3,
                },
            ]
        );

        assert_eq!(
            command.attempt_parse_and_exec(&mut ex, &tokens("pair a b"), 6),
            vec![0]
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_every_handler_contributes_a_status() {
        let calls = Rc::new(Cell::new(0));
        let mut command =
            Command::new(Rc::new(counting(calls.clone(), 0)), "multi", "", None, None, 3).unwrap();
        command.connect(counting(calls.clone(), 7));
        let mut ex = quiet_executor(3);

        assert_eq!(
            command.attempt_parse_and_exec(&mut ex, &tokens("multi x"), 0),
            vec![0, 7]
        );
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_handler_receives_arguments_without_keyword() {
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handler = move |_: &mut Executor, args: &[String]| -> StatusCode {
            sink.borrow_mut().extend(args.iter().cloned());
            0
        };
        let command = Command::new(Rc::new(handler), "out", "", None, None, 0).unwrap();
        let mut ex = quiet_executor(0);

        command.attempt_parse_and_exec(&mut ex, &tokens("out a b"), 0);
        assert_eq!(*seen.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_foreign_executor_is_rejected() {
        let calls = Rc::new(Cell::new(0));
        let command =
            Command::new(Rc::new(counting(calls.clone(), 0)), "out", "", None, None, 1).unwrap();
        let mut other = quiet_executor(2);

        assert!(command.attempt_parse_and_exec(&mut other, &tokens("out a"), 0).is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_min_greater_than_max_is_rejected() {
        let handler = |_: &mut Executor, _: &[String]| -> StatusCode { 0 };
        let err = Command::new(Rc::new(handler), "bad", "", Some(3), Some(1), 0).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidArity {
                name: "bad".to_string(),
                min: 3,
                max: 1,
            }
        );
    }
}
