use crate::command::{Command, Definer, DefinerDelegate, Handler, StatusCode};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, EngineError, UNKNOWN_ERROR};
use crate::error_table::ErrorTable;
use crate::task::Task;
use crate::text;
use crate::vars::{AUTO_PREPROCESSOR_VAR, Vars};
use std::io::Write;
use std::rc::Rc;

/// Identity of an executor within its [`Environment`](crate::env::Environment).
pub type RunId = u64;

/// Whether [`Executor::exec`] keeps draining tasks queued during a drain.
pub const RECURSIVE_EXECUTION: bool = true;

/// The two dispatch phases every task goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Commands registered by the preprocessor definers. They may rewrite the
    /// in-flight script.
    Preprocessor,
    /// Commands registered by the command definers, run on the rewritten script.
    Command,
}

/// One independent command-dispatch context.
///
/// An executor owns the command registry of the running pass, the variable
/// store, and the task queues. Scripts are submitted with [`Executor::exec`];
/// each becomes a [`Task`] that is run through the preprocessor pass, the
/// automatic preprocessors and the command pass.
///
/// Example
/// ```
/// use deep_sea_shell::{EngineError, Executor, MemWriter, StatusCode};
/// use std::io::Write;
///
/// let (out, buf) = MemWriter::with_handle();
/// let mut ex = Executor::builder(0)
///     .command_definer(|ex: &mut Executor| -> Result<(), EngineError> {
///         ex.define_command(
///             |ex: &mut Executor, args: &[String]| -> StatusCode {
///                 let _ = writeln!(ex.stdout(), "{}", args.join("+"));
///                 0
///             },
///             "sum",
///             "joins its arguments",
///             Some(1),
///             None,
///         )?;
///         Ok(())
///     })
///     .stdout(out)
///     .build();
///
/// ex.exec("sum 1 2 3").unwrap();
/// assert_eq!(String::from_utf8(buf.borrow().clone()).unwrap(), "1+2+3\n");
/// ```
pub struct Executor {
    id: RunId,
    loaded_commands: Vec<Command>,
    preprocessor_definers: DefinerDelegate,
    command_definers: DefinerDelegate,
    tasks: Vec<Task>,
    task_buffer: Vec<Task>,
    vars: Vars,
    busy: bool,
    pass: Option<Pass>,
    current_task: Option<Task>,
    preprocessor_names: Vec<String>,
    error_table: Rc<ErrorTable>,
    max_generations: Option<usize>,
    report_unknown_commands: bool,
    diagnostics: Vec<Diagnostic>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Executor {
    /// Start building an executor with run id `id`.
    pub fn builder(id: RunId) -> ExecutorBuilder {
        ExecutorBuilder::new(id)
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    /// Register a command for the running pass.
    ///
    /// This is what definers call. The command is bound to this executor and
    /// is dropped when the next pass reloads the registry. Fails when
    /// `min_args > max_args`.
    pub fn define_command(
        &mut self,
        handler: impl Handler + 'static,
        name: impl Into<String>,
        description: impl Into<String>,
        min_args: Option<usize>,
        max_args: Option<usize>,
    ) -> Result<&mut Command, EngineError> {
        let command = Command::new(
            Rc::new(handler),
            name,
            description,
            min_args,
            max_args,
            self.id,
        )?;
        self.loaded_commands.push(command);
        let index = self.loaded_commands.len() - 1;
        Ok(&mut self.loaded_commands[index])
    }

    /// Commands loaded for the running (or last) pass, in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.loaded_commands
    }

    /// Submit `script` for execution.
    ///
    /// When the executor is idle the script runs immediately, together with
    /// every task it queues. When called from inside a handler, the script is
    /// deferred to the next drain generation instead.
    pub fn exec(&mut self, script: impl Into<String>) -> Result<(), EngineError> {
        let task = Task::new(script);
        if self.busy {
            log::debug!("executor {}: busy, deferring task", self.id);
            self.task_buffer.push(task);
            return Ok(());
        }
        self.tasks.push(task);
        self.exec_all_tasks(RECURSIVE_EXECUTION).map(|_| ())
    }

    /// Queue `task` for the next drain generation.
    pub fn queue_task(&mut self, task: Task) {
        self.task_buffer.push(task);
    }

    /// Run every pending task.
    ///
    /// Does nothing when there are no pending tasks or a drain is already in
    /// progress. With `recursive`, tasks queued while draining are executed as
    /// a new generation, until a generation queues nothing. Returns the number
    /// of tasks executed, or [`EngineError::DrainDepthExceeded`] once the
    /// configured generation limit is hit; both queues are discarded then.
    pub fn exec_all_tasks(&mut self, recursive: bool) -> Result<usize, EngineError> {
        if self.tasks.is_empty() || self.busy {
            return Ok(0);
        }

        let mut executed = 0;
        let mut generation = 0;
        loop {
            if let Some(limit) = self.max_generations {
                if generation >= limit {
                    log::warn!(
                        "executor {}: dropping {} task(s) after {} generations",
                        self.id,
                        self.tasks.len() + self.task_buffer.len(),
                        limit
                    );
                    self.tasks.clear();
                    self.task_buffer.clear();
                    return Err(EngineError::DrainDepthExceeded { limit });
                }
            }

            self.busy = true;
            let tasks = std::mem::take(&mut self.tasks);
            log::debug!(
                "executor {}: generation {} with {} task(s)",
                self.id,
                generation,
                tasks.len()
            );
            for task in tasks {
                self.exec_task(task);
                executed += 1;
            }
            self.busy = false;
            generation += 1;

            if !recursive || self.task_buffer.is_empty() {
                break;
            }
            self.tasks = std::mem::take(&mut self.task_buffer);
        }

        Ok(executed)
    }

    /// Run the statements against the commands currently loaded.
    ///
    /// For each statement the last command returning a non-empty result
    /// decides its status. Failures are reported as diagnostics, never
    /// returned.
    pub fn direct_exec(&mut self, statements: &[String]) {
        for (line, statement) in statements.iter().enumerate() {
            let tokens = text::tokens(statement);
            let Some(keyword) = tokens.first() else {
                continue;
            };

            let commands = self.loaded_commands.clone();
            let mut result = Vec::new();
            for command in &commands {
                let attempt = command.attempt_parse_and_exec(self, &tokens, line);
                if !attempt.is_empty() {
                    result = attempt;
                }
            }

            match result.first().copied() {
                None => {
                    if self.should_report_unknown(&commands, keyword) {
                        self.report(Diagnostic::UnknownCommand {
                            command: keyword.clone(),
                            line,
                        });
                    }
                }
                Some(0) => {}
                Some(code) => self.report_status(keyword, code, line),
            }
        }
    }

    /// Variables of this executor. They persist across tasks.
    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut Vars {
        &mut self.vars
    }

    /// The task being executed, if any. Handlers may rewrite its script.
    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_ref()
    }

    pub fn current_task_mut(&mut self) -> Option<&mut Task> {
        self.current_task.as_mut()
    }

    /// The pass currently running, if any.
    pub fn current_pass(&self) -> Option<Pass> {
        self.pass
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Number of tasks waiting for the next drain generation.
    pub fn queued_tasks(&self) -> usize {
        self.task_buffer.len()
    }

    /// Output sink for command handlers.
    pub fn stdout(&mut self) -> &mut dyn Write {
        self.stdout.as_mut()
    }

    pub fn error_table(&self) -> &ErrorTable {
        &self.error_table
    }

    /// Every diagnostic reported so far, oldest first.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Record `diagnostic` and render it to the diagnostic sink.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::debug!("executor {}: {:?}", self.id, diagnostic);
        if let Err(err) = diagnostic.render(self.stderr.as_mut()) {
            log::warn!("executor {}: failed to print diagnostic: {}", self.id, err);
        }
        self.diagnostics.push(diagnostic);
    }

    fn exec_task(&mut self, task: Task) {
        self.current_task = Some(task);

        let statements = self.current_statements();
        self.command_pass(Pass::Preprocessor, &statements);
        self.auto_preprocessors();

        // Preprocessors may have rewritten the script.
        let statements = self.current_statements();
        self.command_pass(Pass::Command, &statements);

        self.pass = None;
        self.current_task = None;
    }

    fn current_statements(&self) -> Vec<String> {
        self.current_task
            .as_ref()
            .map(|task| text::statements(task.script()))
            .unwrap_or_default()
    }

    fn command_pass(&mut self, pass: Pass, statements: &[String]) {
        self.pass = Some(pass);
        self.loaded_commands.clear();

        let definers = match pass {
            Pass::Preprocessor => self.preprocessor_definers.clone(),
            Pass::Command => self.command_definers.clone(),
        };
        let results = definers.call(|definer| definer.define(self));
        for err in results.into_iter().filter_map(Result::err) {
            log::warn!("executor {}: definer failed: {}", self.id, err);
            self.report(Diagnostic::DefinerFailed {
                reason: err.to_string(),
            });
        }
        log::debug!(
            "executor {}: {:?} pass with {} command(s)",
            self.id,
            pass,
            self.loaded_commands.len()
        );

        if pass == Pass::Preprocessor {
            self.preprocessor_names = self
                .loaded_commands
                .iter()
                .map(|c| c.name().to_string())
                .collect();
        }

        self.direct_exec(statements);
    }

    /// Run the preprocessors listed in [`AUTO_PREPROCESSOR_VAR`] against the
    /// registry left by the preprocessor pass.
    fn auto_preprocessors(&mut self) {
        let statements: Vec<String> = match self.vars.get(AUTO_PREPROCESSOR_VAR) {
            Some(var) => var.texts().map(str::to_string).collect(),
            None => return,
        };
        self.direct_exec(&statements);
    }

    fn should_report_unknown(&self, commands: &[Command], keyword: &str) -> bool {
        self.report_unknown_commands
            && self.pass == Some(Pass::Command)
            && !commands.iter().any(|c| c.name() == keyword)
            && !self.preprocessor_names.iter().any(|name| name == keyword)
            && !text::is_comment(keyword)
    }

    /// Report a non-zero `code` from `command`, described by the error table.
    pub fn report_status(&mut self, command: &str, code: StatusCode, line: usize) {
        let message = self
            .error_table
            .lookup(command, code)
            .unwrap_or(UNKNOWN_ERROR)
            .to_string();
        self.report(Diagnostic::CommandFailed {
            command: command.to_string(),
            line,
            code,
            message,
        });
    }
}

/// Builder for [`Executor`]. Only the run id is required.
pub struct ExecutorBuilder {
    id: RunId,
    preprocessor_definers: DefinerDelegate,
    command_definers: DefinerDelegate,
    error_table: Rc<ErrorTable>,
    max_generations: Option<usize>,
    report_unknown_commands: bool,
    stdout: Option<Box<dyn Write>>,
    stderr: Option<Box<dyn Write>>,
}

impl ExecutorBuilder {
    pub fn new(id: RunId) -> Self {
        let config = Config::default();
        Self {
            id,
            preprocessor_definers: DefinerDelegate::new(),
            command_definers: DefinerDelegate::new(),
            error_table: Rc::new(ErrorTable::new()),
            max_generations: config.max_generations,
            report_unknown_commands: config.report_unknown_commands,
            stdout: None,
            stderr: None,
        }
    }

    /// Replace the preprocessor definers with `definers`.
    pub fn preprocessor_definers(mut self, definers: DefinerDelegate) -> Self {
        self.preprocessor_definers = definers;
        self
    }

    /// Replace the command definers with `definers`.
    pub fn command_definers(mut self, definers: DefinerDelegate) -> Self {
        self.command_definers = definers;
        self
    }

    /// Add one preprocessor definer.
    pub fn preprocessor_definer(mut self, definer: impl Definer + 'static) -> Self {
        self.preprocessor_definers.connect(Rc::new(definer));
        self
    }

    /// Add one command definer.
    pub fn command_definer(mut self, definer: impl Definer + 'static) -> Self {
        self.command_definers.connect(Rc::new(definer));
        self
    }

    pub fn error_table(mut self, table: Rc<ErrorTable>) -> Self {
        self.error_table = table;
        self
    }

    /// Apply the engine settings from `config`.
    pub fn config(mut self, config: &Config) -> Self {
        self.max_generations = config.max_generations;
        self.report_unknown_commands = config.report_unknown_commands;
        self
    }

    /// Limit the number of drain generations; `None` removes the limit.
    pub fn max_generations(mut self, limit: Option<usize>) -> Self {
        self.max_generations = limit;
        self
    }

    pub fn report_unknown_commands(mut self, report: bool) -> Self {
        self.report_unknown_commands = report;
        self
    }

    /// Where handlers write their output. Defaults to the process stdout.
    pub fn stdout(mut self, out: impl Write + 'static) -> Self {
        self.stdout = Some(Box::new(out));
        self
    }

    /// Where diagnostics are rendered. Defaults to the process stderr.
    pub fn stderr(mut self, err: impl Write + 'static) -> Self {
        self.stderr = Some(Box::new(err));
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            id: self.id,
            loaded_commands: Vec::new(),
            preprocessor_definers: self.preprocessor_definers,
            command_definers: self.command_definers,
            tasks: Vec::new(),
            task_buffer: Vec::new(),
            vars: Vars::new(),
            busy: false,
            pass: None,
            current_task: None,
            preprocessor_names: Vec::new(),
            error_table: self.error_table,
            max_generations: self.max_generations,
            report_unknown_commands: self.report_unknown_commands,
            diagnostics: Vec::new(),
            stdout: self
                .stdout
                .unwrap_or_else(|| Box::new(std::io::stdout())),
            stderr: self
                .stderr
                .unwrap_or_else(|| Box::new(std::io::stderr())),
        }
    }
}
