use crate::builtin;
use crate::command::{Definer, DefinerDelegate};
use crate::config::Config;
use crate::diagnostic::EngineError;
use crate::error_table::{ErrorKey, ErrorTable};
use crate::executor::{Executor, ExecutorBuilder, RunId};
use std::rc::Rc;

/// Owner of one or more executors and of the extension points they share.
///
/// The environment contains:
/// - the preprocessor and command definers every spawned executor loads,
/// - the error table used to describe failing status codes,
/// - the engine [`Config`].
///
/// Definers and error keys are expected to be registered before executors
/// are spawned; an executor keeps what the environment held when it was
/// spawned.
///
/// Example
/// ```
/// use deep_sea_shell::Environment;
/// let mut env = Environment::new();
/// env.init();
/// let main = env.main_executor().unwrap();
/// main.exec("alias_def GREETING hello").unwrap();
/// assert!(main.diagnostics().is_empty());
/// ```
pub struct Environment {
    next_id: RunId,
    executors: Vec<Executor>,
    preprocessor_definers: DefinerDelegate,
    command_definers: DefinerDelegate,
    error_table: Rc<ErrorTable>,
    config: Config,
}

impl Environment {
    /// An empty environment with default settings.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            next_id: 0,
            executors: Vec::new(),
            preprocessor_definers: DefinerDelegate::new(),
            command_definers: DefinerDelegate::new(),
            error_table: Rc::new(ErrorTable::new()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Merge `key` into the shared error table.
    pub fn apply_error_key(&mut self, key: ErrorKey) {
        Rc::make_mut(&mut self.error_table).apply(key);
    }

    pub fn error_table(&self) -> &ErrorTable {
        &self.error_table
    }

    /// Add a definer that runs at the start of every preprocessor pass.
    pub fn connect_preprocessor_definer(&mut self, definer: impl Definer + 'static) {
        self.preprocessor_definers.connect(Rc::new(definer));
    }

    /// Add a definer that runs at the start of every command pass.
    pub fn connect_command_definer(&mut self, definer: impl Definer + 'static) {
        self.command_definers.connect(Rc::new(definer));
    }

    /// Create an executor wired to this environment and return its run id.
    pub fn spawn_executor(&mut self) -> RunId {
        self.spawn_executor_with(|builder| builder)
    }

    /// Spawn an executor through a caller-configured builder.
    ///
    /// The builder is given the run id and the shared definers and error
    /// table; `configure` may override anything else, e.g. output sinks.
    pub fn spawn_executor_with(
        &mut self,
        configure: impl FnOnce(ExecutorBuilder) -> ExecutorBuilder,
    ) -> RunId {
        let id = self.unique_run_id();
        let builder = Executor::builder(id)
            .preprocessor_definers(self.preprocessor_definers.clone())
            .command_definers(self.command_definers.clone())
            .error_table(self.error_table.clone())
            .config(&self.config);
        self.executors.push(configure(builder).build());
        log::debug!("spawned executor {}", id);
        id
    }

    /// Register the default command set and spawn the main executor.
    pub fn init(&mut self) -> RunId {
        self.connect_preprocessor_definer(builtin::preprocessor_definer);
        self.connect_command_definer(builtin::command_definer);
        self.apply_error_key(builtin::error_key());
        self.spawn_executor()
    }

    /// The first executor spawned, if any.
    pub fn main_executor(&mut self) -> Option<&mut Executor> {
        self.executors.first_mut()
    }

    pub fn executor_by_id(&mut self, id: RunId) -> Result<&mut Executor, EngineError> {
        self.executors
            .iter_mut()
            .find(|ex| ex.id() == id)
            .ok_or(EngineError::UnknownExecutor(id))
    }

    pub fn executors(&self) -> &[Executor] {
        &self.executors
    }

    fn unique_run_id(&mut self) -> RunId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::StatusCode;
    use crate::diagnostic::Diagnostic;
    use crate::error_table::codes;
    use crate::io_adapters::MemWriter;

    fn quiet(builder: ExecutorBuilder) -> ExecutorBuilder {
        builder.stdout(MemWriter::new()).stderr(MemWriter::new())
    }

    #[test]
    fn test_main_executor_requires_spawn() {
        let mut env = Environment::new();
        assert!(env.main_executor().is_none());
        assert_eq!(env.init(), 0);
        assert_eq!(env.main_executor().map(|ex| ex.id()), Some(0));
    }

    #[test]
    fn test_run_ids_are_unique() {
        let mut env = Environment::new();
        let ids: Vec<RunId> = (0..3).map(|_| env.spawn_executor()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(env.executor_by_id(1).map(|ex| ex.id()), Ok(1));
        assert_eq!(
            env.executor_by_id(9).map(|ex| ex.id()),
            Err(EngineError::UnknownExecutor(9))
        );
        assert_eq!(env.executors().len(), 3);
    }

    #[test]
    fn test_spawned_executors_share_definers_and_errors() {
        let mut env = Environment::new();
        env.connect_command_definer(|ex: &mut Executor| -> Result<(), EngineError> {
            ex.define_command(
                |_: &mut Executor, _: &[String]| -> StatusCode { 4 },
                "boom",
                "always fails",
                None,
                None,
            )?;
            Ok(())
        });
        env.apply_error_key(ErrorKey::from([("boom".to_string(), codes([(4, "kaboom")]))]));

        let first = env.spawn_executor_with(quiet);
        let second = env.spawn_executor_with(quiet);

        for id in [first, second] {
            let ex = env.executor_by_id(id).unwrap();
            ex.exec("boom").unwrap();
            assert_eq!(
                ex.diagnostics(),
                &[Diagnostic::CommandFailed {
                    command: "boom".to_string(),
                    line: 0,
                    code: 4,
                    message: "kaboom".to_string(),
                }]
            );
        }
    }

    #[test]
    fn test_executor_state_is_isolated() {
        let mut env = Environment::new();
        env.connect_preprocessor_definer(builtin::preprocessor_definer);
        let first = env.spawn_executor_with(quiet);
        let second = env.spawn_executor_with(quiet);

        env.executor_by_id(first)
            .unwrap()
            .exec("alias_def X 1")
            .unwrap();

        assert!(env.executor_by_id(first).unwrap().vars().contains("alias"));
        assert!(!env.executor_by_id(second).unwrap().vars().contains("alias"));
    }

    #[test]
    fn test_later_error_keys_do_not_reach_spawned_executors() {
        let mut env = Environment::new();
        let id = env.spawn_executor();
        env.apply_error_key(ErrorKey::from([("x".to_string(), codes([(1, "late")]))]));

        assert_eq!(env.error_table().lookup("x", 1), Some("late"));
        assert_eq!(env.executor_by_id(id).unwrap().error_table().lookup("x", 1), None);
    }

    #[test]
    fn test_init_registers_default_error_key() {
        let mut env = Environment::new();
        env.init();
        assert_eq!(
            env.error_table().lookup("src", 2),
            Some("failed to queue script, file does not exist")
        );
    }

    #[test]
    fn test_config_reaches_executors() {
        let config = Config {
            report_unknown_commands: true,
            ..Config::default()
        };
        let mut env = Environment::with_config(config);
        env.connect_command_definer(builtin::command_definer);
        let id = env.spawn_executor_with(quiet);
        let ex = env.executor_by_id(id).unwrap();
        ex.exec("nope").unwrap();
        assert!(matches!(
            ex.diagnostics(),
            [Diagnostic::UnknownCommand { .. }]
        ));
    }
}
