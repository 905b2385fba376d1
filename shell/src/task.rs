/// One queued script.
///
/// Preprocessors may rewrite the script in place while the task is being
/// executed; the command pass re-reads it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    script: String,
}

impl Task {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn script_mut(&mut self) -> &mut String {
        &mut self.script
    }
}
