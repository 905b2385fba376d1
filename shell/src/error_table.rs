use crate::command::StatusCode;
use std::collections::HashMap;

/// Messages for the non-zero status codes of one command.
pub type ErrorCodes = HashMap<StatusCode, String>;

/// Error messages of several commands, keyed by command name.
pub type ErrorKey = HashMap<String, ErrorCodes>;

/// Shared lookup table turning `(command, status code)` into a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTable {
    entries: ErrorKey,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `key` into the table.
    ///
    /// Codes are merged per command; a code that is already present is
    /// overwritten by the newer message.
    pub fn apply(&mut self, key: ErrorKey) {
        for (command, codes) in key {
            self.entries.entry(command).or_default().extend(codes);
        }
    }

    pub fn lookup(&self, command: &str, code: StatusCode) -> Option<&str> {
        self.entries
            .get(command)
            .and_then(|codes| codes.get(&code))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build an [`ErrorCodes`] map from `(code, message)` pairs.
pub fn codes<const N: usize>(pairs: [(StatusCode, &str); N]) -> ErrorCodes {
    pairs
        .into_iter()
        .map(|(code, message)| (code, message.to_string()))
        .collect()
}
