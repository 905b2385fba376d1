use std::collections::HashMap;
use std::env as stdenv;

/// Default cap on drain generations per [`exec`](crate::Executor::exec) call.
pub const DEFAULT_MAX_GENERATIONS: usize = 256;

/// Default name shown in the console prompt.
pub const DEFAULT_CLI_NAME: &str = "dss";

pub const MAX_GENERATIONS_VAR: &str = "DSS_MAX_GENERATIONS";
pub const STRICT_VAR: &str = "DSS_STRICT";
pub const NAME_VAR: &str = "DSS_NAME";

/// Engine settings shared by every executor an environment spawns.
///
/// Note: fields are public so embedders and the command line can override
/// individual settings after loading them from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of drain generations; `None` means unbounded.
    pub max_generations: Option<usize>,
    /// Report statements whose keyword matches no command.
    pub report_unknown_commands: bool,
    /// Name shown in the console prompt.
    pub cli_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_generations: Some(DEFAULT_MAX_GENERATIONS),
            report_unknown_commands: false,
            cli_name: DEFAULT_CLI_NAME.to_string(),
        }
    }
}

impl Config {
    /// Read the settings from the current process environment.
    ///
    /// See [`Config::from_vars`] for the recognised variables.
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        Self::from_vars(&vars)
    }

    /// Read the settings from `vars`, falling back to the defaults.
    ///
    /// - `DSS_MAX_GENERATIONS`: a positive number, or `0`/`none` for no limit.
    /// - `DSS_STRICT`: `1`, `true` or `yes` to report unknown commands.
    /// - `DSS_NAME`: console prompt name.
    ///
    /// Malformed values are logged and ignored.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = vars.get(MAX_GENERATIONS_VAR) {
            match parse_generations(raw) {
                Some(limit) => config.max_generations = limit,
                None => log::warn!("ignoring {}={:?}: not a number", MAX_GENERATIONS_VAR, raw),
            }
        }

        if let Some(raw) = vars.get(STRICT_VAR) {
            match parse_flag(raw) {
                Some(flag) => config.report_unknown_commands = flag,
                None => log::warn!("ignoring {}={:?}: not a boolean", STRICT_VAR, raw),
            }
        }

        if let Some(name) = vars.get(NAME_VAR).filter(|name| !name.trim().is_empty()) {
            config.cli_name = name.trim().to_string();
        }

        config
    }
}

/// `Some(None)` disables the limit, `None` is a parse failure.
fn parse_generations(raw: &str) -> Option<Option<usize>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    match raw.parse::<usize>() {
        Ok(0) => Some(None),
        Ok(limit) => Some(Some(limit)),
        Err(_) => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = Config::from_vars(&HashMap::new());
        assert_eq!(config, Config::default());
        assert_eq!(config.max_generations, Some(DEFAULT_MAX_GENERATIONS));
        assert!(!config.report_unknown_commands);
        assert_eq!(config.cli_name, "dss");
    }

    #[test]
    fn test_reads_all_variables() {
        let config = Config::from_vars(&vars(&[
            ("DSS_MAX_GENERATIONS", "12"),
            ("DSS_STRICT", "yes"),
            ("DSS_NAME", " reef "),
        ]));
        assert_eq!(config.max_generations, Some(12));
        assert!(config.report_unknown_commands);
        assert_eq!(config.cli_name, "reef");
    }

    #[test]
    fn test_zero_or_none_disables_the_cap() {
        let config = Config::from_vars(&vars(&[("DSS_MAX_GENERATIONS", "0")]));
        assert_eq!(config.max_generations, None);
        let config = Config::from_vars(&vars(&[("DSS_MAX_GENERATIONS", "None")]));
        assert_eq!(config.max_generations, None);
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let config = Config::from_vars(&vars(&[
            ("DSS_MAX_GENERATIONS", "lots"),
            ("DSS_STRICT", "maybe"),
            ("DSS_NAME", "   "),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reads_from_process_env() {
        let config = Config::from_env();
        assert!(!config.cli_name.is_empty());
    }
}
