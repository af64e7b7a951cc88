use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LogLevel;

/// Global options bound from a single parse, shared with every handler of that invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub remaining_arguments: Vec<String>,
    pub verbose: bool,
    pub trace: bool,
    pub debug: bool,
    pub explicit_log_level: Option<LogLevel>,
    pub default_log_level: Option<LogLevel>,
    pub is_default_command: bool,
}

impl ApplicationState {
    /// Explicit `--loglevel` beats `-v`/`-t`, which beat `-d`, which beats the
    /// configured default; `Information` is the last resort.
    pub fn log_level(&self) -> LogLevel {
        if let Some(level) = self.explicit_log_level {
            return level;
        }

        if self.verbose || self.trace {
            return LogLevel::Trace;
        }

        if self.debug {
            return LogLevel::Debug;
        }

        self.default_log_level.unwrap_or(LogLevel::Information)
    }

    pub const fn is_default_command(&self) -> bool {
        self.is_default_command
    }

    /// Flattens the state into `ApplicationState:<Field>` pairs for layering into host configuration.
    pub fn to_config_pairs(&self) -> BTreeMap<String, String> {
        [
            ("Verbose", self.verbose.to_string()),
            ("Trace", self.trace.to_string()),
            ("Debug", self.debug.to_string()),
            ("IsDefaultCommand", self.is_default_command.to_string()),
            ("LogLevel", self.log_level().to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (format!("ApplicationState:{key}"), value))
        .collect()
    }
}
