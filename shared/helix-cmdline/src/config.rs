use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::LogLevel;
use crate::error::{CmdlineError, Result};

/// Environment variable that overrides the configured default log level.
pub const LOG_LEVEL_ENV: &str = "HELIX_LOG_LEVEL";

/// Root command settings, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub name: String,
    pub about: Option<String>,
    pub log_level: Option<LogLevel>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            about: None,
            log_level: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CmdlineError::Settings(e.to_string()))
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(LOG_LEVEL_ENV) {
            let level = value
                .parse::<LogLevel>()
                .map_err(|e| CmdlineError::Settings(format!("{LOG_LEVEL_ENV}: {e}")))?;
            self.log_level = Some(level);
        }
        Ok(self)
    }

    pub fn with_process_env(self) -> Result<Self> {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_from_toml_str() {
        let settings = Settings::from_toml_str(
            r#"
name = "ix"
about = "Knowledge tools"
log_level = "Warning"
"#,
        )
        .expect("valid settings");

        assert_eq!(
            settings,
            Settings {
                name: "ix".to_string(),
                about: Some("Knowledge tools".to_string()),
                log_level: Some(LogLevel::Warning),
            }
        );
    }

    #[test]
    fn test_unknown_level_in_file_is_rejected() {
        let err = Settings::from_toml_str("log_level = \"loud\"").unwrap_err();
        assert!(matches!(err, CmdlineError::Settings(_)));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "name = \"hbd\"").expect("write");
        let settings = Settings::load(file.path()).expect("loads");
        assert_eq!(settings.name, "hbd");
        assert_eq!(settings.log_level, None);
    }

    #[test]
    fn test_env_override() {
        let settings = Settings::default()
            .with_env_overrides(|key| (key == LOG_LEVEL_ENV).then(|| "verbose".to_string()))
            .expect("valid level");
        assert_eq!(settings.log_level, Some(LogLevel::Trace));

        let err = Settings::default()
            .with_env_overrides(|_| Some("loud".to_string()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid settings: HELIX_LOG_LEVEL: Unknown log level: loud"
        );
    }
}
