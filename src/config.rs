use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core::session::DEFAULT_LATENCY;

pub const DEFAULT_LOG_FILTER: &str = "organizer=info";
pub const SCRIPT_EXTENSION: &str = "org";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cannot expand ORGANIZER_HOME '{value}': {reason}")]
    Home { value: String, reason: String },
    #[error("ORGANIZER_LATENCY_MS must be a whole number of milliseconds, got '{0}'")]
    Latency(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("expected a .org script, got '{0}'")]
    ScriptExtension(String),
    #[error("only one script may be given")]
    ExtraArgument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root for persisted state, logs and the line-editor history.
    pub home: PathBuf,
    pub latency: Duration,
    pub log_filter: String,
    pub ephemeral: bool,
    pub verbose: bool,
    pub script: Option<PathBuf>,
    pub show_usage: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = match lookup("ORGANIZER_HOME") {
            Some(raw) => {
                let expanded = shellexpand::full(&raw).map_err(|e| ConfigError::Home {
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                PathBuf::from(expanded.as_ref())
            }
            None => default_home(),
        };

        let latency = match lookup("ORGANIZER_LATENCY_MS") {
            Some(raw) => raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Latency(raw))?,
            None => DEFAULT_LATENCY,
        };

        let log_filter = lookup("ORGANIZER_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            home,
            latency,
            log_filter,
            ephemeral: false,
            verbose: false,
            script: None,
            show_usage: false,
        })
    }

    /// Apply command-line arguments (without the program name).
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--ephemeral" => self.ephemeral = true,
                "-v" | "--verbose" => self.verbose = true,
                "-h" | "--help" => self.show_usage = true,
                _ if arg.starts_with('-') => {
                    return Err(ConfigError::UnknownOption(arg.to_string()));
                }
                _ => {
                    if self.script.is_some() {
                        return Err(ConfigError::ExtraArgument);
                    }
                    if !arg.ends_with(&format!(".{}", SCRIPT_EXTENSION)) {
                        return Err(ConfigError::ScriptExtension(arg.to_string()));
                    }
                    self.script = Some(PathBuf::from(arg));
                }
            }
        }
        Ok(self)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.home.join("state")
    }

    pub fn log_file(&self) -> PathBuf {
        self.home.join("organizer.log")
    }

    pub fn repl_history_file(&self) -> PathBuf {
        self.home.join("repl_history.txt")
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".organizer")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.home.ends_with(".organizer"));
        assert_eq!(config.latency, DEFAULT_LATENCY);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(!config.ephemeral);
        assert_eq!(config.state_dir(), config.home.join("state"));
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("ORGANIZER_HOME", "/tmp/organizer-test"),
            ("ORGANIZER_LATENCY_MS", " 0 "),
            ("ORGANIZER_LOG", "organizer=debug"),
        ])
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/tmp/organizer-test"));
        assert_eq!(config.latency, Duration::ZERO);
        assert_eq!(config.log_filter, "organizer=debug");
    }

    #[test]
    fn test_bad_latency() {
        assert_eq!(
            config_from(&[("ORGANIZER_LATENCY_MS", "fast")]),
            Err(ConfigError::Latency("fast".to_string()))
        );
    }

    #[test]
    fn test_args() {
        let config = config_from(&[]).unwrap()
            .with_args(["--ephemeral", "-v", "tidy.org"])
            .unwrap();
        assert!(config.ephemeral);
        assert!(config.verbose);
        assert_eq!(config.script, Some(PathBuf::from("tidy.org")));

        let base = config_from(&[]).unwrap();
        assert_eq!(
            base.clone().with_args(["--fast"]),
            Err(ConfigError::UnknownOption("--fast".to_string()))
        );
        assert_eq!(
            base.clone().with_args(["notes.txt"]),
            Err(ConfigError::ScriptExtension("notes.txt".to_string()))
        );
        assert_eq!(
            base.with_args(["a.org", "b.org"]),
            Err(ConfigError::ExtraArgument)
        );
    }
}
