//! Settings of the command line compiler.  A configuration can be read from a
//! YAML file and is then overridden by command line flags.

use std::{fmt::Display, path::PathBuf, str::FromStr};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{
    compiler::{Options, DEFAULT_ROOT},
    diagnostics::StageTracing,
};

/// Format the assembled program is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emit {
    None,
    Json,
    Yaml,
}

impl FromStr for Emit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Emit::None),
            "json" => Ok(Emit::Json),
            "yaml" => Ok(Emit::Yaml),
            _ => Err(format!("Unknown emit format {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Unknown log level {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grammar description to use instead of the builtin grammar.
    pub grammar: Option<PathBuf>,
    pub root: String,
    pub emit: Emit,
    pub log_level: LogLevel,
    pub tracing: StageTracing,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            grammar: None,
            root: DEFAULT_ROOT.into(),
            emit: Emit::None,
            log_level: LogLevel::Warn,
            tracing: StageTracing::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Config, ConfigError> {
        serde_yaml::from_str(text).map_err(ConfigError::Yaml)
    }

    pub fn read(path: &PathBuf) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.clone(), e.to_string()))?;
        Config::from_yaml(&text)
    }

    /// The settings of a single compilation.
    pub fn options(&self) -> Options {
        Options {
            root: self.root.clone(),
            tracing: self.tracing,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, String),
    Yaml(serde_yaml::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, msg) => {
                f.write_fmt(format_args!("Could not read {}: {}", path.display(), msg))
            }
            ConfigError::Yaml(e) => f.write_fmt(format_args!("Invalid configuration: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::TracingConfig;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.options().root, "program");
    }

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(
            "
grammar: lang/dspl.peg
root: expression
emit: json
log_level: debug
tracing:
  parser: All
  semantics:
    Between: [2, 9]
",
        )
        .unwrap();

        assert_eq!(config.grammar, Some(PathBuf::from("lang/dspl.peg")));
        assert_eq!(config.root, "expression");
        assert_eq!(config.emit, Emit::Json);
        assert_eq!(config.log_level.to_filter(), LevelFilter::Debug);
        assert_eq!(config.tracing.parser, TracingConfig::All);
        assert_eq!(config.tracing.semantics, TracingConfig::Between(2, 9));
        assert_eq!(config.tracing.lexer, TracingConfig::Off);
    }

    #[test]
    fn test_invalid_yaml() {
        for text in vec!["emit: xml", "log_level: loud", "root: [a, b]"] {
            assert!(Config::from_yaml(text).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_parse_flags() {
        for (text, expected) in vec![("none", Emit::None), ("json", Emit::Json), ("yaml", Emit::Yaml)] {
            assert_eq!(text.parse::<Emit>(), Ok(expected));
        }
        assert!("xml".parse::<Emit>().is_err());
        assert_eq!("trace".parse::<LogLevel>(), Ok(LogLevel::Trace));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
