//! `finclass.toml` settings.
//!
//! ```toml
//! model_dir = "models/demo"
//! expected_profile = "cfpb-lemma@1"
//! output = "json"
//! ```
//!
//! Precedence, highest first: command-line flags, `FINCLASS_MODEL_DIR`,
//! the config file, built-in defaults.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "finclass.toml";

/// Environment variable overriding `model_dir`.
pub const MODEL_DIR_ENV: &str = "FINCLASS_MODEL_DIR";

/// Bundle directory used when nothing else names one.
pub const DEFAULT_MODEL_DIR: &str = "models/demo";

/// How results are printed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Label, bar chart, optional canonical text.
    #[default]
    Text,
    /// One JSON document.
    Json,
}

/// Parsed config file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Model bundle directory.
    pub model_dir: Option<PathBuf>,
    /// Required profile, `NAME` or `NAME@VERSION`.
    pub expected_profile: Option<String>,
    /// Default output format.
    pub output: OutputFormat,
}

impl Config {
    /// Loads `path`, or `finclass.toml` if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Parses TOML text.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Bundle directory after applying the flag and environment overrides.
    pub fn model_dir(&self, flag: Option<PathBuf>, env: Option<OsString>) -> PathBuf {
        flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(|| self.model_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR))
    }

    /// Output format after applying the `--json` flag.
    pub fn output(&self, json_flag: bool) -> OutputFormat {
        if json_flag {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn parses_all_keys() {
        let config = Config::parse(
            r#"
            model_dir = "/srv/models/cfpb"
            expected_profile = "cfpb-lemma@1"
            output = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.model_dir, Some(PathBuf::from("/srv/models/cfpb")));
        assert_eq!(config.expected_profile.as_deref(), Some("cfpb-lemma@1"));
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::parse("model = \"x\"").is_err());
        assert!(Config::parse("output = \"yaml\"").is_err());
    }

    #[test]
    fn model_dir_precedence() {
        let config = Config {
            model_dir: Some("from-file".into()),
            ..Config::default()
        };

        let flag = Some(PathBuf::from("from-flag"));
        let env = Some(OsString::from("from-env"));

        assert_eq!(config.model_dir(flag, env.clone()), PathBuf::from("from-flag"));
        assert_eq!(config.model_dir(None, env), PathBuf::from("from-env"));
        assert_eq!(config.model_dir(None, Some(OsString::new())), PathBuf::from("from-file"));
        assert_eq!(config.model_dir(None, None), PathBuf::from("from-file"));
        assert_eq!(
            Config::default().model_dir(None, None),
            PathBuf::from(DEFAULT_MODEL_DIR)
        );
    }

    #[test]
    fn json_flag_wins() {
        let config = Config::default();
        assert_eq!(config.output(false), OutputFormat::Text);
        assert_eq!(config.output(true), OutputFormat::Json);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/no/such/finclass.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
