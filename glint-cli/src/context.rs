// Context and configuration loading for CLI commands

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use glint_engine::{Context, EngineOptions, ExpressionEngine, Value};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {} as JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {} as YAML: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid --set entry '{0}', expected KEY=VALUE")]
    InvalidAssignment(String),
}

/// Inputs shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// JSON or YAML file holding the variable context
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub context: Option<PathBuf>,

    /// Set a context variable; VALUE is parsed as JSON, otherwise taken as a string
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE", global = true)]
    pub set: Vec<String>,

    /// Engine configuration file (default: <config dir>/glint/config.yaml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Locale for pluralization and articles
    #[arg(long, short = 'l', global = true)]
    pub locale: Option<String>,
}

impl InputArgs {
    /// Context from `--context`, then each `--set` applied on top
    pub fn load_context(&self) -> Result<Context, ContextError> {
        let mut context = match &self.context {
            Some(path) => read_document::<Context>(path)?,
            None => Context::new(),
        };

        for entry in &self.set {
            let (key, value) = parse_assignment(entry)?;
            context.insert(key, value);
        }

        debug!(variables = context.len(), "loaded context");
        Ok(context)
    }

    /// Options from `--config` or the default config file, with `--locale` applied
    pub fn load_options(&self) -> Result<EngineOptions, ContextError> {
        let mut options = match &self.config {
            Some(path) => read_document::<EngineOptions>(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!(path = %path.display(), "using default config");
                    read_document::<EngineOptions>(&path)?
                }
                None => EngineOptions::default(),
            },
        };

        if let Some(locale) = &self.locale {
            options.default_locale = Some(locale.clone());
        }

        Ok(options)
    }

    pub fn engine(&self) -> Result<ExpressionEngine, ContextError> {
        Ok(ExpressionEngine::new(self.load_options()?))
    }
}

/// `<config dir>/glint/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("glint").join("config.yaml"))
}

/// Parse a JSON or YAML document, chosen by file extension
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, ContextError> {
    let content = fs::read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|source| ContextError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&content).map_err(|source| ContextError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Split a `KEY=VALUE` entry; VALUE is JSON when it parses as JSON
pub fn parse_assignment(entry: &str) -> Result<(String, Value), ContextError> {
    let (key, raw) = entry
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| ContextError::InvalidAssignment(entry.to_string()))?;

    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
    Ok((key.trim().to_string(), value))
}
