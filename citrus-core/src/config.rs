//! # Configuration Module
//!
//! Handles loading citrus configuration from `citrus.toml` and the environment.
//!
//! ## Configuration Loading Flow (block diagram)
//!
//! ```text
//! +-------------------+     +-------------------+     +-------------------+
//! | CITRUS_CONFIG env | --> | Path resolution   | --> | citrus.toml file  |
//! | (optional)        |     | or default ./     |     |                   |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!                                                              v
//! +-------------------+     +-------------------+     +-------------------+
//! | citrus.toml file  | --> | TOML parser       | --> | Config struct     |
//! |                   |     | (deserialization) |     | global_variables  |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!          +---------------------------------------------------+
//!          v
//! +-------------------+     +-------------------+     +-------------------+
//! | Environment vars  | --> | CITRUS_VAR_*      | --> | Merged into       |
//! | CITRUS_VAR_X=v    |     | prefix            | --> | global_variables  |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!                                                              v
//!                                                     +-------------------+
//!                                                     | TestContextFactory|
//!                                                     | ::from_config     |
//!                                                     +-------------------+
//! ```
//!
//! ## Config File Location
//!
//! 1. If `CITRUS_CONFIG` environment variable is set, load from that path
//! 2. Otherwise, load from `citrus.toml` in the current directory
//!
//! **Note:** `CITRUS_CONFIG` is reserved for specifying the config file path. If
//! citrus detects misuse (e.g. `CITRUS_CONFIG=true`), it errors with a helpful message.
//!
//! ## Configuration Structure
//!
//! ```toml
//! [global_variables]
//! project = "citrus"
//! runId = "citrus:randomNumber(8)"
//! greeting = "Hello ${project}"
//!
//! [functions]
//! discover = true
//!
//! [masking]
//! enabled = true
//! ```
//!
//! Global variable values are resolved when the context factory is built, in
//! declaration order.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;
use std::{io::Read, path::Path};
use tracing::*;

use crate::{Error, Result};

/// Environment variable name for specifying the config file path.
const CITRUS_CONFIG_ENV: &str = "CITRUS_CONFIG";

/// Prefix of environment variables defining global variables.
const CITRUS_VAR_PREFIX: &str = "CITRUS_VAR_";

static CONFIG: Lazy<Config> = Lazy::new(|| {
    let _ = dotenv::dotenv();
    Config::load().unwrap_or_else(|e| {
        error!("{e}");
        Config::default()
    })
});

/// Process-wide configuration, loaded on first access.
pub fn get_citrus_config() -> &'static Config {
    &CONFIG
}

/// citrus's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Global variables in declaration order. String values may contain dynamic content.
    pub global_variables: IndexMap<String, Value>,
    pub functions: Functions,
    pub masking: Masking,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Functions {
    /// Whether functions registered with `#[citrus::function]` are added to the registry.
    #[serde(default = "enabled")]
    pub discover: bool,
}

impl Default for Functions {
    fn default() -> Self {
        Functions { discover: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Masking {
    /// Whether values of sensitive variables are masked in logs.
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl Default for Masking {
    fn default() -> Self {
        Masking { enabled: true }
    }
}

fn enabled() -> bool {
    true
}

fn looks_like_path(value: &str) -> bool {
    Path::new(value).extension().is_some_and(|ext| ext == "toml")
        || value.contains(std::path::MAIN_SEPARATOR)
        || value.contains('/')
}

impl Config {
    /// Load citrus configuration from path. A missing file yields the default configuration.
    pub fn load_from(path: &Path) -> Result<Config> {
        let Ok(mut file) = std::fs::File::open(path) else {
            debug!("{path:?} not found, using default configuration");
            let mut cfg = Config::default();
            cfg.load_env();
            return Ok(cfg);
        };

        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .map_err(|e| Error::LoadError(e.to_string()))?;

        #[derive(Deserialize)]
        struct ConfigHelper {
            #[serde(default)]
            global_variables: IndexMap<String, Value>,
            #[serde(default)]
            functions: Functions,
            #[serde(default)]
            masking: Masking,
        }

        let helper: ConfigHelper = toml::from_str(&buf).map_err(|e| {
            Error::LoadError(format!(
                "failed to deserialize citrus.toml into citrus::Config: {e}"
            ))
        })?;

        let mut cfg = Config {
            global_variables: helper.global_variables,
            functions: helper.functions,
            masking: helper.masking,
        };

        debug!(
            "citrus.toml was successfully loaded with {} global variables",
            cfg.global_variables.len()
        );

        cfg.load_env();

        Ok(cfg)
    }

    /// Load citrus configuration.
    ///
    /// Loading order:
    /// 1. If `CITRUS_CONFIG` env var is set, load from that path
    /// 2. Otherwise, load from `citrus.toml` in the current directory
    pub fn load() -> Result<Config> {
        match std::env::var(CITRUS_CONFIG_ENV) {
            Ok(path) => {
                if !looks_like_path(&path) {
                    return Err(Error::LoadError(format!(
                        "{CITRUS_CONFIG_ENV} should be a path to a config file, not a config value. \
                         Got: {path:?}. Use {CITRUS_VAR_PREFIX}<NAME>=value for variables instead."
                    )));
                }

                let path = Path::new(&path);
                if !path.exists() {
                    return Err(Error::LoadError(format!(
                        "Config file specified by {CITRUS_CONFIG_ENV} not found: {path:?}"
                    )));
                }

                debug!("Loading config from {CITRUS_CONFIG_ENV}={path:?}");
                Config::load_from(path)
            }
            Err(_) => Config::load_from(Path::new("citrus.toml")),
        }
    }

    /// Load global variables from environment variables.
    ///
    /// citrus detects environment variables prefixed with `CITRUS_VAR_` and maps
    /// `CITRUS_VAR_XXX=value` to the global variable "xxx". Environment variables win
    /// over variables of the same name declared in `citrus.toml`.
    fn load_env(&mut self) {
        debug!("Loading global variables from env");
        let vars = std::env::vars().filter_map(|(k, v)| {
            let name = k.strip_prefix(CITRUS_VAR_PREFIX)?;
            (!name.is_empty()).then(|| (name.to_lowercase(), Value::String(v)))
        });
        self.global_variables.extend(vars);
    }
}
