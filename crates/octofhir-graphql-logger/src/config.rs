//! Request logger configuration.
//!
//! Configuration can be embedded in `octofhir.toml`, for example under a
//! `[graphql.logging]` section. Every field has a default.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql.logging]
//! path = "/$graphql"
//! redacted_variables = ["password", "token", "captcha", "ssn"]
//! id_length = 12
//! debug_selector = "graphql:"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::id::DEFAULT_ID_LENGTH;

/// Request logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLoggerConfig {
    /// Path GraphQL is served on. Only used in server start/stop messages.
    /// Default: "/graphql"
    #[serde(default = "default_path")]
    pub path: String,

    /// Variable names whose values are replaced with `[REDACTED]` in logs.
    /// Default: ["password", "token", "captcha"]
    #[serde(default = "default_redacted_variables")]
    pub redacted_variables: Vec<String>,

    /// Length of generated correlation ids.
    /// Default: 10
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    /// Environment variable read once at server start to enable debug output.
    /// Default: "DEBUG"
    #[serde(default = "default_debug_env")]
    pub debug_env: String,

    /// Pattern the debug variable must match to switch the logger to `debug`.
    /// Default: "graphql:"
    #[serde(default = "default_debug_selector")]
    pub debug_selector: String,

    /// Append the elapsed time to the completion line.
    /// Default: true
    #[serde(default = "default_log_duration")]
    pub log_duration: bool,
}

fn default_path() -> String {
    "/graphql".to_string()
}

fn default_redacted_variables() -> Vec<String> {
    vec!["password".into(), "token".into(), "captcha".into()]
}

fn default_id_length() -> usize {
    DEFAULT_ID_LENGTH
}

fn default_debug_env() -> String {
    "DEBUG".to_string()
}

fn default_debug_selector() -> String {
    "graphql:".to_string()
}

fn default_log_duration() -> bool {
    true
}

impl Default for RequestLoggerConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            redacted_variables: default_redacted_variables(),
            id_length: default_id_length(),
            debug_env: default_debug_env(),
            debug_selector: default_debug_selector(),
            log_duration: default_log_duration(),
        }
    }
}

impl RequestLoggerConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.is_empty() {
            return Err("path must not be empty".into());
        }
        if self.id_length == 0 {
            return Err("id_length must be > 0".into());
        }
        if self.debug_env.is_empty() {
            return Err("debug_env must not be empty".into());
        }
        Ok(())
    }

    /// Compiles the debug selector.
    pub(crate) fn debug_pattern(&self) -> Result<Regex, ConfigError> {
        Ok(Regex::new(&self.debug_selector)?)
    }
}
