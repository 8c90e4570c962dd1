//! Error types.
//!
//! [`RequestError`] is what the request hooks log: parse failures,
//! validation failures and errors collected during execution. The plugin
//! only observes these, it never raises them. [`ConfigError`] is returned
//! when building a plugin from an invalid configuration.

use async_graphql::{PathSegment, Pos, ServerError};
use thiserror::Error;

/// An error reported to the request hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The source could not be parsed.
    #[error("{message}")]
    Syntax {
        message: String,
        locations: Vec<Pos>,
    },

    /// The document failed validation against the schema.
    #[error("{message}")]
    Validation {
        message: String,
        locations: Vec<Pos>,
    },

    /// An error raised while executing the operation.
    #[error("{message}")]
    Execution {
        message: String,
        /// Response path of the failing field, if any.
        path: Vec<String>,
        locations: Vec<Pos>,
    },

    /// Any other error.
    #[error("{message}")]
    Other { message: String },
}

impl RequestError {
    /// Create a new Syntax error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            locations: Vec::new(),
        }
    }

    /// Create a new Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            locations: Vec::new(),
        }
    }

    /// Create a new Execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            path: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Kind name written before the message in the error line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "SyntaxError",
            Self::Validation { .. } => "ValidationError",
            Self::Execution { .. } => "GraphQLError",
            Self::Other { .. } => "Error",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. }
            | Self::Validation { message, .. }
            | Self::Execution { message, .. }
            | Self::Other { message } => message,
        }
    }

    /// Source positions the error points at.
    #[must_use]
    pub fn locations(&self) -> &[Pos] {
        match self {
            Self::Syntax { locations, .. }
            | Self::Validation { locations, .. }
            | Self::Execution { locations, .. } => locations,
            Self::Other { .. } => &[],
        }
    }

    /// Replaces the source positions. Ignored for [`RequestError::Other`].
    #[must_use]
    pub fn with_locations(mut self, positions: Vec<Pos>) -> Self {
        match &mut self {
            Self::Syntax { locations, .. }
            | Self::Validation { locations, .. }
            | Self::Execution { locations, .. } => *locations = positions,
            Self::Other { .. } => {}
        }
        self
    }
}

impl From<ServerError> for RequestError {
    fn from(err: ServerError) -> Self {
        Self::from(&err)
    }
}

impl From<&ServerError> for RequestError {
    fn from(err: &ServerError) -> Self {
        Self::Execution {
            message: err.message.clone(),
            path: err
                .path
                .iter()
                .map(|segment| match segment {
                    PathSegment::Field(name) => name.clone(),
                    PathSegment::Index(index) => index.to_string(),
                })
                .collect(),
            locations: err.locations.clone(),
        }
    }
}

/// Errors raised while building a plugin.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid request logger configuration: {0}")]
    Invalid(String),

    #[error("Invalid debug selector: {0}")]
    Pattern(#[from] regex::Error),
}
