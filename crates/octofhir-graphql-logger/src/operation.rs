//! Operation payloads handed to the request hooks.

use std::fmt;

use async_graphql::parser::types::{DocumentOperations, ExecutableDocument, OperationType};

use crate::redact::Variables;

/// Declared type of a GraphQL operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OperationType> for OperationKind {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => Self::Query,
            OperationType::Mutation => Self::Mutation,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

/// What the engine knows about the current operation.
///
/// Every field is optional: hooks fire at different points of the
/// lifecycle and fall back to placeholders for whatever is still unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationDescriptor {
    pub kind: Option<OperationKind>,
    pub name: Option<String>,
    pub variables: Option<Variables>,
    pub source: Option<String>,
}

impl OperationDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_kind(mut self, kind: OperationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Operation name, or an empty string when absent.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Fills in the kind of the operation selected from `document`, and its
    /// name when the request did not give one.
    ///
    /// Without a name the document must contain exactly one operation.
    pub fn resolve(&mut self, document: &ExecutableDocument) {
        match &document.operations {
            DocumentOperations::Single(operation) => self.kind = Some(operation.node.ty.into()),
            DocumentOperations::Multiple(operations) => {
                let selected = match self.name.as_deref() {
                    Some(name) => operations.iter().find(|(op_name, _)| op_name.as_str() == name),
                    None if operations.len() == 1 => operations.iter().next(),
                    None => None,
                };
                if let Some((name, operation)) = selected {
                    self.kind = Some(operation.node.ty.into());
                    self.name = Some(name.to_string());
                }
            }
        }
    }

    /// Declared kind, or `fallback` when unknown.
    pub fn kind_or<'a>(&self, fallback: &'a str) -> &'a str {
        self.kind.map_or(fallback, |kind| kind.as_str())
    }
}
