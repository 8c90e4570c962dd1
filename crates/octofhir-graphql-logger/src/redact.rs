//! Variable redaction.
//!
//! Operation variables are logged on every request, so values under
//! sensitive names (passwords, tokens, captchas) are masked before they
//! reach the sink.

use serde_json::{Map, Value};

/// Marker written in place of a redacted value.
pub const REDACTED: &str = "[REDACTED]";

/// Variables as received with a GraphQL request.
pub type Variables = Map<String, Value>;

/// Returns a shallow copy of `variables` with every value whose key appears
/// in `names` replaced by [`REDACTED`].
///
/// A missing map is treated as empty. Nested objects are copied as-is and
/// no keys are added.
///
/// # Example
///
/// ```
/// use octofhir_graphql_logger::redact;
/// use serde_json::json;
///
/// let variables = json!({ "name": "foo", "password": "bar" });
/// let cleaned = redact(&["password"], variables.as_object());
///
/// assert_eq!(cleaned["name"], "foo");
/// assert_eq!(cleaned["password"], "[REDACTED]");
/// ```
#[must_use]
pub fn redact<S: AsRef<str>>(names: &[S], variables: Option<&Variables>) -> Variables {
    let Some(variables) = variables else {
        return Variables::new();
    };

    variables
        .iter()
        .map(|(key, value)| {
            let value = if names.iter().any(|name| name.as_ref() == key) {
                Value::String(REDACTED.to_string())
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}
