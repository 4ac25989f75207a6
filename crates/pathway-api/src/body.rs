use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

/// Lenient JSON request body.
///
/// Never rejects: a missing, unparsable or non-object body reads as an empty
/// object, so handlers report "field required" instead of a parse error.
/// Content-Type is not checked.
#[derive(Debug, Default, Clone)]
pub struct JsonBody(Map<String, Value>);

impl JsonBody {
    pub fn from_slice(raw: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self::default(),
        }
    }

    /// Trimmed string field. Wrong type, blank or missing all read as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Array of strings, trimmed, blanks and non-strings dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn email(&self, key: &str) -> Option<String> {
        self.text(key).map(|e| e.to_lowercase())
    }
}

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Bytes::from_request(req, state).await {
            Ok(bytes) => Ok(Self::from_slice(&bytes)),
            Err(_) => Ok(Self::default()),
        }
    }
}
