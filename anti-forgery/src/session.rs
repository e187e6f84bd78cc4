//! Session mapping and token binding
//!
//! The session itself belongs to whatever session layer sits in front of the
//! filter. This module only knows about one reserved key in it, and provides
//! the two binding steps the filter runs around the wrapped service:
//!
//! - [`ensure_token`] before validation, so every session carries a token
//! - [`bind_response_token`] after the wrapped service, so the outgoing
//!   session always carries the same token the request was checked against

use crate::request::Request;
use crate::response::Response;
use crate::token::AntiForgeryToken;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Session key holding the anti-forgery token
pub const SESSION_KEY: &str = "__anti-forgery-token";

/// Per-client session data handed to the filter for one request cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(HashMap<String, Value>);

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a value by key
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Check whether a key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the session has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The anti-forgery token stored in this session, if any
    ///
    /// A non-string value under [`SESSION_KEY`] is not a token this filter
    /// could have written, and is reported as absent.
    #[must_use]
    pub fn anti_forgery_token(&self) -> Option<&str> {
        self.0.get(SESSION_KEY).and_then(Value::as_str)
    }

    /// Store a token under [`SESSION_KEY`], replacing any previous value
    pub fn set_anti_forgery_token(&mut self, token: &str) {
        self.0
            .insert(SESSION_KEY.to_string(), Value::String(token.to_string()));
    }
}

impl FromIterator<(String, Value)> for Session {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<HashMap<String, Value>> for Session {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Make sure the request's session carries a token
///
/// Requests whose session already holds a token are returned untouched. The
/// token is never regenerated while the session keeps it.
#[must_use]
pub fn ensure_token(mut request: Request) -> Request {
    if request.session.anti_forgery_token().is_some() {
        return request;
    }

    let token = AntiForgeryToken::generate();
    request.session.set_anti_forgery_token(token.as_str());
    tracing::debug!(path = %request.uri.path(), "generated anti-forgery token for session");

    request
}

/// Re-attach the request's token to an outgoing response
///
/// `request_session` is the session of the token-bearing request the wrapped
/// service was called with. When the response session already carries that
/// token the response is returned as-is. Otherwise the outgoing session is the
/// one the response supplied, or failing that a copy of `request_session`,
/// with the request token written over whatever the response had under
/// [`SESSION_KEY`].
///
/// If `request_session` has no token there is nothing to bind and the
/// response is returned unchanged.
#[must_use]
pub fn bind_response_token(mut response: Response, request_session: &Session) -> Response {
    let Some(token) = request_session.anti_forgery_token() else {
        return response;
    };

    let response_token = response
        .session
        .as_ref()
        .and_then(Session::anti_forgery_token);
    if response_token == Some(token) {
        return response;
    }

    let mut session = response
        .session
        .take()
        .unwrap_or_else(|| request_session.clone());
    session.set_anti_forgery_token(token);
    response.session = Some(session);

    tracing::debug!("re-bound anti-forgery token to response session");
    response
}
