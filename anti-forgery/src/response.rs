//! Response representation produced by the wrapped service or the denial path

use crate::session::Session;
use bytes::Bytes;
use http::header::{IntoHeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};

/// Body of the built-in denial response
pub const DENIAL_BODY: &str = "<h1>Invalid anti-forgery token</h1>";

/// Outgoing response
///
/// `session` is `None` when the response leaves the session alone. A filtered
/// response always carries the session the client should keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Outgoing session, if the response sets one
    pub session: Option<Session>,
    /// Body
    pub body: Bytes,
}

impl Response {
    /// Create an empty response with the given status
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Create an empty `200 OK` response
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Built-in denial: `403 Forbidden` with an HTML body
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )
            .with_body(DENIAL_BODY)
    }

    /// Set a header
    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the outgoing session
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build a response from an `http::Response`
    ///
    /// A [`Session`] in the response extensions becomes the outgoing session.
    #[must_use]
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (mut parts, body) = response.into_parts();
        Self {
            status: parts.status,
            session: parts.extensions.remove::<Session>(),
            headers: parts.headers,
            body,
        }
    }

    /// Convert into an `http::Response`
    ///
    /// The outgoing session, if any, is placed in the response extensions for
    /// the session layer to persist.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if let Some(session) = self.session {
            response.extensions_mut().insert(session);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_response() {
        let response = Response::forbidden();

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers.get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.body, Bytes::from_static(DENIAL_BODY.as_bytes()));
        assert!(response.session.is_none());
    }

    #[test]
    fn test_default_is_ok() {
        let response = Response::default();
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_into_http_carries_session() {
        let mut session = Session::new();
        session.set_anti_forgery_token("tok");

        let response = Response::new(StatusCode::CREATED)
            .with_header("x-request-id", HeaderValue::from_static("42"))
            .with_session(session.clone())
            .with_body("created")
            .into_http();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "42");
        assert_eq!(response.extensions().get::<Session>(), Some(&session));
        assert_eq!(response.body(), &Bytes::from_static(b"created"));
    }

    #[test]
    fn test_into_http_without_session() {
        let response = Response::ok().into_http();
        assert!(response.extensions().get::<Session>().is_none());
    }

    #[test]
    fn test_from_http_takes_session() {
        let mut session = Session::new();
        session.insert("user_id", 1);

        let mut response = http::Response::new(Bytes::from_static(b"hi"));
        response.extensions_mut().insert(session.clone());

        let response = Response::from_http(response);
        assert_eq!(response.session, Some(session));
        assert_eq!(response.status, StatusCode::OK);
    }
}
