//! Request representation seen by the filter
//!
//! [`Request`] carries exactly what the filter and the wrapped service need:
//! method, URI, headers, the session mapping, and the decoded form and
//! multipart parameters. [`Request::from_http`] builds one from an
//! `http::Request` with a buffered body.

use crate::error::Result;
use crate::session::Session;
use bytes::Bytes;
use futures_util::stream;
use http::header::{IntoHeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Uri};
use std::collections::HashMap;
use std::convert::Infallible;

/// Form field carrying the anti-forgery token
pub const FORM_FIELD: &str = "__anti-forgery-token";

/// Header carrying the anti-forgery token
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Alternative header carrying the anti-forgery token
pub const XSRF_HEADER: &str = "x-xsrf-token";

/// String-keyed request parameters
pub type Params = HashMap<String, String>;

/// Incoming request
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers (names are case-insensitive)
    pub headers: HeaderMap,
    /// Session mapping for this request cycle
    pub session: Session,
    /// Decoded `application/x-www-form-urlencoded` parameters
    pub form_params: Params,
    /// Text fields of a `multipart/form-data` body
    pub multipart_params: Params,
    /// Raw body
    pub body: Bytes,
}

impl Request {
    /// Create a request with an empty session, no headers and no body
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            ..Self::default()
        }
    }

    /// Set a header
    #[must_use]
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the session
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Add a form parameter
    #[must_use]
    pub fn with_form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_params.insert(name.into(), value.into());
        self
    }

    /// Add a multipart text field
    #[must_use]
    pub fn with_multipart_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.multipart_params.insert(name.into(), value.into());
        self
    }

    /// Replace the raw body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Token stored in this request's session
    ///
    /// Once the filter has run, this is the value to render into forms or hand
    /// to scripts for the `x-csrf-token` header.
    #[must_use]
    pub fn anti_forgery_token(&self) -> Option<&str> {
        self.session.anti_forgery_token()
    }

    /// Build a request from an `http::Request` with a buffered body
    ///
    /// The session is taken from the request extensions, where a session
    /// layer running in front of the filter is expected to have put it. A
    /// request without one starts with an empty session.
    ///
    /// Form bodies are decoded into [`Request::form_params`], text fields of
    /// multipart bodies into [`Request::multipart_params`]. File fields are
    /// skipped. When a name repeats, the first value wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the body claims a form or multipart content type
    /// but cannot be decoded as one.
    pub async fn from_http(request: http::Request<Bytes>) -> Result<Self> {
        let (mut parts, body) = request.into_parts();
        let session = parts.extensions.remove::<Session>().unwrap_or_default();

        let mut form_params = Params::new();
        let mut multipart_params = Params::new();

        if let Some(mime) = content_type(&parts.headers) {
            if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
                form_params = parse_form(&body)?;
            } else if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA {
                let boundary = multer::parse_boundary(mime.as_ref())?;
                multipart_params = parse_multipart(body.clone(), boundary).await?;
            }
        }

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            session,
            form_params,
            multipart_params,
            body,
        })
    }
}

fn content_type(headers: &HeaderMap) -> Option<mime::Mime> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn parse_form(body: &[u8]) -> Result<Params> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;

    let mut params = Params::new();
    for (name, value) in pairs {
        params.entry(name).or_insert(value);
    }
    Ok(params)
}

async fn parse_multipart(body: Bytes, boundary: String) -> Result<Params> {
    let body = stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(body, boundary);

    let mut params = Params::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await?;
        params.entry(name).or_insert(value);
    }
    Ok(params)
}
