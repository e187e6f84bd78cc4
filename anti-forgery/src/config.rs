//! Filter configuration
//!
//! [`AntiForgeryOptions`] is what callers build; it allows any combination of
//! settings. Converting it into an [`AntiForgeryConfig`] resolves it once into
//! the immutable form the filter runs with, rejecting combinations that make
//! no sense.
//!
//! ```rust
//! use anti_forgery::{AntiForgeryConfig, AntiForgeryOptions, Response};
//! use http::StatusCode;
//!
//! let options = AntiForgeryOptions::new()
//!     .with_error_response(Response::new(StatusCode::UNPROCESSABLE_ENTITY));
//! let config = AntiForgeryConfig::try_from(options).unwrap();
//!
//! let conflicting = AntiForgeryOptions::new()
//!     .with_error_response(Response::forbidden())
//!     .with_error_handler(|_req| Response::forbidden());
//! assert!(AntiForgeryConfig::try_from(conflicting).is_err());
//! ```

use crate::error::AntiForgeryError;
use crate::request::Request;
use crate::response::Response;
use crate::validate::{self, default_read_token};
use std::sync::Arc;

/// Token lookup strategy
pub type ReadToken = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

/// Denial response builder
pub type ErrorHandler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// Options accepted when building the filter
#[derive(Clone, Default)]
pub struct AntiForgeryOptions {
    read_token: Option<ReadToken>,
    error_response: Option<Response>,
    error_handler: Option<ErrorHandler>,
}

impl std::fmt::Debug for AntiForgeryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AntiForgeryOptions")
            .field("read_token", &self.read_token.as_ref().map(|_| "Fn"))
            .field("error_response", &self.error_response)
            .field("error_handler", &self.error_handler.as_ref().map(|_| "Fn"))
            .finish()
    }
}

impl AntiForgeryOptions {
    /// Create options with every setting at its default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default token lookup entirely
    #[must_use]
    pub fn with_read_token<F>(mut self, read_token: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.read_token = Some(Arc::new(read_token));
        self
    }

    /// Return this response verbatim when a request is denied
    #[must_use]
    pub fn with_error_response(mut self, response: Response) -> Self {
        self.error_response = Some(response);
        self
    }

    /// Build the denial response with this handler
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }
}

/// How denied requests are answered
#[derive(Clone, Default)]
pub enum Denial {
    /// Built-in `403 Forbidden` HTML response
    #[default]
    Forbidden,
    /// Fixed response returned verbatim
    Response(Response),
    /// Handler invoked with the denied request
    Handler(ErrorHandler),
}

impl std::fmt::Debug for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden => f.write_str("Forbidden"),
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Handler(_) => f.write_str("Handler(Fn)"),
        }
    }
}

impl Denial {
    /// Produce the denial response for a request
    #[must_use]
    pub fn respond(&self, request: &Request) -> Response {
        match self {
            Self::Forbidden => Response::forbidden(),
            Self::Response(response) => response.clone(),
            Self::Handler(handler) => handler(request),
        }
    }
}

/// Resolved, immutable filter configuration
#[derive(Clone)]
pub struct AntiForgeryConfig {
    read_token: ReadToken,
    denial: Denial,
}

impl std::fmt::Debug for AntiForgeryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AntiForgeryConfig")
            .field("read_token", &"Fn")
            .field("denial", &self.denial)
            .finish()
    }
}

impl Default for AntiForgeryConfig {
    fn default() -> Self {
        Self {
            read_token: Arc::new(default_read_token),
            denial: Denial::default(),
        }
    }
}

impl TryFrom<AntiForgeryOptions> for AntiForgeryConfig {
    type Error = AntiForgeryError;

    fn try_from(options: AntiForgeryOptions) -> Result<Self, Self::Error> {
        let denial = match (options.error_response, options.error_handler) {
            (Some(_), Some(_)) => return Err(AntiForgeryError::ConflictingDenialOptions),
            (Some(response), None) => Denial::Response(response),
            (None, Some(handler)) => Denial::Handler(handler),
            (None, None) => Denial::Forbidden,
        };

        let read_token: ReadToken = match options.read_token {
            Some(read_token) => read_token,
            None => Arc::new(default_read_token),
        };

        Ok(Self { read_token, denial })
    }
}

impl AntiForgeryConfig {
    /// Token presented by a request, according to the configured lookup
    #[must_use]
    pub fn read_token(&self, request: &Request) -> Option<String> {
        (self.read_token)(request)
    }

    /// Check the request's presented token against its session token
    #[must_use]
    pub fn is_valid(&self, request: &Request) -> bool {
        validate::is_valid(request, &*self.read_token)
    }

    /// Denial response for a request that failed validation
    #[must_use]
    pub fn deny(&self, request: &Request) -> Response {
        self.denial.respond(request)
    }

    /// The configured denial strategy
    #[must_use]
    pub const fn denial(&self) -> &Denial {
        &self.denial
    }
}
