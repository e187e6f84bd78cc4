//! anti-forgery: session-bound CSRF protection for tower services
//!
//! The filter keeps one secret token per session and requires every
//! state-changing request to present it back:
//!
//! - **Safe methods** (GET, HEAD) always reach the wrapped service
//! - **Unsafe methods** must present the session token in the
//!   `__anti-forgery-token` form field, or in the `x-csrf-token` or
//!   `x-xsrf-token` header
//! - Requests that fail validation get a `403 Forbidden` HTML response, or a
//!   configured replacement
//!
//! Tokens are 80-character URL-safe base64 strings (60 random bytes), so they
//! match `[A-Za-z0-9_-]{80}`. The session belongs to the session layer in
//! front of the filter; the filter only reads and writes the
//! `__anti-forgery-token` key of the session it is handed.
//!
//! # Quick Start
//!
//! ```rust
//! use anti_forgery::prelude::*;
//! use std::convert::Infallible;
//! use tower::{service_fn, Layer, ServiceExt};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let handler = service_fn(|req: Request| async move {
//!     // The token to render into forms
//!     let token = req.anti_forgery_token().unwrap_or_default().to_string();
//!     Ok::<_, Infallible>(Some(Response::ok().with_body(token)))
//! });
//!
//! let service = AntiForgeryLayer::new(AntiForgeryOptions::new())?.layer(handler);
//!
//! let request = Request::new(http::Method::GET, "/form".parse()?);
//! let response = service.oneshot(request).await?.expect("handler responded");
//!
//! // The outgoing session carries the token the page was rendered with
//! let session = response.session.expect("session bound");
//! assert_eq!(session.anti_forgery_token().map(str::len), Some(80));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! [`AntiForgeryOptions`] accepts a custom token lookup, and either a static
//! error response or an error handler (not both; see [`AntiForgeryConfig`]).

pub mod config;
pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod session;
pub mod token;
pub mod validate;

pub use config::{AntiForgeryConfig, AntiForgeryOptions, Denial, ErrorHandler, ReadToken};
pub use error::{AntiForgeryError, Result};
pub use middleware::{wrap, AntiForgery, AntiForgeryLayer};
pub use request::{Params, Request, CSRF_HEADER, FORM_FIELD, XSRF_HEADER};
pub use response::{Response, DENIAL_BODY};
pub use session::{bind_response_token, ensure_token, Session, SESSION_KEY};
pub use token::{constant_time_eq, AntiForgeryToken, TOKEN_BYTES, TOKEN_LEN};
pub use validate::{default_read_token, is_safe_method, is_valid};

pub mod prelude {
    //! Convenience re-exports for common types
    //!
    //! ```rust
    //! use anti_forgery::prelude::*;
    //! ```

    pub use crate::config::{AntiForgeryConfig, AntiForgeryOptions};
    pub use crate::error::AntiForgeryError;
    pub use crate::middleware::{wrap, AntiForgery, AntiForgeryLayer};
    pub use crate::request::Request;
    pub use crate::response::Response;
    pub use crate::session::Session;
    pub use crate::token::AntiForgeryToken;
}
