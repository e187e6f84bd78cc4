//! Anti-forgery middleware
//!
//! Wraps a service handling [`Request`]s and producing optional
//! [`Response`]s. On every request it:
//!
//! 1. makes sure the session carries a token
//! 2. denies unsafe requests (anything but GET and HEAD) whose presented
//!    token does not match the session token
//! 3. otherwise calls the inner service and re-binds the session token on
//!    its response
//!
//! An inner service answering `None` is passed through untouched. Denial
//! responses are never session-patched.

use crate::config::{AntiForgeryConfig, AntiForgeryOptions};
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use crate::session::{bind_response_token, ensure_token};
use crate::validate::is_safe_method;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer for anti-forgery middleware
#[derive(Clone, Debug, Default)]
pub struct AntiForgeryLayer {
    config: Arc<AntiForgeryConfig>,
}

impl AntiForgeryLayer {
    /// Create the layer from options
    ///
    /// # Errors
    ///
    /// Returns [`crate::AntiForgeryError::ConflictingDenialOptions`] if both an
    /// error response and an error handler are configured.
    pub fn new(options: AntiForgeryOptions) -> Result<Self> {
        Ok(Self::from_config(AntiForgeryConfig::try_from(options)?))
    }

    /// Create the layer from an already resolved configuration
    #[must_use]
    pub fn from_config(config: AntiForgeryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for AntiForgeryLayer {
    type Service = AntiForgery<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AntiForgery {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Wrap a service with anti-forgery protection
///
/// # Errors
///
/// Fails before any request is processed if the options conflict.
pub fn wrap<S>(inner: S, options: AntiForgeryOptions) -> Result<AntiForgery<S>> {
    Ok(AntiForgeryLayer::new(options)?.layer(inner))
}

/// Anti-forgery middleware service
#[derive(Clone, Debug)]
pub struct AntiForgery<S> {
    inner: S,
    config: Arc<AntiForgeryConfig>,
}

impl<S> AntiForgery<S> {
    /// The resolved configuration
    #[must_use]
    pub fn config(&self) -> &AntiForgeryConfig {
        &self.config
    }

    /// Get a reference to the wrapped service
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Consume the middleware, returning the wrapped service
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Service<Request> for AntiForgery<S>
where
    S: Service<Request, Response = Option<Response>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Option<Response>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let request = ensure_token(request);

        if !is_safe_method(&request.method) && !self.config.is_valid(&request) {
            tracing::warn!(
                method = %request.method,
                path = %request.uri.path(),
                "anti-forgery token missing or invalid"
            );
            let denial = self.config.deny(&request);
            return Box::pin(async move { Ok(Some(denial)) });
        }

        // Call the instance that was driven ready, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let session = request.session.clone();

        Box::pin(async move {
            let Some(response) = inner.call(request).await? else {
                tracing::trace!("inner service returned no response");
                return Ok(None);
            };

            Ok(Some(bind_response_token(response, &session)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FORM_FIELD;
    use crate::session::Session;
    use crate::AntiForgeryError;
    use http::{Method, StatusCode};
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    async fn ok_handler(_req: Request) -> std::result::Result<Option<Response>, Infallible> {
        Ok(Some(Response::ok().with_body("handled")))
    }

    #[tokio::test]
    async fn test_get_passes_and_binds_token() {
        let service = AntiForgeryLayer::default().layer(service_fn(ok_handler));

        let request = Request::new(Method::GET, "/".parse().unwrap());
        let response = service.oneshot(request).await.unwrap().unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert!(response
            .session
            .as_ref()
            .and_then(Session::anti_forgery_token)
            .is_some());
    }

    #[tokio::test]
    async fn test_post_without_token_denied() {
        let service = AntiForgeryLayer::default().layer(service_fn(ok_handler));

        let request = Request::new(Method::POST, "/".parse().unwrap());
        let response = service.oneshot(request).await.unwrap().unwrap();

        assert_eq!(response, Response::forbidden());
    }

    #[tokio::test]
    async fn test_post_with_token_passes() {
        let service = AntiForgeryLayer::default().layer(service_fn(ok_handler));

        let mut session = Session::new();
        session.set_anti_forgery_token("tok");
        let request = Request::new(Method::POST, "/".parse().unwrap())
            .with_session(session)
            .with_form_param(FORM_FIELD, "tok");
        let response = service.oneshot(request).await.unwrap().unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "handled");
    }

    #[tokio::test]
    async fn test_none_response_propagated() {
        let service = AntiForgeryLayer::default().layer(service_fn(|_req: Request| async {
            Ok::<Option<Response>, Infallible>(None)
        }));

        let request = Request::new(Method::GET, "/".parse().unwrap());
        assert!(service.oneshot(request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inner_error_propagated() {
        let service = AntiForgeryLayer::default().layer(service_fn(|_req: Request| async {
            Err::<Option<Response>, _>("boom")
        }));

        let request = Request::new(Method::HEAD, "/".parse().unwrap());
        assert_eq!(service.oneshot(request).await.unwrap_err(), "boom");
    }

    #[test]
    fn test_wrap_rejects_conflicting_options() {
        let options = AntiForgeryOptions::new()
            .with_error_response(Response::forbidden())
            .with_error_handler(|_| Response::forbidden());

        let result = wrap(service_fn(ok_handler), options);
        assert!(matches!(
            result.map(|_| ()),
            Err(AntiForgeryError::ConflictingDenialOptions)
        ));
    }

    #[test]
    fn test_layer_shares_config() {
        let layer = AntiForgeryLayer::default();
        let a = layer.layer(service_fn(ok_handler));
        let b = layer.layer(service_fn(ok_handler));

        assert!(Arc::ptr_eq(&a.config, &b.config));
    }
}
