//! Request lifecycle between the gateway and the registered endpoints.
//!
//! One call to [`App::handle`] (or [`App::call`]) takes one request through,
//! in order and without re-entry:
//!
//! 1. content-type negotiation, rejected with `415` and an `Accept` header,
//! 2. middleware pre-processing,
//! 3. route lookup by exact path, `404` on a miss,
//! 4. operation lookup by verb, `405` on a miss,
//! 5. the operation itself, then serialization of its [`Response`],
//! 6. middleware post-processing.
//!
//! The `415`, `404` and `405` replies are terminal: they skip every later
//! stage, post-processing included, and carry no body. Middleware, handler and
//! serialization failures are returned as [`DispatchError`] without a reply
//! being started.
//!
//! [`Response`]: crate::http::response::Response

use tracing::{debug, debug_span, error};

use crate::config::{AppConfig, ErrorContentType};
use crate::error::{ConfigError, DispatchError};
use crate::handler::middleware::MiddlewareChain;
use crate::handler::responses;
use crate::handler::router::Router;
use crate::http::TEXT_HTML;
use crate::http::request::{DEFAULT_MAX_BODY_SIZE, Environ, HTTP_ACCEPT_ENCODING, Request};
use crate::http::response::ResponseParts;
use crate::http::validator::Validator;

/// What goes back to the gateway for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    /// `"<code> <reason>"`
    pub status: String,
    pub headers: Vec<(String, String)>,
    /// One chunk on dispatched paths, none on terminal ones.
    pub body: Vec<Vec<u8>>,
}

enum Outcome {
    Terminal(ResponseParts),
    Dispatched(ResponseParts),
}

/// The dispatcher. Route table and middleware chain are fixed at construction
/// and only read afterwards, so one `App` can serve concurrent calls.
pub struct App {
    router: Router,
    middleware: MiddlewareChain,
    allowed_content_types: Vec<String>,
    error_content_type: ErrorContentType,
    max_body_size: usize,
}

impl App {
    /// Dispatcher with the default allow-list (`application/json`, `text/html`)
    /// and no middleware.
    pub fn new(router: Router) -> Self {
        let config = AppConfig::default();
        Self {
            router,
            middleware: MiddlewareChain::new(),
            allowed_content_types: config.allowed_content_types,
            error_content_type: config.error_content_type,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn from_config(
        router: Router,
        middleware: MiddlewareChain,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            router,
            middleware,
            allowed_content_types: config.allowed_content_types.clone(),
            error_content_type: config.error_content_type,
            max_body_size: config.max_body_size,
        })
    }

    pub fn with_middleware(mut self, middleware: MiddlewareChain) -> Self {
        self.middleware = middleware;
        self
    }

    pub fn with_allowed_content_types<S: Into<String>>(
        mut self,
        allowed: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
        if allowed.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        self.allowed_content_types = allowed;
        Ok(self)
    }

    pub fn with_error_content_type(mut self, policy: ErrorContentType) -> Self {
        self.error_content_type = policy;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Gateway entry point: starts the reply through `start_response`, then
    /// returns the body chunks. `start_response` is called exactly once unless
    /// an error is returned, in which case it is not called at all.
    pub fn call<F>(&self, environ: Environ, start_response: F) -> Result<Vec<Vec<u8>>, DispatchError>
    where
        F: FnOnce(&str, &[(String, String)]),
    {
        let reply = self.handle(environ)?;
        start_response(&reply.status, &reply.headers);
        Ok(reply.body)
    }

    pub fn handle(&self, environ: Environ) -> Result<GatewayReply, DispatchError> {
        let req = Request::from_environ(environ).with_max_body_size(self.max_body_size);

        let span = debug_span!("dispatch", method = %req.method(), path = req.path());
        let _enter = span.enter();

        let outcome = self.process(req).inspect_err(|err| {
            error!(error = %err, "dispatch failed");
        })?;

        let reply = match outcome {
            Outcome::Terminal(parts) => GatewayReply {
                status: parts.status_line(),
                headers: parts.headers.to_pairs(),
                body: Vec::new(),
            },
            Outcome::Dispatched(parts) => GatewayReply {
                status: parts.status_line(),
                headers: parts.headers.to_pairs(),
                body: vec![parts.body],
            },
        };
        debug!(status = %reply.status, "reply");
        Ok(reply)
    }

    fn process(&self, req: Request) -> Result<Outcome, DispatchError> {
        let validator = Validator::new(&self.allowed_content_types);
        let negotiated = match validator.negotiate(&req) {
            Ok(content_type) => content_type,
            Err(err) => {
                debug!(error = %err, "content type rejected");
                return Ok(Outcome::Terminal(responses::unsupported_media_type(
                    &validator.accept_header(),
                )));
            }
        };

        let req = self.middleware.run_pre(req)?;

        let op = match self.router.resolve(req.path(), req.method()) {
            Ok(op) => op,
            Err(err) => {
                debug!(error = %err, "no route");
                let content_type = match self.error_content_type {
                    ErrorContentType::Negotiated => negotiated,
                    ErrorContentType::Html => TEXT_HTML,
                };
                return Ok(Outcome::Terminal(responses::any_error(
                    err.status(),
                    content_type,
                )));
            }
        };

        let accept_encoding = req.var(HTTP_ACCEPT_ENCODING).map(str::to_string);
        let response = op(req)?;
        let mut parts = response.serialize()?;
        parts.accept_encoding = accept_encoding;
        let parts = self.middleware.run_post(parts)?;

        Ok(Outcome::Dispatched(parts))
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &self.router)
            .field("middleware", &self.middleware)
            .field("allowed_content_types", &self.allowed_content_types)
            .field("error_content_type", &self.error_content_type)
            .finish()
    }
}
