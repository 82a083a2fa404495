//! Minimal request dispatch between a gateway call and user endpoints.
//!
//! A gateway hands each request over as an [`Environ`](http::request::Environ)
//! to [`App::call`](handler::App::call), which negotiates the content type,
//! runs the middleware chain, routes by exact path and verb, serializes the
//! endpoint's response and starts the reply.

pub mod config;
pub mod demo;
pub mod error;
pub mod handler;
pub mod http;
pub mod observability;

pub use config::AppConfig;
pub use error::DispatchError;
pub use handler::{App, Handler, Router};
pub use http::request::{Environ, Request};
pub use http::response::Response;
pub use http::status::HttpStatus;
