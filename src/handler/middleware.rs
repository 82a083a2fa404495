//! Ordered request/response transformation stages.
//!
//! Stages run in registration order on the way in ([`Middleware::preprocess`])
//! and in the same registration order on the way out
//! ([`Middleware::postprocess`]); the chain is not unwound in reverse.
//! A stage aborts the pipeline only by returning a [`MiddlewareError`].

use std::io::Write;
use std::sync::Arc;
use std::time::SystemTime;

use flate2::Compression as Level;
use flate2::write::{DeflateEncoder, GzEncoder};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::MiddlewareError;
use crate::http::request::Request;
use crate::http::response::ResponseParts;

pub trait Middleware: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    fn preprocess(&self, req: Request) -> Result<Request, MiddlewareError> {
        Ok(req)
    }

    fn postprocess(&self, parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
        Ok(parts)
    }
}

#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with(mut self, stage: Arc<dyn Middleware>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn push(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Each stage receives the request returned by the previous one.
    pub fn run_pre(&self, mut req: Request) -> Result<Request, MiddlewareError> {
        for stage in &self.stages {
            req = stage.preprocess(req)?;
        }
        Ok(req)
    }

    /// Same order as [`MiddlewareChain::run_pre`].
    pub fn run_post(&self, mut parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
        for stage in &self.stages {
            parts = stage.postprocess(parts)?;
        }
        Ok(parts)
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Logs each request on the way in and its status on the way out.
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn name(&self) -> &str {
        "request_logger"
    }

    fn preprocess(&self, req: Request) -> Result<Request, MiddlewareError> {
        info!(
            method = %req.method(),
            path = req.path(),
            content_type = req.content_type().unwrap_or(""),
            "request"
        );
        Ok(req)
    }

    fn postprocess(&self, parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
        info!(
            status = parts.status.code(),
            bytes = parts.body.len(),
            "response"
        );
        Ok(parts)
    }
}

/// Appends fixed headers (e.g. `Server`) to every dispatched response.
pub struct ResponseHeaders {
    headers: Vec<(String, String)>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for ResponseHeaders {
    fn name(&self) -> &str {
        "response_headers"
    }

    fn postprocess(&self, mut parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
        for (name, value) in &self.headers {
            parts.headers.set(name, value.as_str());
        }
        Ok(parts)
    }
}

/// Sets an HTTP-date `Date` header.
pub struct DateHeader;

impl Middleware for DateHeader {
    fn name(&self) -> &str {
        "date_header"
    }

    fn postprocess(&self, mut parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
        parts
            .headers
            .set("Date", httpdate::fmt_http_date(SystemTime::now()));
        Ok(parts)
    }
}

// Content codings that can be produced here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    Gzip,
    Deflate,
}

impl CompressionAlgorithm {
    pub fn as_str(&self) -> &str {
        match self {
            CompressionAlgorithm::Gzip => "gzip",
            CompressionAlgorithm::Deflate => "deflate",
        }
    }
}

/// Encodes response bodies of at least `min_size` bytes when the client's
/// `Accept-Encoding` lists the algorithm.
///
/// Bodies that already carry a `Content-Encoding` are left alone.
pub struct Compression {
    algorithm: CompressionAlgorithm,
    min_size: usize,
}

impl Compression {
    pub fn new(algorithm: CompressionAlgorithm, min_size: usize) -> Self {
        Self {
            algorithm,
            min_size,
        }
    }

    fn compress(&self, body: &[u8]) -> std::io::Result<Vec<u8>> {
        match self.algorithm {
            CompressionAlgorithm::Gzip => {
                let mut e = GzEncoder::new(Vec::new(), Level::default());
                e.write_all(body)?;
                e.finish()
            }
            CompressionAlgorithm::Deflate => {
                let mut e = DeflateEncoder::new(Vec::new(), Level::default());
                e.write_all(body)?;
                e.finish()
            }
        }
    }
}

impl Middleware for Compression {
    fn name(&self) -> &str {
        "compression"
    }

    fn postprocess(&self, mut parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
        if parts.body.is_empty()
            || parts.body.len() < self.min_size
            || parts.headers.contains("Content-Encoding")
            || !parts.accepts_encoding(self.algorithm.as_str())
        {
            return Ok(parts);
        }

        let encoded = self
            .compress(&parts.body)
            .map_err(|err| MiddlewareError::new(self.name(), err.to_string()))?;
        debug!(
            algorithm = self.algorithm.as_str(),
            from = parts.body.len(),
            to = encoded.len(),
            "compressed response body"
        );

        parts.set_body(encoded);
        parts
            .headers
            .set("Content-Encoding", self.algorithm.as_str());
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::{Environ, PATH_INFO};
    use crate::http::response::Response;
    use crate::http::status::HttpStatus;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::sync::Mutex;

    struct Recorder {
        id: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &str {
            self.id
        }

        fn preprocess(&self, req: Request) -> Result<Request, MiddlewareError> {
            self.seen.lock().unwrap().push(format!("pre:{}", self.id));
            let path = format!("{}/{}", req.path(), self.id);
            Ok(req.with_path(path))
        }

        fn postprocess(&self, mut parts: ResponseParts) -> Result<ResponseParts, MiddlewareError> {
            self.seen.lock().unwrap().push(format!("post:{}", self.id));
            let mut body = parts.body.clone();
            body.extend_from_slice(self.id.as_bytes());
            parts.set_body(body);
            Ok(parts)
        }
    }

    struct Reject;

    impl Middleware for Reject {
        fn name(&self) -> &str {
            "reject"
        }

        fn preprocess(&self, _req: Request) -> Result<Request, MiddlewareError> {
            Err(MiddlewareError::new(self.name(), "nope"))
        }
    }

    fn chain(seen: &Arc<Mutex<Vec<String>>>) -> MiddlewareChain {
        MiddlewareChain::new()
            .with(Arc::new(Recorder {
                id: "a",
                seen: seen.clone(),
            }))
            .with(Arc::new(Recorder {
                id: "b",
                seen: seen.clone(),
            }))
    }

    #[test]
    fn pre_and_post_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = chain(&seen);

        let req = chain
            .run_pre(Request::from_environ(Environ::new().with(PATH_INFO, "")))
            .unwrap();
        assert_eq!(req.path(), "/a/b");

        let parts = chain.run_post(Response::html("x").serialize().unwrap()).unwrap();
        assert_eq!(parts.body, b"xab");
        assert_eq!(parts.headers.get("Content-Length"), Some("3"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["pre:a", "pre:b", "post:a", "post:b"]
        );
    }

    #[test]
    fn failing_stage_stops_the_chain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new()
            .with(Arc::new(Reject))
            .with(Arc::new(Recorder {
                id: "a",
                seen: seen.clone(),
            }));

        let err = chain
            .run_pre(Request::from_environ(Environ::new()))
            .unwrap_err();
        assert_eq!(err.stage, "reject");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn gzip_round_trips_and_fixes_length() {
        let body = "<p>".repeat(100);
        let mut parts = Response::html(body.clone()).serialize().unwrap();
        parts.accept_encoding = Some("gzip, deflate".to_string());
        let parts = Compression::new(CompressionAlgorithm::Gzip, 16)
            .postprocess(parts)
            .unwrap();

        assert_eq!(parts.headers.get("Content-Encoding"), Some("gzip"));
        assert_eq!(
            parts.headers.get("Content-Length"),
            Some(parts.body.len().to_string().as_str())
        );

        let mut decoded = String::new();
        GzDecoder::new(parts.body.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn bodies_stay_plain_without_accept_encoding() {
        let body = "<p>".repeat(100);
        let compression = Compression::new(CompressionAlgorithm::Gzip, 16);

        let parts = Response::html(body.clone()).serialize().unwrap();
        let parts = compression.postprocess(parts).unwrap();
        assert_eq!(parts.body, body.as_bytes());
        assert!(!parts.headers.contains("Content-Encoding"));

        let mut parts = Response::html(body.clone()).serialize().unwrap();
        parts.accept_encoding = Some("deflate".to_string());
        let parts = compression.postprocess(parts).unwrap();
        assert_eq!(parts.body, body.as_bytes());
    }

    #[test]
    fn small_bodies_are_not_compressed() {
        let mut parts = Response::html("tiny").serialize().unwrap();
        parts.accept_encoding = Some("deflate".to_string());
        let parts = Compression::new(CompressionAlgorithm::Deflate, 1024)
            .postprocess(parts)
            .unwrap();
        assert_eq!(parts.body, b"tiny");
        assert!(!parts.headers.contains("Content-Encoding"));
    }

    #[test]
    fn static_and_date_headers_are_added() {
        let parts = ResponseParts::empty(HttpStatus::Ok);
        let parts = ResponseHeaders::new()
            .with("Server", "rustygate/test")
            .postprocess(parts)
            .unwrap();
        let parts = DateHeader.postprocess(parts).unwrap();

        assert_eq!(parts.headers.get("Server"), Some("rustygate/test"));
        let date = parts.headers.get("Date").unwrap();
        assert!(httpdate::parse_http_date(date).is_ok());
    }
}
