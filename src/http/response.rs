use serde_json::Value;

use crate::error::SerializationError;
use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;
use crate::http::{APPLICATION_JSON, TEXT_HTML, media_type_essence};

/// Body of a [`Response`] before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    Empty,
}

impl ResponseBody {
    fn kind(&self) -> &'static str {
        match self {
            ResponseBody::Json(_) => "structured",
            ResponseBody::Text(_) => "text",
            ResponseBody::Bytes(_) => "binary",
            ResponseBody::Empty => "empty",
        }
    }
}

/// What an endpoint operation returns.
///
/// Defaults to `200 OK` with `application/json`. Encoding is deferred to
/// [`Response::serialize`], which is the only place the content type is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: HttpStatus,
    pub content_type: String,
    pub body: ResponseBody,
    headers: HttpHeaders,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: HttpStatus::Ok,
            content_type: APPLICATION_JSON.to_string(),
            body: ResponseBody::Empty,
            headers: HttpHeaders::new(),
        }
    }

    pub fn json(body: impl Into<Value>) -> Self {
        Self {
            body: ResponseBody::Json(body.into()),
            ..Self::new()
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: TEXT_HTML.to_string(),
            body: ResponseBody::Text(body.into()),
            ..Self::new()
        }
    }

    pub fn with_status(mut self, status: HttpStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// Extra header emitted after `Content-Type` and `Content-Length`.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Encodes the body for the declared content type.
    ///
    /// `application/json` writes compact JSON; `text/html` passes text through
    /// unchanged. `Content-Length` always reflects the encoded byte length.
    pub fn serialize(&self) -> Result<ResponseParts, SerializationError> {
        let body = self.encode_body()?;

        let mut headers = HttpHeaders::new();
        headers.set("Content-Type", self.content_type.as_str());
        headers.set("Content-Length", body.len().to_string());
        for (name, value) in self.headers.iter() {
            if !headers.contains(name) {
                headers.set(name, value);
            }
        }

        Ok(ResponseParts {
            status: self.status,
            headers,
            body,
            accept_encoding: None,
        })
    }

    fn encode_body(&self) -> Result<Vec<u8>, SerializationError> {
        let essence = media_type_essence(&self.content_type);

        if essence.eq_ignore_ascii_case(APPLICATION_JSON) {
            return match &self.body {
                ResponseBody::Json(value) => Ok(serde_json::to_vec(value)?),
                ResponseBody::Text(text) => Ok(serde_json::to_vec(text)?),
                ResponseBody::Empty => Ok(b"null".to_vec()),
                ResponseBody::Bytes(_) => Err(self.mismatch()),
            };
        }

        if essence.eq_ignore_ascii_case(TEXT_HTML) {
            return match &self.body {
                ResponseBody::Text(text) => Ok(text.as_bytes().to_vec()),
                ResponseBody::Json(Value::String(text)) => Ok(text.as_bytes().to_vec()),
                ResponseBody::Bytes(bytes) => Ok(bytes.clone()),
                _ => Err(self.mismatch()),
            };
        }

        Err(SerializationError::UnsupportedContentType(
            self.content_type.clone(),
        ))
    }

    fn mismatch(&self) -> SerializationError {
        SerializationError::BodyMismatch {
            content_type: self.content_type.clone(),
            body: self.body.kind(),
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// The serialized `(status, headers, body)` triple middleware post-processing
/// works on, and that terminal responses are built as directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseParts {
    pub status: HttpStatus,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Request's `Accept-Encoding` value, copied in by the dispatcher before
    /// post-processing. Never sent to the gateway.
    pub accept_encoding: Option<String>,
}

impl ResponseParts {
    /// Bodyless reply, as used by the terminal error paths.
    pub fn empty(status: HttpStatus) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: Vec::new(),
            accept_encoding: None,
        }
    }

    /// Whether the client accepts `coding`, by name or through `*`.
    ///
    /// An entry naming the coding wins over the wildcard; `q=0` refuses.
    pub fn accepts_encoding(&self, coding: &str) -> bool {
        let Some(accepted) = &self.accept_encoding else {
            return false;
        };

        let mut wildcard = false;
        for entry in accepted.split(',') {
            let mut params = entry.split(';');
            let name = params.next().unwrap_or("").trim();
            let refused = params.any(|param| {
                param
                    .trim()
                    .strip_prefix("q=")
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .is_some_and(|q| q <= 0.0)
            });
            if name.eq_ignore_ascii_case(coding) {
                return !refused;
            }
            if name == "*" {
                wildcard = !refused;
            }
        }
        wildcard
    }

    pub fn status_line(&self) -> String {
        self.status.status_line()
    }

    /// Replaces the body and keeps `Content-Length` in step with it.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.headers.set("Content-Length", body.len().to_string());
        self.body = body;
    }
}
