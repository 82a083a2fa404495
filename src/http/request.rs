use std::io::{Cursor, Read};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::BodyError;
use crate::http::HttpMethod;

pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const PATH_INFO: &str = "PATH_INFO";
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
pub const QUERY_STRING: &str = "QUERY_STRING";
pub const HTTP_ACCEPT_ENCODING: &str = "HTTP_ACCEPT_ENCODING";

/// Body limit applied when the dispatcher has not set one.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024; // 1 MB

/// Readable byte source carrying the request body.
pub type BodyStream = Box<dyn Read + Send>;

/// What the gateway hands over for one call: string variables plus a body source.
pub struct Environ {
    vars: IndexMap<String, String>,
    input: BodyStream,
}

impl Environ {
    pub fn new() -> Self {
        Self {
            vars: IndexMap::new(),
            input: Box::new(std::io::empty()),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn with_input(mut self, input: impl Read + Send + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// In-memory body; also sets `CONTENT_LENGTH`.
    pub fn with_body(self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.with(CONTENT_LENGTH, body.len().to_string())
            .with_input(Cursor::new(body))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl Default for Environ {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environ {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut environ = Environ::new();
        for (key, value) in iter {
            environ.vars.insert(key.into(), value.into());
        }
        environ
    }
}

/// Typed view over an [`Environ`].
///
/// Built once per call by [`Request::from_environ`], which never fails: missing
/// keys simply leave the corresponding field empty. Middleware hands an updated
/// request forward with [`Request::with_var`] instead of mutating a shared one.
///
/// Every key that is not one of the typed fields is kept in insertion order under
/// a normalized name (dots replaced by underscores).
pub struct Request {
    method: HttpMethod,
    raw_method: String,
    path: String,
    content_type: Option<String>,
    content_length: Option<usize>,
    query_string: String,
    vars: IndexMap<String, String>,
    body: BodyStream,
    max_body_size: usize,
}

impl Request {
    pub fn from_environ(environ: Environ) -> Self {
        let Environ { vars: raw, input } = environ;

        let mut req = Self {
            method: HttpMethod::Other(String::new()),
            raw_method: String::new(),
            path: String::new(),
            content_type: None,
            content_length: None,
            query_string: String::new(),
            vars: IndexMap::new(),
            body: input,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        };

        for (key, value) in raw {
            match key.as_str() {
                REQUEST_METHOD => {
                    req.method = HttpMethod::parse(&value);
                    req.raw_method = value;
                }
                PATH_INFO => req.path = value,
                CONTENT_TYPE => {
                    req.content_type = Some(value).filter(|v| !v.trim().is_empty());
                }
                CONTENT_LENGTH => {
                    req.content_length = value.trim().parse::<usize>().ok();
                    req.vars.insert(key, value);
                }
                QUERY_STRING => {
                    req.query_string = value.clone();
                    req.vars.insert(key, value);
                }
                _ => {
                    req.vars.insert(normalize_key(&key), value);
                }
            }
        }

        req
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// Verb exactly as the gateway sent it.
    pub fn raw_method(&self) -> &str {
        &self.raw_method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Any preserved environment variable. `wsgi.url_scheme` and
    /// `wsgi_url_scheme` name the same entry.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(&normalize_key(name)).map(String::as_str)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the request with `name` set; typed fields are updated too.
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match name {
            REQUEST_METHOD => {
                self.method = HttpMethod::parse(&value);
                self.raw_method = value;
            }
            PATH_INFO => self.path = value,
            CONTENT_TYPE => self.content_type = Some(value).filter(|v| !v.trim().is_empty()),
            _ => {
                if name == CONTENT_LENGTH {
                    self.content_length = value.trim().parse::<usize>().ok();
                }
                if name == QUERY_STRING {
                    self.query_string = value.clone();
                }
                self.vars.insert(normalize_key(name), value);
            }
        }
        self
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.with_var(PATH_INFO, path)
    }

    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// `QUERY_STRING` split into ordered pairs. Only `+` is decoded.
    pub fn query(&self) -> Vec<(String, String)> {
        self.query_string
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key.replace('+', " "), value.replace('+', " "))
            })
            .collect()
    }

    /// Direct access to the body source.
    pub fn body_mut(&mut self) -> &mut (dyn Read + Send) {
        self.body.as_mut()
    }

    /// Reads the body, bounded by `CONTENT_LENGTH` when the gateway declared one.
    pub fn read_body(&mut self) -> Result<Vec<u8>, BodyError> {
        let limit = self.max_body_size;
        if let Some(declared) = self.content_length {
            if declared > limit {
                return Err(BodyError::TooLarge { limit });
            }
        }

        let cap = self.content_length.unwrap_or(limit);
        let mut body = Vec::new();
        // One extra byte tells an oversized undeclared body apart from an exact fit
        let read_limit = if self.content_length.is_some() {
            cap
        } else {
            cap.saturating_add(1)
        };
        (&mut self.body)
            .take(read_limit as u64)
            .read_to_end(&mut body)?;

        if body.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        Ok(body)
    }

    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        let body = self.read_body()?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("content_type", &self.content_type)
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}

fn normalize_key(key: &str) -> String {
    key.replace('.', "_")
}
