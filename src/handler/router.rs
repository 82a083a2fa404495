use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ConfigError, HandlerError, RouteError};
use crate::http::HttpMethod;
use crate::http::request::Request;
use crate::http::response::Response;

pub type HandlerResult = Result<Response, HandlerError>;

/// One verb operation of an endpoint.
pub type Operation = Arc<dyn Fn(Request) -> HandlerResult + Send + Sync>;

/// Verb table of a single endpoint, filled at registration time.
///
/// ```
/// use rustygate::handler::router::Handler;
/// use rustygate::http::response::Response;
///
/// let handler = Handler::new()
///     .get(|_req| Ok(Response::html("<h1>hi</h1>")));
/// ```
#[derive(Clone, Default)]
pub struct Handler {
    operations: IndexMap<HttpMethod, Operation>,
}

impl Handler {
    pub fn new() -> Self {
        Self {
            operations: IndexMap::new(),
        }
    }

    /// Binds `op` to `method`, replacing a previous binding for the same verb.
    pub fn on<F>(mut self, method: HttpMethod, op: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.operations.insert(method, Arc::new(op));
        self
    }

    pub fn get<F>(self, op: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(HttpMethod::Get, op)
    }

    pub fn post<F>(self, op: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(HttpMethod::Post, op)
    }

    pub fn put<F>(self, op: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(HttpMethod::Put, op)
    }

    pub fn patch<F>(self, op: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(HttpMethod::Patch, op)
    }

    pub fn delete<F>(self, op: F) -> Self
    where
        F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(HttpMethod::Delete, op)
    }

    pub fn operation(&self, method: &HttpMethod) -> Option<&Operation> {
        self.operations.get(method)
    }

    /// Registered verbs, in registration order.
    pub fn allowed_methods(&self) -> Vec<&HttpMethod> {
        self.operations.keys().collect()
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("methods", &self.allowed_methods())
            .finish()
    }
}

/// Exact-match path table. Read-only once the dispatcher is built.
#[derive(Clone, Debug, Default)]
pub struct Router {
    routes: IndexMap<String, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: IndexMap::new(),
        }
    }

    pub fn register(&mut self, path: &str, handler: Handler) -> Result<(), ConfigError> {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidPath(path.to_string()));
        }
        if self.routes.contains_key(path) {
            return Err(ConfigError::DuplicateRoute(path.to_string()));
        }
        self.routes.insert(path.to_string(), handler);
        Ok(())
    }

    /// Builder form of [`Router::register`].
    pub fn route(mut self, path: &str, handler: Handler) -> Result<Self, ConfigError> {
        self.register(path, handler)?;
        Ok(self)
    }

    pub fn handler(&self, path: &str) -> Option<&Handler> {
        self.routes.get(path)
    }

    /// Resolves the handler by path, then the operation by verb.
    pub fn resolve(&self, path: &str, method: &HttpMethod) -> Result<&Operation, RouteError> {
        let handler = self.handler(path).ok_or_else(|| RouteError::NotFound {
            path: path.to_string(),
        })?;

        handler
            .operation(method)
            .ok_or_else(|| RouteError::MethodNotAllowed {
                path: path.to_string(),
                method: method.to_string(),
            })
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Environ;

    fn ok(_req: Request) -> HandlerResult {
        Ok(Response::html("ok"))
    }

    #[test]
    fn resolves_exact_paths_only() {
        let router = Router::new().route("/cars", Handler::new().get(ok)).unwrap();

        assert!(router.resolve("/cars", &HttpMethod::Get).is_ok());
        assert_eq!(
            router.resolve("/cars/", &HttpMethod::Get).err(),
            Some(RouteError::NotFound {
                path: "/cars/".to_string()
            })
        );
        assert!(router.resolve("/car", &HttpMethod::Get).is_err());
    }

    #[test]
    fn missing_verb_is_not_allowed() {
        let router = Router::new().route("/cars", Handler::new().get(ok)).unwrap();
        assert_eq!(
            router.resolve("/cars", &HttpMethod::Delete).err(),
            Some(RouteError::MethodNotAllowed {
                path: "/cars".to_string(),
                method: "DELETE".to_string()
            })
        );
    }

    #[test]
    fn duplicate_and_relative_paths_are_rejected() {
        let mut router = Router::new();
        router.register("/cars", Handler::new()).unwrap();
        assert!(matches!(
            router.register("/cars", Handler::new()),
            Err(ConfigError::DuplicateRoute(_))
        ));
        assert!(matches!(
            router.register("cars", Handler::new()),
            Err(ConfigError::InvalidPath(_))
        ));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn extension_verbs_can_be_bound() {
        let handler = Handler::new()
            .post(ok)
            .on(HttpMethod::parse("purge"), ok)
            .get(ok);
        assert_eq!(
            handler.allowed_methods(),
            vec![
                &HttpMethod::Post,
                &HttpMethod::Other("PURGE".to_string()),
                &HttpMethod::Get
            ]
        );

        let router = Router::new().route("/cache", handler).unwrap();
        let op = router
            .resolve("/cache", &HttpMethod::parse("PURGE"))
            .unwrap();
        let res = op(Request::from_environ(Environ::new())).unwrap();
        assert_eq!(res.body, crate::http::response::ResponseBody::Text("ok".into()));
    }
}
