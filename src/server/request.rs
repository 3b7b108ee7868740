use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for [`RouteRequest`]. Names use `Arc<str>` since the same
/// handful of names repeat across requests.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// What the router needs to know about an incoming request.
///
/// Only [`path`](HttpRequest::path) is required. The remaining accessors have
/// defaults so minimal transports can implement the trait with a single method;
/// filters that inspect headers simply see nothing in that case.
pub trait HttpRequest {
    /// Raw request path, without query string.
    fn path(&self) -> &str;

    /// Request method.
    fn method(&self) -> &Method {
        &Method::GET
    }

    /// Header lookup, case-insensitive per RFC 7230.
    fn header(&self, _name: &str) -> Option<&str> {
        None
    }

    /// Raw query string, if any.
    fn query(&self) -> Option<&str> {
        None
    }
}

/// Owned request used by the bundled transport and by tests.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderVec,
}

impl RouteRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderVec::new(),
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Build from a request target such as `/user/list?page=2`, splitting off the query.
    #[must_use]
    pub fn from_target(method: Method, target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => {
                let mut req = Self::new(method, path);
                if !query.is_empty() {
                    req.query = Some(query.to_string());
                }
                req
            }
            None => Self::new(method, target),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }
}

impl HttpRequest for RouteRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}
