use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::json;

use crate::ids::RequestId;
use crate::router::url::{Route, METHOD_NAMES_KEY};
use crate::server::{HttpRequest, HttpResponse};

/// Explicit context handed to every handler method.
///
/// Carries the original transport request together with the parsed route, so
/// handlers can read trailing path parameters without ambient state.
pub struct HandlerRequest<'a> {
    pub request: &'a dyn HttpRequest,
    pub route: &'a Route,
    pub request_id: RequestId,
}

impl HandlerRequest<'_> {
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.route.params
    }

    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.route.param(index)
    }
}

/// A routable handler as seen by the router.
///
/// One instance per registered action, created at startup and shared
/// read-only by every request.
pub trait HandlerProxy: Send + Sync {
    /// Whether `name` is an invocable method. Case-sensitive.
    fn has_method(&self, name: &str) -> bool;

    /// Run method `name`. Errors propagate unchanged to the router.
    fn invoke(
        &self,
        name: &str,
        req: &HandlerRequest<'_>,
        res: &mut dyn HttpResponse,
    ) -> anyhow::Result<()>;
}

/// Invocable entry in a [`MethodTable`].
pub type HandlerMethod<H> =
    Arc<dyn Fn(&H, &HandlerRequest<'_>, &mut dyn HttpResponse) -> anyhow::Result<()> + Send + Sync>;

/// Per-handler capability table: method name to invocable, built once.
pub struct MethodTable<H> {
    methods: HashMap<String, HandlerMethod<H>>,
}

impl<H> Default for MethodTable<H> {
    fn default() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }
}

impl<H> fmt::Debug for MethodTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl<H> MethodTable<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `f` under `name`. Registering a name twice keeps the last one.
    pub fn method<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&H, &HandlerRequest<'_>, &mut dyn HttpResponse) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HandlerMethod<H>> {
        self.methods.get(name)
    }

    /// Method names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Handlers that declare their own methods.
///
/// ```rust
/// use action_router::dispatcher::{HandlerRequest, MethodTable, RequestHandler, SimpleHandlerProxy};
/// use action_router::server::HttpResponse;
///
/// struct UserHandler;
///
/// impl UserHandler {
///     fn login(&self, _req: &HandlerRequest<'_>, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
///         res.set_data_by_json(&serde_json::json!({ "logged_in": true }));
///         Ok(())
///     }
/// }
///
/// impl RequestHandler for UserHandler {
///     fn register_methods(table: &mut MethodTable<Self>) {
///         table.method("login", Self::login);
///     }
/// }
///
/// let proxy = SimpleHandlerProxy::new(UserHandler);
/// ```
pub trait RequestHandler: Send + Sync + Sized + 'static {
    fn register_methods(table: &mut MethodTable<Self>);
}

/// [`HandlerProxy`] over one handler value and its [`MethodTable`].
///
/// Answers the reserved `methodNames` keyword itself (unless the handler
/// defines a method of that name) with the sorted list of its methods.
pub struct SimpleHandlerProxy<H> {
    handler: H,
    methods: MethodTable<H>,
}

impl<H: RequestHandler> SimpleHandlerProxy<H> {
    #[must_use]
    pub fn new(handler: H) -> Self {
        let mut methods = MethodTable::new();
        H::register_methods(&mut methods);
        Self { handler, methods }
    }
}

impl<H> SimpleHandlerProxy<H> {
    /// Wrap a handler with an explicitly built table.
    #[must_use]
    pub fn with_methods(handler: H, methods: MethodTable<H>) -> Self {
        Self { handler, methods }
    }

    #[must_use]
    pub fn methods(&self) -> &MethodTable<H> {
        &self.methods
    }
}

impl<H: Send + Sync> HandlerProxy for SimpleHandlerProxy<H> {
    fn has_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    fn invoke(
        &self,
        name: &str,
        req: &HandlerRequest<'_>,
        res: &mut dyn HttpResponse,
    ) -> anyhow::Result<()> {
        match self.methods.get(name) {
            Some(method) => method(&self.handler, req, res),
            None if name == METHOD_NAMES_KEY => {
                res.set_data_by_json(&json!({
                    "action": req.route.action,
                    "methods": self.methods.names(),
                }));
                Ok(())
            }
            None => Err(anyhow!(
                "action '{}' has no method '{}'",
                req.route.action,
                name
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::url::ParamVec;
    use crate::server::{RouteRequest, RouteResponse};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    impl Counter {
        fn bump(&self, _req: &HandlerRequest<'_>, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
            let n = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
            res.set_data_by_json(&json!({ "hits": n }));
            Ok(())
        }
    }

    impl RequestHandler for Counter {
        fn register_methods(table: &mut MethodTable<Self>) {
            table
                .method("bump", Self::bump)
                .method("fail", |_, _, _| Err(anyhow!("counter is broken")));
        }
    }

    fn route(action: &str, method: &str) -> Route {
        Route {
            action: action.to_string(),
            method_start: method.to_string(),
            params: ParamVec::new(),
        }
    }

    fn call(proxy: &dyn HandlerProxy, method: &str) -> (anyhow::Result<()>, RouteResponse) {
        let request = RouteRequest::get(format!("/counter/{method}"));
        let route = route("counter", method);
        let req = HandlerRequest {
            request: &request,
            route: &route,
            request_id: RequestId::new(),
        };
        let mut res = RouteResponse::new();
        let result = proxy.invoke(method, &req, &mut res);
        (result, res)
    }

    #[test]
    fn test_has_method_is_case_sensitive() {
        let proxy = SimpleHandlerProxy::new(Counter::default());
        assert!(proxy.has_method("bump"));
        assert!(!proxy.has_method("Bump"));
        assert!(!proxy.has_method(METHOD_NAMES_KEY));
    }

    #[test]
    fn test_invoke_runs_method_against_shared_handler() {
        let proxy = SimpleHandlerProxy::new(Counter::default());
        let (first, _) = call(&proxy, "bump");
        first.unwrap();
        let (second, res) = call(&proxy, "bump");
        second.unwrap();
        let body: Value = serde_json::from_slice(&res.into_bytes().unwrap()).unwrap();
        assert_eq!(body["hits"], 2);
    }

    #[test]
    fn test_method_error_propagates_unchanged() {
        let proxy = SimpleHandlerProxy::new(Counter::default());
        let (result, _) = call(&proxy, "fail");
        assert_eq!(result.unwrap_err().to_string(), "counter is broken");
    }

    #[test]
    fn test_method_names_keyword_lists_methods() {
        let proxy = SimpleHandlerProxy::new(Counter::default());
        let (result, res) = call(&proxy, METHOD_NAMES_KEY);
        result.unwrap();
        let body: Value = serde_json::from_slice(&res.into_bytes().unwrap()).unwrap();
        assert_eq!(body, json!({ "action": "counter", "methods": ["bump", "fail"] }));
    }

    #[test]
    fn test_unknown_method_is_an_error() {
        let proxy = SimpleHandlerProxy::new(Counter::default());
        let (result, _) = call(&proxy, "missing");
        assert!(result.unwrap_err().to_string().contains("no method 'missing'"));
    }
}
