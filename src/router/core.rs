use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use regex::Regex;
use tracing::{debug, error};

use super::builder::RouterBuilder;
use super::panics;
use super::url::{parse_url, METHOD_NAMES_KEY};
use crate::context::{ContextGuard, RequestInfo};
use crate::dispatcher::{HandlerRegistry, HandlerRequest};
use crate::filter::{FilterChain, FilterMapping};
use crate::ids::RequestId;
use crate::server::{
    HttpRequest, HttpResponse, CODE_FORBIDDEN_ACCESS, CODE_INTERNAL_ERROR, CODE_NOT_FOUND,
};
use crate::static_files::StaticFiles;

/// Path served for an empty or `/` request.
pub const WELCOME_PATH: &str = "/index.html";
/// First path segment that is never reachable from outside.
pub const RESTRICTED_SEGMENT: &str = "WEB-INF";
/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const FORBIDDEN_MESSAGE: &str = "not allowed to access!";

/// Front controller: filters, static assets and action dispatch.
///
/// All state is built by [`RouterBuilder`] and read-only afterwards, so one
/// router is shared by every worker thread.
#[derive(Debug)]
pub struct WebRouter {
    pub(crate) registry: HandlerRegistry,
    pub(crate) filters: Vec<FilterMapping>,
    pub(crate) ignore_url: Option<Regex>,
    pub(crate) static_files: StaticFiles,
    pub(crate) work_base: String,
}

impl WebRouter {
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn filters(&self) -> &[FilterMapping] {
        &self.filters
    }

    #[must_use]
    pub fn web_root(&self) -> &Path {
        self.static_files.base_dir()
    }

    #[must_use]
    pub fn ignore_url(&self) -> Option<&str> {
        self.ignore_url.as_ref().map(Regex::as_str)
    }

    #[must_use]
    pub fn work_base(&self) -> &str {
        &self.work_base
    }

    /// Handle one request, writing exactly one response.
    ///
    /// Never fails: filter and handler errors, and panics, become an
    /// internal-error JSON command. The current-request context is set for
    /// the duration of the call and cleared on every exit path.
    pub fn route(&self, req: &dyn HttpRequest, res: &mut dyn HttpResponse) {
        let path = normalize_path(req.path());

        if is_restricted(path) {
            debug!(path = %path, "Refused restricted path");
            res.set_error(CODE_FORBIDDEN_ACCESS, FORBIDDEN_MESSAGE);
            return;
        }

        let request_id = RequestId::from_header_or_new(req.header(REQUEST_ID_HEADER));
        let _context = ContextGuard::enter(RequestInfo {
            request_id,
            method: req.method().clone(),
            path: path.to_string(),
        });

        // drop a report left by a panic some handler caught itself
        panics::take_report();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handle(path, request_id, req, &mut *res)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let trace = format!("{err:?}");
                error!(
                    request_id = %request_id,
                    path = %path,
                    error = %err,
                    trace = %trace,
                    "Request handling failed"
                );
                res.set_data_by_json_command(CODE_INTERNAL_ERROR, &err.to_string(), Some(&trace));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let location =
                    panics::take_report().unwrap_or_else(|| "unknown location".to_string());
                let trace = format!("panicked while handling {path}: {message}\nat {location}");
                error!(
                    request_id = %request_id,
                    path = %path,
                    panic = %message,
                    trace = %trace,
                    "Request handling panicked"
                );
                res.set_data_by_json_command(CODE_INTERNAL_ERROR, &message, Some(&trace));
            }
        }
    }

    fn handle(
        &self,
        path: &str,
        request_id: RequestId,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
    ) -> anyhow::Result<()> {
        let proceed = |req: &dyn HttpRequest, res: &mut dyn HttpResponse| {
            if self.ignore_url.as_ref().is_some_and(|p| p.is_match(path)) {
                self.serve_static(path, res)
            } else {
                self.dispatch(path, request_id, req, res)
            }
        };

        let mut chain = FilterChain::matching(&self.filters, path).with_terminal(&proceed);
        if chain.do_filter(req, res)? {
            debug!(path = %path, "Request handled by filter chain");
        }
        Ok(())
    }

    fn serve_static(&self, path: &str, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        match self.static_files.open(path)? {
            Some(asset) => {
                debug!(path = %path, file = %asset.path.display(), "Serving static asset");
                res.set_data_stream(asset.content_type.as_deref(), Box::new(asset.file));
            }
            None => {
                debug!(path = %path, "Static asset not found");
                res.set_error(CODE_NOT_FOUND, &format!("not found:{path}"));
            }
        }
        Ok(())
    }

    fn dispatch(
        &self,
        path: &str,
        request_id: RequestId,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
    ) -> anyhow::Result<()> {
        let route = parse_url(
            path,
            |action| self.registry.contains(action),
            |action, method| {
                self.registry
                    .get(action)
                    .is_some_and(|proxy| proxy.has_method(method))
            },
        );

        let Some(proxy) = self.registry.get(&route.action) else {
            debug!(path = %path, action = %route.action, "No handler for action");
            res.set_data_by_json_command(
                CODE_NOT_FOUND,
                &format!("not found action: {}", route.action),
                None,
            );
            return Ok(());
        };

        if route.method_start != METHOD_NAMES_KEY && !proxy.has_method(&route.method_start) {
            debug!(
                path = %path,
                action = %route.action,
                method = %route.method_start,
                "Action has no such method"
            );
            res.set_data_by_json_command(
                CODE_NOT_FOUND,
                &format!("not found method: {}/{}", route.action, route.method_start),
                None,
            );
            return Ok(());
        }

        debug!(
            request_id = %request_id,
            action = %route.action,
            method = %route.method_start,
            params = route.params.len(),
            "Dispatching"
        );
        let handler_req = HandlerRequest {
            request: req,
            route: &route,
            request_id,
        };
        proxy.invoke(&route.method_start, &handler_req, res)
    }
}

/// Paths without a single non-empty segment become the welcome page.
pub(crate) fn normalize_path(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.split('/').all(str::is_empty) {
        WELCOME_PATH
    } else {
        trimmed
    }
}

/// Whether the first real segment of `path` is the restricted directory.
///
/// Empty and `.` segments are skipped and case is ignored, so `//WEB-INF/x`,
/// `/./WEB-INF/x` and `/web-inf/x` cannot slip past to the static resolver.
pub(crate) fn is_restricted(path: &str) -> bool {
    path.split('/')
        .find(|segment| !segment.is_empty() && *segment != ".")
        .is_some_and(|segment| segment.eq_ignore_ascii_case(RESTRICTED_SEGMENT))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
