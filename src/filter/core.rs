use std::fmt;
use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;

use crate::config::FilterConfig;
use crate::server::{HttpRequest, HttpResponse};

/// Request interceptor wrapped around static and dynamic handling.
///
/// A filter either calls `chain.do_filter(req, res)` to run the rest of the
/// chain, possibly doing work before and after, or writes a response itself
/// and returns `Ok(true)` to stop. Returning `Ok(false)` without calling the
/// continuation lets the chain proceed with the next filter.
///
/// When the router builds the chain, the rest of the chain ends with static
/// serving or dispatch, so work done after `chain.do_filter` returns sees the
/// finished response.
pub trait RequestFilter: Send + Sync {
    fn do_filter(
        &self,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
        chain: &mut FilterChain<'_>,
    ) -> anyhow::Result<bool>;
}

/// Builds a filter from its configuration block.
pub type FilterFactory =
    Arc<dyn Fn(&FilterConfig) -> anyhow::Result<Arc<dyn RequestFilter>> + Send + Sync>;

/// A named filter bound to the paths it applies to.
#[derive(Clone)]
pub struct FilterMapping {
    name: String,
    pattern: Option<Regex>,
    filter: Arc<dyn RequestFilter>,
}

impl fmt::Debug for FilterMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterMapping")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .finish()
    }
}

impl FilterMapping {
    /// Bind `filter` to paths matching `pattern`, or to every path when `None`.
    pub fn new(
        name: impl Into<String>,
        pattern: Option<&str>,
        filter: Arc<dyn RequestFilter>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: pattern.map(Regex::new).transpose()?,
            filter,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.as_ref().map_or(true, |p| p.is_match(path))
    }
}

/// Step run once every filter has passed the request on.
pub type ChainTerminal<'a> = &'a dyn Fn(&dyn HttpRequest, &mut dyn HttpResponse) -> anyhow::Result<()>;

/// The filters selected for one request and a cursor into them.
pub struct FilterChain<'a> {
    filters: SmallVec<[&'a dyn RequestFilter; 8]>,
    next: usize,
    terminal: Option<ChainTerminal<'a>>,
}

impl<'a> FilterChain<'a> {
    #[must_use]
    pub fn new(filters: impl IntoIterator<Item = &'a dyn RequestFilter>) -> Self {
        Self {
            filters: filters.into_iter().collect(),
            next: 0,
            terminal: None,
        }
    }

    /// Run `terminal` after the last filter hands the request on. It runs at
    /// most once, and never when a filter stops the chain.
    #[must_use]
    pub fn with_terminal<F>(mut self, terminal: &'a F) -> Self
    where
        F: Fn(&dyn HttpRequest, &mut dyn HttpResponse) -> anyhow::Result<()>,
    {
        self.terminal = Some(terminal);
        self
    }

    /// Chain of the mappings whose pattern matches `path`, in configured order.
    #[must_use]
    pub fn matching(mappings: &'a [FilterMapping], path: &str) -> Self {
        Self::new(
            mappings
                .iter()
                .filter(|m| m.matches(path))
                .map(|m| -> &'a dyn RequestFilter { m.filter.as_ref() }),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filters not yet run.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.filters.len() - self.next
    }

    /// Run the remaining filters, then the terminal step. `Ok(true)` means a
    /// filter wrote the response and nothing else may run.
    pub fn do_filter(
        &mut self,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
    ) -> anyhow::Result<bool> {
        while let Some(filter) = self.filters.get(self.next).copied() {
            self.next += 1;
            if filter.do_filter(req, res, self)? {
                self.terminal = None;
                return Ok(true);
            }
        }
        if let Some(terminal) = self.terminal.take() {
            terminal(req, res)?;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{RouteRequest, RouteResponse};
    use http::StatusCode;
    use std::sync::Mutex;

    /// Records its name, then either stops or hands over.
    struct Recorder {
        name: &'static str,
        stop: bool,
        calls_chain: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RequestFilter for Recorder {
        fn do_filter(
            &self,
            req: &dyn HttpRequest,
            res: &mut dyn HttpResponse,
            chain: &mut FilterChain<'_>,
        ) -> anyhow::Result<bool> {
            self.log.lock().unwrap().push(format!("{}:before", self.name));
            if self.stop {
                res.set_error(StatusCode::UNAUTHORIZED, self.name);
                return Ok(true);
            }
            if !self.calls_chain {
                return Ok(false);
            }
            let stopped = chain.do_filter(req, res)?;
            self.log.lock().unwrap().push(format!("{}:after", self.name));
            Ok(stopped)
        }
    }

    fn recorder(
        name: &'static str,
        stop: bool,
        calls_chain: bool,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn RequestFilter> {
        Arc::new(Recorder {
            name,
            stop,
            calls_chain,
            log: Arc::clone(log),
        })
    }

    fn run(mappings: &[FilterMapping], path: &str) -> bool {
        let req = RouteRequest::get(path);
        let mut res = RouteResponse::new();
        FilterChain::matching(mappings, path)
            .do_filter(&req, &mut res)
            .unwrap()
    }

    #[test]
    fn test_continuation_wraps_later_filters() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mappings = vec![
            FilterMapping::new("outer", None, recorder("outer", false, true, &log)).unwrap(),
            FilterMapping::new("inner", None, recorder("inner", false, true, &log)).unwrap(),
        ];
        assert!(!run(&mappings, "/user/login"));
        assert_eq!(
            *log.lock().unwrap(),
            ["outer:before", "inner:before", "inner:after", "outer:after"]
        );
    }

    #[test]
    fn test_stop_skips_later_filters() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mappings = vec![
            FilterMapping::new("gate", None, recorder("gate", true, false, &log)).unwrap(),
            FilterMapping::new("late", None, recorder("late", false, true, &log)).unwrap(),
        ];
        assert!(run(&mappings, "/anything"));
        assert_eq!(*log.lock().unwrap(), ["gate:before"]);
    }

    #[test]
    fn test_filter_without_continuation_passes_on() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mappings = vec![
            FilterMapping::new("peek", None, recorder("peek", false, false, &log)).unwrap(),
            FilterMapping::new("next", None, recorder("next", false, true, &log)).unwrap(),
        ];
        assert!(!run(&mappings, "/"));
        assert_eq!(*log.lock().unwrap(), ["peek:before", "next:before", "next:after"]);
    }

    #[test]
    fn test_pattern_selects_filters_per_request() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mappings = vec![
            FilterMapping::new("api", Some("^/api/"), recorder("api", true, false, &log)).unwrap(),
        ];
        assert!(!run(&mappings, "/static/app.js"));
        assert!(run(&mappings, "/api/user"));
        assert_eq!(FilterChain::matching(&mappings, "/other").len(), 0);
    }

    #[test]
    fn test_terminal_runs_inside_continuation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mappings = vec![
            FilterMapping::new("outer", None, recorder("outer", false, true, &log)).unwrap(),
            FilterMapping::new("peek", None, recorder("peek", false, false, &log)).unwrap(),
        ];
        let terminal_log = Arc::clone(&log);
        let terminal = move |_: &dyn HttpRequest, _: &mut dyn HttpResponse| {
            terminal_log.lock().unwrap().push("terminal".to_string());
            Ok(())
        };
        let req = RouteRequest::get("/user/login");
        let mut res = RouteResponse::new();
        let stopped = FilterChain::matching(&mappings, "/user/login")
            .with_terminal(&terminal)
            .do_filter(&req, &mut res)
            .unwrap();
        assert!(!stopped);
        assert_eq!(
            *log.lock().unwrap(),
            ["outer:before", "peek:before", "terminal", "outer:after"]
        );
    }

    #[test]
    fn test_terminal_skipped_when_stopped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mappings = vec![
            FilterMapping::new("gate", None, recorder("gate", true, false, &log)).unwrap(),
        ];
        let ran = std::sync::atomic::AtomicBool::new(false);
        let terminal = |_: &dyn HttpRequest, _: &mut dyn HttpResponse| {
            ran.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        };
        let req = RouteRequest::get("/x");
        let mut res = RouteResponse::new();
        let mut chain = FilterChain::matching(&mappings, "/x").with_terminal(&terminal);
        assert!(chain.do_filter(&req, &mut res).unwrap());
        assert!(!chain.do_filter(&req, &mut res).unwrap());
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        assert!(FilterMapping::new("bad", Some("(unclosed"), recorder("bad", false, true, &log)).is_err());
    }
}
