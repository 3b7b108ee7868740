use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use dashmap::DashMap;
use serde::Serialize;

use super::{FilterChain, RequestFilter};
use crate::config::FilterConfig;
use crate::server::{HttpRequest, HttpResponse};

/// Distinct paths tracked before further paths are counted under [`OTHER_PATHS`].
pub const DEFAULT_MAX_PATHS: usize = 1024;

/// Bucket for requests whose path arrived after the path table filled up.
pub const OTHER_PATHS: &str = "(other)";

/// Request counters and latency, timed around the rest of the chain
/// including static serving and dispatch.
///
/// With a `path` setting the filter also answers that path itself with a
/// JSON [`MetricsSnapshot`] and stops the chain. `maxPaths` bounds the
/// per-path table (default [`DEFAULT_MAX_PATHS`]).
#[derive(Debug)]
pub struct MetricsFilter {
    endpoint: Option<String>,
    max_paths: usize,
    request_count: AtomicU64,
    stopped_count: AtomicU64,
    total_latency_ns: AtomicU64,
    per_path: DashMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub stopped_by_filters: u64,
    pub average_latency_us: u64,
    pub paths: BTreeMap<String, u64>,
}

impl Default for MetricsFilter {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_paths: DEFAULT_MAX_PATHS,
            request_count: AtomicU64::new(0),
            stopped_count: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
            per_path: DashMap::new(),
        }
    }
}

impl MetricsFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn from_config(config: &FilterConfig) -> anyhow::Result<Arc<dyn RequestFilter>> {
        let filter = match config.get("path") {
            Some(endpoint) => Self::with_endpoint(endpoint),
            None => Self::new(),
        };
        let max_paths = match config.get("maxPaths") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("maxPaths must be a number, got '{raw}'"))?,
            None => DEFAULT_MAX_PATHS,
        };
        Ok(Arc::new(filter.with_max_paths(max_paths)))
    }

    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn path_count(&self, path: &str) -> u64 {
        self.per_path.get(path).map_or(0, |count| *count)
    }

    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count();
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.request_count(),
            stopped_by_filters: self.stopped_count.load(Ordering::Relaxed),
            average_latency_us: self.average_latency().as_micros() as u64,
            paths: self
                .per_path
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }

    fn record(&self, path: &str, latency: Duration, stopped: bool) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if stopped {
            self.stopped_count.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(mut count) = self.per_path.get_mut(path) {
            *count += 1;
            return;
        }
        // concurrent inserts may overshoot the limit by a few entries
        let key = if self.per_path.len() < self.max_paths {
            path
        } else {
            OTHER_PATHS
        };
        *self.per_path.entry(key.to_string()).or_insert(0) += 1;
    }
}

impl RequestFilter for MetricsFilter {
    fn do_filter(
        &self,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
        chain: &mut FilterChain<'_>,
    ) -> anyhow::Result<bool> {
        if self.endpoint.as_deref() == Some(req.path()) {
            res.set_data_by_json(&serde_json::to_value(self.snapshot())?);
            return Ok(true);
        }

        let start = Instant::now();
        let stopped = chain.do_filter(req, res)?;
        self.record(req.path(), start.elapsed(), stopped);
        Ok(stopped)
    }
}
