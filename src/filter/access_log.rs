use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::{FilterChain, RequestFilter};
use crate::config::FilterConfig;
use crate::context::current_request;
use crate::server::{HttpRequest, HttpResponse};

/// Logs one event per request once the rest of the chain, including static
/// serving or dispatch, has run.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLogFilter;

impl AccessLogFilter {
    pub fn from_config(_config: &FilterConfig) -> anyhow::Result<Arc<dyn RequestFilter>> {
        Ok(Arc::new(Self))
    }
}

impl RequestFilter for AccessLogFilter {
    fn do_filter(
        &self,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
        chain: &mut FilterChain<'_>,
    ) -> anyhow::Result<bool> {
        let start = Instant::now();
        let stopped = chain.do_filter(req, res)?;
        let request_id = current_request()
            .map(|info| info.request_id.to_string())
            .unwrap_or_default();
        info!(
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
            stopped_by_filter = stopped,
            latency_us = start.elapsed().as_micros() as u64,
            "Request filtered"
        );
        Ok(stopped)
    }
}
