use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use super::{FilterChain, RequestFilter};
use crate::config::FilterConfig;
use crate::server::{HttpRequest, HttpResponse};

pub const DEFAULT_TOKEN_HEADER: &str = "authorization";

/// Rejects requests whose token header does not carry the configured token.
///
/// Settings: `token` (required) and `header` (default `authorization`). The
/// header may hold the bare token or `Bearer <token>`.
#[derive(Debug, Clone)]
pub struct TokenAuthFilter {
    header: String,
    token: String,
}

impl TokenAuthFilter {
    pub fn new(header: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &FilterConfig) -> anyhow::Result<Arc<dyn RequestFilter>> {
        let token = config.require("token")?;
        let header = config.get_or("header", DEFAULT_TOKEN_HEADER);
        Ok(Arc::new(Self::new(header, token)))
    }

    fn accepts(&self, value: Option<&str>) -> bool {
        let Some(value) = value.map(str::trim) else {
            return false;
        };
        let presented = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        presented == self.token
    }
}

impl RequestFilter for TokenAuthFilter {
    fn do_filter(
        &self,
        req: &dyn HttpRequest,
        res: &mut dyn HttpResponse,
        chain: &mut FilterChain<'_>,
    ) -> anyhow::Result<bool> {
        if self.accepts(req.header(&self.header)) {
            return chain.do_filter(req, res);
        }
        debug!(path = %req.path(), header = %self.header, "Rejected request without a valid token");
        res.set_data_by_json_command(StatusCode::UNAUTHORIZED, "unauthorized", None);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_bare_and_bearer_tokens() {
        let filter = TokenAuthFilter::new(DEFAULT_TOKEN_HEADER, "s3cret");
        assert!(filter.accepts(Some("s3cret")));
        assert!(filter.accepts(Some("Bearer s3cret")));
        assert!(!filter.accepts(Some("Bearer other")));
        assert!(!filter.accepts(Some("")));
        assert!(!filter.accepts(None));
    }

    #[test]
    fn test_token_setting_is_required() {
        let config = FilterConfig::new("tokenAuth", Default::default());
        assert!(TokenAuthFilter::from_config(&config).is_err());
    }
}
