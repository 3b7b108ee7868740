//! # Filters
//!
//! Filters intercept requests ahead of static and dynamic handling. They are
//! configured in the `web` group:
//!
//! ```yaml
//! web:
//!   filterNames: accessLog, auth
//!   auth.type: tokenAuth
//!   auth.pattern: ^/api/
//!   auth.token: s3cret
//! ```
//!
//! `<name>.type` selects the factory (defaulting to the filter name itself),
//! `<name>.pattern` restricts the filter to matching paths, and the rest of the
//! `<name>.*` keys go to the factory. Built-in types are `accessLog`,
//! `tokenAuth` and `metrics`; [`RouterBuilder::filter_factory`] adds more.
//!
//! [`RouterBuilder::filter_factory`]: crate::router::RouterBuilder::filter_factory

mod access_log;
mod auth;
mod core;
mod metrics;

use std::collections::HashMap;
use std::sync::Arc;

pub use access_log::AccessLogFilter;
pub use auth::{TokenAuthFilter, DEFAULT_TOKEN_HEADER};
pub use core::{ChainTerminal, FilterChain, FilterFactory, FilterMapping, RequestFilter};
pub use metrics::{MetricsFilter, MetricsSnapshot, DEFAULT_MAX_PATHS, OTHER_PATHS};

pub const ACCESS_LOG: &str = "accessLog";
pub const TOKEN_AUTH: &str = "tokenAuth";
pub const METRICS: &str = "metrics";

/// Factories for the built-in filter types, keyed by type name.
#[must_use]
pub fn builtin_factories() -> HashMap<String, FilterFactory> {
    let factories: [(&str, FilterFactory); 3] = [
        (ACCESS_LOG, Arc::new(AccessLogFilter::from_config)),
        (TOKEN_AUTH, Arc::new(TokenAuthFilter::from_config)),
        (METRICS, Arc::new(MetricsFilter::from_config)),
    ];
    factories
        .into_iter()
        .map(|(name, factory)| (name.to_string(), factory))
        .collect()
}
