use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use super::core::WebRouter;
use crate::config::{FilterConfig, WebConfig, WEB_ROOT_ENV};
use crate::dispatcher::{HandlerDiscovery, HandlerProxy, HandlerRegistry, HandlerRegistryBuilder};
use crate::error::StartupError;
use crate::filter::{builtin_factories, FilterFactory, FilterMapping, RequestFilter};
use crate::static_files::StaticFiles;

/// Startup assembly of a [`WebRouter`].
///
/// Everything that can be wrong with the configuration is reported by
/// [`build`](Self::build); a router that builds never fails a request because
/// of its setup.
pub struct RouterBuilder {
    web_root: Option<PathBuf>,
    config: WebConfig,
    registry: HandlerRegistryBuilder,
    discoveries: Vec<Box<dyn HandlerDiscovery>>,
    factories: HashMap<String, FilterFactory>,
    extra_filters: Vec<(String, Option<String>, Arc<dyn RequestFilter>)>,
    content_types: Vec<(String, String)>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            web_root: None,
            config: WebConfig::default(),
            registry: HandlerRegistry::builder(),
            discoveries: Vec::new(),
            factories: builtin_factories(),
            extra_filters: Vec::new(),
            content_types: Vec::new(),
        }
    }

    /// Directory static assets are served from. Falls back to `ROUTER_WEB_ROOT`.
    #[must_use]
    pub fn web_root(mut self, web_root: impl Into<PathBuf>) -> Self {
        self.web_root = Some(web_root.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: WebConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a handler directly, ahead of discovery.
    #[must_use]
    pub fn handler<P>(mut self, action: &str, proxy: P) -> Self
    where
        P: HandlerProxy + 'static,
    {
        self.registry.register(action, proxy);
        self
    }

    /// Add a discovery step, run against the configured work base at build time.
    #[must_use]
    pub fn discovery<D>(mut self, discovery: D) -> Self
    where
        D: HandlerDiscovery + 'static,
    {
        self.discoveries.push(Box::new(discovery));
        self
    }

    /// Make `filter_type` available to `<name>.type` settings.
    #[must_use]
    pub fn filter_factory<F>(mut self, filter_type: &str, factory: F) -> Self
    where
        F: Fn(&FilterConfig) -> anyhow::Result<Arc<dyn RequestFilter>> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(filter_type.to_string(), Arc::new(factory))
            .is_some()
        {
            warn!(filter_type = %filter_type, "Replaced filter factory");
        }
        self
    }

    /// Append an already built filter after the configured ones.
    #[must_use]
    pub fn filter(
        mut self,
        name: &str,
        pattern: Option<&str>,
        filter: Arc<dyn RequestFilter>,
    ) -> Self {
        self.extra_filters
            .push((name.to_string(), pattern.map(str::to_string), filter));
        self
    }

    /// Serve files with `extension` as `content_type`, overriding the built-in table.
    #[must_use]
    pub fn content_type(mut self, extension: &str, content_type: &str) -> Self {
        self.content_types
            .push((extension.to_string(), content_type.to_string()));
        self
    }

    pub fn build(self) -> Result<WebRouter, StartupError> {
        super::panics::install_hook();

        let web_root = self
            .web_root
            .or_else(|| env::var_os(WEB_ROOT_ENV).map(PathBuf::from))
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(StartupError::MissingWebRoot)?;
        if !web_root.is_dir() {
            warn!(web_root = %web_root.display(), "Web root is not a directory; static assets will not be found");
        }

        let ignore_url = self
            .config
            .ignore_url
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| StartupError::InvalidIgnorePattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let mut filters = Vec::with_capacity(self.config.filters.len() + self.extra_filters.len());
        for filter_config in &self.config.filters {
            filters.push(configured_filter(&self.factories, filter_config)?);
        }
        for (name, pattern, filter) in self.extra_filters {
            let mapping = FilterMapping::new(name.as_str(), pattern.as_deref(), filter).map_err(|e| {
                StartupError::InvalidFilterPattern {
                    filter: name.clone(),
                    pattern: pattern.clone().unwrap_or_default(),
                    reason: e.to_string(),
                }
            })?;
            filters.push(mapping);
        }

        let mut registry = self.registry;
        let work_base = self.config.work_base;
        for discovery in &self.discoveries {
            discovery
                .discover(&work_base, &mut registry)
                .map_err(|e| StartupError::HandlerDiscovery {
                    work_base: work_base.clone(),
                    reason: format!("{e:#}"),
                })?;
        }
        let registry = registry.build();

        info!(
            web_root = %web_root.display(),
            work_base = %work_base,
            actions = registry.len(),
            filters = filters.len(),
            static_assets = ignore_url.is_some(),
            "Router initialized"
        );

        let static_files = self
            .content_types
            .iter()
            .fold(StaticFiles::new(web_root), |files, (ext, ty)| {
                files.with_content_type(ext, ty.as_str())
            });

        Ok(WebRouter {
            registry,
            filters,
            ignore_url,
            static_files,
            work_base,
        })
    }
}

fn configured_filter(
    factories: &HashMap<String, FilterFactory>,
    config: &FilterConfig,
) -> Result<FilterMapping, StartupError> {
    let name = config.name();
    let filter_type = config.get("type").unwrap_or(name);
    let factory = factories
        .get(filter_type)
        .ok_or_else(|| StartupError::UnknownFilterType {
            filter: name.to_string(),
            filter_type: filter_type.to_string(),
        })?;

    let filter = factory(config).map_err(|e| StartupError::FilterInit {
        filter: name.to_string(),
        reason: format!("{e:#}"),
    })?;

    let pattern = config.get("pattern");
    FilterMapping::new(name, pattern, filter).map_err(|e| StartupError::InvalidFilterPattern {
        filter: name.to_string(),
        pattern: pattern.unwrap_or_default().to_string(),
        reason: e.to_string(),
    })
}
