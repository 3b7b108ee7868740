use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use super::proxy::HandlerProxy;

/// Immutable action name to [`HandlerProxy`] map.
///
/// Built once through [`HandlerRegistryBuilder`]; cloning shares the same
/// table, so request threads read it without locking.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<HashMap<String, Arc<dyn HandlerProxy>>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("actions", &self.actions())
            .finish()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, action: &str) -> Option<&Arc<dyn HandlerProxy>> {
        self.handlers.get(action)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered action names, sorted.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Mutable staging area for a [`HandlerRegistry`].
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn HandlerProxy>>,
}

impl HandlerRegistryBuilder {
    /// Register `proxy` under `action`.
    ///
    /// Surrounding slashes are stripped, so `/admin/user/` and `admin/user` are
    /// the same action. Empty names are ignored. A second registration of the
    /// same action replaces the first.
    pub fn register<P>(&mut self, action: &str, proxy: P) -> &mut Self
    where
        P: HandlerProxy + 'static,
    {
        self.register_arc(action, Arc::new(proxy))
    }

    pub fn register_arc(&mut self, action: &str, proxy: Arc<dyn HandlerProxy>) -> &mut Self {
        let action = action.trim().trim_matches('/');
        if action.is_empty() {
            warn!("Ignoring handler registered under an empty action name");
            return self;
        }

        if self.handlers.insert(action.to_string(), proxy).is_some() {
            warn!(
                action = %action,
                total_handlers = self.handlers.len(),
                "Replaced existing handler"
            );
        } else {
            info!(
                action = %action,
                total_handlers = self.handlers.len(),
                "Handler registered"
            );
        }
        self
    }

    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Startup collaborator that locates handlers under the configured work base
/// and registers them.
pub trait HandlerDiscovery {
    fn discover(&self, work_base: &str, registry: &mut HandlerRegistryBuilder) -> anyhow::Result<()>;
}

impl<F> HandlerDiscovery for F
where
    F: Fn(&str, &mut HandlerRegistryBuilder) -> anyhow::Result<()>,
{
    fn discover(&self, work_base: &str, registry: &mut HandlerRegistryBuilder) -> anyhow::Result<()> {
        self(work_base, registry)
    }
}
