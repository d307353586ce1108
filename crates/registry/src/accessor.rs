//! Two-tier provider resolution.

use crate::{RegistryConfig, ServiceItemFilter};
use exertion_core::{Provider, ServiceItem, ServiceRegistry, ServiceTemplate};
use exertion_types::{Signature, CATALOGER};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Counters describing how lookups were answered.
#[derive(Debug, Default)]
struct Counters {
    catalog_hits: AtomicU64,
    discovery_lookups: AtomicU64,
    cataloger_acquisitions: AtomicU64,
}

/// Snapshot of [`ProviderAccessor`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessorStats {
    /// Lookups answered by the cataloger.
    pub catalog_hits: u64,
    /// Registry lookups issued by the discovery fallback (each poll counts).
    pub discovery_lookups: u64,
    /// Times the cataloger handle was (re-)acquired.
    pub cataloger_acquisitions: u64,
}

/// Resolves signatures to live providers.
///
/// Lookups first go to a cached cataloger. The cache is checked for liveness
/// on every use and replaced under a lock when stale, so concurrent
/// dispatches observing a dead cataloger re-acquire it once. When the
/// cataloger is absent, fails, or has no match, the accessor falls back to
/// template discovery against the service registry.
///
/// Resolution never fails: errors are logged and reported as no match.
pub struct ProviderAccessor {
    registry: Arc<dyn ServiceRegistry>,
    config: RegistryConfig,
    filter: Option<Arc<dyn ServiceItemFilter>>,
    cataloger: Mutex<Option<ServiceItem>>,
    counters: Counters,
}

impl ProviderAccessor {
    /// Create an accessor over a service registry.
    pub fn new(registry: Arc<dyn ServiceRegistry>, config: RegistryConfig) -> Self {
        Self {
            registry,
            config,
            filter: None,
            cataloger: Mutex::new(None),
            counters: Counters::default(),
        }
    }

    /// Apply a filter to every lookup result.
    pub fn with_filter(mut self, filter: impl ServiceItemFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Resolve the provider for a signature.
    pub fn resolve(&self, signature: &Signature) -> Option<Arc<dyn Provider>> {
        let template = ServiceTemplate::for_signature(signature);
        let provider = self
            .lookup(&template)
            .iter()
            .find_map(|item| item.provider().cloned());

        match &provider {
            Some(p) => debug!(
                signature = %signature,
                provider = p.provider_name(),
                "Resolved provider"
            ),
            None => debug!(signature = %signature, "No provider resolved"),
        }
        provider
    }

    /// First item matching the template, from either tier.
    pub fn lookup_service(&self, template: &ServiceTemplate) -> Option<ServiceItem> {
        self.lookup(template).into_iter().next()
    }

    /// Items matching the template: cataloger first, discovery second.
    pub fn lookup(&self, template: &ServiceTemplate) -> Vec<ServiceItem> {
        if self.config.use_cataloger && !template.targets(CATALOGER) {
            if let Some(items) = self.catalog_lookup(template) {
                self.counters.catalog_hits.fetch_add(1, Ordering::Relaxed);
                return items;
            }
        }
        self.discover(template)
    }

    /// Drop the cached cataloger so the next lookup re-acquires it.
    pub fn invalidate_cataloger(&self) {
        *self.cataloger.lock() = None;
    }

    pub fn stats(&self) -> AccessorStats {
        AccessorStats {
            catalog_hits: self.counters.catalog_hits.load(Ordering::Relaxed),
            discovery_lookups: self.counters.discovery_lookups.load(Ordering::Relaxed),
            cataloger_acquisitions: self.counters.cataloger_acquisitions.load(Ordering::Relaxed),
        }
    }

    /// Query the cataloger. `None` means fall through to discovery.
    fn catalog_lookup(&self, template: &ServiceTemplate) -> Option<Vec<ServiceItem>> {
        let item = self.cataloger_item()?;
        let cataloger = item.cataloger()?;

        match cataloger.lookup(template, self.config.max_matches) {
            Ok(items) => {
                let items = self.filtered(items);
                if items.is_empty() {
                    trace!(types = ?template.service_types, "Cataloger had no match");
                    None
                } else {
                    Some(items)
                }
            }
            Err(e) => {
                warn!(error = %e, "Cataloger lookup failed, dropping cached cataloger");
                self.invalidate_cataloger();
                None
            }
        }
    }

    /// Current cataloger, re-acquired if the cached one is dead or missing.
    ///
    /// The check and the replacement happen under one lock.
    fn cataloger_item(&self) -> Option<ServiceItem> {
        let mut cached = self.cataloger.lock();

        if let Some(item) = cached.as_ref() {
            if self.registry.is_alive(item) {
                return Some(item.clone());
            }
            debug!(service_id = %item.service_id, "Cached cataloger is not alive");
            *cached = None;
        }

        let mut template = ServiceTemplate::of_type(CATALOGER);
        if let Some(name) = &self.config.cataloger_name {
            template = template.with_name(name.clone());
        }

        let found = match self.registry.lookup(&template, 1) {
            Ok(items) => items.into_iter().find(|i| i.cataloger().is_some()),
            Err(e) => {
                warn!(error = %e, "Cataloger discovery failed");
                None
            }
        };

        if let Some(item) = &found {
            self.counters
                .cataloger_acquisitions
                .fetch_add(1, Ordering::Relaxed);
            debug!(service_id = %item.service_id, "Acquired cataloger");
        }
        cached.clone_from(&found);
        found
    }

    /// Template discovery with min/max/wait semantics.
    ///
    /// Polls until `min_matches` items survive filtering or the wait expires,
    /// then returns at most `max_matches` of whatever was found last.
    fn discover(&self, template: &ServiceTemplate) -> Vec<ServiceItem> {
        let max = self.config.max_matches.max(1);
        let min = self.config.min_matches.min(max);
        let deadline = Instant::now() + self.config.discovery_wait;
        let mut last = Vec::new();

        loop {
            self.counters
                .discovery_lookups
                .fetch_add(1, Ordering::Relaxed);

            match self.registry.lookup(template, max) {
                Ok(items) => {
                    let mut items = self.filtered(items);
                    items.truncate(max);
                    if items.len() >= min {
                        return items;
                    }
                    last = items;
                }
                Err(e) => warn!(error = %e, types = ?template.service_types, "Registry lookup failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    types = ?template.service_types,
                    found = last.len(),
                    min,
                    "Discovery wait expired"
                );
                return last;
            }
            std::thread::sleep(self.config.poll_interval.min(deadline - now));
        }
    }

    fn filtered(&self, items: Vec<ServiceItem>) -> Vec<ServiceItem> {
        match &self.filter {
            Some(filter) => items.into_iter().filter(|i| filter.filter(i)).collect(),
            None => items,
        }
    }
}
