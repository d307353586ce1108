//! In-memory service registry and cataloger.

use exertion_core::{
    Cataloger, Entry, Provider, RegistryError, ServiceHandle, ServiceItem, ServiceRegistry,
    ServiceTemplate,
};
use exertion_types::ServiceId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct Registration {
    item: ServiceItem,
    alive: bool,
}

/// Service registry holding items in process.
///
/// Items can be marked dead without unregistering them, which makes
/// `is_alive` fail while lookups skip them, the way a crashed provider looks
/// to a lease-based registry before its lease expires.
#[derive(Debug)]
pub struct InMemoryRegistry {
    registrations: RwLock<Vec<Registration>>,
    available: AtomicBool,
    lookups: AtomicU64,
    next_id: AtomicU64,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            lookups: AtomicU64::new(0),
            next_id: AtomicU64::new(1_000),
        }
    }

    /// Register an item, replacing any item with the same service id.
    pub fn register(&self, item: ServiceItem) -> ServiceId {
        let id = item.service_id;
        let mut regs = self.registrations.write();
        regs.retain(|r| r.item.service_id != id);
        debug!(service_id = %id, types = ?item.service_types, "Registered service");
        regs.push(Registration { item, alive: true });
        id
    }

    /// Register a provider under the given service types and its own name.
    pub fn register_provider(
        &self,
        provider: Arc<dyn Provider>,
        service_types: &[&str],
    ) -> ServiceId {
        let id = ServiceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = provider.provider_name().to_string();
        let mut item = ServiceItem::new(id, ServiceHandle::Provider(provider))
            .with_attribute(Entry::Name(name));
        for t in service_types {
            item = item.with_type(*t);
        }
        self.register(item)
    }

    pub fn unregister(&self, id: ServiceId) -> bool {
        let mut regs = self.registrations.write();
        let before = regs.len();
        regs.retain(|r| r.item.service_id != id);
        regs.len() != before
    }

    /// Mark a registered service alive or dead.
    pub fn set_alive(&self, id: ServiceId, alive: bool) {
        for reg in self.registrations.write().iter_mut() {
            if reg.item.service_id == id {
                reg.alive = alive;
            }
        }
    }

    /// Make every lookup fail while `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Number of `lookup` calls served so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ServiceRegistry for InMemoryRegistry {
    fn lookup(
        &self,
        template: &ServiceTemplate,
        max_matches: usize,
    ) -> Result<Vec<ServiceItem>, RegistryError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !self.available.load(Ordering::Relaxed) {
            return Err(RegistryError::Unavailable("registry offline".into()));
        }
        Ok(self
            .registrations
            .read()
            .iter()
            .filter(|r| r.alive && template.matches(&r.item))
            .take(max_matches)
            .map(|r| r.item.clone())
            .collect())
    }

    fn is_alive(&self, item: &ServiceItem) -> bool {
        self.registrations
            .read()
            .iter()
            .any(|r| r.item.service_id == item.service_id && r.alive)
    }
}

/// Cataloger holding a directory of items in process.
#[derive(Debug, Default)]
pub struct InMemoryCataloger {
    items: RwLock<Vec<ServiceItem>>,
    lookups: AtomicU64,
}

impl InMemoryCataloger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, item: ServiceItem) {
        let mut items = self.items.write();
        items.retain(|i| i.service_id != item.service_id);
        items.push(item);
    }

    pub fn unregister(&self, id: ServiceId) {
        self.items.write().retain(|i| i.service_id != id);
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Cataloger for InMemoryCataloger {
    fn lookup(
        &self,
        template: &ServiceTemplate,
        max_matches: usize,
    ) -> Result<Vec<ServiceItem>, RegistryError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .items
            .read()
            .iter()
            .filter(|i| template.matches(i))
            .take(max_matches)
            .cloned()
            .collect())
    }
}
