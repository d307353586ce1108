//! Service templates and registry lookup results.

use crate::{Cataloger, LockManager, Provider};
use exertion_types::{ServiceId, Signature};
use std::fmt;
use std::sync::Arc;

/// Attribute attached to a registered service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    /// Provider name.
    Name(String),
    /// Discovery group the service registered in.
    Group(String),
    /// Free-form location hint.
    Location(String),
}

/// Lookup template: an item matches when it carries every listed type and
/// every listed attribute, and the service id if one is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTemplate {
    pub service_id: Option<ServiceId>,
    pub service_types: Vec<String>,
    pub attributes: Vec<Entry>,
}

impl ServiceTemplate {
    /// Template for a single service type.
    pub fn of_type(service_type: impl Into<String>) -> Self {
        Self {
            service_types: vec![service_type.into()],
            ..Default::default()
        }
    }

    /// Template selecting providers for a signature.
    ///
    /// A concrete provider name becomes a `Name` attribute; `ANY` adds none.
    pub fn for_signature(signature: &Signature) -> Self {
        let mut template = Self::of_type(signature.service_type.clone());
        if !signature.is_any_provider() {
            template
                .attributes
                .push(Entry::Name(signature.provider_name.clone()));
        }
        template
    }

    /// Require a provider name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(Entry::Name(name.into()));
        self
    }

    /// Whether the template targets the given service type.
    pub fn targets(&self, service_type: &str) -> bool {
        self.service_types.iter().any(|t| t == service_type)
    }

    /// Whether `item` satisfies this template.
    pub fn matches(&self, item: &ServiceItem) -> bool {
        if let Some(id) = self.service_id {
            if item.service_id != id {
                return false;
            }
        }
        self.service_types
            .iter()
            .all(|t| item.service_types.contains(t))
            && self.attributes.iter().all(|a| item.attributes.contains(a))
    }
}

/// A live handle to a registered service.
#[derive(Clone)]
pub enum ServiceHandle {
    Provider(Arc<dyn Provider>),
    Cataloger(Arc<dyn Cataloger>),
    LockManager(Arc<dyn LockManager>),
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceHandle::Provider(p) => f
                .debug_tuple("Provider")
                .field(&p.provider_name())
                .finish(),
            ServiceHandle::Cataloger(_) => f.write_str("Cataloger"),
            ServiceHandle::LockManager(_) => f.write_str("LockManager"),
        }
    }
}

/// Registry resolution result.
#[derive(Debug, Clone)]
pub struct ServiceItem {
    pub service_id: ServiceId,
    pub service: ServiceHandle,
    pub service_types: Vec<String>,
    pub attributes: Vec<Entry>,
}

impl ServiceItem {
    pub fn new(service_id: ServiceId, service: ServiceHandle) -> Self {
        Self {
            service_id,
            service,
            service_types: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_types.push(service_type.into());
        self
    }

    pub fn with_attribute(mut self, entry: Entry) -> Self {
        self.attributes.push(entry);
        self
    }

    /// The provider behind this item, if it is one.
    pub fn provider(&self) -> Option<&Arc<dyn Provider>> {
        match &self.service {
            ServiceHandle::Provider(p) => Some(p),
            _ => None,
        }
    }

    pub fn cataloger(&self) -> Option<&Arc<dyn Cataloger>> {
        match &self.service {
            ServiceHandle::Cataloger(c) => Some(c),
            _ => None,
        }
    }

    pub fn lock_manager(&self) -> Option<&Arc<dyn LockManager>> {
        match &self.service {
            ServiceHandle::LockManager(l) => Some(l),
            _ => None,
        }
    }

    /// The registered name, if the item carries one.
    pub fn name(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            Entry::Name(n) => Some(n.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LockRequest, LockResult};
    use crate::LockError;

    struct NoLocks;

    impl LockManager for NoLocks {
        fn acquire(&self, _request: &LockRequest) -> Result<LockResult, LockError> {
            Ok(LockResult::denied("never"))
        }
    }

    fn item(types: &[&str], name: &str) -> ServiceItem {
        let mut item = ServiceItem::new(ServiceId(1), ServiceHandle::LockManager(Arc::new(NoLocks)))
            .with_attribute(Entry::Name(name.to_string()));
        for t in types {
            item = item.with_type(*t);
        }
        item
    }

    #[test]
    fn test_template_matches_types_and_name() {
        let it = item(&["Echo", "Service"], "echo-1");

        assert!(ServiceTemplate::of_type("Echo").matches(&it));
        assert!(ServiceTemplate::of_type("Echo").with_name("echo-1").matches(&it));
        assert!(!ServiceTemplate::of_type("Echo").with_name("echo-2").matches(&it));
        assert!(!ServiceTemplate::of_type("Calculator").matches(&it));
    }

    #[test]
    fn test_template_service_id() {
        let it = item(&["Echo"], "e");
        let mut template = ServiceTemplate::of_type("Echo");
        template.service_id = Some(ServiceId(2));
        assert!(!template.matches(&it));
        template.service_id = Some(ServiceId(1));
        assert!(template.matches(&it));
    }

    #[test]
    fn test_for_signature_any_adds_no_name() {
        let any = ServiceTemplate::for_signature(&Signature::net("Echo", "run"));
        assert!(any.attributes.is_empty());

        let named =
            ServiceTemplate::for_signature(&Signature::net("Echo", "run").with_provider_name("e1"));
        assert_eq!(named.attributes, vec![Entry::Name("e1".into())]);
    }

    #[test]
    fn test_item_accessors() {
        let it = item(&["LockManager"], "locks");
        assert!(it.lock_manager().is_some());
        assert!(it.provider().is_none());
        assert_eq!(it.name(), Some("locks"));
    }
}
