//! Filters applied to lookup results.

use exertion_core::ServiceItem;

/// Accepts or rejects a candidate service item.
///
/// Closures `Fn(&ServiceItem) -> bool` implement this directly.
pub trait ServiceItemFilter: Send + Sync {
    fn filter(&self, item: &ServiceItem) -> bool;
}

impl<F> ServiceItemFilter for F
where
    F: Fn(&ServiceItem) -> bool + Send + Sync,
{
    fn filter(&self, item: &ServiceItem) -> bool {
        self(item)
    }
}
