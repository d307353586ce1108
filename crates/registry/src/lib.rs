//! Service registry client.
//!
//! [`ProviderAccessor`] turns a signature into a live provider handle using a
//! two-tier protocol:
//!
//! ```text
//! resolve(signature)
//!     │
//!     ▼
//! ┌───────────────────────────────────────────────┐
//! │ Cataloger fast path                           │
//! │   1. cached cataloger alive? else re-acquire  │
//! │   2. cataloger.lookup(template, max)          │
//! │   3. filter; any match → return               │
//! └───────────────────────────────────────────────┘
//!     │ no cataloger / error / zero matches
//!     ▼
//! ┌───────────────────────────────────────────────┐
//! │ Discovery fallback                            │
//! │   registry.lookup polled until min_matches    │
//! │   or discovery_wait expires                   │
//! └───────────────────────────────────────────────┘
//! ```

mod accessor;
mod config;
mod filter;

pub use accessor::{AccessorStats, ProviderAccessor};
pub use config::RegistryConfig;
pub use filter::ServiceItemFilter;
