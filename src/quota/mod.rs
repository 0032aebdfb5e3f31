//! Rate Limiting
//!
//! Per-client concurrency quota for generation jobs: an injected store
//! behind the [`QuotaStore`] trait, an admission gate, origin-header client
//! identity, and the periodic full-map reset task.
//!
//! The quota is per-process. Horizontally scaled deployments each hold an
//! independent counter map; coordinating them would require an external
//! atomic store behind the same trait, which is out of scope here.

mod identity;
mod reset;
mod store;

pub use identity::client_id_from_headers;
pub use reset::{QuotaResetHandle, QuotaResetTask};
pub use store::{Admission, InMemoryQuotaStore, QuotaStore, RateLimiter};
