//! In-process TTL caching.
//!
//! [`TtlCache`] is the generic primitive: a keyed map with a fixed per-entry
//! lifetime and no backend awareness. [`EntityCache`] composes one cache per
//! key family the data-access service reads through; the service alone knows
//! which keys a write touches.

mod lock;
mod registry;
mod store;

pub use registry::EntityCache;
pub use store::{TtlCache, TtlSlot};
