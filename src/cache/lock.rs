//! Lock guards that survive poisoning.
//!
//! A panic while a cache guard is held must not wedge every later request;
//! stale-but-readable state is acceptable for a cache.

use std::sync::{RwLock, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn write_guard<'a, T>(
    lock: &'a RwLock<T>,
    cache: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(cache, "recovered poisoned cache lock");
        poisoned.into_inner()
    })
}
