//! Resolve-once capability slots
//!
//! Capability results are computed lazily and published into a single atomic
//! slot. Concurrent first callers may both compute; the first publish wins and
//! every caller observes the winner. Nothing is ever invalidated.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use errors::ValResult;
use serde::Serialize;

use crate::value_range::ValueRange;

/// Storage policy for a lazily resolved value
///
/// Call sites only see `load`/`publish`, so a refreshing policy can replace
/// [`ResolveOnce`] without touching them.
pub trait CapabilityCache<T>: Send + Sync {
    fn load(&self) -> Option<Arc<T>>;

    /// Offer a freshly computed value, returning the one that is now current
    fn publish(&self, value: T) -> Arc<T>;
}

/// Write-once slot; the first published value is permanent
pub struct ResolveOnce<T> {
    slot: ArcSwapOption<T>,
}

impl<T> ResolveOnce<T> {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }
}

impl<T> Default for ResolveOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> CapabilityCache<T> for ResolveOnce<T> {
    fn load(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    fn publish(&self, value: T) -> Arc<T> {
        let candidate = Arc::new(value);
        let previous = self
            .slot
            .compare_and_swap(&None::<Arc<T>>, Some(Arc::clone(&candidate)));
        match &*previous {
            Some(winner) => Arc::clone(winner),
            None => candidate,
        }
    }
}

/// Load the cached value or compute and publish it
pub fn resolve_with<T, C, F>(cache: &C, compute: F) -> Arc<T>
where
    C: CapabilityCache<T> + ?Sized,
    F: FnOnce() -> T,
{
    match cache.load() {
        Some(value) => value,
        None => cache.publish(compute()),
    }
}

/// Resolved capability of one action
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capability {
    pub supported: bool,
    pub elements: BTreeSet<String>,
    /// Only populated for min-max and per-zone range actions
    pub ranges: BTreeMap<String, ValueRange>,
}

impl Capability {
    pub fn unsupported() -> Self {
        Self::default()
    }
}

/// Cached outcome of resolving an action, errors included
pub type Resolution = ValResult<Arc<Capability>>;

pub type CapabilitySlot = Box<dyn CapabilityCache<Resolution>>;

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use errors::ErrorCode;

    #[test]
    fn test_first_publish_wins() {
        let slot = ResolveOnce::new();
        assert!(slot.load().is_none());
        let first = slot.publish(1);
        let second = slot.publish(2);
        assert_eq!(*first, 1);
        assert_eq!(*second, 1);
        assert!(Arc::ptr_eq(&first, &slot.load().unwrap()));
    }

    #[test]
    fn test_errors_are_permanent() {
        let slot: ResolveOnce<ValResult<bool>> = ResolveOnce::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ErrorCode::BadPlatformImpl)
        };
        assert_eq!(*resolve_with(&slot, compute), Err(ErrorCode::BadPlatformImpl));
        assert_eq!(*resolve_with(&slot, || Ok(true)), Err(ErrorCode::BadPlatformImpl));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_resolution_converges() {
        let slot = Arc::new(ResolveOnce::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || *resolve_with(&*slot, || i))
            })
            .collect();
        let results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
