//! Children cache with request coalescing.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use location_selector_sdk::{DirectoryError, LocationNode, ParentKey};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::DomainError;

/// An immutable, cheaply clonable children list.
pub type ChildList = Arc<[LocationNode]>;

type SharedFetch = Shared<BoxFuture<'static, Result<ChildList, DirectoryError>>>;

enum Slot {
    Ready(ChildList),
    Pending { generation: u64, fetch: SharedFetch },
}

/// Children lists keyed by parent, filled on first use and kept for the
/// lifetime of the view.
///
/// A key is absent, pending (one shared in-flight fetch every caller
/// awaits) or ready. A failed fetch removes the pending entry, so the next
/// caller fetches again. Once `liveness` is cancelled nothing is written.
pub struct LocationCache {
    slots: Arc<Mutex<HashMap<ParentKey, Slot>>>,
    generation: AtomicU64,
    liveness: CancellationToken,
}

impl LocationCache {
    #[must_use]
    pub fn new(liveness: CancellationToken) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            liveness,
        }
    }

    /// Ready list for `key`, if any. Pending entries are not returned.
    #[must_use]
    pub fn get(&self, key: &ParentKey) -> Option<ChildList> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready(list)) => Some(Arc::clone(list)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self, key: &ParentKey) -> bool {
        matches!(self.slots.lock().get(key), Some(Slot::Pending { .. }))
    }

    /// Number of ready or pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Stores a list unless the key is already present. Returns whether the
    /// list was stored.
    pub fn seed(&self, key: ParentKey, list: Vec<LocationNode>) -> bool {
        if self.liveness.is_cancelled() {
            return false;
        }
        match self.slots.lock().entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Slot::Ready(list.into()));
                true
            }
        }
    }

    /// Drops every entry. Pending fetches still resolve for their awaiters
    /// but no longer write back.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Returns the children of `key`, fetching them on a miss.
    ///
    /// `fetch` is only invoked when no entry exists; callers arriving while
    /// a fetch is in flight await the same request. `prefix` is prepended
    /// to the fetched list before it is stored.
    ///
    /// # Errors
    ///
    /// - `Directory` if the fetch fails; the key is left absent
    /// - `StaleResponse` if the cache was torn down while waiting
    pub async fn get_or_fetch<F>(
        &self,
        key: ParentKey,
        prefix: Option<LocationNode>,
        fetch: F,
    ) -> Result<ChildList, DomainError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Vec<LocationNode>, DirectoryError>>,
    {
        if self.liveness.is_cancelled() {
            return Err(DomainError::StaleResponse);
        }

        let shared = {
            let mut slots = self.slots.lock();
            match slots.get(&key) {
                Some(Slot::Ready(list)) => {
                    debug!(key = %key, "children cache hit");
                    return Ok(Arc::clone(list));
                }
                Some(Slot::Pending { fetch, .. }) => {
                    debug!(key = %key, "joining in-flight children fetch");
                    fetch.clone()
                }
                None => {
                    debug!(key = %key, "children cache miss");
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let request = fetch();
                    let slots_ref = Arc::clone(&self.slots);
                    let liveness = self.liveness.clone();
                    let settle_key = key.clone();
                    let shared = async move {
                        let result = request.await.map(|nodes| -> ChildList {
                            prefix.into_iter().chain(nodes).collect()
                        });
                        settle(&slots_ref, &liveness, &settle_key, generation, &result);
                        result
                    }
                    .boxed()
                    .shared();
                    slots.insert(
                        key,
                        Slot::Pending {
                            generation,
                            fetch: shared.clone(),
                        },
                    );
                    shared
                }
            }
        };

        let result = shared.await;
        if self.liveness.is_cancelled() {
            return Err(DomainError::StaleResponse);
        }
        result.map_err(DomainError::from)
    }
}

/// Applies a finished fetch to its pending slot.
fn settle(
    slots: &Mutex<HashMap<ParentKey, Slot>>,
    liveness: &CancellationToken,
    key: &ParentKey,
    generation: u64,
    result: &Result<ChildList, DirectoryError>,
) {
    let mut slots = slots.lock();
    let owns_slot = matches!(
        slots.get(key),
        Some(Slot::Pending { generation: g, .. }) if *g == generation
    );
    if !owns_slot {
        return;
    }

    match result {
        Ok(list) if !liveness.is_cancelled() => {
            debug!(key = %key, count = list.len(), "children cached");
            slots.insert(key.clone(), Slot::Ready(Arc::clone(list)));
        }
        Ok(_) => {
            debug!(key = %key, "discarding children fetched after teardown");
            slots.remove(key);
        }
        Err(e) => {
            debug!(key = %key, error = %e, "children fetch failed, key left absent");
            slots.remove(key);
        }
    }
}
