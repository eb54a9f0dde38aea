use std::num::NonZeroUsize;

use alloy_primitives::B256;
use keel_execution_types::{PayloadId, Slot};
use lru::LruCache;
use parking_lot::Mutex;

const PAYLOAD_ID_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct PayloadIdCacheKey {
    pub slot: Slot,
    pub parent_hash: B256,
}

/// Bounded map from (slot, parent hash) to the ID of an in-flight payload
/// build. Last writer wins on a key collision; entries for old slots age out
/// in LRU order rather than by explicit invalidation.
#[derive(Debug)]
pub struct PayloadIdCache {
    payload_ids: Mutex<LruCache<PayloadIdCacheKey, PayloadId>>,
}

impl Default for PayloadIdCache {
    fn default() -> Self {
        PayloadIdCache {
            payload_ids: Mutex::new(LruCache::new(PAYLOAD_ID_CACHE_SIZE)),
        }
    }
}

impl PayloadIdCache {
    pub fn get(&self, slot: Slot, parent_hash: B256) -> Option<PayloadId> {
        self.payload_ids
            .lock()
            .get(&PayloadIdCacheKey { slot, parent_hash })
            .copied()
    }

    pub fn set(&self, slot: Slot, parent_hash: B256, payload_id: PayloadId) {
        self.payload_ids
            .lock()
            .put(PayloadIdCacheKey { slot, parent_hash }, payload_id);
    }
}
