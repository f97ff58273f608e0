//! Concurrent client cache backed by a sharded map. No TTL: entries live
//! until explicitly invalidated by a `client.secret.rotated` event, so
//! staleness is bounded only by how quickly the pub/sub subscriber
//! processes that event, not by a clock.

use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct ClientCache<V: Clone + Send + Sync + 'static> {
    inner: Arc<DashMap<String, V>>,
}

impl<V: Clone + Send + Sync + 'static> ClientCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, client_id: &str) -> Option<V> {
        self.inner.get(client_id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, client_id: impl Into<String>, value: V) {
        self.inner.insert(client_id.into(), value);
    }

    pub fn invalidate(&self, client_id: &str) {
        self.inner.remove(client_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<V: Clone + Send + Sync + 'static> Default for ClientCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
