//! Payload caching layer

use std::sync::Arc;

use ahash::AHashMap;
use async_trait::async_trait;
use ev_core::ProjectId;
use parking_lot::RwLock;
use tracing::trace;

use crate::{DataSource, FetchError, MetricPayload, VisualizationKind};

type CacheKey = (VisualizationKind, ProjectId);

/// Cache of successfully fetched payloads, keyed by (kind, project)
///
/// Clones share the same storage, so a host can keep a handle for
/// invalidation after handing the source to the widgets.
#[derive(Clone)]
pub struct PayloadCache {
    entries: Arc<RwLock<AHashMap<CacheKey, MetricPayload>>>,
    /// Maximum number of payloads to keep
    max_entries: usize,
}

impl PayloadCache {
    /// Create a new payload cache
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(AHashMap::new())),
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, kind: VisualizationKind, project_id: ProjectId) -> Option<MetricPayload> {
        self.entries.read().get(&(kind, project_id)).cloned()
    }

    pub fn put(&self, kind: VisualizationKind, project_id: ProjectId, payload: MetricPayload) {
        let mut entries = self.entries.write();
        let key = (kind, project_id);

        // Evict an arbitrary entry at capacity
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(evict) = entries.keys().next().copied() {
                entries.remove(&evict);
            }
        }

        entries.insert(key, payload);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drop every payload cached for one project
    pub fn clear_project(&self, project_id: ProjectId) {
        self.entries.write().retain(|(_, project), _| *project != project_id);
    }
}

impl Default for PayloadCache {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Serves repeated fetches from a [`PayloadCache`]; failures are never cached
pub struct CachingSource<S> {
    inner: S,
    cache: PayloadCache,
}

impl<S: DataSource> CachingSource<S> {
    pub fn new(inner: S, cache: PayloadCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachingSource<S> {
    async fn fetch_visualization(
        &self,
        kind: VisualizationKind,
        project_id: ProjectId,
    ) -> Result<MetricPayload, FetchError> {
        if let Some(payload) = self.cache.get(kind, project_id) {
            trace!(%kind, %project_id, "Cache hit");
            return Ok(payload);
        }

        let payload = self.inner.fetch_visualization(kind, project_id).await?;
        self.cache.put(kind, project_id, payload.clone());
        Ok(payload)
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}
