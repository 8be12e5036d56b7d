//! Scripted in-memory data source

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ahash::AHashMap;
use async_trait::async_trait;
use ev_core::ProjectId;
use parking_lot::Mutex;

use crate::{DataSource, FetchError, MetricPayload, VisualizationKind};

type Key = (VisualizationKind, ProjectId);

/// Answers fetches from a fixed table of results
///
/// Each (kind, project) can carry a payload or a failure and an optional
/// delay before answering. Unknown keys answer with a 404 status.
pub struct MemorySource {
    name: String,
    responses: Mutex<AHashMap<Key, Result<MetricPayload, FetchError>>>,
    delays: Mutex<AHashMap<Key, Duration>>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            responses: Mutex::new(AHashMap::new()),
            delays: Mutex::new(AHashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_payload(self, kind: VisualizationKind, project_id: ProjectId, payload: MetricPayload) -> Self {
        self.set_payload(kind, project_id, payload);
        self
    }

    pub fn with_failure(self, kind: VisualizationKind, project_id: ProjectId, error: FetchError) -> Self {
        self.set_failure(kind, project_id, error);
        self
    }

    pub fn with_delay(self, kind: VisualizationKind, project_id: ProjectId, delay: Duration) -> Self {
        self.delays.lock().insert((kind, project_id), delay);
        self
    }

    pub fn set_payload(&self, kind: VisualizationKind, project_id: ProjectId, payload: MetricPayload) {
        self.responses.lock().insert((kind, project_id), Ok(payload));
    }

    pub fn set_failure(&self, kind: VisualizationKind, project_id: ProjectId, error: FetchError) {
        self.responses.lock().insert((kind, project_id), Err(error));
    }

    /// Number of fetches answered so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_visualization(
        &self,
        kind: VisualizationKind,
        project_id: ProjectId,
    ) -> Result<MetricPayload, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().get(&(kind, project_id)).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .get(&(kind, project_id))
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgressData;

    #[tokio::test]
    async fn test_scripted_answers() {
        let payload = MetricPayload::Progress(ProgressData { percentage: 73.0, earned: 146.0, budgeted: 200.0 });
        let source = MemorySource::new()
            .with_payload(VisualizationKind::Donut, ProjectId(42), payload.clone())
            .with_failure(VisualizationKind::Spi, ProjectId(42), FetchError::Timeout);

        assert_eq!(source.fetch_visualization(VisualizationKind::Donut, ProjectId(42)).await, Ok(payload));
        assert_eq!(source.fetch_visualization(VisualizationKind::Spi, ProjectId(42)).await, Err(FetchError::Timeout));
        assert_eq!(
            source.fetch_visualization(VisualizationKind::Donut, ProjectId(1)).await,
            Err(FetchError::Status(404))
        );
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied() {
        let source = MemorySource::new()
            .with_payload(VisualizationKind::Donut, ProjectId(1), VisualizationKind::Donut.zero_payload())
            .with_delay(VisualizationKind::Donut, ProjectId(1), Duration::from_millis(500));

        let start = tokio::time::Instant::now();
        source.fetch_visualization(VisualizationKind::Donut, ProjectId(1)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
