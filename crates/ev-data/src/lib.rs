//! Metric payloads and data sources for the dashboard widgets

pub mod cache;
pub mod payload;
pub mod sources;

use async_trait::async_trait;
use ev_core::ProjectId;
use thiserror::Error;

// Re-exports
pub use cache::{CachingSource, PayloadCache};
pub use payload::{
    decode_response, DatePoint, HistogramData, MetricPayload, ProgressData, QuantityData,
    QuantityRow, SCurveData, SeriesPair, SpiData, SpiPoint, UnknownKind, VisualizationKind,
    WeekPoint,
};
pub use sources::{DemoSource, HttpSource, MemorySource};

/// Why a metric fetch failed
///
/// Every ordinary failure mode of a fetch (transport, status, body) ends up
/// here; nothing is thrown past a [`DataSource`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("API request failed with status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The backend answered but reported an error in its envelope
    #[error("{0}")]
    Backend(String),
}

/// Async source of widget metrics
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the metrics behind one widget kind for one project
    async fn fetch_visualization(
        &self,
        kind: VisualizationKind,
        project_id: ProjectId,
    ) -> Result<MetricPayload, FetchError>;

    /// Get the source name
    fn source_name(&self) -> &str;
}
