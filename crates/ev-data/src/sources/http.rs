//! HTTP data source for the backend's visualization API

use std::time::Duration;

use async_trait::async_trait;
use ev_core::{DashboardConfig, ProjectId};
use tracing::debug;

use crate::payload::decode_response;
use crate::{DataSource, FetchError, MetricPayload, VisualizationKind};

/// Fetches `GET {base}/api/visualizations/{kind}/{project_id}`
#[derive(Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// URL serving one widget's metrics
    pub fn endpoint(&self, kind: VisualizationKind, project_id: ProjectId) -> String {
        format!("{}/api/visualizations/{}/{}", self.base_url, kind, project_id)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_visualization(
        &self,
        kind: VisualizationKind,
        project_id: ProjectId,
    ) -> Result<MetricPayload, FetchError> {
        let url = self.endpoint(kind, project_id);
        debug!(%url, "API GET request");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;

        debug!(%url, status, bytes = body.len(), "API response");
        decode_response(kind, status, &body)
    }

    fn source_name(&self) -> &str {
        &self.base_url
    }
}
