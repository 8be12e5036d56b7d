//! Typed metric payloads, one per widget kind
//!
//! Every payload type has a zero value (`Default`): all numbers 0, all series
//! empty. Widgets fall back to it whenever they have nothing better to show.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::FetchError;

/// Declared widget kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualizationKind {
    /// Overall progress donut
    Donut,
    /// Weekly / cumulative progress histogram
    Histogram,
    /// Actual vs planned vs forecast S-curve
    SCurve,
    /// Quantity distribution by discipline and unit
    Quantity,
    /// Schedule performance index over time
    Spi,
}

/// A widget type name that is not one of [`VisualizationKind`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown visualization type: {0:?}")]
pub struct UnknownKind(pub String);

impl VisualizationKind {
    pub const ALL: [VisualizationKind; 5] = [
        VisualizationKind::Donut,
        VisualizationKind::Histogram,
        VisualizationKind::SCurve,
        VisualizationKind::Quantity,
        VisualizationKind::Spi,
    ];

    /// Name used in layouts and backend routes
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationKind::Donut => "donut",
            VisualizationKind::Histogram => "histogram",
            VisualizationKind::SCurve => "scurve",
            VisualizationKind::Quantity => "quantity",
            VisualizationKind::Spi => "spi",
        }
    }

    /// Human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            VisualizationKind::Donut => "Overall Progress",
            VisualizationKind::Histogram => "Progress Histogram",
            VisualizationKind::SCurve => "S-Curve",
            VisualizationKind::Quantity => "Quantity Distribution",
            VisualizationKind::Spi => "Schedule Performance Index",
        }
    }

    /// Fully populated zero-value payload for this kind
    pub fn zero_payload(&self) -> MetricPayload {
        match self {
            VisualizationKind::Donut => MetricPayload::Progress(ProgressData::default()),
            VisualizationKind::Histogram => MetricPayload::Histogram(HistogramData::default()),
            VisualizationKind::SCurve => MetricPayload::SCurve(SCurveData::default()),
            VisualizationKind::Quantity => MetricPayload::Quantity(QuantityData::default()),
            VisualizationKind::Spi => MetricPayload::Spi(SpiData::default()),
        }
    }

    /// Parse the `data` object of a backend envelope into this kind's payload
    pub fn parse_data(&self, data: Value) -> Result<MetricPayload, serde_json::Error> {
        fn typed<T: DeserializeOwned>(data: Value) -> Result<T, serde_json::Error> {
            serde_json::from_value(data)
        }

        Ok(match self {
            VisualizationKind::Donut => MetricPayload::Progress(typed(data)?),
            VisualizationKind::Histogram => MetricPayload::Histogram(typed(data)?),
            VisualizationKind::SCurve => MetricPayload::SCurve(typed(data)?),
            VisualizationKind::Quantity => MetricPayload::Quantity(typed(data)?),
            VisualizationKind::Spi => MetricPayload::Spi(typed(data)?),
        })
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donut" => Ok(VisualizationKind::Donut),
            "histogram" => Ok(VisualizationKind::Histogram),
            "scurve" | "s-curve" => Ok(VisualizationKind::SCurve),
            "quantity" => Ok(VisualizationKind::Quantity),
            "spi" => Ok(VisualizationKind::Spi),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Earned vs budgeted hours
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    pub percentage: f64,
    pub earned: f64,
    pub budgeted: f64,
}

/// Progress booked in one ISO week
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekPoint {
    pub week: String,
    pub progress: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPair {
    #[serde(default)]
    pub actual: Vec<WeekPoint>,
    #[serde(default)]
    pub planned: Vec<WeekPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramData {
    #[serde(default)]
    pub weekly: SeriesPair,
    #[serde(default)]
    pub cumulative: SeriesPair,
}

/// Percent complete on a calendar date (`YYYY-MM-DD`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatePoint {
    pub date: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SCurveData {
    #[serde(default)]
    pub actual: Vec<DatePoint>,
    #[serde(default)]
    pub planned: Vec<DatePoint>,
    #[serde(default)]
    pub forecast: Vec<DatePoint>,
}

/// Budgeted vs earned quantity for one discipline or unit of measure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantityRow {
    #[serde(alias = "discipline", alias = "unit")]
    pub label: String,
    pub budgeted: f64,
    pub earned: f64,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantityData {
    #[serde(default)]
    pub by_discipline: Vec<QuantityRow>,
    #[serde(default)]
    pub by_unit: Vec<QuantityRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpiPoint {
    pub date: String,
    pub spi: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpiData {
    #[serde(default)]
    pub spi_values: Vec<SpiPoint>,
    #[serde(default)]
    pub current_spi: f64,
}

/// Payload of any widget kind
#[derive(Debug, Clone, PartialEq)]
pub enum MetricPayload {
    Progress(ProgressData),
    Histogram(HistogramData),
    SCurve(SCurveData),
    Quantity(QuantityData),
    Spi(SpiData),
}

impl MetricPayload {
    pub fn kind(&self) -> VisualizationKind {
        match self {
            MetricPayload::Progress(_) => VisualizationKind::Donut,
            MetricPayload::Histogram(_) => VisualizationKind::Histogram,
            MetricPayload::SCurve(_) => VisualizationKind::SCurve,
            MetricPayload::Quantity(_) => VisualizationKind::Quantity,
            MetricPayload::Spi(_) => VisualizationKind::Spi,
        }
    }

    /// Whether this equals its kind's zero value
    pub fn is_zero(&self) -> bool {
        *self == self.kind().zero_payload()
    }

    pub fn as_progress(&self) -> Option<&ProgressData> {
        match self {
            MetricPayload::Progress(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&HistogramData> {
        match self {
            MetricPayload::Histogram(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_scurve(&self) -> Option<&SCurveData> {
        match self {
            MetricPayload::SCurve(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&QuantityData> {
        match self {
            MetricPayload::Quantity(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_spi(&self) -> Option<&SpiData> {
        match self {
            MetricPayload::Spi(data) => Some(data),
            _ => None,
        }
    }
}

/// Backend response envelope: `{project_name?, data, error?}`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn an HTTP status and body into a typed payload
///
/// Non-2xx statuses, unparsable bodies, envelopes without `data` and envelopes
/// that report an `error` are all failures.
pub fn decode_response(
    kind: VisualizationKind,
    status: u16,
    body: &[u8],
) -> Result<MetricPayload, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status(status));
    }

    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(message) = envelope.error {
        return Err(FetchError::Backend(message));
    }

    let data = envelope
        .data
        .ok_or_else(|| FetchError::Malformed("response has no data field".to_string()))?;

    kind.parse_data(data)
        .map_err(|e| FetchError::Malformed(format!("{kind} data: {e}")))
}
