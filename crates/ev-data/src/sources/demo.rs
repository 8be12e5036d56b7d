//! Demo data source
//! Generates deterministic synthetic metrics so the dashboard runs without a backend

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use ev_core::ProjectId;

use crate::{
    DataSource, DatePoint, FetchError, HistogramData, MetricPayload, ProgressData, QuantityData,
    QuantityRow, SCurveData, SeriesPair, SpiData, SpiPoint, VisualizationKind, WeekPoint,
};

const WEEKS: u64 = 12;
const DISCIPLINES: [&str; 5] = ["Civil", "Piping", "Electrical", "Mechanical", "Instrumentation"];
const UNITS: [&str; 3] = ["LF", "EA", "CY"];

/// Synthetic metrics derived from the project id
pub struct DemoSource {
    start: NaiveDate,
    latency: Duration,
}

impl DemoSource {
    pub fn new() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            latency: Duration::ZERO,
        }
    }

    /// Answer every fetch after `latency`, to make loading states visible
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fraction of work earned for a project, in 0.05..0.95
    fn completion(project_id: ProjectId) -> f64 {
        ((project_id.0.unsigned_abs() * 37) % 90 + 5) as f64 / 100.0
    }

    fn budgeted_hours(project_id: ProjectId) -> f64 {
        1000.0 + (project_id.0.unsigned_abs() % 7) as f64 * 250.0
    }

    /// Share of the total earned in each week; ramps up then down
    fn weekly_shares() -> Vec<f64> {
        let raw: Vec<f64> = (0..WEEKS)
            .map(|week| {
                let x = (week as f64 + 0.5) / WEEKS as f64;
                x * (1.0 - x)
            })
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|share| share / total).collect()
    }

    fn week_date(&self, week: u64) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(week * 7))
            .unwrap_or(self.start)
    }

    fn progress(&self, project_id: ProjectId) -> ProgressData {
        let budgeted = Self::budgeted_hours(project_id);
        let earned = round_to(budgeted * Self::completion(project_id), 1);
        ProgressData {
            percentage: round_to(earned / budgeted * 100.0, 1),
            earned,
            budgeted,
        }
    }

    fn histogram(&self, project_id: ProjectId) -> HistogramData {
        let completion = Self::completion(project_id) * 100.0;
        let mut weekly = SeriesPair::default();
        let mut cumulative = SeriesPair::default();
        let (mut actual_total, mut planned_total) = (0.0, 0.0);

        for (week, share) in Self::weekly_shares().into_iter().enumerate() {
            let label = format!("2024-W{:02}", week + 1);
            let actual = completion * share;
            let planned = 100.0 / WEEKS as f64;
            actual_total += actual;
            planned_total += planned;

            weekly.actual.push(WeekPoint { week: label.clone(), progress: round_to(actual, 1) });
            weekly.planned.push(WeekPoint { week: label.clone(), progress: round_to(planned, 1) });
            cumulative.actual.push(WeekPoint { week: label.clone(), progress: round_to(actual_total, 1) });
            cumulative.planned.push(WeekPoint { week: label, progress: round_to(planned_total, 1) });
        }

        HistogramData { weekly, cumulative }
    }

    fn actual_curve(&self, project_id: ProjectId) -> Vec<DatePoint> {
        let completion = Self::completion(project_id) * 100.0;
        let mut total = 0.0;
        Self::weekly_shares()
            .into_iter()
            .enumerate()
            .map(|(week, share)| {
                total += completion * share;
                DatePoint {
                    date: self.week_date(week as u64).format("%Y-%m-%d").to_string(),
                    percentage: round_to(total, 1),
                }
            })
            .collect()
    }

    fn scurve(&self, project_id: ProjectId) -> SCurveData {
        let actual = self.actual_curve(project_id);
        let last = self.week_date(WEEKS - 1);
        let end = last.checked_add_days(Days::new(30)).unwrap_or(last);
        let planned = planned_s_curve(self.start, end);
        let forecast = forecast_curve(&actual, &planned);
        SCurveData { actual, planned, forecast }
    }

    fn quantity(&self, project_id: ProjectId) -> QuantityData {
        let completion = Self::completion(project_id);
        let seed = project_id.0.unsigned_abs();
        let row = |label: &str, index: u64| {
            let budgeted = 200.0 + ((seed + index * 13) % 11) as f64 * 75.0;
            let ratio = (completion + (index as f64 - 2.0) * 0.05).clamp(0.0, 1.0);
            let earned = round_to(budgeted * ratio, 2);
            QuantityRow {
                label: label.to_string(),
                budgeted,
                earned,
                percentage: round_to(earned / budgeted * 100.0, 1),
            }
        };

        let mut by_discipline: Vec<QuantityRow> =
            DISCIPLINES.iter().zip(0u64..).map(|(label, i)| row(label, i)).collect();
        let mut by_unit: Vec<QuantityRow> =
            UNITS.iter().zip(0u64..).map(|(label, i)| row(label, i + 5)).collect();
        by_discipline.sort_by(|a, b| b.budgeted.total_cmp(&a.budgeted));
        by_unit.sort_by(|a, b| b.budgeted.total_cmp(&a.budgeted));

        QuantityData { by_discipline, by_unit }
    }

    fn spi(&self, project_id: ProjectId) -> SpiData {
        let actual = self.actual_curve(project_id);
        let planned_step = 100.0 / WEEKS as f64;
        let spi_values: Vec<SpiPoint> = actual
            .iter()
            .zip(1..)
            .map(|(point, week)| {
                let planned = planned_step * week as f64;
                SpiPoint {
                    date: point.date.clone(),
                    spi: round_to(if planned > 0.0 { point.percentage / planned } else { 1.0 }, 2),
                }
            })
            .collect();
        let current_spi = spi_values.last().map(|p| p.spi).unwrap_or(0.0);
        SpiData { spi_values, current_spi }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for DemoSource {
    async fn fetch_visualization(
        &self,
        kind: VisualizationKind,
        project_id: ProjectId,
    ) -> Result<MetricPayload, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        // Negative ids stand in for projects the backend does not know
        if project_id.0 < 0 {
            return Err(FetchError::Backend("Project not found".to_string()));
        }

        Ok(match kind {
            VisualizationKind::Donut => MetricPayload::Progress(self.progress(project_id)),
            VisualizationKind::Histogram => MetricPayload::Histogram(self.histogram(project_id)),
            VisualizationKind::SCurve => MetricPayload::SCurve(self.scurve(project_id)),
            VisualizationKind::Quantity => MetricPayload::Quantity(self.quantity(project_id)),
            VisualizationKind::Spi => MetricPayload::Spi(self.spi(project_id)),
        })
    }

    fn source_name(&self) -> &str {
        "demo"
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Planned S-curve between two dates, at most ~20 points
///
/// Slow start (0-10% over the first fifth), steady middle (10-90%), slow end.
pub fn planned_s_curve(start: NaiveDate, end: NaiveDate) -> Vec<DatePoint> {
    let total_days = (end - start).num_days();
    if total_days <= 0 {
        return Vec::new();
    }

    let step = (total_days / 20).max(1) as usize;
    (0..=total_days)
        .step_by(step)
        .filter_map(|day| {
            let date = start.checked_add_days(Days::new(day as u64))?;
            let x = day as f64 / total_days as f64;
            let percentage = if x < 0.2 {
                10.0 * (x / 0.2)
            } else if x < 0.8 {
                10.0 + 80.0 * ((x - 0.2) / 0.6)
            } else {
                90.0 + 10.0 * ((x - 0.8) / 0.2)
            };
            Some(DatePoint {
                date: date.format("%Y-%m-%d").to_string(),
                percentage: round_to(percentage, 1),
            })
        })
        .collect()
}

/// Project the planned curve past the last actual point
///
/// Planned values are scaled by the performance factor observed on the last
/// actual date (clamped to 0.5..=1.5) and capped at 100%.
pub fn forecast_curve(actual: &[DatePoint], planned: &[DatePoint]) -> Vec<DatePoint> {
    let Some(last) = actual.last() else {
        return Vec::new();
    };
    let Ok(last_date) = NaiveDate::parse_from_str(&last.date, "%Y-%m-%d") else {
        return Vec::new();
    };

    let planned_at_last = planned
        .iter()
        .find(|point| point.date == last.date)
        .map(|point| point.percentage)
        .unwrap_or(0.0);
    let factor = if planned_at_last > 0.0 {
        last.percentage / planned_at_last
    } else {
        1.0
    }
    .clamp(0.5, 1.5);

    planned
        .iter()
        .filter(|point| {
            NaiveDate::parse_from_str(&point.date, "%Y-%m-%d")
                .map(|date| date > last_date)
                .unwrap_or(false)
        })
        .map(|point| DatePoint {
            date: point.date.clone(),
            percentage: round_to((point.percentage * factor).min(100.0), 1),
        })
        .collect()
}
