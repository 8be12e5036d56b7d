#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ev_core::{names, BusEvent, EventBus, ProjectId};
use ev_data::{MemorySource, MetricPayload, ProgressData};
use ev_views::{ComponentContext, VisualizationRegistry};

pub struct Fixture {
    pub bus: EventBus,
    pub source: Arc<MemorySource>,
    pub registry: VisualizationRegistry,
}

/// Registry backed by `source`, on the current test runtime
pub fn fixture(source: MemorySource) -> Fixture {
    let bus = EventBus::new();
    let source = Arc::new(source);
    let context = ComponentContext::new(bus.clone(), source.clone(), tokio::runtime::Handle::current());
    Fixture {
        bus,
        source,
        registry: VisualizationRegistry::new(context),
    }
}

pub fn progress(percentage: f64, earned: f64, budgeted: f64) -> MetricPayload {
    MetricPayload::Progress(ProgressData { percentage, earned, budgeted })
}

pub fn select(bus: &EventBus, project_id: i64) {
    bus.publish(
        names::SELECTION_CHANGED,
        BusEvent::SelectionChanged { project_id: ProjectId(project_id) },
    );
}

pub fn window_resized(bus: &EventBus, width: f32, height: f32) {
    bus.publish(names::WINDOW_RESIZED, BusEvent::WindowResized { width, height });
}

/// Let spawned loads run to completion
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
