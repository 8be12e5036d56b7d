//! Visualization component base
//!
//! Every widget embeds a [`ComponentCore`] and implements
//! [`VisualizationComponent::draw`]; the lifecycle (init, load, render,
//! resize, destroy) lives in the core and the trait's provided methods.
//!
//! Lifecycle states: `Uninitialized -> Loading -> Ready | Error`, with reloads
//! moving back to `Loading`. `destroy` is terminal: the component stops
//! touching its surface and every later call is a no-op.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use ev_core::{names, Debouncer, EventBus, ProjectId, Subscription};
use ev_data::{DataSource, FetchError, MetricPayload, VisualizationKind};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};

use crate::surface::{MountPoint, SceneNode, SurfaceSize};

/// Where a component is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComponentState::Uninitialized => "uninitialized",
            ComponentState::Loading => "loading",
            ComponentState::Ready => "ready",
            ComponentState::Error => "error",
        })
    }
}

/// Result of one `load_data` call
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The fetched payload was applied and rendered
    Ready,
    /// The fetch failed; the message is what the component now shows
    Error(String),
    /// A newer load superseded this one, or the component was destroyed
    Stale,
}

impl LoadOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::Stale)
    }
}

/// Snapshot of a component's data-facing state
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStatus {
    pub state: ComponentState,
    /// Never absent: the kind's zero payload stands in until a load succeeds
    pub data: MetricPayload,
    pub last_error: Option<String>,
    /// Project of the most recent load request
    pub bound_project: Option<ProjectId>,
}

fn default_responsive() -> bool {
    true
}

/// Options a component is created with
///
/// Keys other than the ones below land in `settings` and are parsed by
/// each widget into its own config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Load for this project right after init
    #[serde(default, alias = "projectId", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,

    /// Follow window resizes
    #[serde(default = "default_responsive")]
    pub responsive: bool,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Default for ComponentOptions {
    fn default() -> Self {
        Self {
            id: None,
            project_id: None,
            responsive: true,
            settings: Map::new(),
        }
    }
}

impl ComponentOptions {
    /// Parse from JSON; `null` yields the defaults
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            value => serde_json::from_value(value),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Widget-specific settings; falls back to `T::default()` when they don't parse
    pub fn widget_config<T: DeserializeOwned + Default>(&self) -> T {
        serde_json::from_value(Value::Object(self.settings.clone())).unwrap_or_else(|err| {
            warn!(error = %err, "Invalid widget settings, using defaults");
            T::default()
        })
    }
}

/// Everything a component needs from its host
#[derive(Clone)]
pub struct ComponentContext {
    pub bus: EventBus,
    pub source: Arc<dyn DataSource>,
    /// Runtime that fetches and debounce timers run on
    pub runtime_handle: tokio::runtime::Handle,
    pub resize_debounce: Duration,
}

impl ComponentContext {
    pub fn new(
        bus: EventBus,
        source: Arc<dyn DataSource>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            bus,
            source,
            runtime_handle,
            resize_debounce: Debouncer::DEFAULT_WINDOW,
        }
    }

    pub fn with_resize_debounce(mut self, window: Duration) -> Self {
        self.resize_debounce = window;
        self
    }
}

/// Shared lifecycle state embedded in every widget
pub struct ComponentCore {
    id: String,
    kind: VisualizationKind,
    mount: MountPoint,
    options: ComponentOptions,
    context: ComponentContext,

    /// Guards every surface mutation; held across render and teardown
    status: Mutex<ComponentStatus>,
    alive: AtomicBool,
    initialized: AtomicBool,
    rendered: AtomicBool,
    /// Ticket of the most recent load; only the holder may apply its result
    generation: AtomicU64,
    layout_passes: AtomicU64,

    handle: OnceLock<Weak<dyn VisualizationComponent>>,
    subscriptions: Mutex<Vec<Subscription>>,
    resize: Mutex<Option<Debouncer>>,
}

impl ComponentCore {
    pub fn new(
        id: impl Into<String>,
        kind: VisualizationKind,
        mount: MountPoint,
        options: ComponentOptions,
        context: ComponentContext,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            mount,
            options,
            context,
            status: Mutex::new(ComponentStatus {
                state: ComponentState::Uninitialized,
                data: kind.zero_payload(),
                last_error: None,
                bound_project: None,
            }),
            alive: AtomicBool::new(true),
            initialized: AtomicBool::new(false),
            rendered: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            layout_passes: AtomicU64::new(0),
            handle: OnceLock::new(),
            subscriptions: Mutex::new(Vec::new()),
            resize: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> VisualizationKind {
        self.kind
    }

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.options
    }

    pub fn context(&self) -> &ComponentContext {
        &self.context
    }

    pub fn status(&self) -> ComponentStatus {
        self.status.lock().clone()
    }

    pub fn state(&self) -> ComponentState {
        self.status.lock().state
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn has_rendered(&self) -> bool {
        self.rendered.load(Ordering::SeqCst)
    }

    /// Number of size-driven re-layouts since creation
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes.load(Ordering::SeqCst)
    }

    /// Live bus subscriptions owned by this component
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    fn bind_handle(&self, handle: Weak<dyn VisualizationComponent>) {
        if self.handle.set(handle).is_err() {
            warn!(id = %self.id, "Component mounted twice");
        }
    }

    fn spawn_load(&self, component: Arc<dyn VisualizationComponent>, project_id: ProjectId) {
        self.context.runtime_handle.spawn(async move {
            component.load_data(project_id).await;
        });
    }

    fn init(&self) {
        if !self.is_alive() || self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(handle) = self.handle.get().cloned() else {
            warn!(id = %self.id, "Cannot initialize a component that was never mounted");
            self.initialized.store(false, Ordering::SeqCst);
            return;
        };

        self.mount.install_affordances();

        let mut subscriptions = self.subscriptions.lock();

        let weak = handle.clone();
        subscriptions.push(self.context.bus.subscribe(names::SELECTION_CHANGED, move |event| {
            let (Some(project_id), Some(component)) = (event.project_id(), weak.upgrade()) else {
                return Ok(());
            };
            component.core().spawn_load(component.clone(), project_id);
            Ok(())
        }));

        if self.options.responsive {
            let weak = handle.clone();
            let debouncer = Debouncer::new(
                self.context.resize_debounce,
                self.context.runtime_handle.clone(),
                move || {
                    if let Some(component) = weak.upgrade() {
                        component.resize();
                    }
                },
            );
            *self.resize.lock() = Some(debouncer);

            let weak = handle.clone();
            subscriptions.push(self.context.bus.subscribe(names::WINDOW_RESIZED, move |_| {
                if let Some(component) = weak.upgrade() {
                    component.core().schedule_resize();
                }
                Ok(())
            }));
        }
        drop(subscriptions);

        debug!(id = %self.id, kind = %self.kind, "Initialized visualization");

        if let (Some(project_id), Some(component)) = (self.options.project_id, handle.upgrade()) {
            self.spawn_load(component, project_id);
        }
    }

    fn schedule_resize(&self) {
        if let Some(debouncer) = self.resize.lock().as_ref() {
            debouncer.trigger();
        }
    }

    /// Claim a new load ticket and show the loading affordance
    fn begin_load(&self, project_id: ProjectId) -> Option<u64> {
        let mut status = self.status.lock();
        if !self.is_alive() {
            return None;
        }

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        status.state = ComponentState::Loading;
        status.bound_project = Some(project_id);
        self.mount.hide_error();
        self.mount.set_loading(true);
        Some(ticket)
    }

    /// Apply a fetch result if `ticket` is still current
    fn finish_load(
        &self,
        ticket: u64,
        project_id: ProjectId,
        result: Result<MetricPayload, FetchError>,
    ) -> LoadOutcome {
        let mut status = self.status.lock();
        if !self.is_alive() || self.generation.load(Ordering::SeqCst) != ticket {
            trace!(id = %self.id, %project_id, "Discarding stale load");
            return LoadOutcome::Stale;
        }

        self.mount.set_loading(false);

        let result = result.and_then(|payload| {
            if payload.kind() == self.kind {
                Ok(payload)
            } else {
                Err(FetchError::Malformed(format!(
                    "expected {} data, got {}",
                    self.kind,
                    payload.kind()
                )))
            }
        });

        match result {
            Ok(payload) => {
                status.data = payload;
                status.last_error = None;
                status.state = ComponentState::Ready;
                LoadOutcome::Ready
            }
            Err(err) => {
                error!(id = %self.id, kind = %self.kind, %project_id, error = %err,
                    "Error loading visualization data");
                let message = format!("Failed to load data: {err}");
                status.data = self.kind.zero_payload();
                status.last_error = Some(message.clone());
                status.state = ComponentState::Error;
                self.mount.show_error(&message);
                LoadOutcome::Error(message)
            }
        }
    }

    /// Replace the surface scene with `draw`'s output; false once destroyed
    pub fn render_with(
        &self,
        draw: impl FnOnce(&MetricPayload, SurfaceSize) -> Vec<SceneNode>,
    ) -> bool {
        let status = self.status.lock();
        if !self.is_alive() {
            return false;
        }

        let scene = draw(&status.data, self.mount.size());
        self.mount.replace_scene(scene);
        self.rendered.store(true, Ordering::SeqCst);
        true
    }

    fn destroy(&self) {
        let mut status = self.status.lock();
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }

        // Invalidate in-flight loads
        self.generation.fetch_add(1, Ordering::SeqCst);

        for subscription in self.subscriptions.lock().drain(..) {
            subscription.unsubscribe();
        }
        if let Some(debouncer) = self.resize.lock().take() {
            debouncer.cancel();
        }

        self.mount.clear();
        status.data = self.kind.zero_payload();
        status.last_error = None;

        debug!(id = %self.id, kind = %self.kind, "Destroyed visualization");
    }
}

/// A widget bound to one surface
///
/// Implementors supply [`core`](Self::core) and [`draw`](Self::draw); the
/// provided methods implement the lifecycle and should not be overridden.
#[async_trait]
pub trait VisualizationComponent: Send + Sync {
    fn core(&self) -> &ComponentCore;

    /// Build the scene for `data` at `size`
    fn draw(&self, data: &MetricPayload, size: SurfaceSize) -> Vec<SceneNode>;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn kind(&self) -> VisualizationKind {
        self.core().kind()
    }

    fn state(&self) -> ComponentState {
        self.core().state()
    }

    fn status(&self) -> ComponentStatus {
        self.core().status()
    }

    fn is_alive(&self) -> bool {
        self.core().is_alive()
    }

    /// Install affordances and bus subscriptions; idempotent
    fn init(&self) {
        self.core().init();
    }

    /// Fetch and apply data for `project_id`
    ///
    /// Never fails: errors become [`LoadOutcome::Error`] and a visible
    /// message. A load overtaken by a newer one, or finishing after
    /// destroy, resolves to [`LoadOutcome::Stale`] without touching the
    /// surface.
    async fn load_data(&self, project_id: ProjectId) -> LoadOutcome {
        let core = self.core();
        let Some(ticket) = core.begin_load(project_id) else {
            return LoadOutcome::Stale;
        };

        let result = core
            .context()
            .source
            .fetch_visualization(core.kind(), project_id)
            .await;

        let outcome = core.finish_load(ticket, project_id, result);
        if !outcome.is_stale() {
            self.render();
        }
        outcome
    }

    fn render(&self) {
        self.core().render_with(|data, size| self.draw(data, size));
    }

    /// Re-layout for the surface's current size; no-op before the first render
    fn resize(&self) {
        let core = self.core();
        if !core.is_alive() || !core.has_rendered() {
            return;
        }
        if core.render_with(|data, size| self.draw(data, size)) {
            core.layout_passes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Tear down; later calls on this component do nothing
    fn destroy(&self) {
        self.core().destroy();
    }
}

/// Wrap a widget for shared use and let its core hand out weak self-handles
pub fn mount_component<W>(widget: W) -> Arc<dyn VisualizationComponent>
where
    W: VisualizationComponent + 'static,
{
    let component: Arc<dyn VisualizationComponent> = Arc::new(widget);
    component.core().bind_handle(Arc::downgrade(&component));
    component
}
