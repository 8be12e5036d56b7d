//! Dashboard window: project selector plus one panel per configured widget

use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Context, Ui};
use ev_core::{names, BusEvent, DashboardConfig, EventBus, ProjectId, ProjectSelection};
use ev_data::{DataSource, PayloadCache};
use ev_views::{ComponentContext, ComponentOptions, Container, VisualizationRegistry};
use tracing::info;

use crate::paint;

/// Margin kept free around panels when the window narrows
const WINDOW_MARGIN: f32 = 32.0;
const MIN_PANEL_WIDTH: f32 = 120.0;

pub struct DashboardApp {
    config: DashboardConfig,
    bus: EventBus,
    selection: ProjectSelection,
    registry: VisualizationRegistry,
    container: Container,
    cache: Option<PayloadCache>,

    /// Project id typed in when no projects are configured
    manual_project: i64,
    last_window_size: Option<egui::Vec2>,

    /// Keeps fetch and debounce tasks running
    _runtime: tokio::runtime::Runtime,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: DashboardConfig,
        runtime: tokio::runtime::Runtime,
        source: Arc<dyn DataSource>,
        cache: Option<PayloadCache>,
    ) -> Self {
        let bus = EventBus::new();
        bus.set_debug(config.debug);

        let context = ComponentContext::new(bus.clone(), source, runtime.handle().clone())
            .with_resize_debounce(config.resize_debounce());
        let registry = VisualizationRegistry::new(context);

        let container = Container::from_layout(&config.layout);
        let created = registry.create_all(&container, &ComponentOptions::default());
        info!(created, "Dashboard ready");

        let selection = ProjectSelection::new(bus.clone());
        if let Some(first) = config.projects.first() {
            selection.select(first.id);
        }

        Self {
            config,
            bus,
            selection,
            registry,
            container,
            cache,
            manual_project: 1,
            last_window_size: None,
            _runtime: runtime,
        }
    }

    /// Fit panels to the window and tell widgets to re-layout
    fn track_window_size(&mut self, ctx: &Context) {
        let size = ctx.screen_rect().size();
        if self.last_window_size == Some(size) {
            return;
        }
        self.last_window_size = Some(size);

        let available = (size.x - WINDOW_MARGIN).max(MIN_PANEL_WIDTH);
        for (placeholder, spec) in self.container.placeholders().iter().zip(&self.config.layout) {
            placeholder.mount.set_size(spec.width.min(available), spec.height);
        }

        self.bus.publish(
            names::WINDOW_RESIZED,
            BusEvent::WindowResized { width: size.x, height: size.y },
        );
    }

    /// Re-fetch the current project, bypassing the cache
    fn refresh(&self) {
        let Some(project_id) = self.selection.current() else {
            return;
        };
        if let Some(cache) = &self.cache {
            cache.clear_project(project_id);
        }
        self.selection.refresh();
    }

    fn project_label(&self, project_id: Option<ProjectId>) -> String {
        let Some(project_id) = project_id else {
            return "Select a project".to_string();
        };
        self.config
            .projects
            .iter()
            .find(|project| project.id == project_id)
            .map(|project| project.name.clone())
            .unwrap_or_else(|| format!("Project {project_id}"))
    }

    fn toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Earned Value");
            ui.separator();

            let current = self.selection.current();
            if self.config.projects.is_empty() {
                ui.label("Project id:");
                ui.add(egui::DragValue::new(&mut self.manual_project).clamp_range(1..=i64::MAX));
                if ui.button("Load").clicked() {
                    self.selection.select(ProjectId(self.manual_project));
                }
            } else {
                egui::ComboBox::from_id_source("project")
                    .selected_text(self.project_label(current))
                    .show_ui(ui, |ui| {
                        for project in &self.config.projects {
                            let selected = current == Some(project.id);
                            if ui.selectable_label(selected, project.name.as_str()).clicked() {
                                self.selection.select(project.id);
                            }
                        }
                    });
            }

            if ui.button("Refresh").clicked() {
                self.refresh();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.weak(format!("{} widgets", self.registry.len()));
            });
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.track_window_size(ctx);

        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.refresh();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for placeholder in self.container.placeholders() {
                        paint::surface(ui, &placeholder.mount);
                    }
                });
            });
        });

        // Loads finish on the runtime; poll for their results
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        self.registry.clear();
    }
}
