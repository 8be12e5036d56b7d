//! Visualization registry
//!
//! Maps widget ids to live components. Creation resolves the kind by name,
//! mounts and initializes the widget, then announces it on the bus.
//! Instances destroyed directly, rather than through [`VisualizationRegistry::remove`],
//! are dropped from the table the next time it is read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use chrono::Utc;
use ev_core::{names, BusEvent};
use ev_data::VisualizationKind;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::component::{ComponentContext, ComponentCore, ComponentOptions, VisualizationComponent};
use crate::mount::{merge_options, Container};
use crate::surface::MountPoint;
use crate::widgets;

pub struct VisualizationRegistry {
    context: ComponentContext,
    entries: RwLock<AHashMap<String, Arc<dyn VisualizationComponent>>>,
    sequence: AtomicU64,
}

impl VisualizationRegistry {
    pub fn new(context: ComponentContext) -> Self {
        Self {
            context,
            entries: RwLock::new(AHashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &ComponentContext {
        &self.context
    }

    /// Create, register and initialize a widget of `view_type`
    ///
    /// Returns `None` for an unknown type; the registry is left unchanged.
    /// An id already in use is taken over: the previous instance is
    /// destroyed and replaced.
    pub fn create(
        &self,
        view_type: &str,
        mount: MountPoint,
        options: ComponentOptions,
    ) -> Option<Arc<dyn VisualizationComponent>> {
        let kind = match view_type.parse::<VisualizationKind>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!(error = %err, "Cannot create visualization");
                return None;
            }
        };

        let id = options
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.generate_id(kind));

        let core = ComponentCore::new(id.clone(), kind, mount, options, self.context.clone());
        let component = widgets::build(core);

        let displaced = self.entries.write().insert(id.clone(), component.clone());
        if let Some(previous) = displaced {
            warn!(%id, "Visualization id already registered; replacing previous instance");
            previous.destroy();
        }

        component.init();
        info!(%id, %kind, "Created visualization");

        self.context.bus.publish(
            names::VISUALIZATION_CREATED,
            BusEvent::VisualizationCreated { id, kind: kind.to_string() },
        );
        Some(component)
    }

    /// `{kind}-{millis}-{sequence}`; the sequence keeps same-millisecond ids apart
    fn generate_id(&self, kind: VisualizationKind) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", kind, Utc::now().timestamp_millis(), sequence)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn VisualizationComponent>> {
        self.prune();
        self.entries.read().get(id).cloned()
    }

    /// Forget entries whose component was destroyed outside the registry
    fn prune(&self) {
        if self.entries.read().values().all(|c| c.is_alive()) {
            return;
        }

        self.entries.write().retain(|id, component| {
            let alive = component.is_alive();
            if !alive {
                debug!(%id, "Dropping destroyed visualization");
            }
            alive
        });
    }

    /// Destroy and forget `id`; returns false when it was not registered
    pub fn remove(&self, id: &str) -> bool {
        self.prune();
        let Some(component) = self.entries.write().remove(id) else {
            debug!(%id, "No visualization to remove");
            return false;
        };

        component.destroy();
        info!(%id, "Removed visualization");
        self.context.bus.publish(
            names::VISUALIZATION_REMOVED,
            BusEvent::VisualizationRemoved { id: id.to_string() },
        );
        true
    }

    /// Create a widget for every placeholder in `container`
    ///
    /// Placeholder options are merged over `defaults`. Placeholders that
    /// fail (unknown type, unusable options) are skipped. Returns the
    /// number of widgets created.
    pub fn create_all(&self, container: &Container, defaults: &ComponentOptions) -> usize {
        let base = serde_json::to_value(defaults).unwrap_or_default();
        let mut created = 0;

        for placeholder in container.placeholders() {
            let mut merged = merge_options(&base, &placeholder.options);
            if let Some(map) = merged.as_object_mut() {
                // Ids are per placeholder; a shared default id would collide
                match &placeholder.id {
                    Some(id) => {
                        map.insert("id".to_string(), serde_json::Value::String(id.clone()));
                    }
                    None if placeholder.options.get("id").is_none() => {
                        map.remove("id");
                    }
                    None => {}
                }
            }

            let options = match ComponentOptions::from_value(merged) {
                Ok(options) => options,
                Err(err) => {
                    warn!(view_type = %placeholder.view_type, error = %err,
                        "Skipping placeholder with invalid options");
                    continue;
                }
            };

            if self
                .create(&placeholder.view_type, placeholder.mount.clone(), options)
                .is_some()
            {
                created += 1;
            }
        }

        info!("Created {} of {} visualizations", created, container.len());
        created
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        self.prune();
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.prune();
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prune();
        self.entries.read().is_empty()
    }

    /// Remove every widget
    pub fn clear(&self) {
        for id in self.ids() {
            self.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;
    use ev_core::EventBus;
    use ev_data::MemorySource;
    use parking_lot::Mutex;

    fn registry() -> VisualizationRegistry {
        VisualizationRegistry::new(ComponentContext::new(
            EventBus::new(),
            Arc::new(MemorySource::new()),
            tokio::runtime::Handle::current(),
        ))
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let registry = registry();
        let a = registry.create("donut", Surface::mount(200.0, 200.0), ComponentOptions::default()).unwrap();
        let b = registry.create("donut", Surface::mount(200.0, 200.0), ComponentOptions::default()).unwrap();

        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("donut-"));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_events_announce_lifecycle() {
        let registry = registry();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for event in [names::VISUALIZATION_CREATED, names::VISUALIZATION_REMOVED] {
            let seen = seen.clone();
            registry.context().bus.subscribe(event, move |payload| {
                seen.lock().push(payload.clone());
                Ok(())
            });
        }

        registry.create("spi", Surface::mount(200.0, 200.0), ComponentOptions::default().with_id("s"));
        assert!(registry.remove("s"));
        assert!(!registry.remove("s"));

        assert_eq!(
            *seen.lock(),
            vec![
                BusEvent::VisualizationCreated { id: "s".to_string(), kind: "spi".to_string() },
                BusEvent::VisualizationRemoved { id: "s".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_id_replaces_and_destroys() {
        let registry = registry();
        let options = ComponentOptions::default().with_id("dup");
        let first = registry.create("donut", Surface::mount(200.0, 200.0), options.clone()).unwrap();
        let second = registry.create("histogram", Surface::mount(200.0, 200.0), options).unwrap();

        assert!(!first.is_alive());
        assert!(second.is_alive());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("dup").unwrap().kind(), VisualizationKind::Histogram);
    }

    #[tokio::test]
    async fn test_directly_destroyed_instance_is_forgotten() {
        let registry = registry();
        let donut = registry
            .create("donut", Surface::mount(200.0, 200.0), ComponentOptions::default().with_id("d"))
            .unwrap();
        registry.create("spi", Surface::mount(200.0, 200.0), ComponentOptions::default().with_id("s"));

        donut.destroy();

        assert!(registry.get("d").is_none());
        assert_eq!(registry.ids(), vec!["s".to_string()]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.remove("d"));
    }

    #[tokio::test]
    async fn test_create_all_ignores_default_id() {
        let registry = registry();
        let mut container = Container::new();
        for view_type in ["donut", "histogram", "spi"] {
            container.push(crate::mount::Placeholder::new(view_type, Surface::mount(200.0, 200.0)));
        }

        let created = registry.create_all(&container, &ComponentOptions::default().with_id("x"));

        assert_eq!(created, 3);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("x").is_none());
    }

    #[tokio::test]
    async fn test_clear_destroys_everything() {
        let registry = registry();
        let a = registry.create("donut", Surface::mount(200.0, 200.0), ComponentOptions::default()).unwrap();
        let b = registry.create("scurve", Surface::mount(200.0, 200.0), ComponentOptions::default()).unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert!(!a.is_alive());
        assert!(!b.is_alive());
        assert_eq!(registry.context().bus.subscriber_count(names::SELECTION_CHANGED), 0);
    }
}
