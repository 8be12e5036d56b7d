//! Selection state shared across the dashboard

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{names, BusEvent, EventBus};
use crate::CoreError;

/// Identifier of a tracked project; every metric is scoped to one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProjectId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for ProjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ProjectId)
            .map_err(|_| CoreError::InvalidProjectId(s.to_string()))
    }
}

/// The page-level "current project"
///
/// Publishes `selection:changed` on the bus whenever the selection moves to a
/// different project.
pub struct ProjectSelection {
    bus: EventBus,
    current: RwLock<Option<ProjectId>>,
}

impl ProjectSelection {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            current: RwLock::new(None),
        }
    }

    /// Currently selected project, if any
    pub fn current(&self) -> Option<ProjectId> {
        *self.current.read()
    }

    /// Select a project; returns whether the selection changed
    pub fn select(&self, project_id: ProjectId) -> bool {
        {
            let mut current = self.current.write();
            if *current == Some(project_id) {
                return false;
            }
            *current = Some(project_id);
        }

        debug!(%project_id, "Project selected");
        self.announce(project_id);
        true
    }

    /// Re-publish the current selection so every widget reloads
    pub fn refresh(&self) -> bool {
        match self.current() {
            Some(project_id) => {
                self.announce(project_id);
                true
            }
            None => false,
        }
    }

    /// Forget the current selection without notifying anyone
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    fn announce(&self, project_id: ProjectId) {
        self.bus.publish(
            names::SELECTION_CHANGED,
            BusEvent::SelectionChanged { project_id },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_project_id_parse() {
        assert_eq!("42".parse::<ProjectId>().unwrap(), ProjectId(42));
        assert_eq!(" 7 ".parse::<ProjectId>().unwrap(), ProjectId(7));
        assert!("abc".parse::<ProjectId>().is_err());
        assert!("".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_select_publishes_only_on_change() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let _sub = bus.subscribe(names::SELECTION_CHANGED, move |event| {
            assert_eq!(event.project_id(), Some(ProjectId(3)));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let selection = ProjectSelection::new(bus);
        assert!(selection.select(ProjectId(3)));
        assert!(!selection.select(ProjectId(3)));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(selection.refresh());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(selection.current(), Some(ProjectId(3)));
    }

    #[test]
    fn test_refresh_without_selection() {
        let selection = ProjectSelection::new(EventBus::new());
        assert!(!selection.refresh());

        selection.select(ProjectId(1));
        selection.clear();
        assert_eq!(selection.current(), None);
    }
}
