//! Placeholders and the container that holds them

use std::collections::HashMap;

use ev_core::ViewSpec;
use serde_json::Value;
use tracing::warn;

use crate::surface::{MountPoint, Surface};

pub const TYPE_ATTRIBUTE: &str = "data-visualization-type";
pub const ID_ATTRIBUTE: &str = "data-visualization-id";
pub const OPTIONS_ATTRIBUTE: &str = "data-visualization-options";

/// A slot in the page that asks for a visualization
#[derive(Clone)]
pub struct Placeholder {
    pub view_type: String,
    pub id: Option<String>,
    /// Per-placeholder options, merged over the caller's defaults
    pub options: Value,
    pub mount: MountPoint,
}

impl Placeholder {
    pub fn new(view_type: impl Into<String>, mount: MountPoint) -> Self {
        Self {
            view_type: view_type.into(),
            id: None,
            options: Value::Null,
            mount,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Build from marker attributes; `None` when the type marker is absent
    ///
    /// Unparseable options are logged and ignored.
    pub fn from_attributes(attributes: &HashMap<String, String>, mount: MountPoint) -> Option<Self> {
        let view_type = attributes.get(TYPE_ATTRIBUTE)?.trim();
        if view_type.is_empty() {
            return None;
        }

        let options = match attributes.get(OPTIONS_ATTRIBUTE) {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|err| {
                warn!(%view_type, error = %err, "Ignoring malformed visualization options");
                Value::Null
            }),
            None => Value::Null,
        };

        Some(Self {
            view_type: view_type.to_string(),
            id: attributes
                .get(ID_ATTRIBUTE)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            options,
            mount,
        })
    }

    fn from_spec(spec: &ViewSpec) -> Self {
        Self {
            view_type: spec.view_type.clone(),
            id: spec.id.clone(),
            options: spec.options.clone(),
            mount: Surface::mount(spec.width, spec.height),
        }
    }
}

/// Ordered set of placeholders, usually built from the configured layout
#[derive(Clone, Default)]
pub struct Container {
    placeholders: Vec<Placeholder>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// One placeholder, each with a fresh surface, per layout entry
    pub fn from_layout(specs: &[ViewSpec]) -> Self {
        Self {
            placeholders: specs.iter().map(Placeholder::from_spec).collect(),
        }
    }

    pub fn push(&mut self, placeholder: Placeholder) {
        self.placeholders.push(placeholder);
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

/// Shallow merge: keys of `overlay` replace keys of `base`
///
/// A non-object overlay leaves `base` untouched; a non-object base is
/// treated as empty.
pub fn merge_options(base: &Value, overlay: &Value) -> Value {
    let mut merged = match base {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    if let Value::Object(extra) = overlay {
        for (key, value) in extra {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}
