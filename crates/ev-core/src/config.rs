//! Dashboard configuration
//!
//! Loaded from a JSON file; every field has a default so a partial (or
//! missing) file still yields a usable dashboard. `EV_API_BASE_URL` and
//! `EV_DEBUG` override the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::ProjectId;
use crate::Result;

/// Top-level dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Backend origin serving `/api/visualizations/...`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout for metric fetches
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Quiescence window applied to window-resize bursts
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,

    /// Verbose event-bus and registry logging
    #[serde(default)]
    pub debug: bool,

    /// Cache successful payloads per (kind, project)
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Projects offered by the selector
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,

    /// Declared widget placeholders, in display order
    #[serde(default = "default_layout")]
    pub layout: Vec<ViewSpec>,
}

/// A selectable project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub id: ProjectId,
    pub name: String,
}

/// Specification for one widget placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    /// Widget type name, e.g. `donut`
    pub view_type: String,

    /// Stable instance id; generated when absent
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default = "default_view_width")]
    pub width: f32,

    #[serde(default = "default_view_height")]
    pub height: f32,

    /// Widget options merged over the dashboard defaults
    #[serde(default)]
    pub options: Value,
}

impl ViewSpec {
    pub fn new(view_type: impl Into<String>) -> Self {
        Self {
            view_type: view_type.into(),
            id: None,
            width: default_view_width(),
            height: default_view_height(),
            options: Value::Null,
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
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            resize_debounce_ms: default_resize_debounce_ms(),
            debug: false,
            cache_enabled: true,
            projects: Vec::new(),
            layout: default_layout(),
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply `EV_API_BASE_URL` / `EV_DEBUG` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("EV_API_BASE_URL").filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(flag) = lookup("EV_DEBUG") {
            self.debug = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Default value providers
fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_resize_debounce_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

fn default_view_width() -> f32 {
    320.0
}

fn default_view_height() -> f32 {
    260.0
}

fn default_layout() -> Vec<ViewSpec> {
    ["donut", "histogram", "scurve", "quantity", "spi"]
        .into_iter()
        .map(|kind| ViewSpec::new(kind).with_id(format!("{kind}-main")))
        .collect()
}
