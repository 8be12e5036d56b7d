//! Retained drawing surface that widgets mount into
//!
//! A [`Surface`] owns a scene (a flat list of [`SceneNode`]s) plus two
//! affordances: a loading indicator and an error message. Widgets replace the
//! scene wholesale on every render; the host paints whatever the surface holds.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Shared handle to a surface
pub type MountPoint = Arc<Surface>;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TEXT: Color = Color::rgb(51, 51, 51);
    pub const MUTED: Color = Color::rgb(117, 117, 117);
    pub const ERROR: Color = Color::rgb(211, 47, 47);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();

        match digits.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (slot, c) in rgb.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 16 + v;
                }
                Some(Self::rgb(rgb[0], rgb[1], rgb[2]))
            }
            6 | 8 if digits.is_ascii() => {
                let r = channel(&digits[0..2])?;
                let g = channel(&digits[2..4])?;
                let b = channel(&digits[4..6])?;
                let a = if digits.len() == 8 { channel(&digits[6..8])? } else { 255 };
                Some(Self([r, g, b, a]))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Horizontal text alignment relative to a node's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Start,
    #[default]
    Middle,
    End,
}

/// One primitive of a widget's scene, in surface-local pixels
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    /// Full circle outline
    Ring {
        center: [f32; 2],
        radius: f32,
        thickness: f32,
        color: Color,
    },
    /// Circle segment starting at 12 o'clock, sweeping clockwise
    Arc {
        center: [f32; 2],
        radius: f32,
        thickness: f32,
        /// Fraction of the full circle, 0..=1
        sweep: f32,
        color: Color,
    },
    Text {
        position: [f32; 2],
        content: String,
        size: f32,
        color: Color,
        anchor: Anchor,
    },
    Rect {
        min: [f32; 2],
        size: [f32; 2],
        color: Color,
    },
    Polyline {
        points: Vec<[f32; 2]>,
        width: f32,
        color: Color,
    },
}

impl SceneNode {
    pub fn text(position: [f32; 2], content: impl Into<String>, size: f32, color: Color) -> Self {
        SceneNode::Text {
            position,
            content: content.into(),
            size,
            color,
            anchor: Anchor::Middle,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SceneNode::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// Point-in-time copy of everything a surface shows
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub size: SurfaceSize,
    pub scene: Vec<SceneNode>,
    pub affordances_installed: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub revision: u64,
}

impl SurfaceSnapshot {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.scene.iter().filter_map(SceneNode::as_text)
    }
}

struct SurfaceInner {
    size: SurfaceSize,
    scene: Vec<SceneNode>,
    affordances_installed: bool,
    loading: bool,
    error: Option<String>,
    /// Bumped on every visible change
    revision: u64,
}

impl SurfaceInner {
    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Mount point for one widget
pub struct Surface {
    inner: RwLock<SurfaceInner>,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            inner: RwLock::new(SurfaceInner {
                size: SurfaceSize::new(width, height),
                scene: Vec::new(),
                affordances_installed: false,
                loading: false,
                error: None,
                revision: 0,
            }),
        }
    }

    /// Create a shared surface ready to hand to a widget
    pub fn mount(width: f32, height: f32) -> MountPoint {
        Arc::new(Self::new(width, height))
    }

    pub fn size(&self) -> SurfaceSize {
        self.inner.read().size
    }

    /// Host-driven layout change; widgets pick it up on their next resize
    pub fn set_size(&self, width: f32, height: f32) {
        let size = SurfaceSize::new(width, height);
        let mut inner = self.inner.write();
        if inner.size != size {
            inner.size = size;
            inner.touch();
        }
    }

    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        let inner = self.inner.read();
        SurfaceSnapshot {
            size: inner.size,
            scene: inner.scene.clone(),
            affordances_installed: inner.affordances_installed,
            loading: inner.loading,
            error: inner.error.clone(),
            revision: inner.revision,
        }
    }

    pub fn scene_len(&self) -> usize {
        self.inner.read().scene.len()
    }

    /// Whether any text node currently shows exactly `content`
    pub fn contains_text(&self, content: &str) -> bool {
        self.inner
            .read()
            .scene
            .iter()
            .any(|node| node.as_text() == Some(content))
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().loading
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner.read().error.clone()
    }

    pub(crate) fn install_affordances(&self) {
        let mut inner = self.inner.write();
        if !inner.affordances_installed {
            inner.affordances_installed = true;
            inner.loading = false;
            inner.error = None;
            inner.touch();
        }
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        let mut inner = self.inner.write();
        if inner.affordances_installed && inner.loading != loading {
            inner.loading = loading;
            inner.touch();
        }
    }

    pub(crate) fn show_error(&self, message: &str) {
        let mut inner = self.inner.write();
        if inner.affordances_installed {
            inner.error = Some(message.to_string());
            inner.touch();
        }
    }

    pub(crate) fn hide_error(&self) {
        let mut inner = self.inner.write();
        if inner.error.take().is_some() {
            inner.touch();
        }
    }

    pub(crate) fn replace_scene(&self, scene: Vec<SceneNode>) {
        let mut inner = self.inner.write();
        inner.scene = scene;
        inner.touch();
    }

    /// Remove the scene and both affordances
    pub(crate) fn clear(&self) {
        let mut inner = self.inner.write();
        inner.scene.clear();
        inner.affordances_installed = false;
        inner.loading = false;
        inner.error = None;
        inner.touch();
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(320.0, 260.0)
    }
}
