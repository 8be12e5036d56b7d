//! Visualization components for the EV dashboard
//!
//! Every widget implements [`VisualizationComponent`]; the
//! [`VisualizationRegistry`] creates, indexes and tears them down.

mod component;
mod mount;
mod registry;
mod surface;
pub mod widgets;

pub use component::{
    mount_component, ComponentContext, ComponentCore, ComponentOptions, ComponentState,
    ComponentStatus, LoadOutcome, VisualizationComponent,
};
pub use mount::{merge_options, Container, Placeholder};
pub use registry::VisualizationRegistry;
pub use surface::{Anchor, Color, MountPoint, SceneNode, Surface, SurfaceSize, SurfaceSnapshot};
