//! Markup-with-components support: scanning, component registry and
//! compiled units

pub mod jsx;
mod registry;
mod unit;

pub use registry::{
    Callout, Component, ComponentError, ComponentRegistry, Figure, TemplateComponent, YouTube,
};
pub use unit::{CompiledUnit, ComponentCall, Segment};

/// Component props, in the order they were written
pub type Props = indexmap::IndexMap<String, serde_json::Value>;
