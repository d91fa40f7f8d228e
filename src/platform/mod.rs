//! Platform definitions and the declarative platform registry.
//!
//! A platform describes one device family: connection defaults, the commands
//! it supports (with parsing templates), capability flags, and field-name
//! mapping tables consumed by the normalizer.

mod definition;
mod fallback;
mod family;
mod registry;

pub use definition::{
    Capabilities, CommandSpec, ConnectionDefaults, PlatformDefinition, TemplateConfig,
};
pub use family::PlatformFamily;
pub use registry::{PlatformRegistry, PlatformValidation};
