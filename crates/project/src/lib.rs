//! Project loading: manifest, scene declarations, tags, settings, scenes and
//! entity prefabs, read from XML files into owned values.
//!
//! # Invariants
//! - A failed load returns an error and no partial object.
//! - Loading the same files twice yields equal values.
//! - Alias keys are unique per element; tag names are unique among siblings;
//!   scene names are unique in the declaration file.
//! - Settings are returned to the caller; there is no global configuration.

pub mod alias;
pub mod entity;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod markup;
pub mod project;
pub mod scene;
pub mod settings;
pub mod tag;

pub use alias::{AliasMap, SubstituteError};
pub use entity::{Entity, Resource, ResourceKind};
pub use error::{ErrorKind, LoadError, Reference};
pub use loader::{ProjectLoader, XmlProjectLoader};
pub use manifest::ProjectInfo;
pub use markup::{Element, MarkupDocument};
pub use project::Project;
pub use scene::Scene;
pub use settings::{
    ActionBinding, InputSettings, ProjectSettings, ProjectionMode, RenderSettings, WindowMode,
    WindowSettings,
};
pub use tag::Tag;

pub fn crate_info() -> &'static str {
    "tessera-project v0.1.0"
}
