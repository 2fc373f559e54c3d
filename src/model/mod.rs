//! Character model resolution
//!
//! Turns a model directory and its manifest into an immutable, existence-checked
//! [`LoadedModel`].

pub mod loader;
pub mod manifest;
pub mod resolver;

pub use loader::ModelLoader;
pub use resolver::{resolve, resolve_with, LoadedModel, ResolvePolicy};
