//! Domain layer: the manifest model and the workspace layout derived from it
pub mod entities;
pub mod value_objects;
