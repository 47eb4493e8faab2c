//! Engine data structures: model files, meshes and instances.
//!
//! - `model` contains the parsed geometry and the per-material mesh builder
//! - `instance` holds the per-instance transformation and the shape it draws

pub mod instance;
pub mod model;
