//! mvz
//!
//! A minimal scene-rendering session over OpenGL ES 2. It loads Wavefront OBJ
//! models into static vertex buffers, draws a cubemap skybox behind them and
//! keeps every GPU object it creates under transactional ownership: a failed
//! construction or upload leaves nothing allocated, and dropping the session
//! releases everything exactly once.
//!
//! High-level modules
//! - `assets`: embedded and in-memory storage for shaders and skybox faces
//! - `camera`: camera value type and view/projection math
//! - `config`: session configuration
//! - `data_structures`: model files, meshes and instances
//! - `driver`: the GL seam and its `glow` implementation
//! - `error`: error types and the per-call driver check
//! - `resources`: GPU objects (framebuffers, textures, shaders, programs, meshes)
//! - `session`: the session that owns all of the above
//!

pub mod assets;
pub mod camera;
pub mod config;
pub mod data_structures;
pub mod driver;
pub mod error;
mod logging;
pub(crate) mod render;
pub mod resources;
pub mod session;

// Re-exports commonly used types for convenience in downstream code.
pub use camera::Camera;
pub use cgmath;
pub use config::{SessionConfig, ShaderPaths};
pub use data_structures::instance::{FileId, MeshInstance};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use session::{ImageType, Session};
