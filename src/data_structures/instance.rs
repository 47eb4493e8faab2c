//! Mesh instances: what to draw and where to place it.
//!
//! An instance owns no GPU resources. It refers to a shape of a model file
//! loaded into the session's registry and is resolved at draw time.

use std::fmt;

use cgmath::Vector3;

use crate::camera::euler_rotation;

/// Identifier of a model file loaded into a session. Ids are assigned in
/// load order starting at zero and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-instance transformation: translation, Euler rotation (radians) and
/// scale, plus the shape it draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    pub scale: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub translation: Vector3<f32>,
    pub file_id: FileId,
    pub shape_index: usize,
}

impl MeshInstance {
    /// Identity placement of `shape_index` in `file_id`.
    pub fn new(file_id: FileId, shape_index: usize) -> Self {
        Self {
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            translation: Vector3::new(0.0, 0.0, 0.0),
            file_id,
            shape_index,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<Vector3<f32>>) -> Self {
        self.translation = translation.into();
        self
    }

    pub fn with_rotation(mut self, rotation: impl Into<Vector3<f32>>) -> Self {
        self.rotation = rotation.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Model transform: translate · rotate · scale.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.translation)
            * cgmath::Matrix4::from(euler_rotation(self.rotation))
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}
