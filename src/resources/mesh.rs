//! Uploads model files into static vertex buffers, one per mesh.

use crate::{
    check_gl,
    data_structures::model::{Mesh, ModelFile},
    driver::{Gl, Handle},
    error::{Error, Result},
    resources::UndoStack,
};

/// Vertex buffer of one [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    pub buffer: Handle,
    pub num_vertices: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GpuShape {
    pub meshes: Vec<GpuMesh>,
}

/// GPU buffers of a [`ModelFile`], shape for shape and mesh for mesh in the
/// same order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GpuModel {
    pub shapes: Vec<GpuShape>,
}

impl GpuModel {
    pub fn buffer_count(&self) -> usize {
        self.shapes.iter().map(|s| s.meshes.len()).sum()
    }

    /// Deletes every buffer. The first driver error is returned after all
    /// deletions have been attempted.
    pub fn release(&mut self, gl: &dyn Gl) -> Result<()> {
        let mut result = Ok(());
        for shape in std::mem::take(&mut self.shapes) {
            for mesh in shape.meshes {
                gl.delete_buffer(mesh.buffer);
                let checked = crate::error::check(gl, "gl.delete_buffer(mesh.buffer)", file!(), line!());
                result = result.and(checked);
            }
        }
        result
    }
}

/// Creates and fills one buffer per mesh of `file`.
///
/// On failure every buffer created for this file so far, including one that
/// was generated but not yet filled, is deleted before the error returns.
pub fn upload_model(gl: &dyn Gl, file: &ModelFile) -> Result<GpuModel> {
    UndoStack::run(gl, |undo| {
        let mut model = GpuModel::default();
        for shape in file.shapes() {
            let mut gpu_shape = GpuShape::default();
            for mesh in &shape.meshes {
                gpu_shape.meshes.push(upload_mesh(gl, undo, mesh)?);
            }
            model.shapes.push(gpu_shape);
        }
        log::debug!("uploaded {} vertex buffers", model.buffer_count());
        Ok(model)
    })
}

fn upload_mesh(gl: &dyn Gl, undo: &mut UndoStack, mesh: &Mesh) -> Result<GpuMesh> {
    let num_vertices = i32::try_from(mesh.num_vertices)
        .map_err(|_| Error::runtime(format!("Mesh with {} vertices is too large.", mesh.num_vertices)))?;

    let buffer = check_gl!(gl, gl.gen_buffer());
    undo.push("vertex buffer", move |gl| gl.delete_buffer(buffer));

    check_gl!(gl, gl.bind_buffer(glow::ARRAY_BUFFER, buffer));
    check_gl!(
        gl,
        gl.buffer_data(glow::ARRAY_BUFFER, bytemuck::cast_slice(&mesh.vertices), glow::STATIC_DRAW)
    );

    Ok(GpuMesh { buffer, num_vertices })
}
