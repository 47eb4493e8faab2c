//! Frame composition: the skybox pass followed by the mesh pass.
//!
//! Both passes render into whatever framebuffer is currently bound. Every
//! attribute array a pass enables is disabled again before it returns, also
//! when drawing fails halfway.
//!
//! # Passes
//!
//! - skybox: a full-screen quad sampling the cubemap with the camera rotation
//! - meshes: every instance, one draw call per mesh of its shape

use std::collections::BTreeMap;

use crate::{
    camera::Camera,
    check_gl,
    data_structures::{
        instance::{FileId, MeshInstance},
        model::VERTEX_STRIDE,
    },
    driver::{Gl, Handle},
    error::{self, Error, Result},
    resources::{
        Managed,
        mesh::{GpuModel, GpuShape},
        program::Program,
        texture::SKYBOX_TEXTURE_UNIT,
    },
};

/// Mesh vertex attributes: name, float count and byte offset.
const MESH_ATTRIBUTES: [(&str, i32, i32); 3] = [("position", 3, 0), ("texcoord", 2, 12), ("normal", 3, 20)];

/// Byte stride of one screen quad vertex (2 floats).
const QUAD_STRIDE: i32 = 8;

const QUAD_VERTICES: i32 = 6;

/// Everything the passes read besides the camera and the instances.
pub(crate) struct FrameResources<'a> {
    pub skybox_program: &'a Managed<Program>,
    pub mesh_program: &'a Managed<Program>,
    pub skybox_texture: Handle,
    pub screen_quad: Handle,
    pub models: &'a BTreeMap<FileId, GpuModel>,
}

/// An attribute array enabled for the current pass.
#[derive(Clone, Copy)]
struct EnabledAttribute {
    location: u32,
    size: i32,
    offset: i32,
}

pub(crate) fn draw_frame(gl: &dyn Gl, frame: &FrameResources, camera: &Camera, instances: &[MeshInstance]) -> Result<()> {
    let [width, height] = camera.resolution;
    check_gl!(gl, gl.enable(glow::DEPTH_TEST));
    check_gl!(gl, gl.viewport(0, 0, width, height));
    check_gl!(gl, gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT));

    draw_skybox(gl, frame, camera)?;

    // The skybox is infinitely far away.
    check_gl!(gl, gl.clear(glow::DEPTH_BUFFER_BIT));

    draw_meshes(gl, frame, camera, instances)
}

fn bind_skybox(gl: &dyn Gl, program: &Managed<Program>, cubemap: Handle) -> Result<()> {
    check_gl!(gl, gl.active_texture(glow::TEXTURE0 + SKYBOX_TEXTURE_UNIT));
    check_gl!(gl, gl.bind_texture(glow::TEXTURE_CUBE_MAP, cubemap));
    check_gl!(
        gl,
        gl.uniform_1_i32(program.uniform_location("skybox"), SKYBOX_TEXTURE_UNIT as i32)
    );
    Ok(())
}

fn draw_skybox(gl: &dyn Gl, frame: &FrameResources, camera: &Camera) -> Result<()> {
    let program = frame.skybox_program;
    check_gl!(gl, gl.bind_buffer(glow::ARRAY_BUFFER, frame.screen_quad));
    program.bind()?;

    let rotation = camera.rotation_matrix();
    let rotation: &[f32; 9] = rotation.as_ref();
    check_gl!(
        gl,
        gl.uniform_matrix_3_f32(program.uniform_location("camera_rotation"), rotation)
    );
    bind_skybox(gl, program, frame.skybox_texture)?;

    let position = program
        .attribute_location("position")
        .ok_or_else(|| Error::runtime("Skybox program has no 'position' attribute."))?;
    gl.enable_vertex_attrib_array(position);
    // Disabled even when enabling it failed, like the mesh attributes.
    let drawn = error::check(gl, "gl.enable_vertex_attrib_array(position)", file!(), line!())
        .and_then(|()| draw_quad(gl, position));
    drawn.and(disable_attributes(gl, &[position]))
}

fn draw_quad(gl: &dyn Gl, position: u32) -> Result<()> {
    check_gl!(gl, gl.vertex_attrib_pointer_f32(position, 2, QUAD_STRIDE, 0));
    check_gl!(gl, gl.draw_arrays(glow::TRIANGLES, 0, QUAD_VERTICES));
    Ok(())
}

fn draw_meshes(gl: &dyn Gl, frame: &FrameResources, camera: &Camera, instances: &[MeshInstance]) -> Result<()> {
    let program = frame.mesh_program;
    program.bind()?;

    let mut enabled = Vec::with_capacity(MESH_ATTRIBUTES.len());
    let drawn = enable_mesh_attributes(gl, program, &mut enabled)
        .and_then(|()| bind_skybox(gl, program, frame.skybox_texture))
        .and_then(|()| draw_instances(gl, frame, camera, instances, &enabled));

    let locations: Vec<u32> = enabled.iter().map(|a| a.location).collect();
    drawn.and(disable_attributes(gl, &locations))
}

/// Enables the arrays the program actually uses; attributes the compiler
/// optimized out have no location and are skipped.
fn enable_mesh_attributes(gl: &dyn Gl, program: &Managed<Program>, enabled: &mut Vec<EnabledAttribute>) -> Result<()> {
    for (name, size, offset) in MESH_ATTRIBUTES {
        let Some(location) = program.attribute_location(name) else {
            log::trace!("mesh attribute '{name}' is not used by {}", program.label());
            continue;
        };
        gl.enable_vertex_attrib_array(location);
        // Tracked before the check so a failed enable is still disabled.
        enabled.push(EnabledAttribute { location, size, offset });
        error::check(gl, "gl.enable_vertex_attrib_array(location)", file!(), line!())?;
    }
    Ok(())
}

fn draw_instances(
    gl: &dyn Gl,
    frame: &FrameResources,
    camera: &Camera,
    instances: &[MeshInstance],
    attributes: &[EnabledAttribute],
) -> Result<()> {
    let mvp_location = frame.mesh_program.uniform_location("mvp");
    let view_projection = camera.view_projection();

    for instance in instances {
        let shape = resolve(frame.models, instance)?;

        let mvp = view_projection * instance.to_matrix();
        let mvp: &[f32; 16] = mvp.as_ref();
        check_gl!(gl, gl.uniform_matrix_4_f32(mvp_location, mvp));

        for mesh in &shape.meshes {
            check_gl!(gl, gl.bind_buffer(glow::ARRAY_BUFFER, mesh.buffer));
            for a in attributes {
                check_gl!(
                    gl,
                    gl.vertex_attrib_pointer_f32(a.location, a.size, VERTEX_STRIDE as i32, a.offset)
                );
            }
            check_gl!(gl, gl.draw_arrays(glow::TRIANGLES, 0, mesh.num_vertices));
        }
    }
    Ok(())
}

fn resolve<'a>(models: &'a BTreeMap<FileId, GpuModel>, instance: &MeshInstance) -> Result<&'a GpuShape> {
    let model = models
        .get(&instance.file_id)
        .ok_or_else(|| Error::runtime(format!("Unknown OBJ id {}.", instance.file_id.0)))?;
    model.shapes.get(instance.shape_index).ok_or_else(|| {
        Error::runtime(format!(
            "OBJ {} has no shape with index {}.",
            instance.file_id.0, instance.shape_index
        ))
    })
}

/// Disables every location, even after a failure. Returns the first error.
fn disable_attributes(gl: &dyn Gl, locations: &[u32]) -> Result<()> {
    let mut result = Ok(());
    for &location in locations {
        gl.disable_vertex_attrib_array(location);
        result = result.and(error::check(
            gl,
            "gl.disable_vertex_attrib_array(location)",
            file!(),
            line!(),
        ));
    }
    result
}
