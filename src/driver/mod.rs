//! The GPU driver seam.
//!
//! [`Gl`] is the subset of the OpenGL ES 2 API the session issues, expressed
//! with plain integer handles so that the resource and rendering code can run
//! against either a live context ([`GlowDriver`]) or a recording fake.
//!
//! Like raw GL, none of the calls report failure directly: callers read the
//! error flag with [`Gl::get_error`] after each call (see
//! [`check_gl!`](crate::check_gl)). Enum arguments use the `glow` constants.

use std::rc::Rc;

#[cfg(not(target_arch = "wasm32"))]
mod glow_driver;

#[cfg(not(target_arch = "wasm32"))]
pub use glow_driver::GlowDriver;

/// Opaque driver object name. `0` means "no object", as in GL.
pub type Handle = u32;

/// The driver shared by the session and every resource it owns.
pub type SharedGl = Rc<dyn Gl>;

pub trait Gl {
    /// Returns and resets the driver error flag (`glow::NO_ERROR` when clear).
    fn get_error(&self) -> u32;

    fn enable(&self, capability: u32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear(&self, mask: u32);

    fn gen_texture(&self) -> Handle;
    fn delete_texture(&self, texture: Handle);
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Handle);
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    /// Specifies level 0 of a 2D texture or cubemap face. `pixels: None`
    /// only allocates storage.
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    );

    fn gen_framebuffer(&self) -> Handle;
    fn delete_framebuffer(&self, framebuffer: Handle);
    fn bind_framebuffer(&self, target: u32, framebuffer: Handle);
    fn framebuffer_texture_2d(&self, target: u32, attachment: u32, texture_target: u32, texture: Handle);
    fn check_framebuffer_status(&self, target: u32) -> u32;

    fn gen_renderbuffer(&self) -> Handle;
    fn delete_renderbuffer(&self, renderbuffer: Handle);
    fn bind_renderbuffer(&self, target: u32, renderbuffer: Handle);
    fn renderbuffer_storage(&self, target: u32, internal_format: u32, width: i32, height: i32);
    fn framebuffer_renderbuffer(
        &self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: Handle,
    );

    fn gen_buffer(&self) -> Handle;
    fn delete_buffer(&self, buffer: Handle);
    fn bind_buffer(&self, target: u32, buffer: Handle);
    fn buffer_data(&self, target: u32, data: &[u8], usage: u32);

    fn create_shader(&self, shader_type: u32) -> Handle;
    fn shader_source(&self, shader: Handle, source: &str);
    fn compile_shader(&self, shader: Handle);
    /// `glGetShaderiv` for `COMPILE_STATUS` and `INFO_LOG_LENGTH`.
    fn get_shader_iv(&self, shader: Handle, parameter: u32) -> i32;
    /// Reads at most `max_length - 1` bytes of the info log. Returns the
    /// reported read size together with the text.
    fn get_shader_info_log(&self, shader: Handle, max_length: i32) -> (i32, String);
    fn delete_shader(&self, shader: Handle);

    fn create_program(&self) -> Handle;
    fn attach_shader(&self, program: Handle, shader: Handle);
    fn detach_shader(&self, program: Handle, shader: Handle);
    fn link_program(&self, program: Handle);
    /// `glGetProgramiv` for `LINK_STATUS` and `INFO_LOG_LENGTH`.
    fn get_program_iv(&self, program: Handle, parameter: u32) -> i32;
    fn get_program_info_log(&self, program: Handle, max_length: i32) -> (i32, String);
    fn delete_program(&self, program: Handle);
    fn use_program(&self, program: Handle);
    fn get_uniform_location(&self, program: Handle, name: &str) -> Option<u32>;
    fn get_attrib_location(&self, program: Handle, name: &str) -> Option<u32>;
    fn uniform_1_i32(&self, location: Option<u32>, value: i32);
    fn uniform_matrix_3_f32(&self, location: Option<u32>, value: &[f32; 9]);
    fn uniform_matrix_4_f32(&self, location: Option<u32>, value: &[f32; 16]);

    fn enable_vertex_attrib_array(&self, index: u32);
    fn disable_vertex_attrib_array(&self, index: u32);
    /// Float attribute pointer into the bound `ARRAY_BUFFER`; `stride` and
    /// `offset` are in bytes.
    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
}
