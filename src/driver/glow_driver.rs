use std::{cell::Cell, ffi::c_void, num::NonZeroU32};

use glow::HasContext;

use crate::driver::{Gl, Handle};

/// [`Gl`] over a live `glow::Context`.
///
/// Object creation in glow reports failure as a `Result`; such failures are
/// latched as `GL_OUT_OF_MEMORY` and surfaced by the next [`Gl::get_error`],
/// keeping the check-after-every-call contract of raw GL.
pub struct GlowDriver {
    gl: glow::Context,
    pending_error: Cell<u32>,
}

impl GlowDriver {
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            pending_error: Cell::new(glow::NO_ERROR),
        }
    }

    /// Resolves the GL entry points through the host's loader.
    ///
    /// # Safety
    ///
    /// A GL ES 2 compatible context must be current on this thread and stay
    /// current for the lifetime of the driver.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        Self::new(gl)
    }

    fn created<T>(&self, result: Result<T, String>, raw: impl Fn(T) -> Handle) -> Handle {
        match result {
            Ok(object) => raw(object),
            Err(message) => {
                log::error!("driver object creation failed: {message}");
                self.pending_error.set(glow::OUT_OF_MEMORY);
                0
            }
        }
    }

    fn info_log_length(log: &str) -> i32 {
        // GL counts the terminating NUL.
        if log.is_empty() { 0 } else { log.len() as i32 + 1 }
    }

    fn truncated(mut log: String, max_length: i32) -> (i32, String) {
        let mut end = (max_length.max(1) - 1) as usize;
        if log.len() > end {
            while !log.is_char_boundary(end) {
                end -= 1;
            }
            log.truncate(end);
        }
        (log.len() as i32, log)
    }
}

fn texture(handle: Handle) -> Option<glow::NativeTexture> {
    NonZeroU32::new(handle).map(glow::NativeTexture)
}

fn framebuffer(handle: Handle) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(handle).map(glow::NativeFramebuffer)
}

fn renderbuffer(handle: Handle) -> Option<glow::NativeRenderbuffer> {
    NonZeroU32::new(handle).map(glow::NativeRenderbuffer)
}

fn buffer(handle: Handle) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(handle).map(glow::NativeBuffer)
}

fn shader(handle: Handle) -> Option<glow::NativeShader> {
    NonZeroU32::new(handle).map(glow::NativeShader)
}

fn program(handle: Handle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(handle).map(glow::NativeProgram)
}

fn uniform(location: Option<u32>) -> Option<glow::NativeUniformLocation> {
    location.map(glow::NativeUniformLocation)
}

impl Gl for GlowDriver {
    fn get_error(&self) -> u32 {
        let latched = self.pending_error.replace(glow::NO_ERROR);
        if latched != glow::NO_ERROR {
            return latched;
        }
        unsafe { self.gl.get_error() }
    }

    fn enable(&self, capability: u32) {
        unsafe { self.gl.enable(capability) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn gen_texture(&self) -> Handle {
        self.created(unsafe { self.gl.create_texture() }, |t| t.0.get())
    }

    fn delete_texture(&self, handle: Handle) {
        if let Some(t) = texture(handle) {
            unsafe { self.gl.delete_texture(t) }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(unit) }
    }

    fn bind_texture(&self, target: u32, handle: Handle) {
        unsafe { self.gl.bind_texture(target, texture(handle)) }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, parameter, value) }
    }

    fn tex_image_2d(
        &self,
        target: u32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            self.gl
                .tex_image_2d(target, 0, internal_format, width, height, 0, format, ty, pixels)
        }
    }

    fn gen_framebuffer(&self) -> Handle {
        self.created(unsafe { self.gl.create_framebuffer() }, |f| f.0.get())
    }

    fn delete_framebuffer(&self, handle: Handle) {
        if let Some(f) = framebuffer(handle) {
            unsafe { self.gl.delete_framebuffer(f) }
        }
    }

    fn bind_framebuffer(&self, target: u32, handle: Handle) {
        unsafe { self.gl.bind_framebuffer(target, framebuffer(handle)) }
    }

    fn framebuffer_texture_2d(&self, target: u32, attachment: u32, texture_target: u32, handle: Handle) {
        unsafe {
            self.gl
                .framebuffer_texture_2d(target, attachment, texture_target, texture(handle), 0)
        }
    }

    fn check_framebuffer_status(&self, target: u32) -> u32 {
        unsafe { self.gl.check_framebuffer_status(target) }
    }

    fn gen_renderbuffer(&self) -> Handle {
        self.created(unsafe { self.gl.create_renderbuffer() }, |r| r.0.get())
    }

    fn delete_renderbuffer(&self, handle: Handle) {
        if let Some(r) = renderbuffer(handle) {
            unsafe { self.gl.delete_renderbuffer(r) }
        }
    }

    fn bind_renderbuffer(&self, target: u32, handle: Handle) {
        unsafe { self.gl.bind_renderbuffer(target, renderbuffer(handle)) }
    }

    fn renderbuffer_storage(&self, target: u32, internal_format: u32, width: i32, height: i32) {
        unsafe { self.gl.renderbuffer_storage(target, internal_format, width, height) }
    }

    fn framebuffer_renderbuffer(
        &self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        handle: Handle,
    ) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                target,
                attachment,
                renderbuffer_target,
                renderbuffer(handle),
            )
        }
    }

    fn gen_buffer(&self) -> Handle {
        self.created(unsafe { self.gl.create_buffer() }, |b| b.0.get())
    }

    fn delete_buffer(&self, handle: Handle) {
        if let Some(b) = buffer(handle) {
            unsafe { self.gl.delete_buffer(b) }
        }
    }

    fn bind_buffer(&self, target: u32, handle: Handle) {
        unsafe { self.gl.bind_buffer(target, buffer(handle)) }
    }

    fn buffer_data(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { self.gl.buffer_data_u8_slice(target, data, usage) }
    }

    fn create_shader(&self, shader_type: u32) -> Handle {
        self.created(unsafe { self.gl.create_shader(shader_type) }, |s| s.0.get())
    }

    fn shader_source(&self, handle: Handle, source: &str) {
        if let Some(s) = shader(handle) {
            unsafe { self.gl.shader_source(s, source) }
        }
    }

    fn compile_shader(&self, handle: Handle) {
        if let Some(s) = shader(handle) {
            unsafe { self.gl.compile_shader(s) }
        }
    }

    fn get_shader_iv(&self, handle: Handle, parameter: u32) -> i32 {
        let Some(s) = shader(handle) else {
            self.pending_error.set(glow::INVALID_VALUE);
            return 0;
        };
        match parameter {
            glow::COMPILE_STATUS => unsafe { self.gl.get_shader_compile_status(s) as i32 },
            glow::INFO_LOG_LENGTH => Self::info_log_length(&unsafe { self.gl.get_shader_info_log(s) }),
            _ => {
                self.pending_error.set(glow::INVALID_ENUM);
                0
            }
        }
    }

    fn get_shader_info_log(&self, handle: Handle, max_length: i32) -> (i32, String) {
        match shader(handle) {
            Some(s) => Self::truncated(unsafe { self.gl.get_shader_info_log(s) }, max_length),
            None => (0, String::new()),
        }
    }

    fn delete_shader(&self, handle: Handle) {
        if let Some(s) = shader(handle) {
            unsafe { self.gl.delete_shader(s) }
        }
    }

    fn create_program(&self) -> Handle {
        self.created(unsafe { self.gl.create_program() }, |p| p.0.get())
    }

    fn attach_shader(&self, program_handle: Handle, shader_handle: Handle) {
        if let (Some(p), Some(s)) = (program(program_handle), shader(shader_handle)) {
            unsafe { self.gl.attach_shader(p, s) }
        }
    }

    fn detach_shader(&self, program_handle: Handle, shader_handle: Handle) {
        if let (Some(p), Some(s)) = (program(program_handle), shader(shader_handle)) {
            unsafe { self.gl.detach_shader(p, s) }
        }
    }

    fn link_program(&self, handle: Handle) {
        if let Some(p) = program(handle) {
            unsafe { self.gl.link_program(p) }
        }
    }

    fn get_program_iv(&self, handle: Handle, parameter: u32) -> i32 {
        let Some(p) = program(handle) else {
            self.pending_error.set(glow::INVALID_VALUE);
            return 0;
        };
        match parameter {
            glow::LINK_STATUS => unsafe { self.gl.get_program_link_status(p) as i32 },
            glow::INFO_LOG_LENGTH => Self::info_log_length(&unsafe { self.gl.get_program_info_log(p) }),
            _ => {
                self.pending_error.set(glow::INVALID_ENUM);
                0
            }
        }
    }

    fn get_program_info_log(&self, handle: Handle, max_length: i32) -> (i32, String) {
        match program(handle) {
            Some(p) => Self::truncated(unsafe { self.gl.get_program_info_log(p) }, max_length),
            None => (0, String::new()),
        }
    }

    fn delete_program(&self, handle: Handle) {
        if let Some(p) = program(handle) {
            unsafe { self.gl.delete_program(p) }
        }
    }

    fn use_program(&self, handle: Handle) {
        unsafe { self.gl.use_program(program(handle)) }
    }

    fn get_uniform_location(&self, handle: Handle, name: &str) -> Option<u32> {
        let p = program(handle)?;
        unsafe { self.gl.get_uniform_location(p, name) }.map(|location| location.0)
    }

    fn get_attrib_location(&self, handle: Handle, name: &str) -> Option<u32> {
        let p = program(handle)?;
        unsafe { self.gl.get_attrib_location(p, name) }
    }

    fn uniform_1_i32(&self, location: Option<u32>, value: i32) {
        unsafe { self.gl.uniform_1_i32(uniform(location).as_ref(), value) }
    }

    fn uniform_matrix_3_f32(&self, location: Option<u32>, value: &[f32; 9]) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(uniform(location).as_ref(), false, value)
        }
    }

    fn uniform_matrix_4_f32(&self, location: Option<u32>, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(uniform(location).as_ref(), false, value)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, glow::FLOAT, false, stride, offset)
        }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }
}
