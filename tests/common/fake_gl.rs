//! A recording [`Gl`] with live-handle accounting and injectable failures.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use mvz::driver::{Gl, Handle};

pub const COMPILE_LOG: &str = "0:1: error: syntax error, expected ';'";
pub const LINK_LOG: &str = "error: vertex and fragment varyings do not match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Texture,
    Framebuffer,
    Renderbuffer,
    Buffer,
    Shader,
    Program,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub mode: u32,
    pub first: i32,
    pub count: i32,
    pub buffer: Handle,
    pub program: Handle,
}

#[derive(Default)]
struct State {
    next_handle: Handle,
    live: HashMap<Handle, Kind>,
    double_frees: usize,
    error: u32,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, (usize, u32)>,
    shader_sources: HashMap<Handle, String>,
    compiled: HashMap<Handle, bool>,
    linked: HashMap<Handle, bool>,
    fail_links: bool,
    negative_log_length: bool,
    negative_read_size: bool,
    incomplete_framebuffers: bool,
    bound_buffer: Handle,
    current_program: Handle,
    buffer_sizes: HashMap<Handle, usize>,
    enabled_attributes: HashSet<u32>,
    clears: Vec<u32>,
    draws: Vec<Draw>,
    matrices: Vec<[f32; 16]>,
}

#[derive(Default)]
pub struct FakeGl {
    state: RefCell<State>,
}

impl FakeGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`-th call to `name` from now on (1-based) raise `code`
    /// and have no effect.
    pub fn fail_nth_call(&self, name: &'static str, n: usize, code: u32) {
        let mut state = self.state.borrow_mut();
        let target = state.calls.get(name).copied().unwrap_or(0) + n;
        state.failures.insert(name, (target, code));
    }

    pub fn calls_of(&self, name: &str) -> usize {
        self.state.borrow().calls.get(name).copied().unwrap_or(0)
    }

    pub fn live_count(&self, kind: Kind) -> usize {
        self.state.borrow().live.values().filter(|k| **k == kind).count()
    }

    pub fn live_total(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn double_frees(&self) -> usize {
        self.state.borrow().double_frees
    }

    pub fn set_fail_links(&self, fail: bool) {
        self.state.borrow_mut().fail_links = fail;
    }

    pub fn set_negative_log_length(&self, negative: bool) {
        self.state.borrow_mut().negative_log_length = negative;
    }

    pub fn set_negative_read_size(&self, negative: bool) {
        self.state.borrow_mut().negative_read_size = negative;
    }

    pub fn set_incomplete_framebuffers(&self, incomplete: bool) {
        self.state.borrow_mut().incomplete_framebuffers = incomplete;
    }

    pub fn buffer_size(&self, buffer: Handle) -> Option<usize> {
        self.state.borrow().buffer_sizes.get(&buffer).copied()
    }

    pub fn enabled_attributes(&self) -> usize {
        self.state.borrow().enabled_attributes.len()
    }

    pub fn clears(&self) -> Vec<u32> {
        self.state.borrow().clears.clone()
    }

    pub fn draws(&self) -> Vec<Draw> {
        self.state.borrow().draws.clone()
    }

    pub fn matrices(&self) -> Vec<[f32; 16]> {
        self.state.borrow().matrices.clone()
    }

    /// Forgets recorded clears, draws and uniform uploads.
    pub fn clear_records(&self) {
        let mut state = self.state.borrow_mut();
        state.clears.clear();
        state.draws.clear();
        state.matrices.clear();
    }

    /// Counts the call and returns `false` when it was chosen to fail.
    fn call(&self, name: &'static str) -> bool {
        let mut state = self.state.borrow_mut();
        let count = state.calls.entry(name).or_insert(0);
        *count += 1;
        let count = *count;
        let due = state.failures.get(name).is_some_and(|&(target, _)| target == count);
        if !due {
            return true;
        }
        if let Some((_, code)) = state.failures.remove(name) {
            state.error = code;
        }
        false
    }

    fn generate(&self, name: &'static str, kind: Kind) -> Handle {
        if !self.call(name) {
            return 0;
        }
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.live.insert(handle, kind);
        handle
    }

    fn delete(&self, name: &'static str, kind: Kind, handle: Handle) {
        if !self.call(name) || handle == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.live.get(&handle) == Some(&kind) {
            state.live.remove(&handle);
            state.buffer_sizes.remove(&handle);
            state.shader_sources.remove(&handle);
        } else {
            state.double_frees += 1;
        }
    }

    fn log_length(&self, failed: bool, log: &str) -> i32 {
        let state = self.state.borrow();
        if state.negative_log_length {
            -1
        } else if failed {
            log.len() as i32 + 1
        } else {
            0
        }
    }

    fn read_log(&self, max_length: i32, log: &str) -> (i32, String) {
        if self.state.borrow().negative_read_size {
            return (-1, String::new());
        }
        let end = log.len().min((max_length.max(1) - 1) as usize);
        (end as i32, log[..end].to_string())
    }
}

impl Gl for FakeGl {
    fn get_error(&self) -> u32 {
        std::mem::replace(&mut self.state.borrow_mut().error, glow::NO_ERROR)
    }

    fn enable(&self, _capability: u32) {
        self.call("enable");
    }

    fn viewport(&self, _x: i32, _y: i32, _width: i32, _height: i32) {
        self.call("viewport");
    }

    fn clear(&self, mask: u32) {
        if self.call("clear") {
            self.state.borrow_mut().clears.push(mask);
        }
    }

    fn gen_texture(&self) -> Handle {
        self.generate("gen_texture", Kind::Texture)
    }

    fn delete_texture(&self, texture: Handle) {
        self.delete("delete_texture", Kind::Texture, texture);
    }

    fn active_texture(&self, _unit: u32) {
        self.call("active_texture");
    }

    fn bind_texture(&self, _target: u32, _texture: Handle) {
        self.call("bind_texture");
    }

    fn tex_parameter_i32(&self, _target: u32, _parameter: u32, _value: i32) {
        self.call("tex_parameter_i32");
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        _internal_format: i32,
        _width: i32,
        _height: i32,
        _format: u32,
        _ty: u32,
        _pixels: Option<&[u8]>,
    ) {
        self.call("tex_image_2d");
    }

    fn gen_framebuffer(&self) -> Handle {
        self.generate("gen_framebuffer", Kind::Framebuffer)
    }

    fn delete_framebuffer(&self, framebuffer: Handle) {
        self.delete("delete_framebuffer", Kind::Framebuffer, framebuffer);
    }

    fn bind_framebuffer(&self, _target: u32, _framebuffer: Handle) {
        self.call("bind_framebuffer");
    }

    fn framebuffer_texture_2d(&self, _target: u32, _attachment: u32, _texture_target: u32, _texture: Handle) {
        self.call("framebuffer_texture_2d");
    }

    fn check_framebuffer_status(&self, _target: u32) -> u32 {
        self.call("check_framebuffer_status");
        if self.state.borrow().incomplete_framebuffers {
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        } else {
            glow::FRAMEBUFFER_COMPLETE
        }
    }

    fn gen_renderbuffer(&self) -> Handle {
        self.generate("gen_renderbuffer", Kind::Renderbuffer)
    }

    fn delete_renderbuffer(&self, renderbuffer: Handle) {
        self.delete("delete_renderbuffer", Kind::Renderbuffer, renderbuffer);
    }

    fn bind_renderbuffer(&self, _target: u32, _renderbuffer: Handle) {
        self.call("bind_renderbuffer");
    }

    fn renderbuffer_storage(&self, _target: u32, _internal_format: u32, _width: i32, _height: i32) {
        self.call("renderbuffer_storage");
    }

    fn framebuffer_renderbuffer(
        &self,
        _target: u32,
        _attachment: u32,
        _renderbuffer_target: u32,
        _renderbuffer: Handle,
    ) {
        self.call("framebuffer_renderbuffer");
    }

    fn gen_buffer(&self) -> Handle {
        self.generate("gen_buffer", Kind::Buffer)
    }

    fn delete_buffer(&self, buffer: Handle) {
        self.delete("delete_buffer", Kind::Buffer, buffer);
    }

    fn bind_buffer(&self, _target: u32, buffer: Handle) {
        if self.call("bind_buffer") {
            self.state.borrow_mut().bound_buffer = buffer;
        }
    }

    fn buffer_data(&self, _target: u32, data: &[u8], _usage: u32) {
        if self.call("buffer_data") {
            let mut state = self.state.borrow_mut();
            let buffer = state.bound_buffer;
            state.buffer_sizes.insert(buffer, data.len());
        }
    }

    fn create_shader(&self, _shader_type: u32) -> Handle {
        self.generate("create_shader", Kind::Shader)
    }

    fn shader_source(&self, shader: Handle, source: &str) {
        if self.call("shader_source") {
            self.state.borrow_mut().shader_sources.insert(shader, source.to_string());
        }
    }

    fn compile_shader(&self, shader: Handle) {
        if self.call("compile_shader") {
            let mut state = self.state.borrow_mut();
            let ok = state
                .shader_sources
                .get(&shader)
                .is_some_and(|s| s.contains(';') && !s.contains("#error"));
            state.compiled.insert(shader, ok);
        }
    }

    fn get_shader_iv(&self, shader: Handle, parameter: u32) -> i32 {
        self.call("get_shader_iv");
        let compiled = self.state.borrow().compiled.get(&shader).copied().unwrap_or(false);
        match parameter {
            glow::COMPILE_STATUS => compiled as i32,
            glow::INFO_LOG_LENGTH => self.log_length(!compiled, COMPILE_LOG),
            _ => 0,
        }
    }

    fn get_shader_info_log(&self, _shader: Handle, max_length: i32) -> (i32, String) {
        self.call("get_shader_info_log");
        self.read_log(max_length, COMPILE_LOG)
    }

    fn delete_shader(&self, shader: Handle) {
        self.delete("delete_shader", Kind::Shader, shader);
    }

    fn create_program(&self) -> Handle {
        self.generate("create_program", Kind::Program)
    }

    fn attach_shader(&self, _program: Handle, _shader: Handle) {
        self.call("attach_shader");
    }

    fn detach_shader(&self, _program: Handle, _shader: Handle) {
        self.call("detach_shader");
    }

    fn link_program(&self, program: Handle) {
        if self.call("link_program") {
            let mut state = self.state.borrow_mut();
            let ok = !state.fail_links;
            state.linked.insert(program, ok);
        }
    }

    fn get_program_iv(&self, program: Handle, parameter: u32) -> i32 {
        self.call("get_program_iv");
        let linked = self.state.borrow().linked.get(&program).copied().unwrap_or(false);
        match parameter {
            glow::LINK_STATUS => linked as i32,
            glow::INFO_LOG_LENGTH => self.log_length(!linked, LINK_LOG),
            _ => 0,
        }
    }

    fn get_program_info_log(&self, _program: Handle, max_length: i32) -> (i32, String) {
        self.call("get_program_info_log");
        self.read_log(max_length, LINK_LOG)
    }

    fn delete_program(&self, program: Handle) {
        self.delete("delete_program", Kind::Program, program);
    }

    fn use_program(&self, program: Handle) {
        if self.call("use_program") {
            self.state.borrow_mut().current_program = program;
        }
    }

    fn get_uniform_location(&self, _program: Handle, name: &str) -> Option<u32> {
        self.call("get_uniform_location");
        match name {
            "mvp" => Some(0),
            "skybox" => Some(1),
            "camera_rotation" => Some(2),
            _ => None,
        }
    }

    fn get_attrib_location(&self, _program: Handle, name: &str) -> Option<u32> {
        self.call("get_attrib_location");
        match name {
            "position" => Some(0),
            "texcoord" => Some(1),
            "normal" => Some(2),
            _ => None,
        }
    }

    fn uniform_1_i32(&self, _location: Option<u32>, _value: i32) {
        self.call("uniform_1_i32");
    }

    fn uniform_matrix_3_f32(&self, _location: Option<u32>, _value: &[f32; 9]) {
        self.call("uniform_matrix_3_f32");
    }

    fn uniform_matrix_4_f32(&self, _location: Option<u32>, value: &[f32; 16]) {
        if self.call("uniform_matrix_4_f32") {
            self.state.borrow_mut().matrices.push(*value);
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        if self.call("enable_vertex_attrib_array") {
            self.state.borrow_mut().enabled_attributes.insert(index);
        }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        if self.call("disable_vertex_attrib_array") {
            self.state.borrow_mut().enabled_attributes.remove(&index);
        }
    }

    fn vertex_attrib_pointer_f32(&self, _index: u32, _size: i32, _stride: i32, _offset: i32) {
        self.call("vertex_attrib_pointer_f32");
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        if self.call("draw_arrays") {
            let mut state = self.state.borrow_mut();
            let draw = Draw {
                mode,
                first,
                count,
                buffer: state.bound_buffer,
                program: state.current_program,
            };
            state.draws.push(draw);
        }
    }
}
