use crate::{
    check_gl,
    driver::{Gl, Handle, SharedGl},
    error::{Error, Result},
    resources::{GpuObject, Managed, shader::ShaderUnit},
};

/// A linked vertex + fragment program.
#[derive(Debug)]
pub struct Program {
    label: String,
    vertex_shader: Handle,
    fragment_shader: Handle,
    handle: Handle,
}

impl Program {
    /// `vertex_shader` and `fragment_shader` must be compiled and stay alive
    /// until `create` returns.
    pub fn new(label: impl Into<String>, vertex_shader: Handle, fragment_shader: Handle) -> Self {
        Self {
            label: label.into(),
            vertex_shader,
            fragment_shader,
            handle: 0,
        }
    }

    /// Compiles both stages and links them. The shader objects are released
    /// once linking is over, whether it succeeded or not.
    pub fn build(gl: &SharedGl, label: &str, vertex: ShaderUnit, fragment: ShaderUnit) -> Result<Managed<Program>> {
        let mut vertex = Managed::new(gl.clone(), vertex);
        vertex.init()?;

        let mut fragment = Managed::new(gl.clone(), fragment);
        if let Err(err) = fragment.init() {
            vertex.release();
            return Err(err);
        }

        let mut program = Managed::new(gl.clone(), Program::new(label, vertex.handle(), fragment.handle()));
        let linked = program.init();

        fragment.release();
        vertex.release();

        linked.map(|()| program)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    fn link(&self, gl: &dyn Gl, program: Handle) -> Result<()> {
        check_gl!(gl, gl.attach_shader(program, self.vertex_shader));
        check_gl!(gl, gl.attach_shader(program, self.fragment_shader));
        check_gl!(gl, gl.link_program(program));
        check_gl!(gl, gl.detach_shader(program, self.vertex_shader));
        check_gl!(gl, gl.detach_shader(program, self.fragment_shader));

        let link_status = check_gl!(gl, gl.get_program_iv(program, glow::LINK_STATUS));
        if link_status != 0 {
            return Ok(());
        }

        let log_length = check_gl!(gl, gl.get_program_iv(program, glow::INFO_LOG_LENGTH));
        if log_length < 0 {
            return Err(Error::runtime(format!(
                "Invalid log length '{log_length}' for shader program."
            )));
        }

        let (read_size, log) = check_gl!(gl, gl.get_program_info_log(program, log_length));
        if read_size < 0 {
            return Err(Error::runtime(format!(
                "Invalid log read size '{read_size}' for shader program."
            )));
        }

        Err(Error::Link(log))
    }
}

impl GpuObject for Program {
    fn create(&mut self, gl: &dyn Gl) -> Result<()> {
        let program = check_gl!(gl, gl.create_program());

        if let Err(err) = self.link(gl, program) {
            gl.delete_program(program);
            return Err(err);
        }

        log::debug!("linked program {}", self.label);
        self.handle = program;
        Ok(())
    }

    fn destroy(&mut self, gl: &dyn Gl) -> Result<()> {
        let program = std::mem::take(&mut self.handle);
        check_gl!(gl, gl.delete_program(program));
        Ok(())
    }
}

impl Managed<Program> {
    /// Makes this the active program (`glUseProgram`).
    pub fn bind(&self) -> Result<()> {
        let gl = self.gl();
        check_gl!(gl, gl.use_program(self.handle()));
        Ok(())
    }

    /// `None` for names the program does not use.
    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        self.gl().get_uniform_location(self.handle(), name)
    }

    /// `None` for names the program does not use.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.gl().get_attrib_location(self.handle(), name)
    }
}
