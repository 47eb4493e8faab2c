use crate::{
    assets::AssetSource,
    check_gl,
    driver::{Gl, Handle},
    error::{Error, Result},
    resources::GpuObject,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

/// One compiled shader stage.
///
/// A failed compile is reported as [`Error::ShaderCompile`] with the
/// compiler log, the asset path and the unmodified source. The driver shader
/// object never outlives a failed `create`.
#[derive(Debug)]
pub struct ShaderUnit {
    kind: ShaderKind,
    path: String,
    source: String,
    handle: Handle,
}

impl ShaderUnit {
    pub fn new(kind: ShaderKind, path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            source: source.into(),
            handle: 0,
        }
    }

    /// Reads the source text of `path` from `assets`.
    pub fn from_assets(kind: ShaderKind, path: &str, assets: &dyn AssetSource) -> Result<Self> {
        let source = assets.read_to_string(path)?;
        Ok(Self::new(kind, path, source))
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    fn compile(&self, gl: &dyn Gl, shader: Handle) -> Result<()> {
        check_gl!(gl, gl.shader_source(shader, &self.source));
        check_gl!(gl, gl.compile_shader(shader));

        let compile_status = check_gl!(gl, gl.get_shader_iv(shader, glow::COMPILE_STATUS));
        if compile_status != 0 {
            return Ok(());
        }

        let log_length = check_gl!(gl, gl.get_shader_iv(shader, glow::INFO_LOG_LENGTH));
        if log_length < 0 {
            return Err(Error::runtime(format!("Shader log length of '{log_length}' is invalid.")));
        }

        let (read_size, log) = check_gl!(gl, gl.get_shader_info_log(shader, log_length));
        if read_size < 0 {
            return Err(Error::runtime(format!("Shader log read size of '{read_size}' is invalid.")));
        }

        Err(Error::ShaderCompile {
            log,
            path: self.path.clone(),
            source_text: self.source.clone(),
        })
    }
}

impl GpuObject for ShaderUnit {
    fn create(&mut self, gl: &dyn Gl) -> Result<()> {
        let shader = check_gl!(gl, gl.create_shader(self.kind.gl_enum()));

        if let Err(err) = self.compile(gl, shader) {
            gl.delete_shader(shader);
            return Err(err);
        }

        log::debug!("compiled {:?} shader {}", self.kind, self.path);
        self.handle = shader;
        Ok(())
    }

    fn destroy(&mut self, gl: &dyn Gl) -> Result<()> {
        let shader = std::mem::take(&mut self.handle);
        check_gl!(gl, gl.delete_shader(shader));
        Ok(())
    }
}
