//! Session configuration.

/// Asset paths of the four shader stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub skybox_vertex: String,
    pub skybox_fragment: String,
    pub mesh_vertex: String,
    pub mesh_fragment: String,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            skybox_vertex: "assets/shaders/skybox.vert".to_string(),
            skybox_fragment: "assets/shaders/skybox_color.frag".to_string(),
            mesh_vertex: "assets/shaders/mesh.vert".to_string(),
            mesh_fragment: "assets/shaders/mesh_color.frag".to_string(),
        }
    }
}

/// Everything a [`Session`](crate::Session) needs besides the driver and the
/// assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Initial size of the offscreen framebuffers.
    pub resolution: [i32; 2],
    /// Asset directory holding the six skybox faces.
    pub skybox: String,
    pub shaders: ShaderPaths,
    pub development_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolution: [640, 480],
            skybox: "assets/skyboxes/DaySkyHDRI017B".to_string(),
            shaders: ShaderPaths::default(),
            development_mode: false,
        }
    }
}

impl SessionConfig {
    pub fn with_resolution(mut self, width: i32, height: i32) -> Self {
        self.resolution = [width, height];
        self
    }

    pub fn with_skybox(mut self, skybox: impl Into<String>) -> Self {
        self.skybox = skybox.into();
        self
    }

    pub fn with_shaders(mut self, shaders: ShaderPaths) -> Self {
        self.shaders = shaders;
        self
    }

    pub fn with_development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }
}
