//! The scene session: owner of every GPU resource and of the model registry.
//!
//! A [`Session`] is built in four stages (off-screen framebuffers, skybox
//! cubemap, screen quad, shader programs). Each completed stage is recorded;
//! if a later one fails, the completed stages are torn down in reverse order
//! and the error that stopped it is returned, so a failed construction leaves
//! nothing allocated. Dropping the session releases the registry's vertex
//! buffers and then every stage.

use std::{collections::BTreeMap, path::Path, path::PathBuf};

use crate::{
    assets::AssetSource,
    camera::Camera,
    check_gl,
    config::SessionConfig,
    data_structures::{
        instance::{FileId, MeshInstance},
        model::ModelFile,
    },
    driver::{Handle, SharedGl},
    error::{Error, Result},
    render::{self, FrameResources},
    resources::{
        self, Managed,
        framebuffer::Framebuffer,
        mesh::GpuModel,
        program::Program,
        shader::{ShaderKind, ShaderUnit},
        texture::{self, COLOR_TEXTURE_UNIT, SEGMENTATION_TEXTURE_UNIT, SKYBOX_TEXTURE_UNIT},
    },
};

/// Two triangles covering the unit square; the skybox shader maps them to
/// clip space.
const SCREEN_QUAD: [f32; 12] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

/// Off-screen image a frame can be rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Color,
    Segmentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Framebuffers,
    Skybox,
    ScreenQuad,
    Shaders,
}

impl Stage {
    const ALL: [Stage; 4] = [Stage::Framebuffers, Stage::Skybox, Stage::ScreenQuad, Stage::Shaders];
}

/// CPU side of a loaded model file.
#[derive(Debug)]
pub struct LoadedModel {
    pub file: ModelFile,
    pub path: PathBuf,
}

pub struct Session {
    gl: SharedGl,
    assets: Box<dyn AssetSource>,
    config: SessionConfig,
    color_framebuffer: Managed<Framebuffer>,
    segmentation_framebuffer: Managed<Framebuffer>,
    skybox_texture: Handle,
    screen_quad: Handle,
    skybox_program: Option<Managed<Program>>,
    mesh_program: Option<Managed<Program>>,
    /// Completed construction stages, in order.
    stages: Vec<Stage>,
    models: BTreeMap<FileId, LoadedModel>,
    buffers: BTreeMap<FileId, GpuModel>,
    next_file_id: u32,
    development_mode: bool,
}

impl Session {
    /// Builds a session on `gl`, reading shaders and skybox faces from
    /// `assets`.
    pub fn new(gl: SharedGl, assets: Box<dyn AssetSource>, config: SessionConfig) -> Result<Self> {
        let [width, height] = config.resolution;
        let mut session = Self {
            color_framebuffer: Managed::new(gl.clone(), Framebuffer::new(COLOR_TEXTURE_UNIT, true, width, height)),
            segmentation_framebuffer: Managed::new(
                gl.clone(),
                Framebuffer::new(SEGMENTATION_TEXTURE_UNIT, true, width, height),
            ),
            gl,
            assets,
            skybox_texture: 0,
            screen_quad: 0,
            skybox_program: None,
            mesh_program: None,
            stages: Vec::with_capacity(Stage::ALL.len()),
            models: BTreeMap::new(),
            buffers: BTreeMap::new(),
            next_file_id: 0,
            development_mode: config.development_mode,
            config,
        };

        for stage in Stage::ALL {
            if let Err(err) = session.enter(stage) {
                log::debug!("session stage {stage:?} failed, rolling back");
                session.teardown_logged(stage);
                session.rollback();
                return Err(err);
            }
            session.stages.push(stage);
            log::debug!("session stage {stage:?} ready");
        }

        log::info!("session ready at {width}x{height} with skybox {}", session.config.skybox);
        Ok(session)
    }

    /// Builds a session on the GL context current on this thread, using the
    /// embedded assets.
    ///
    /// # Safety
    ///
    /// A GL ES 2 compatible context must be current on this thread and stay
    /// current for the lifetime of the session.
    #[cfg(not(target_arch = "wasm32"))]
    pub unsafe fn from_loader<F>(loader: F, config: SessionConfig) -> Result<Self>
    where
        F: FnMut(&str) -> *const std::ffi::c_void,
    {
        let driver = unsafe { crate::driver::GlowDriver::from_loader(loader) };
        Self::new(std::rc::Rc::new(driver), Box::new(crate::assets::EmbeddedAssets), config)
    }

    fn enter(&mut self, stage: Stage) -> Result<()> {
        let gl = self.gl.clone();
        match stage {
            Stage::Framebuffers => {
                self.color_framebuffer.init()?;
                self.segmentation_framebuffer.init()?;
            }
            Stage::Skybox => {
                self.skybox_texture = texture::create_cubemap(&*gl, SKYBOX_TEXTURE_UNIT)?;
                texture::upload_skybox(&*gl, &*self.assets, self.skybox_texture, &self.config.skybox)?;
            }
            Stage::ScreenQuad => {
                self.screen_quad = check_gl!(gl, gl.gen_buffer());
                check_gl!(gl, gl.bind_buffer(glow::ARRAY_BUFFER, self.screen_quad));
                check_gl!(
                    gl,
                    gl.buffer_data(glow::ARRAY_BUFFER, bytemuck::cast_slice(&SCREEN_QUAD), glow::STATIC_DRAW)
                );
            }
            Stage::Shaders => {
                let shaders = self.config.shaders.clone();
                self.skybox_program = Some(self.build_program("skybox", &shaders.skybox_vertex, &shaders.skybox_fragment)?);
                self.mesh_program = Some(self.build_program("mesh", &shaders.mesh_vertex, &shaders.mesh_fragment)?);
            }
        }
        Ok(())
    }

    fn build_program(&self, label: &str, vertex: &str, fragment: &str) -> Result<Managed<Program>> {
        let vertex = ShaderUnit::from_assets(ShaderKind::Vertex, vertex, &*self.assets)?;
        let fragment = ShaderUnit::from_assets(ShaderKind::Fragment, fragment, &*self.assets)?;
        Program::build(&self.gl, label, vertex, fragment)
    }

    /// Releases whatever `stage` holds. Safe on a partially entered or
    /// already torn down stage.
    fn teardown(&mut self, stage: Stage) -> Result<()> {
        let gl = self.gl.clone();
        match stage {
            Stage::Framebuffers => {
                let color = self.color_framebuffer.cleanup();
                color.and(self.segmentation_framebuffer.cleanup())
            }
            Stage::Skybox => {
                let cubemap = std::mem::take(&mut self.skybox_texture);
                if cubemap == 0 {
                    return Ok(());
                }
                check_gl!(gl, gl.delete_texture(cubemap));
                Ok(())
            }
            Stage::ScreenQuad => {
                let buffer = std::mem::take(&mut self.screen_quad);
                if buffer == 0 {
                    return Ok(());
                }
                check_gl!(gl, gl.delete_buffer(buffer));
                Ok(())
            }
            Stage::Shaders => {
                let mut result = Ok(());
                for mut program in [self.mesh_program.take(), self.skybox_program.take()].into_iter().flatten() {
                    result = result.and(program.cleanup());
                }
                result
            }
        }
    }

    fn teardown_logged(&mut self, stage: Stage) {
        if let Err(err) = self.teardown(stage) {
            log::warn!("tearing down {stage:?} failed: {err}");
        }
    }

    /// Tears down the completed stages, last first.
    fn rollback(&mut self) {
        while let Some(stage) = self.stages.pop() {
            self.teardown_logged(stage);
        }
    }

    /// Parses an OBJ file and uploads its meshes. Ids are handed out in load
    /// order, starting at 0; a failed load consumes no id and leaves no
    /// buffer behind.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<FileId> {
        let path = path.as_ref();
        let (file, gpu) = resources::load_model_obj(&*self.gl, path)?;

        let id = FileId(self.next_file_id);
        self.next_file_id += 1;

        log::info!(
            "loaded OBJ {id} from {}: {} shapes, {} vertex buffers",
            path.display(),
            file.shapes().len(),
            gpu.buffer_count()
        );
        self.models.insert(
            id,
            LoadedModel {
                file,
                path: path.to_path_buf(),
            },
        );
        self.buffers.insert(id, gpu);
        Ok(id)
    }

    /// Creates an identity-placed instance of the shape named `shape_name`
    /// (exact, case-sensitive match).
    pub fn instantiate(&self, file_id: FileId, shape_name: &str) -> Result<MeshInstance> {
        let model = self
            .models
            .get(&file_id)
            .ok_or_else(|| Error::runtime(format!("Unknown OBJ id {}.", file_id.0)))?;
        let shape_index = model.file.find_shape(shape_name).ok_or_else(|| {
            Error::runtime(format!(
                "Failed to find shape '{shape_name}' in OBJ '{}'.",
                model.path.display()
            ))
        })?;
        Ok(MeshInstance::new(file_id, shape_index))
    }

    /// Renders the skybox and `instances` into the currently bound
    /// framebuffer.
    pub fn render(&self, camera: &Camera, instances: &[MeshInstance]) -> Result<()> {
        let (Some(skybox_program), Some(mesh_program)) = (&self.skybox_program, &self.mesh_program) else {
            return Err(Error::runtime("Session has no shader programs."));
        };
        let frame = FrameResources {
            skybox_program,
            mesh_program,
            skybox_texture: self.skybox_texture,
            screen_quad: self.screen_quad,
            models: &self.buffers,
        };
        render::draw_frame(&*self.gl, &frame, camera, instances)
    }

    /// Renders into the off-screen framebuffer of `image`, resized to the
    /// camera resolution, then restores the default framebuffer.
    pub fn render_to(&mut self, image: ImageType, camera: &Camera, instances: &[MeshInstance]) -> Result<()> {
        let [width, height] = camera.resolution;
        let target = self.framebuffer_mut(image);
        if target.size() != (width.max(1), height.max(1)) {
            target.resize(width, height)?;
        }
        target.bind()?;

        let drawn = self.render(camera, instances);
        drawn.and(self.framebuffer(image).unbind())
    }

    /// Color attachment of the framebuffer behind `image`.
    pub fn target_texture(&self, image: ImageType) -> Handle {
        self.framebuffer(image).texture()
    }

    fn framebuffer(&self, image: ImageType) -> &Managed<Framebuffer> {
        match image {
            ImageType::Color => &self.color_framebuffer,
            ImageType::Segmentation => &self.segmentation_framebuffer,
        }
    }

    fn framebuffer_mut(&mut self, image: ImageType) -> &mut Managed<Framebuffer> {
        match image {
            ImageType::Color => &mut self.color_framebuffer,
            ImageType::Segmentation => &mut self.segmentation_framebuffer,
        }
    }

    pub fn set_development_mode(&mut self, enabled: bool) {
        if self.development_mode != enabled {
            log::info!("development mode {}", if enabled { "on" } else { "off" });
        }
        self.development_mode = enabled;
    }

    pub fn development_mode(&self) -> bool {
        self.development_mode
    }

    pub fn model(&self, id: FileId) -> Option<&LoadedModel> {
        self.models.get(&id)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn release_models(&mut self) {
        for (id, mut gpu) in std::mem::take(&mut self.buffers) {
            if let Err(err) = gpu.release(&*self.gl) {
                log::warn!("releasing buffers of OBJ {id} failed: {err}");
            }
        }
        self.models.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release_models();
        self.rollback();
        log::debug!("session released");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("stages", &self.stages)
            .field("models", &self.models.len())
            .field("development_mode", &self.development_mode)
            .finish_non_exhaustive()
    }
}

