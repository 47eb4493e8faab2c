use std::{fmt, ops::Deref, path::Path};

use crate::{
    data_structures::model::ModelFile,
    driver::{Gl, SharedGl},
    error::Result,
    resources::mesh::GpuModel,
};

/**
 * This module contains all logic for creating GPU objects and for loading
 * meshes/textures from external files into them.
 *
 * Every GPU object follows the same two-phase contract: it is constructed
 * without touching the driver, then `init` creates the driver objects and
 * `cleanup` destroys them. See [`Managed`].
 */
pub mod framebuffer;
pub mod mesh;
pub mod obj;
pub mod program;
pub mod shader;
pub mod texture;

/// Loads an OBJ file and uploads its meshes.
///
/// Nothing is left allocated on the GPU when this fails.
pub fn load_model_obj(gl: &dyn Gl, path: &Path) -> Result<(ModelFile, GpuModel)> {
    let shapes = obj::parse_obj(path)?;
    let file = ModelFile::from_parsed(shapes);
    let gpu = mesh::upload_model(gl, &file)?;
    Ok((file, gpu))
}

/// A GPU object with a fallible creation and destruction routine.
///
/// `create` must leave nothing allocated when it fails. `destroy` is only
/// ever called on an object whose `create` succeeded.
pub trait GpuObject {
    fn create(&mut self, gl: &dyn Gl) -> Result<()>;

    fn destroy(&mut self, gl: &dyn Gl) -> Result<()>;
}

/// Owns a [`GpuObject`] and guarantees it is destroyed at most once.
///
/// `cleanup` is idempotent and a no-op before `init`; dropping an initialized
/// object cleans it up. The wrapper is deliberately not `Clone`: it is the
/// single owner of the driver handles inside.
pub struct Managed<T: GpuObject> {
    gl: SharedGl,
    object: T,
    initialized: bool,
}

impl<T: GpuObject> Managed<T> {
    pub fn new(gl: SharedGl, object: T) -> Self {
        Self {
            gl,
            object,
            initialized: false,
        }
    }

    /// Creates the driver objects. Calling it on an initialized object does
    /// nothing. On failure the object stays uninitialized.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.object.create(&*self.gl)?;
        self.initialized = true;
        Ok(())
    }

    pub fn cleanup(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        // Marked first so a failing destroy is never retried.
        self.initialized = false;
        self.object.destroy(&*self.gl)
    }

    /// [`cleanup`](Self::cleanup) for failure paths, where an earlier error
    /// is the one worth reporting.
    pub fn release(&mut self) {
        if let Err(err) = self.cleanup() {
            log::warn!("cleanup failed: {err}");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn gl(&self) -> &dyn Gl {
        &*self.gl
    }

    pub(crate) fn object_mut(&mut self) -> &mut T {
        &mut self.object
    }
}

impl<T: GpuObject> Deref for Managed<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl<T: GpuObject + fmt::Debug> fmt::Debug for Managed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("object", &self.object)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl<T: GpuObject> Drop for Managed<T> {
    fn drop(&mut self) {
        self.release();
    }
}

type Undo = Box<dyn FnOnce(&dyn Gl)>;

/// Ordered list of undo actions for a multi-step creation.
///
/// Each step pushes the action that reverts it as soon as it succeeds; on a
/// later failure the actions run in reverse order. Undo actions never check
/// the error flag: the error that triggered the rollback is the one that
/// propagates.
#[derive(Default)]
pub struct UndoStack {
    steps: Vec<(&'static str, Undo)>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `build` with a fresh stack. If it fails, everything it pushed is
    /// undone before the error is returned.
    pub fn run<T>(gl: &dyn Gl, build: impl FnOnce(&mut UndoStack) -> Result<T>) -> Result<T> {
        let mut undo = Self::new();
        match build(&mut undo) {
            Ok(value) => {
                undo.commit();
                Ok(value)
            }
            Err(err) => {
                undo.unwind(gl);
                Err(err)
            }
        }
    }

    pub fn push(&mut self, label: &'static str, undo: impl FnOnce(&dyn Gl) + 'static) {
        self.steps.push((label, Box::new(undo)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn unwind(self, gl: &dyn Gl) {
        for (label, undo) in self.steps.into_iter().rev() {
            log::debug!("rolling back {label}");
            undo(gl);
        }
    }

    /// Keeps everything created so far.
    pub fn commit(self) {}
}
