//! Read-only asset storage compiled into the library.
//!
//! Shaders and skybox faces are looked up by path (`assets/shaders/...`,
//! `assets/skyboxes/...`). The session only sees the [`AssetSource`] trait so
//! tests and hosts can swap in their own storage.

use std::{borrow::Cow, collections::HashMap};

use rust_embed::RustEmbed;

use crate::error::{Error, Result};

/// Lookup of asset bytes by path.
pub trait AssetSource {
    fn get(&self, path: &str) -> Option<Cow<'static, [u8]>>;

    fn read(&self, path: &str) -> Result<Cow<'static, [u8]>> {
        self.get(path)
            .ok_or_else(|| Error::runtime(format!("Asset '{path}' not found.")))
    }

    fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes.into_owned())
            .map_err(|err| Error::runtime(format!("Asset '{path}' is not valid UTF-8: {err}")))
    }
}

/// The `assets/` directory, embedded at compile time.
#[derive(RustEmbed)]
#[folder = "assets/"]
#[prefix = "assets/"]
pub struct EmbeddedAssets;

impl AssetSource for EmbeddedAssets {
    fn get(&self, path: &str) -> Option<Cow<'static, [u8]>> {
        <Self as RustEmbed>::get(path).map(|file| file.data)
    }
}

/// In-memory assets, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }
}

impl AssetSource for MemoryAssets {
    fn get(&self, path: &str) -> Option<Cow<'static, [u8]>> {
        self.files.get(path).map(|bytes| Cow::Owned(bytes.clone()))
    }
}
