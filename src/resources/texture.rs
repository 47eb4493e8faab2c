//! Texture creation and skybox upload.

use anyhow::Context;

use crate::{
    assets::AssetSource,
    check_gl,
    driver::{Gl, Handle},
    error::{Error, Result},
    resources::UndoStack,
};

/// Texture unit of the color framebuffer attachment.
pub const COLOR_TEXTURE_UNIT: u32 = 0;

/// Texture unit of the segmentation framebuffer attachment.
pub const SEGMENTATION_TEXTURE_UNIT: u32 = 1;

/// Texture unit the skybox cubemap is bound to in every pass.
pub const SKYBOX_TEXTURE_UNIT: u32 = 2;

/// Skybox face images and the cubemap face each one is uploaded to.
pub const SKYBOX_FACES: [(u32, &str); 6] = [
    (glow::TEXTURE_CUBE_MAP_POSITIVE_X, "px.png"),
    (glow::TEXTURE_CUBE_MAP_NEGATIVE_X, "nx.png"),
    (glow::TEXTURE_CUBE_MAP_POSITIVE_Y, "py.png"),
    (glow::TEXTURE_CUBE_MAP_NEGATIVE_Y, "ny.png"),
    (glow::TEXTURE_CUBE_MAP_POSITIVE_Z, "pz.png"),
    (glow::TEXTURE_CUBE_MAP_NEGATIVE_Z, "nz.png"),
];

/// Creates a 2D texture bound to `unit` with nearest/linear filtering and
/// edge clamping. No storage is allocated.
pub fn create_texture(gl: &dyn Gl, unit: u32) -> Result<Handle> {
    create_with_sampling(gl, glow::TEXTURE_2D, unit)
}

/// Same as [`create_texture`] for a cubemap.
pub fn create_cubemap(gl: &dyn Gl, unit: u32) -> Result<Handle> {
    create_with_sampling(gl, glow::TEXTURE_CUBE_MAP, unit)
}

fn create_with_sampling(gl: &dyn Gl, target: u32, unit: u32) -> Result<Handle> {
    UndoStack::run(gl, |undo| {
        let texture = check_gl!(gl, gl.gen_texture());
        undo.push("texture", move |gl| gl.delete_texture(texture));

        check_gl!(gl, gl.active_texture(glow::TEXTURE0 + unit));
        check_gl!(gl, gl.bind_texture(target, texture));

        check_gl!(gl, gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32));
        check_gl!(gl, gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32));

        check_gl!(gl, gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32));
        check_gl!(gl, gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32));

        Ok(texture)
    })
}

/// Decodes an encoded image (PNG, JPEG) into RGBA8 pixels.
fn decode_rgba(bytes: &[u8]) -> anyhow::Result<image::RgbaImage> {
    let img = image::load_from_memory(bytes).context("image could not be decoded")?;
    Ok(img.to_rgba8())
}

/// Uploads the six `{prefix}/{face}.png` images into `cubemap`.
///
/// The caller owns `cubemap` and is responsible for deleting it when this
/// fails.
pub fn upload_skybox(gl: &dyn Gl, assets: &dyn AssetSource, cubemap: Handle, prefix: &str) -> Result<()> {
    check_gl!(gl, gl.active_texture(glow::TEXTURE0 + SKYBOX_TEXTURE_UNIT));
    check_gl!(gl, gl.bind_texture(glow::TEXTURE_CUBE_MAP, cubemap));

    for (target, face) in SKYBOX_FACES {
        let path = format!("{prefix}/{face}");

        let pixels = assets
            .get(&path)
            .context("asset not found")
            .and_then(|bytes| decode_rgba(&bytes))
            .map_err(|err| Error::runtime(format!("Failed to open internal skybox '{path}': {err:#}")))?;

        let (width, height) = pixels.dimensions();
        let (width, height) = match (i32::try_from(width), i32::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(Error::runtime(format!("Skybox face '{path}' is too large."))),
        };

        check_gl!(
            gl,
            gl.tex_image_2d(
                target,
                glow::RGBA as i32,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels.as_raw()),
            )
        );
        log::debug!("uploaded skybox face {path} ({width}x{height})");
    }

    Ok(())
}
