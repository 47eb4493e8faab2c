use std::{io::Cursor, path::PathBuf, rc::Rc};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use mvz::{
    Session, SessionConfig,
    assets::MemoryAssets,
    driver::SharedGl,
    resources::texture::SKYBOX_FACES,
};

use super::fake_gl::FakeGl;

pub const SKYBOX: &str = "assets/skyboxes/DaySkyHDRI017B";

/// A solid 2x2 PNG.
pub fn png(color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(2, 2, Rgba(color));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding failed");
    bytes
}

/// The shipped shaders plus a generated skybox under the default paths.
pub fn test_assets() -> MemoryAssets {
    let mut assets = MemoryAssets::new()
        .with("assets/shaders/skybox.vert", include_str!("../../assets/shaders/skybox.vert"))
        .with(
            "assets/shaders/skybox_color.frag",
            include_str!("../../assets/shaders/skybox_color.frag"),
        )
        .with("assets/shaders/mesh.vert", include_str!("../../assets/shaders/mesh.vert"))
        .with(
            "assets/shaders/mesh_color.frag",
            include_str!("../../assets/shaders/mesh_color.frag"),
        );
    for (i, (_, face)) in SKYBOX_FACES.iter().enumerate() {
        let shade = 40 * i as u8;
        assets.insert(format!("{SKYBOX}/{face}"), png([shade, 128, 255 - shade, 255]));
    }
    assets
}

pub fn fake() -> (Rc<FakeGl>, SharedGl) {
    let fake = Rc::new(FakeGl::new());
    let gl: SharedGl = fake.clone();
    (fake, gl)
}

pub fn session_with(gl: SharedGl, assets: MemoryAssets) -> mvz::Result<Session> {
    Session::new(gl, Box::new(assets), SessionConfig::default())
}

pub fn session(gl: SharedGl) -> mvz::Result<Session> {
    session_with(gl, test_assets())
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}
