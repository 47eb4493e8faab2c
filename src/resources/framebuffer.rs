use crate::{
    check_gl,
    driver::{Gl, Handle},
    error::{Error, Result, check},
    resources::{GpuObject, Managed, UndoStack, texture},
};

/// An off-screen render target: an RGBA texture attachment and, optionally,
/// a 16-bit depth renderbuffer, both sized to the same resolution.
#[derive(Debug)]
pub struct Framebuffer {
    unit: u32,
    has_depth: bool,
    width: i32,
    height: i32,
    framebuffer: Handle,
    texture: Handle,
    renderbuffer: Handle,
}

impl Framebuffer {
    /// `unit` is the texture unit the color attachment is created on.
    pub fn new(unit: u32, has_depth: bool, width: i32, height: i32) -> Self {
        Self {
            unit,
            has_depth,
            width: width.max(1),
            height: height.max(1),
            framebuffer: 0,
            texture: 0,
            renderbuffer: 0,
        }
    }

    pub fn has_depth(&self) -> bool {
        self.has_depth
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// The color attachment.
    pub fn texture(&self) -> Handle {
        self.texture
    }

    pub fn handle(&self) -> Handle {
        self.framebuffer
    }

    fn allocate_storage(&self, gl: &dyn Gl) -> Result<()> {
        check_gl!(gl, gl.active_texture(glow::TEXTURE0 + self.unit));
        check_gl!(gl, gl.bind_texture(glow::TEXTURE_2D, self.texture));
        check_gl!(
            gl,
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                glow::RGBA as i32,
                self.width,
                self.height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            )
        );

        if self.has_depth {
            check_gl!(gl, gl.bind_renderbuffer(glow::RENDERBUFFER, self.renderbuffer));
            check_gl!(
                gl,
                gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, self.width, self.height)
            );
        }

        Ok(())
    }

    /// Reallocates the attachments at a new resolution. The driver objects
    /// are kept; only their storage changes.
    ///
    /// A failed resize may leave the attachments at different sizes, so the
    /// size then reads `(0, 0)` and any later resize reallocates both.
    pub fn resize(&mut self, gl: &dyn Gl, width: i32, height: i32) -> Result<()> {
        self.width = width.max(1);
        self.height = height.max(1);
        if self.framebuffer == 0 {
            return Ok(());
        }
        log::debug!("resizing framebuffer {} to {}x{}", self.framebuffer, self.width, self.height);
        let resized = self.allocate_storage(gl).and_then(|()| {
            check_gl!(gl, gl.bind_framebuffer(glow::FRAMEBUFFER, self.framebuffer));
            check_complete(gl)
        });
        if resized.is_err() {
            (self.width, self.height) = (0, 0);
        }
        resized
    }

}

/// Reads the status of the bound framebuffer and restores the default target.
fn check_complete(gl: &dyn Gl) -> Result<()> {
    let status = check_gl!(gl, gl.check_framebuffer_status(glow::FRAMEBUFFER));
    check_gl!(gl, gl.bind_framebuffer(glow::FRAMEBUFFER, 0));
    if status != glow::FRAMEBUFFER_COMPLETE {
        return Err(Error::runtime(format!("Framebuffer is incomplete (status 0x{status:x}).")));
    }
    Ok(())
}

impl GpuObject for Framebuffer {
    fn create(&mut self, gl: &dyn Gl) -> Result<()> {
        let (framebuffer, texture, renderbuffer) = UndoStack::run(gl, |undo| {
            self.texture = texture::create_texture(gl, self.unit)?;
            let texture = self.texture;
            undo.push("framebuffer texture", move |gl| gl.delete_texture(texture));

            if self.has_depth {
                self.renderbuffer = check_gl!(gl, gl.gen_renderbuffer());
                let renderbuffer = self.renderbuffer;
                undo.push("framebuffer depth", move |gl| gl.delete_renderbuffer(renderbuffer));
            }

            self.allocate_storage(gl)?;

            let framebuffer = check_gl!(gl, gl.gen_framebuffer());
            undo.push("framebuffer", move |gl| gl.delete_framebuffer(framebuffer));

            check_gl!(gl, gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer));
            check_gl!(
                gl,
                gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, texture)
            );
            if self.has_depth {
                check_gl!(
                    gl,
                    gl.framebuffer_renderbuffer(
                        glow::FRAMEBUFFER,
                        glow::DEPTH_ATTACHMENT,
                        glow::RENDERBUFFER,
                        self.renderbuffer,
                    )
                );
            }

            check_complete(gl)?;

            Ok((framebuffer, self.texture, self.renderbuffer))
        })
        .inspect_err(|_| {
            self.texture = 0;
            self.renderbuffer = 0;
        })?;

        self.framebuffer = framebuffer;
        self.texture = texture;
        self.renderbuffer = renderbuffer;
        Ok(())
    }

    fn destroy(&mut self, gl: &dyn Gl) -> Result<()> {
        let (framebuffer, texture, renderbuffer) = (self.framebuffer, self.texture, self.renderbuffer);
        self.framebuffer = 0;
        self.texture = 0;
        self.renderbuffer = 0;

        // Every deletion is attempted; the first error wins.
        gl.delete_framebuffer(framebuffer);
        let mut result = check(gl, "gl.delete_framebuffer(framebuffer)", file!(), line!());
        gl.delete_texture(texture);
        result = result.and(check(gl, "gl.delete_texture(texture)", file!(), line!()));
        if self.has_depth {
            gl.delete_renderbuffer(renderbuffer);
            result = result.and(check(gl, "gl.delete_renderbuffer(renderbuffer)", file!(), line!()));
        }
        result
    }
}

impl Managed<Framebuffer> {
    /// Makes this framebuffer the render target.
    pub fn bind(&self) -> Result<()> {
        let gl = self.gl();
        check_gl!(gl, gl.bind_framebuffer(glow::FRAMEBUFFER, self.handle()));
        Ok(())
    }

    /// Restores the default framebuffer as the render target.
    pub fn unbind(&self) -> Result<()> {
        let gl = self.gl();
        check_gl!(gl, gl.bind_framebuffer(glow::FRAMEBUFFER, 0));
        Ok(())
    }

    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        let gl = self.gl.clone();
        self.object_mut().resize(&*gl, width, height)
    }
}
