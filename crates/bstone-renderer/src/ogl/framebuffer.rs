// framebuffer.rs -- off-screen multisample target
//
// Used when MSAA is on but the window surface itself is single-sampled.
// Frames are drawn into the multisample renderbuffers and resolved into the
// default framebuffer right before the swap.

use super::api::check_errors;
use super::gl::*;
use super::handle::{self, OglHandle};
use super::state::OglState;
use crate::r3r::*;
use std::rc::Rc;

pub struct OglMsaaFramebuffer {
    width: i32,
    height: i32,
    samples: i32,
    fbo: OglHandle,
    color_rb: OglHandle,
    depth_rb: OglHandle,
}

impl OglMsaaFramebuffer {
    pub fn new(gl: &Rc<GlFns>, state: &mut OglState, width: i32, height: i32, samples: i32) -> R3rResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(R3rError::contract(format!("Framebuffer size {}x{} out of range.", width, height)));
        }

        let (gen_fb, gen_rb, bind_rb, storage, attach, status) = match (
            gl.gen_framebuffers,
            gl.gen_renderbuffers,
            gl.bind_renderbuffer,
            gl.renderbuffer_storage_multisample,
            gl.framebuffer_renderbuffer,
            gl.check_framebuffer_status,
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) => (a, b, c, d, e, f),
            _ => return Err(R3rError::contract("Multisample framebuffers not available.")),
        };

        let fbo = OglHandle::new(gl, handle::gen_name(gen_fb), handle::delete_framebuffer);
        let color_rb = OglHandle::new(gl, handle::gen_name(gen_rb), handle::delete_renderbuffer);
        let depth_rb = OglHandle::new(gl, handle::gen_name(gen_rb), handle::delete_renderbuffer);

        if fbo.is_empty() || color_rb.is_empty() || depth_rb.is_empty() {
            return Err(R3rError::contract("Failed to create framebuffer objects."));
        }

        // SAFETY: plain enum/name/int arguments against freshly generated names.
        unsafe {
            bind_rb(GL_RENDERBUFFER, color_rb.get());
            storage(GL_RENDERBUFFER, samples, GL_RGBA8, width, height);
            bind_rb(GL_RENDERBUFFER, depth_rb.get());
            storage(GL_RENDERBUFFER, samples, GL_DEPTH_COMPONENT16, width, height);
            bind_rb(GL_RENDERBUFFER, 0);
        }

        check_errors(gl, "glRenderbufferStorageMultisample")?;

        state.bind_framebuffer(gl, fbo.get());

        // SAFETY: plain enum/name arguments; the framebuffer is bound.
        let fb_status = unsafe {
            attach(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_RENDERBUFFER, color_rb.get());
            attach(GL_FRAMEBUFFER, GL_DEPTH_ATTACHMENT, GL_RENDERBUFFER, depth_rb.get());
            status(GL_FRAMEBUFFER)
        };

        state.bind_framebuffer(gl, 0);

        if fb_status != GL_FRAMEBUFFER_COMPLETE {
            return Err(R3rError::contract(format!(
                "Incomplete multisample framebuffer (status 0x{:04X}).",
                fb_status
            )));
        }

        Ok(Self {
            width,
            height,
            samples,
            fbo,
            color_rb,
            depth_rb,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn samples(&self) -> i32 {
        self.samples
    }

    pub fn gl_name(&self) -> GLuint {
        self.fbo.get()
    }

    pub fn bind(&self, state: &mut OglState) {
        state.bind_framebuffer(self.fbo.gl(), self.fbo.get());
    }

    /// Resolve into the default framebuffer. Leaves the default framebuffer bound.
    pub fn resolve(&self, state: &mut OglState) -> R3rResult<()> {
        let gl = self.fbo.gl();

        let (bind, blit) = match (gl.bind_framebuffer, gl.blit_framebuffer) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(R3rError::contract("Framebuffer blit not available.")),
        };

        // SAFETY: plain enum/name/int arguments.
        unsafe {
            bind(GL_READ_FRAMEBUFFER, self.fbo.get());
            bind(GL_DRAW_FRAMEBUFFER, 0);
            blit(
                0,
                0,
                self.width,
                self.height,
                0,
                0,
                self.width,
                self.height,
                GL_COLOR_BUFFER_BIT,
                GL_NEAREST,
            );
        }

        // The raw binds above bypass the cache.
        state.forget_name(self.fbo.get());
        state.bind_framebuffer(gl, 0);

        check_errors(gl, "glBlitFramebuffer")
    }

    pub fn abandon(&mut self) {
        self.fbo.abandon();
        self.color_rb.abandon();
        self.depth_rb.abandon();
    }
}
