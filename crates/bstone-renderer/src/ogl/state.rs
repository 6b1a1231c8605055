//! GL state cache.
//!
//! Remembers what the renderer last told the driver so redundant binds and
//! toggles are skipped. `None` means "unknown": the next request always goes
//! through. Call `reset` whenever the context is recreated.

use super::gl::*;
use crate::r3r::{R3rBlendingFunc, R3rScissorBox, R3rViewport};

#[derive(Clone, Debug, Default)]
pub struct OglState {
    texture_2d: Option<GLuint>,
    sampler: Option<GLuint>,
    array_buffer: Option<GLuint>,
    element_buffer: Option<GLuint>,
    vertex_array: Option<GLuint>,
    program: Option<GLuint>,
    framebuffer: Option<GLuint>,

    is_culling: Option<bool>,
    is_depth_test: Option<bool>,
    is_depth_write: Option<bool>,
    is_blending: Option<bool>,
    is_scissor: Option<bool>,
    is_texture_2d: Option<bool>,

    front_face: Option<GLenum>,
    cull_face: Option<GLenum>,
    blending_func: Option<R3rBlendingFunc>,
    viewport: Option<R3rViewport>,
    scissor_box: Option<R3rScissorBox>,
}

impl OglState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; the next request of each kind reaches the driver.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ============================================================
    // Object bindings
    // ============================================================

    pub fn bind_texture_2d(&mut self, gl: &GlFns, name: GLuint) {
        if self.texture_2d != Some(name) {
            // SAFETY: plain enum and name arguments.
            unsafe { (gl.bind_texture)(GL_TEXTURE_2D, name) };
            self.texture_2d = Some(name);
        }
    }

    pub fn texture_2d(&self) -> Option<GLuint> {
        self.texture_2d
    }

    /// Sampler bound to unit 0.
    pub fn bind_sampler(&mut self, gl: &GlFns, name: GLuint) {
        if self.sampler == Some(name) {
            return;
        }

        if let Some(f) = gl.bind_sampler {
            // SAFETY: plain unit and name arguments.
            unsafe { f(0, name) };
            self.sampler = Some(name);
        }
    }

    pub fn bind_buffer(&mut self, gl: &GlFns, target: GLenum, name: GLuint) {
        let slot = match target {
            GL_ELEMENT_ARRAY_BUFFER => &mut self.element_buffer,
            _ => &mut self.array_buffer,
        };

        if *slot == Some(name) {
            return;
        }

        if let Some(f) = gl.bind_buffer {
            // SAFETY: plain enum and name arguments.
            unsafe { f(target, name) };
            *slot = Some(name);
        }
    }

    pub fn bind_vertex_array(&mut self, gl: &GlFns, name: GLuint) {
        if self.vertex_array == Some(name) {
            return;
        }

        if let Some(f) = gl.bind_vertex_array {
            // SAFETY: plain name argument.
            unsafe { f(name) };
            self.vertex_array = Some(name);
            // The element buffer binding lives inside the vertex array.
            self.element_buffer = None;
        }
    }

    pub fn use_program(&mut self, gl: &GlFns, name: GLuint) {
        if self.program == Some(name) {
            return;
        }

        if let Some(f) = gl.use_program {
            // SAFETY: plain name argument.
            unsafe { f(name) };
            self.program = Some(name);
        }
    }

    pub fn program(&self) -> Option<GLuint> {
        self.program
    }

    pub fn bind_framebuffer(&mut self, gl: &GlFns, name: GLuint) {
        if self.framebuffer == Some(name) {
            return;
        }

        if let Some(f) = gl.bind_framebuffer {
            // SAFETY: plain enum and name arguments.
            unsafe { f(GL_FRAMEBUFFER, name) };
            self.framebuffer = Some(name);
        }
    }

    /// Forget a binding whose object was just deleted.
    pub fn forget_name(&mut self, name: GLuint) {
        for slot in [
            &mut self.texture_2d,
            &mut self.sampler,
            &mut self.array_buffer,
            &mut self.element_buffer,
            &mut self.vertex_array,
            &mut self.program,
            &mut self.framebuffer,
        ] {
            if *slot == Some(name) {
                *slot = None;
            }
        }
    }

    // ============================================================
    // Capabilities
    // ============================================================

    fn set_cap(gl: &GlFns, slot: &mut Option<bool>, cap: GLenum, is_enabled: bool) {
        if *slot == Some(is_enabled) {
            return;
        }

        // SAFETY: plain enum argument.
        unsafe {
            if is_enabled {
                (gl.enable)(cap);
            } else {
                (gl.disable)(cap);
            }
        }

        *slot = Some(is_enabled);
    }

    pub fn enable_culling(&mut self, gl: &GlFns, is_enabled: bool) {
        Self::set_cap(gl, &mut self.is_culling, GL_CULL_FACE, is_enabled);
    }

    pub fn enable_depth_test(&mut self, gl: &GlFns, is_enabled: bool) {
        Self::set_cap(gl, &mut self.is_depth_test, GL_DEPTH_TEST, is_enabled);
    }

    pub fn enable_blending(&mut self, gl: &GlFns, is_enabled: bool) {
        Self::set_cap(gl, &mut self.is_blending, GL_BLEND, is_enabled);
    }

    pub fn enable_scissor(&mut self, gl: &GlFns, is_enabled: bool) {
        Self::set_cap(gl, &mut self.is_scissor, GL_SCISSOR_TEST, is_enabled);
    }

    /// Fixed-function texturing switch.
    pub fn enable_texture_2d(&mut self, gl: &GlFns, is_enabled: bool) {
        Self::set_cap(gl, &mut self.is_texture_2d, GL_TEXTURE_2D, is_enabled);
    }

    pub fn is_scissor_enabled(&self) -> bool {
        self.is_scissor == Some(true)
    }

    pub fn enable_depth_write(&mut self, gl: &GlFns, is_enabled: bool) {
        if self.is_depth_write == Some(is_enabled) {
            return;
        }

        let flag = if is_enabled { GL_TRUE } else { GL_FALSE };
        // SAFETY: plain boolean argument.
        unsafe { (gl.depth_mask)(flag) };
        self.is_depth_write = Some(is_enabled);
    }

    // ============================================================
    // Fixed values
    // ============================================================

    pub fn set_front_face(&mut self, gl: &GlFns, mode: GLenum) {
        if self.front_face != Some(mode) {
            // SAFETY: plain enum argument.
            unsafe { (gl.front_face)(mode) };
            self.front_face = Some(mode);
        }
    }

    pub fn set_cull_face(&mut self, gl: &GlFns, mode: GLenum) {
        if self.cull_face != Some(mode) {
            // SAFETY: plain enum argument.
            unsafe { (gl.cull_face)(mode) };
            self.cull_face = Some(mode);
        }
    }

    pub fn set_blending_func(&mut self, gl: &GlFns, func: R3rBlendingFunc, src: GLenum, dst: GLenum) {
        if self.blending_func != Some(func) {
            // SAFETY: plain enum arguments.
            unsafe { (gl.blend_func)(src, dst) };
            self.blending_func = Some(func);
        }
    }

    pub fn set_viewport(&mut self, gl: &GlFns, viewport: R3rViewport) {
        if self.viewport != Some(viewport) {
            // SAFETY: plain integer/float arguments.
            unsafe {
                (gl.viewport)(viewport.x, viewport.y, viewport.width, viewport.height);

                if let Some(f) = gl.depth_range {
                    f(viewport.min_depth as f64, viewport.max_depth as f64);
                } else if let Some(f) = gl.depth_rangef {
                    f(viewport.min_depth, viewport.max_depth);
                }
            }
            self.viewport = Some(viewport);
        }
    }

    pub fn viewport(&self) -> Option<R3rViewport> {
        self.viewport
    }

    pub fn set_scissor_box(&mut self, gl: &GlFns, scissor_box: R3rScissorBox) {
        if self.scissor_box != Some(scissor_box) {
            // SAFETY: plain integer arguments.
            unsafe { (gl.scissor)(scissor_box.x, scissor_box.y, scissor_box.width, scissor_box.height) };
            self.scissor_box = Some(scissor_box);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gl::{self, FakeLoader};
    use crate::ogl::api::OglApi;
    use std::rc::Rc;

    fn gl() -> Rc<GlFns> {
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        api.gl().unwrap().clone()
    }

    fn count(call: &str) -> usize {
        fake_gl::with(|s| s.calls.iter().filter(|c| **c == call).count())
    }

    #[test]
    fn test_redundant_binds_are_skipped() {
        fake_gl::reset();
        let gl = gl();
        let mut state = OglState::new();

        state.bind_texture_2d(&gl, 3);
        state.bind_texture_2d(&gl, 3);
        state.bind_texture_2d(&gl, 4);
        assert_eq!(count("glBindTexture"), 2);

        state.use_program(&gl, 7);
        state.use_program(&gl, 7);
        assert_eq!(count("glUseProgram"), 1);
    }

    #[test]
    fn test_redundant_toggles_are_skipped() {
        fake_gl::reset();
        let gl = gl();
        let mut state = OglState::new();

        state.enable_blending(&gl, true);
        state.enable_blending(&gl, true);
        state.enable_blending(&gl, false);
        assert_eq!(count("glEnable"), 1);
        assert_eq!(count("glDisable"), 1);
        assert!(!fake_gl::with(|s| s.enabled.contains(&GL_BLEND)));
    }

    #[test]
    fn test_vertex_array_change_invalidates_element_buffer() {
        fake_gl::reset();
        let gl = gl();
        let mut state = OglState::new();

        state.bind_buffer(&gl, GL_ELEMENT_ARRAY_BUFFER, 5);
        state.bind_vertex_array(&gl, 2);
        state.bind_buffer(&gl, GL_ELEMENT_ARRAY_BUFFER, 5);
        assert_eq!(count("glBindBuffer"), 2);
    }

    #[test]
    fn test_reset_forgets_everything() {
        fake_gl::reset();
        let gl = gl();
        let mut state = OglState::new();

        state.enable_depth_write(&gl, false);
        state.reset();
        state.enable_depth_write(&gl, false);
        assert_eq!(count("glDepthMask"), 2);
    }

    #[test]
    fn test_forget_name_after_delete() {
        fake_gl::reset();
        let gl = gl();
        let mut state = OglState::new();

        state.bind_texture_2d(&gl, 9);
        state.forget_name(9);
        assert_eq!(state.texture_2d(), None);
    }
}
