// handle.rs -- RAII ownership of GL object names

use super::gl::*;
use std::rc::Rc;

/// Deletes one GL name of a particular object kind.
pub type OglDeleter = fn(&GlFns, GLuint);

/// Owns a GL object name and deletes it on drop.
///
/// The handle keeps the function table alive, so it can never outlive the
/// entry points needed to release it. A name of zero is never deleted.
pub struct OglHandle {
    gl: Rc<GlFns>,
    name: GLuint,
    deleter: OglDeleter,
}

impl OglHandle {
    pub fn new(gl: &Rc<GlFns>, name: GLuint, deleter: OglDeleter) -> Self {
        Self {
            gl: Rc::clone(gl),
            name,
            deleter,
        }
    }

    pub fn get(&self) -> GLuint {
        self.name
    }

    pub fn gl(&self) -> &GlFns {
        &self.gl
    }

    pub fn is_empty(&self) -> bool {
        self.name == 0
    }

    /// Delete the object now. Further calls do nothing.
    pub fn reset(&mut self) {
        if self.name != 0 {
            (self.deleter)(&self.gl, self.name);
            self.name = 0;
        }
    }

    /// Forget the name without deleting it.
    ///
    /// Used after a context loss, when the name no longer refers to anything.
    pub fn abandon(&mut self) {
        self.name = 0;
    }
}

impl Drop for OglHandle {
    fn drop(&mut self) {
        self.reset();
    }
}

impl std::fmt::Debug for OglHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OglHandle").field(&self.name).finish()
    }
}

// ============================================================
// Deleters
// ============================================================

pub fn delete_texture(gl: &GlFns, name: GLuint) {
    // SAFETY: one name is read from `name`.
    unsafe { (gl.delete_textures)(1, &name) };
}

pub fn delete_buffer(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_buffers {
        // SAFETY: one name is read from `name`.
        unsafe { f(1, &name) };
    }
}

pub fn delete_shader(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_shader {
        // SAFETY: plain name argument.
        unsafe { f(name) };
    }
}

pub fn delete_program(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_program {
        // SAFETY: plain name argument.
        unsafe { f(name) };
    }
}

pub fn delete_vertex_array(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_vertex_arrays {
        // SAFETY: one name is read from `name`.
        unsafe { f(1, &name) };
    }
}

pub fn delete_sampler(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_samplers {
        // SAFETY: one name is read from `name`.
        unsafe { f(1, &name) };
    }
}

pub fn delete_framebuffer(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_framebuffers {
        // SAFETY: one name is read from `name`.
        unsafe { f(1, &name) };
    }
}

pub fn delete_renderbuffer(gl: &GlFns, name: GLuint) {
    if let Some(f) = gl.delete_renderbuffers {
        // SAFETY: one name is read from `name`.
        unsafe { f(1, &name) };
    }
}

// ============================================================
// Name generation
// ============================================================

/// Call a `glGen*` style function for a single name. Zero means failure.
pub fn gen_name(f: unsafe extern "system" fn(GLsizei, *mut GLuint)) -> GLuint {
    let mut name: GLuint = 0;
    // SAFETY: one name is written into `name`.
    unsafe { f(1, &mut name) };
    name
}
