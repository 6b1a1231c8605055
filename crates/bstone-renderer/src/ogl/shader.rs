// shader.rs -- vertex and fragment shader objects

use super::gl::*;
use super::handle::{self, OglHandle};
use crate::r3r::*;
use std::ffi::CString;
use std::rc::Rc;

pub fn gl_shader_type(kind: R3rShaderType) -> GLenum {
    match kind {
        R3rShaderType::Vertex => GL_VERTEX_SHADER,
        R3rShaderType::Fragment => GL_FRAGMENT_SHADER,
    }
}

pub struct OglShader {
    kind: R3rShaderType,
    source: String,
    handle: OglHandle,
}

impl OglShader {
    /// Compile `param.source`. A failed compile carries the driver's log.
    pub fn new(gl: &Rc<GlFns>, param: &R3rShaderInitParam<'_>) -> R3rResult<Self> {
        if param.source.is_empty() {
            return Err(R3rError::contract(format!("Empty {} shader source.", param.kind.name())));
        }

        let mut shader = Self {
            kind: param.kind,
            source: param.source.to_string(),
            handle: OglHandle::new(gl, 0, handle::delete_shader),
        };

        shader.recreate(gl)?;
        Ok(shader)
    }

    pub fn kind(&self) -> R3rShaderType {
        self.kind
    }

    pub fn gl_name(&self) -> GLuint {
        self.handle.get()
    }

    /// Compile the kept source again into a new shader object.
    pub fn recreate(&mut self, gl: &Rc<GlFns>) -> R3rResult<()> {
        self.handle.reset();

        let (create, source, compile, get_iv) = match (gl.create_shader, gl.shader_source, gl.compile_shader, gl.get_shaderiv) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => return Err(R3rError::contract("Shader objects not available.")),
        };

        let c_source = CString::new(self.source.as_str())
            .map_err(|_| R3rError::contract("Shader source contains a NUL byte."))?;

        // SAFETY: plain enum argument.
        let name = unsafe { create(gl_shader_type(self.kind)) };
        if name == 0 {
            return Err(R3rError::contract(format!("Failed to create a {} shader.", self.kind.name())));
        }

        let handle = OglHandle::new(gl, name, handle::delete_shader);

        let mut status: GLint = 0;
        // SAFETY: one NUL-terminated string is passed with a null length array.
        unsafe {
            let ptr = c_source.as_ptr();
            source(name, 1, &ptr, std::ptr::null());
            compile(name);
            get_iv(name, GL_COMPILE_STATUS, &mut status);
        }

        if status == 0 {
            return Err(R3rError::ShaderCompile {
                message: format!("Failed to compile a {} shader.", self.kind.name()),
                info_log: shader_info_log(gl, name),
            });
        }

        self.handle = handle;
        Ok(())
    }

    pub fn release(&mut self) {
        self.handle.reset();
    }

    pub fn abandon(&mut self) {
        self.handle.abandon();
    }
}

pub fn shader_info_log(gl: &GlFns, name: GLuint) -> String {
    match (gl.get_shaderiv, gl.get_shader_info_log) {
        (Some(get_iv), Some(get_log)) => read_info_log(name, get_iv, get_log),
        _ => String::new(),
    }
}

pub fn program_info_log(gl: &GlFns, name: GLuint) -> String {
    match (gl.get_programiv, gl.get_program_info_log) {
        (Some(get_iv), Some(get_log)) => read_info_log(name, get_iv, get_log),
        _ => String::new(),
    }
}

fn read_info_log(
    name: GLuint,
    get_iv: unsafe extern "system" fn(GLuint, GLenum, *mut GLint),
    get_log: unsafe extern "system" fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
) -> String {
    let mut length: GLint = 0;
    // SAFETY: one integer is written into `length`.
    unsafe { get_iv(name, GL_INFO_LOG_LENGTH, &mut length) };

    if length <= 1 {
        return String::new();
    }

    let mut buffer = vec![0u8; length as usize];
    let mut written: GLsizei = 0;
    // SAFETY: `buffer` holds `length` bytes.
    unsafe { get_log(name, length, &mut written, buffer.as_mut_ptr() as *mut GLchar) };

    buffer.truncate(written.clamp(0, length) as usize);
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}
