// fake_gl.rs -- in-process GL driver and window manager for unit tests
//
// Every entry point records its name in `FakeState::calls` and keeps just
// enough object state for the tests to observe what the renderer did. The
// state is thread local; each test starts with `reset()`.

#![allow(clippy::too_many_arguments, clippy::missing_safety_doc)]

use crate::ogl::gl::*;
use crate::sys::{GlContext, GlContextProfile, GlSymbolLoader, GlWindow, GlWindowAttributes, WindowMgr};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::ptr;

pub const FAKE_VENDOR: &str = "Fake Vendor";
pub const FAKE_RENDERER: &str = "Fake Renderer";
pub const FAKE_COMPILE_LOG: &str = "0:1: syntax error";
pub const FAKE_LINK_LOG: &str = "link failed: unresolved symbol";

// ============================================================
// State
// ============================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FakeLevel {
    pub width: i32,
    pub height: i32,
    pub pixels: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct FakeTexture {
    pub levels: Vec<FakeLevel>,
    pub params: HashMap<GLenum, i32>,
}

#[derive(Clone, Debug)]
pub struct FakeShader {
    pub kind: GLenum,
    pub source: String,
    pub is_compiled: bool,
}

/// An active attribute or uniform the next linked program reports.
#[derive(Clone, Debug)]
pub struct FakeVar {
    pub name: String,
    pub gl_type: GLenum,
    pub size: GLint,
}

impl FakeVar {
    pub fn new(name: &str, gl_type: GLenum) -> Self {
        Self {
            name: name.to_string(),
            gl_type,
            size: 1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeProgram {
    pub bound_attribs: HashMap<String, GLuint>,
    pub attributes: Vec<FakeVar>,
    pub uniforms: Vec<FakeVar>,
    pub is_linked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FakeAttribPointer {
    pub size: GLint,
    pub kind: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    pub offset: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FakeRenderbuffer {
    pub samples: GLsizei,
    pub format: GLenum,
    pub width: GLsizei,
    pub height: GLsizei,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FakeDraw {
    pub mode: GLenum,
    pub count: GLsizei,
    pub index_type: GLenum,
    pub offset: usize,
}

pub struct FakeState {
    // Driver strings and queries.
    version: CString,
    extensions: Vec<CString>,
    extension_string: CString,
    vendor: CString,
    renderer: CString,
    integers: HashMap<GLenum, GLint>,
    floats: HashMap<GLenum, GLfloat>,
    hidden: HashSet<String>,
    pub null_strings: bool,
    pub pending_error: GLenum,
    pub reset_status: GLenum,

    pub calls: Vec<&'static str>,
    next_name: GLuint,

    // Fixed state.
    pub enabled: HashSet<GLenum>,
    pub client_states: HashSet<GLenum>,
    pub current_color: [f32; 4],
    pub viewport: [i32; 4],
    pub matrix_mode: GLenum,
    pub matrices: HashMap<GLenum, [f32; 16]>,
    pub tex_env_mode: i32,

    // Buffers.
    pub buffers: HashMap<GLuint, Vec<u8>>,
    pub bound_buffers: HashMap<GLenum, GLuint>,
    pub deleted_buffers: Vec<GLuint>,

    // Textures.
    pub textures: HashMap<GLuint, FakeTexture>,
    pub bound_texture: GLuint,
    pub deleted_textures: Vec<GLuint>,

    // Shaders and programs.
    pub shaders: HashMap<GLuint, FakeShader>,
    pub deleted_shaders: Vec<GLuint>,
    pub programs: HashMap<GLuint, FakeProgram>,
    pub deleted_programs: Vec<GLuint>,
    pub next_attributes: Vec<FakeVar>,
    pub next_uniforms: Vec<FakeVar>,
    pub link_fails: bool,
    pub current_program: GLuint,
    pub uniform_calls: Vec<GLint>,
    pub attrib_pointers: HashMap<GLuint, FakeAttribPointer>,

    // Vertex arrays and samplers.
    pub bound_vertex_array: GLuint,
    pub deleted_vertex_arrays: Vec<GLuint>,
    pub deleted_samplers: Vec<GLuint>,

    // Framebuffers.
    pub read_framebuffer: GLuint,
    pub draw_framebuffer: GLuint,
    pub framebuffer_incomplete: bool,
    pub renderbuffers: HashMap<GLuint, FakeRenderbuffer>,
    pub bound_renderbuffer: GLuint,
    pub deleted_framebuffers: Vec<GLuint>,
    pub deleted_renderbuffers: Vec<GLuint>,
    pub blits: Vec<(GLuint, GLuint, i32, i32)>,

    pub draws: Vec<FakeDraw>,

    // Windows.
    pub max_window_samples: i32,
    pub vsync_supported: bool,
    pub rejected_profiles: Vec<GlContextProfile>,
    pub created_windows: Vec<GlWindowAttributes>,
    pub live_windows: usize,
    pub windows_visible: Vec<bool>,
    pub window_title: String,
    pub swap_interval: i32,
    pub swaps: usize,
    pub context_recreations: usize,
    pub current_context: u32,
    pub fail_make_current: bool,
    next_context: u32,
}

impl Default for FakeState {
    fn default() -> Self {
        let mut integers = HashMap::new();
        integers.insert(GL_MAX_TEXTURE_SIZE, 4096);
        integers.insert(GL_MAX_VERTEX_ATTRIBS, 16);
        integers.insert(GL_MAX_SAMPLES, 0);

        let mut state = Self {
            version: CString::default(),
            extensions: Vec::new(),
            extension_string: CString::default(),
            vendor: to_cstring(FAKE_VENDOR),
            renderer: to_cstring(FAKE_RENDERER),
            integers,
            floats: HashMap::new(),
            hidden: HashSet::new(),
            null_strings: false,
            pending_error: GL_NO_ERROR,
            reset_status: GL_NO_ERROR,

            calls: Vec::new(),
            next_name: 1,

            enabled: HashSet::new(),
            client_states: HashSet::new(),
            current_color: [1.0; 4],
            viewport: [0; 4],
            matrix_mode: GL_MODELVIEW,
            matrices: HashMap::new(),
            tex_env_mode: 0,

            buffers: HashMap::new(),
            bound_buffers: HashMap::new(),
            deleted_buffers: Vec::new(),

            textures: HashMap::new(),
            bound_texture: 0,
            deleted_textures: Vec::new(),

            shaders: HashMap::new(),
            deleted_shaders: Vec::new(),
            programs: HashMap::new(),
            deleted_programs: Vec::new(),
            next_attributes: Vec::new(),
            next_uniforms: Vec::new(),
            link_fails: false,
            current_program: 0,
            uniform_calls: Vec::new(),
            attrib_pointers: HashMap::new(),

            bound_vertex_array: 0,
            deleted_vertex_arrays: Vec::new(),
            deleted_samplers: Vec::new(),

            read_framebuffer: 0,
            draw_framebuffer: 0,
            framebuffer_incomplete: false,
            renderbuffers: HashMap::new(),
            bound_renderbuffer: 0,
            deleted_framebuffers: Vec::new(),
            deleted_renderbuffers: Vec::new(),
            blits: Vec::new(),

            draws: Vec::new(),

            max_window_samples: 0,
            vsync_supported: true,
            rejected_profiles: Vec::new(),
            created_windows: Vec::new(),
            live_windows: 0,
            windows_visible: Vec::new(),
            window_title: String::new(),
            swap_interval: 0,
            swaps: 0,
            context_recreations: 0,
            current_context: 0,
            fail_make_current: false,
            next_context: 1,
        };

        state.set_version("2.1 Fake");
        state
    }
}

impl FakeState {
    pub fn set_version(&mut self, version: &str) {
        self.version = to_cstring(version);
    }

    pub fn set_extensions(&mut self, names: &[&str]) {
        self.extensions = names.iter().map(|n| to_cstring(n)).collect();
        self.extension_string = to_cstring(&names.join(" "));
    }

    /// Make the loader return null for `symbol`.
    pub fn hide_symbol(&mut self, symbol: &str) {
        self.hidden.insert(symbol.to_string());
    }

    pub fn set_integer(&mut self, pname: GLenum, value: GLint) {
        self.integers.insert(pname, value);
    }

    pub fn set_float(&mut self, pname: GLenum, value: GLfloat) {
        self.floats.insert(pname, value);
    }

    fn gen_name(&mut self) -> GLuint {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn bound_texture_mut(&mut self) -> &mut FakeTexture {
        self.textures.entry(self.bound_texture).or_default()
    }

    /// Objects of a lost context are gone.
    fn drop_objects(&mut self) {
        self.buffers.clear();
        self.textures.clear();
        self.shaders.clear();
        self.programs.clear();
        self.renderbuffers.clear();
    }
}

fn to_cstring(s: &str) -> CString {
    CString::new(s).unwrap_or_default()
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

/// Start over with a default 2.1 compatibility driver.
pub fn reset() {
    STATE.with(|s| *s.borrow_mut() = FakeState::default());
}

pub fn with<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

fn call<R>(name: &'static str, f: impl FnOnce(&mut FakeState) -> R) -> R {
    with(|s| {
        s.calls.push(name);
        f(s)
    })
}

// ============================================================
// Helpers for pointer arguments
// ============================================================

unsafe fn read_names(n: GLsizei, names: *const GLuint) -> Vec<GLuint> {
    if names.is_null() || n <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(names, n as usize).to_vec()
}

unsafe fn write_names(s: &mut FakeState, n: GLsizei, names: *mut GLuint) -> Vec<GLuint> {
    let mut result = Vec::new();
    for i in 0..n.max(0) as usize {
        let name = s.gen_name();
        *names.add(i) = name;
        result.push(name);
    }
    result
}

unsafe fn read_str(name: *const GLchar) -> String {
    if name.is_null() {
        return String::new();
    }
    CStr::from_ptr(name).to_string_lossy().into_owned()
}

unsafe fn write_str(value: &str, buf_size: GLsizei, length: *mut GLsizei, out: *mut GLchar) {
    let count = value.len().min((buf_size.max(1) - 1) as usize);
    if !out.is_null() {
        ptr::copy_nonoverlapping(value.as_ptr() as *const GLchar, out, count);
        *out.add(count) = 0;
    }
    if !length.is_null() {
        *length = count as GLsizei;
    }
}

// ============================================================
// Core entry points
// ============================================================

unsafe extern "system" fn gl_bind_texture(_target: GLenum, name: GLuint) {
    call("glBindTexture", |s| {
        s.bound_texture = name;
        if name != 0 {
            s.textures.entry(name).or_default();
        }
    })
}

unsafe extern "system" fn gl_blend_func(_src: GLenum, _dst: GLenum) {
    call("glBlendFunc", |_| ())
}

unsafe extern "system" fn gl_clear(_mask: GLbitfield) {
    call("glClear", |_| ())
}

unsafe extern "system" fn gl_clear_color(_r: GLclampf, _g: GLclampf, _b: GLclampf, _a: GLclampf) {
    call("glClearColor", |_| ())
}

unsafe extern "system" fn gl_cull_face(_mode: GLenum) {
    call("glCullFace", |_| ())
}

unsafe extern "system" fn gl_delete_textures(n: GLsizei, names: *const GLuint) {
    let names = read_names(n, names);
    call("glDeleteTextures", |s| {
        for name in names {
            s.textures.remove(&name);
            s.deleted_textures.push(name);
        }
    })
}

unsafe extern "system" fn gl_depth_func(_func: GLenum) {
    call("glDepthFunc", |_| ())
}

unsafe extern "system" fn gl_depth_mask(_flag: GLboolean) {
    call("glDepthMask", |_| ())
}

unsafe extern "system" fn gl_disable(cap: GLenum) {
    call("glDisable", |s| {
        s.enabled.remove(&cap);
    })
}

unsafe extern "system" fn gl_draw_arrays(mode: GLenum, _first: GLint, count: GLsizei) {
    call("glDrawArrays", |s| {
        s.draws.push(FakeDraw {
            mode,
            count,
            index_type: 0,
            offset: 0,
        })
    })
}

unsafe extern "system" fn gl_draw_elements(mode: GLenum, count: GLsizei, index_type: GLenum, indices: *const c_void) {
    call("glDrawElements", |s| {
        s.draws.push(FakeDraw {
            mode,
            count,
            index_type,
            offset: indices as usize,
        })
    })
}

unsafe extern "system" fn gl_enable(cap: GLenum) {
    call("glEnable", |s| {
        s.enabled.insert(cap);
    })
}

unsafe extern "system" fn gl_finish() {
    call("glFinish", |_| ())
}

unsafe extern "system" fn gl_flush() {
    call("glFlush", |_| ())
}

unsafe extern "system" fn gl_front_face(_mode: GLenum) {
    call("glFrontFace", |_| ())
}

unsafe extern "system" fn gl_gen_textures(n: GLsizei, names: *mut GLuint) {
    call("glGenTextures", |s| {
        for name in write_names(s, n, names) {
            s.textures.insert(name, FakeTexture::default());
        }
    })
}

unsafe extern "system" fn gl_get_error() -> GLenum {
    call("glGetError", |s| std::mem::replace(&mut s.pending_error, GL_NO_ERROR))
}

unsafe extern "system" fn gl_get_floatv(pname: GLenum, data: *mut GLfloat) {
    call("glGetFloatv", |s| {
        *data = s.floats.get(&pname).copied().unwrap_or(0.0);
    })
}

unsafe extern "system" fn gl_get_integerv(pname: GLenum, data: *mut GLint) {
    call("glGetIntegerv", |s| match pname {
        GL_MAX_VIEWPORT_DIMS => {
            *data = 4096;
            *data.add(1) = 4096;
        }
        GL_VIEWPORT => {
            for (i, v) in s.viewport.iter().enumerate() {
                *data.add(i) = *v;
            }
        }
        GL_NUM_EXTENSIONS => *data = s.extensions.len() as GLint,
        _ => *data = s.integers.get(&pname).copied().unwrap_or(0),
    })
}

unsafe extern "system" fn gl_get_string(name: GLenum) -> *const GLubyte {
    call("glGetString", |s| {
        if s.null_strings {
            return ptr::null();
        }

        let value = match name {
            GL_VENDOR => &s.vendor,
            GL_RENDERER => &s.renderer,
            GL_VERSION => &s.version,
            GL_EXTENSIONS => &s.extension_string,
            _ => return ptr::null(),
        };

        value.as_ptr() as *const GLubyte
    })
}

unsafe extern "system" fn gl_pixel_storei(_pname: GLenum, _param: GLint) {
    call("glPixelStorei", |_| ())
}

/// Fills row `y` (bottom-up) with the byte `y`.
unsafe extern "system" fn gl_read_pixels(
    _x: GLint,
    _y: GLint,
    width: GLsizei,
    height: GLsizei,
    format: GLenum,
    _kind: GLenum,
    data: *mut c_void,
) {
    call("glReadPixels", |_| {
        let components = if format == GL_RGBA { 4 } else { 3 };
        let row_size = width.max(0) as usize * components;
        let out = data as *mut u8;

        for row in 0..height.max(0) as usize {
            ptr::write_bytes(out.add(row * row_size), row as u8, row_size);
        }
    })
}

unsafe extern "system" fn gl_scissor(_x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {
    call("glScissor", |_| ())
}

unsafe extern "system" fn gl_tex_image_2d(
    _target: GLenum,
    level: GLint,
    _internal_format: GLint,
    width: GLsizei,
    height: GLsizei,
    _border: GLint,
    _format: GLenum,
    _kind: GLenum,
    data: *const c_void,
) {
    call("glTexImage2D", |s| {
        let size = (width.max(0) * height.max(0) * 4) as usize;
        let pixels = if data.is_null() {
            vec![0; size]
        } else {
            std::slice::from_raw_parts(data as *const u8, size).to_vec()
        };

        let texture = s.bound_texture_mut();
        let level = level.max(0) as usize;
        if texture.levels.len() <= level {
            texture.levels.resize(level + 1, FakeLevel::default());
        }
        texture.levels[level] = FakeLevel { width, height, pixels };
    })
}

unsafe extern "system" fn gl_tex_parameterf(_target: GLenum, _pname: GLenum, _param: GLfloat) {
    call("glTexParameterf", |_| ())
}

unsafe extern "system" fn gl_tex_parameteri(_target: GLenum, pname: GLenum, param: GLint) {
    call("glTexParameteri", |s| {
        s.bound_texture_mut().params.insert(pname, param);
    })
}

unsafe extern "system" fn gl_tex_sub_image_2d(
    _target: GLenum,
    level: GLint,
    x: GLint,
    y: GLint,
    width: GLsizei,
    height: GLsizei,
    _format: GLenum,
    _kind: GLenum,
    data: *const c_void,
) {
    call("glTexSubImage2D", |s| {
        let texture = s.bound_texture_mut();
        let level = match texture.levels.get_mut(level.max(0) as usize) {
            Some(l) => l,
            None => return,
        };

        let src = std::slice::from_raw_parts(data as *const u8, (width * height * 4).max(0) as usize);
        for row in 0..height {
            let dst_offset = (((y + row) * level.width + x) * 4) as usize;
            let src_offset = (row * width * 4) as usize;
            let count = (width * 4) as usize;
            level.pixels[dst_offset..dst_offset + count].copy_from_slice(&src[src_offset..src_offset + count]);
        }
    })
}

unsafe extern "system" fn gl_viewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
    call("glViewport", |s| s.viewport = [x, y, width, height])
}

// ============================================================
// Fixed-function entry points
// ============================================================

unsafe extern "system" fn gl_matrix_mode(mode: GLenum) {
    call("glMatrixMode", |s| s.matrix_mode = mode)
}

unsafe extern "system" fn gl_load_matrixf(m: *const GLfloat) {
    let mut matrix = [0.0; 16];
    matrix.copy_from_slice(std::slice::from_raw_parts(m, 16));
    call("glLoadMatrixf", |s| {
        s.matrices.insert(s.matrix_mode, matrix);
    })
}

unsafe extern "system" fn gl_load_identity() {
    call("glLoadIdentity", |s| {
        let mut identity = [0.0; 16];
        for i in 0..4 {
            identity[i * 5] = 1.0;
        }
        s.matrices.insert(s.matrix_mode, identity);
    })
}

unsafe extern "system" fn gl_enable_client_state(array: GLenum) {
    call("glEnableClientState", |s| {
        s.client_states.insert(array);
    })
}

unsafe extern "system" fn gl_disable_client_state(array: GLenum) {
    call("glDisableClientState", |s| {
        s.client_states.remove(&array);
    })
}

unsafe extern "system" fn gl_vertex_pointer(_size: GLint, _kind: GLenum, _stride: GLsizei, _ptr: *const c_void) {
    call("glVertexPointer", |_| ())
}

unsafe extern "system" fn gl_color_pointer(_size: GLint, _kind: GLenum, _stride: GLsizei, _ptr: *const c_void) {
    call("glColorPointer", |_| ())
}

unsafe extern "system" fn gl_tex_coord_pointer(_size: GLint, _kind: GLenum, _stride: GLsizei, _ptr: *const c_void) {
    call("glTexCoordPointer", |_| ())
}

unsafe extern "system" fn gl_tex_envi(_target: GLenum, pname: GLenum, param: GLint) {
    call("glTexEnvi", |s| {
        if pname == GL_TEXTURE_ENV_MODE {
            s.tex_env_mode = param;
        }
    })
}

unsafe extern "system" fn gl_color4f(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
    call("glColor4f", |s| s.current_color = [r, g, b, a])
}

unsafe extern "system" fn gl_active_texture(_unit: GLenum) {
    call("glActiveTexture", |_| ())
}

unsafe extern "system" fn gl_depth_range(_near: f64, _far: f64) {
    call("glDepthRange", |_| ())
}

unsafe extern "system" fn gl_depth_rangef(_near: GLfloat, _far: GLfloat) {
    call("glDepthRangef", |_| ())
}

// ============================================================
// Buffer objects
// ============================================================

unsafe extern "system" fn gl_gen_buffers(n: GLsizei, names: *mut GLuint) {
    call("glGenBuffers", |s| {
        for name in write_names(s, n, names) {
            s.buffers.insert(name, Vec::new());
        }
    })
}

unsafe extern "system" fn gl_delete_buffers(n: GLsizei, names: *const GLuint) {
    let names = read_names(n, names);
    call("glDeleteBuffers", |s| {
        for name in names {
            s.buffers.remove(&name);
            s.deleted_buffers.push(name);
        }
    })
}

unsafe extern "system" fn gl_bind_buffer(target: GLenum, name: GLuint) {
    call("glBindBuffer", |s| {
        s.bound_buffers.insert(target, name);
    })
}

unsafe extern "system" fn gl_buffer_data(target: GLenum, size: GLsizeiptr, data: *const c_void, _usage: GLenum) {
    call("glBufferData", |s| {
        let bytes = if data.is_null() {
            vec![0; size.max(0) as usize]
        } else {
            std::slice::from_raw_parts(data as *const u8, size.max(0) as usize).to_vec()
        };

        let name = s.bound_buffers.get(&target).copied().unwrap_or(0);
        s.buffers.insert(name, bytes);
    })
}

unsafe extern "system" fn gl_buffer_sub_data(target: GLenum, offset: GLintptr, size: GLsizeiptr, data: *const c_void) {
    call("glBufferSubData", |s| {
        let name = s.bound_buffers.get(&target).copied().unwrap_or(0);
        let src = std::slice::from_raw_parts(data as *const u8, size.max(0) as usize);

        if let Some(buffer) = s.buffers.get_mut(&name) {
            let offset = offset as usize;
            if offset + src.len() <= buffer.len() {
                buffer[offset..offset + src.len()].copy_from_slice(src);
            } else {
                s.pending_error = GL_INVALID_VALUE;
            }
        }
    })
}

// ============================================================
// Shaders and programs
// ============================================================

unsafe extern "system" fn gl_create_shader(kind: GLenum) -> GLuint {
    call("glCreateShader", |s| {
        let name = s.gen_name();
        s.shaders.insert(
            name,
            FakeShader {
                kind,
                source: String::new(),
                is_compiled: false,
            },
        );
        name
    })
}

unsafe extern "system" fn gl_delete_shader(name: GLuint) {
    call("glDeleteShader", |s| {
        s.shaders.remove(&name);
        s.deleted_shaders.push(name);
    })
}

unsafe extern "system" fn gl_shader_source(name: GLuint, count: GLsizei, strings: *const *const GLchar, _lengths: *const GLint) {
    let mut source = String::new();
    for i in 0..count.max(0) as usize {
        source.push_str(&read_str(*strings.add(i)));
    }

    call("glShaderSource", |s| {
        if let Some(shader) = s.shaders.get_mut(&name) {
            shader.source = source;
        }
    })
}

unsafe extern "system" fn gl_compile_shader(name: GLuint) {
    call("glCompileShader", |s| {
        if let Some(shader) = s.shaders.get_mut(&name) {
            shader.is_compiled = !shader.source.contains("FAIL");
        }
    })
}

unsafe extern "system" fn gl_get_shaderiv(name: GLuint, pname: GLenum, out: *mut GLint) {
    call("glGetShaderiv", |s| {
        let is_compiled = s.shaders.get(&name).is_some_and(|sh| sh.is_compiled);
        *out = match pname {
            GL_COMPILE_STATUS => is_compiled as GLint,
            GL_INFO_LOG_LENGTH if !is_compiled => FAKE_COMPILE_LOG.len() as GLint + 1,
            _ => 0,
        };
    })
}

unsafe extern "system" fn gl_get_shader_info_log(_name: GLuint, buf_size: GLsizei, length: *mut GLsizei, log: *mut GLchar) {
    call("glGetShaderInfoLog", |_| write_str(FAKE_COMPILE_LOG, buf_size, length, log))
}

unsafe extern "system" fn gl_create_program() -> GLuint {
    call("glCreateProgram", |s| {
        let name = s.gen_name();
        s.programs.insert(name, FakeProgram::default());
        name
    })
}

unsafe extern "system" fn gl_delete_program(name: GLuint) {
    call("glDeleteProgram", |s| {
        s.programs.remove(&name);
        s.deleted_programs.push(name);
    })
}

unsafe extern "system" fn gl_attach_shader(_program: GLuint, _shader: GLuint) {
    call("glAttachShader", |_| ())
}

unsafe extern "system" fn gl_detach_shader(_program: GLuint, _shader: GLuint) {
    call("glDetachShader", |_| ())
}

unsafe extern "system" fn gl_link_program(name: GLuint) {
    call("glLinkProgram", |s| {
        let attributes = s.next_attributes.clone();
        let uniforms = s.next_uniforms.clone();
        let is_linked = !s.link_fails;

        if let Some(program) = s.programs.get_mut(&name) {
            program.attributes = attributes;
            program.uniforms = uniforms;
            program.is_linked = is_linked;
        }
    })
}

fn max_name_length(vars: &[FakeVar]) -> GLint {
    vars.iter().map(|v| v.name.len() as GLint + 1).max().unwrap_or(0)
}

unsafe extern "system" fn gl_get_programiv(name: GLuint, pname: GLenum, out: *mut GLint) {
    call("glGetProgramiv", |s| {
        let program = s.programs.get(&name).cloned().unwrap_or_default();
        *out = match pname {
            GL_LINK_STATUS => program.is_linked as GLint,
            GL_INFO_LOG_LENGTH if !program.is_linked => FAKE_LINK_LOG.len() as GLint + 1,
            GL_ACTIVE_ATTRIBUTES => program.attributes.len() as GLint,
            GL_ACTIVE_ATTRIBUTE_MAX_LENGTH => max_name_length(&program.attributes),
            GL_ACTIVE_UNIFORMS => program.uniforms.len() as GLint,
            GL_ACTIVE_UNIFORM_MAX_LENGTH => max_name_length(&program.uniforms),
            _ => 0,
        };
    })
}

unsafe extern "system" fn gl_get_program_info_log(_name: GLuint, buf_size: GLsizei, length: *mut GLsizei, log: *mut GLchar) {
    call("glGetProgramInfoLog", |_| write_str(FAKE_LINK_LOG, buf_size, length, log))
}

unsafe extern "system" fn gl_use_program(name: GLuint) {
    call("glUseProgram", |s| s.current_program = name)
}

unsafe extern "system" fn gl_bind_attrib_location(program: GLuint, index: GLuint, name: *const GLchar) {
    let name = read_str(name);
    call("glBindAttribLocation", |s| {
        if let Some(p) = s.programs.get_mut(&program) {
            p.bound_attribs.insert(name, index);
        }
    })
}

unsafe fn write_active_var(
    var: Option<&FakeVar>,
    buf_size: GLsizei,
    length: *mut GLsizei,
    size: *mut GLint,
    kind: *mut GLenum,
    name: *mut GLchar,
) {
    match var {
        Some(v) => {
            write_str(&v.name, buf_size, length, name);
            *size = v.size;
            *kind = v.gl_type;
        }
        None => {
            write_str("", buf_size, length, name);
            *size = 0;
            *kind = 0;
        }
    }
}

unsafe extern "system" fn gl_get_active_attrib(
    program: GLuint,
    index: GLuint,
    buf_size: GLsizei,
    length: *mut GLsizei,
    size: *mut GLint,
    kind: *mut GLenum,
    name: *mut GLchar,
) {
    call("glGetActiveAttrib", |s| {
        let var = s.programs.get(&program).and_then(|p| p.attributes.get(index as usize));
        write_active_var(var, buf_size, length, size, kind, name);
    })
}

unsafe extern "system" fn gl_get_active_uniform(
    program: GLuint,
    index: GLuint,
    buf_size: GLsizei,
    length: *mut GLsizei,
    size: *mut GLint,
    kind: *mut GLenum,
    name: *mut GLchar,
) {
    call("glGetActiveUniform", |s| {
        let var = s.programs.get(&program).and_then(|p| p.uniforms.get(index as usize));
        write_active_var(var, buf_size, length, size, kind, name);
    })
}

unsafe extern "system" fn gl_get_attrib_location(program: GLuint, name: *const GLchar) -> GLint {
    let name = read_str(name);
    call("glGetAttribLocation", |s| {
        let program = match s.programs.get(&program) {
            Some(p) => p,
            None => return -1,
        };

        if let Some(index) = program.bound_attribs.get(&name) {
            return *index as GLint;
        }

        program
            .attributes
            .iter()
            .position(|v| v.name == name)
            .map_or(-1, |i| i as GLint)
    })
}

unsafe extern "system" fn gl_get_uniform_location(program: GLuint, name: *const GLchar) -> GLint {
    let name = read_str(name);
    call("glGetUniformLocation", |s| {
        s.programs
            .get(&program)
            .and_then(|p| p.uniforms.iter().position(|v| v.name == name))
            .map_or(-1, |i| i as GLint)
    })
}

unsafe extern "system" fn gl_uniform1i(location: GLint, _v: GLint) {
    call("glUniform1i", |s| s.uniform_calls.push(location))
}

unsafe extern "system" fn gl_uniform1f(location: GLint, _v: GLfloat) {
    call("glUniform1f", |s| s.uniform_calls.push(location))
}

unsafe extern "system" fn gl_uniform2fv(location: GLint, _count: GLsizei, _v: *const GLfloat) {
    call("glUniform2fv", |s| s.uniform_calls.push(location))
}

unsafe extern "system" fn gl_uniform4fv(location: GLint, _count: GLsizei, _v: *const GLfloat) {
    call("glUniform4fv", |s| s.uniform_calls.push(location))
}

unsafe extern "system" fn gl_uniform_matrix4fv(location: GLint, _count: GLsizei, _transpose: GLboolean, _v: *const GLfloat) {
    call("glUniformMatrix4fv", |s| s.uniform_calls.push(location))
}

unsafe extern "system" fn gl_enable_vertex_attrib_array(_index: GLuint) {
    call("glEnableVertexAttribArray", |_| ())
}

unsafe extern "system" fn gl_disable_vertex_attrib_array(_index: GLuint) {
    call("glDisableVertexAttribArray", |_| ())
}

unsafe extern "system" fn gl_vertex_attrib_pointer(
    index: GLuint,
    size: GLint,
    kind: GLenum,
    normalized: GLboolean,
    stride: GLsizei,
    pointer: *const c_void,
) {
    call("glVertexAttribPointer", |s| {
        s.attrib_pointers.insert(
            index,
            FakeAttribPointer {
                size,
                kind,
                normalized: normalized != GL_FALSE,
                stride,
                offset: pointer as usize,
            },
        );
    })
}

unsafe extern "system" fn gl_vertex_attrib4fv(_index: GLuint, _v: *const GLfloat) {
    call("glVertexAttrib4fv", |_| ())
}

unsafe extern "system" fn gl_generate_mipmap(_target: GLenum) {
    call("glGenerateMipmap", |_| ())
}

// ============================================================
// Framebuffer objects
// ============================================================

unsafe extern "system" fn gl_gen_framebuffers(n: GLsizei, names: *mut GLuint) {
    call("glGenFramebuffers", |s| {
        write_names(s, n, names);
    })
}

unsafe extern "system" fn gl_delete_framebuffers(n: GLsizei, names: *const GLuint) {
    let names = read_names(n, names);
    call("glDeleteFramebuffers", |s| s.deleted_framebuffers.extend(names))
}

unsafe extern "system" fn gl_bind_framebuffer(target: GLenum, name: GLuint) {
    call("glBindFramebuffer", |s| match target {
        GL_READ_FRAMEBUFFER => s.read_framebuffer = name,
        GL_DRAW_FRAMEBUFFER => s.draw_framebuffer = name,
        _ => {
            s.read_framebuffer = name;
            s.draw_framebuffer = name;
        }
    })
}

unsafe extern "system" fn gl_check_framebuffer_status(_target: GLenum) -> GLenum {
    call("glCheckFramebufferStatus", |s| {
        if s.framebuffer_incomplete {
            0x8CD6
        } else {
            GL_FRAMEBUFFER_COMPLETE
        }
    })
}

unsafe extern "system" fn gl_framebuffer_renderbuffer(_target: GLenum, _attachment: GLenum, _rb_target: GLenum, _rb: GLuint) {
    call("glFramebufferRenderbuffer", |_| ())
}

unsafe extern "system" fn gl_gen_renderbuffers(n: GLsizei, names: *mut GLuint) {
    call("glGenRenderbuffers", |s| {
        for name in write_names(s, n, names) {
            s.renderbuffers.insert(name, FakeRenderbuffer::default());
        }
    })
}

unsafe extern "system" fn gl_delete_renderbuffers(n: GLsizei, names: *const GLuint) {
    let names = read_names(n, names);
    call("glDeleteRenderbuffers", |s| {
        for name in names {
            s.renderbuffers.remove(&name);
            s.deleted_renderbuffers.push(name);
        }
    })
}

unsafe extern "system" fn gl_bind_renderbuffer(_target: GLenum, name: GLuint) {
    call("glBindRenderbuffer", |s| s.bound_renderbuffer = name)
}

unsafe extern "system" fn gl_renderbuffer_storage_multisample(
    _target: GLenum,
    samples: GLsizei,
    format: GLenum,
    width: GLsizei,
    height: GLsizei,
) {
    call("glRenderbufferStorageMultisample", |s| {
        s.renderbuffers.insert(
            s.bound_renderbuffer,
            FakeRenderbuffer {
                samples,
                format,
                width,
                height,
            },
        );
    })
}

unsafe extern "system" fn gl_blit_framebuffer(
    _src_x0: GLint,
    _src_y0: GLint,
    src_x1: GLint,
    src_y1: GLint,
    _dst_x0: GLint,
    _dst_y0: GLint,
    _dst_x1: GLint,
    _dst_y1: GLint,
    _mask: GLbitfield,
    _filter: GLenum,
) {
    call("glBlitFramebuffer", |s| {
        s.blits.push((s.read_framebuffer, s.draw_framebuffer, src_x1, src_y1))
    })
}

// ============================================================
// Samplers, vertex arrays, misc
// ============================================================

unsafe extern "system" fn gl_gen_samplers(n: GLsizei, names: *mut GLuint) {
    call("glGenSamplers", |s| {
        write_names(s, n, names);
    })
}

unsafe extern "system" fn gl_delete_samplers(n: GLsizei, names: *const GLuint) {
    let names = read_names(n, names);
    call("glDeleteSamplers", |s| s.deleted_samplers.extend(names))
}

unsafe extern "system" fn gl_bind_sampler(_unit: GLuint, _sampler: GLuint) {
    call("glBindSampler", |_| ())
}

unsafe extern "system" fn gl_sampler_parameteri(_sampler: GLuint, _pname: GLenum, _param: GLint) {
    call("glSamplerParameteri", |_| ())
}

unsafe extern "system" fn gl_sampler_parameterf(_sampler: GLuint, _pname: GLenum, _param: GLfloat) {
    call("glSamplerParameterf", |_| ())
}

unsafe extern "system" fn gl_gen_vertex_arrays(n: GLsizei, names: *mut GLuint) {
    call("glGenVertexArrays", |s| {
        write_names(s, n, names);
    })
}

unsafe extern "system" fn gl_delete_vertex_arrays(n: GLsizei, names: *const GLuint) {
    let names = read_names(n, names);
    call("glDeleteVertexArrays", |s| s.deleted_vertex_arrays.extend(names))
}

unsafe extern "system" fn gl_bind_vertex_array(name: GLuint) {
    call("glBindVertexArray", |s| s.bound_vertex_array = name)
}

unsafe extern "system" fn gl_get_stringi(name: GLenum, index: GLuint) -> *const GLubyte {
    call("glGetStringi", |s| {
        if name != GL_EXTENSIONS {
            return ptr::null();
        }
        s.extensions
            .get(index as usize)
            .map_or(ptr::null(), |e| e.as_ptr() as *const GLubyte)
    })
}

unsafe extern "system" fn gl_get_graphics_reset_status() -> GLenum {
    call("glGetGraphicsResetStatus", |s| s.reset_status)
}

// ============================================================
// Symbol lookup
// ============================================================

fn lookup(symbol: &str) -> *const c_void {
    if with(|s| s.hidden.contains(symbol)) {
        return ptr::null();
    }

    let f: *const c_void = match symbol {
        "glBindTexture" => gl_bind_texture as *const c_void,
        "glBlendFunc" => gl_blend_func as *const c_void,
        "glClear" => gl_clear as *const c_void,
        "glClearColor" => gl_clear_color as *const c_void,
        "glCullFace" => gl_cull_face as *const c_void,
        "glDeleteTextures" => gl_delete_textures as *const c_void,
        "glDepthFunc" => gl_depth_func as *const c_void,
        "glDepthMask" => gl_depth_mask as *const c_void,
        "glDisable" => gl_disable as *const c_void,
        "glDrawArrays" => gl_draw_arrays as *const c_void,
        "glDrawElements" => gl_draw_elements as *const c_void,
        "glEnable" => gl_enable as *const c_void,
        "glFinish" => gl_finish as *const c_void,
        "glFlush" => gl_flush as *const c_void,
        "glFrontFace" => gl_front_face as *const c_void,
        "glGenTextures" => gl_gen_textures as *const c_void,
        "glGetError" => gl_get_error as *const c_void,
        "glGetFloatv" => gl_get_floatv as *const c_void,
        "glGetIntegerv" => gl_get_integerv as *const c_void,
        "glGetString" => gl_get_string as *const c_void,
        "glPixelStorei" => gl_pixel_storei as *const c_void,
        "glReadPixels" => gl_read_pixels as *const c_void,
        "glScissor" => gl_scissor as *const c_void,
        "glTexImage2D" => gl_tex_image_2d as *const c_void,
        "glTexParameterf" => gl_tex_parameterf as *const c_void,
        "glTexParameteri" => gl_tex_parameteri as *const c_void,
        "glTexSubImage2D" => gl_tex_sub_image_2d as *const c_void,
        "glViewport" => gl_viewport as *const c_void,

        "glMatrixMode" => gl_matrix_mode as *const c_void,
        "glLoadMatrixf" => gl_load_matrixf as *const c_void,
        "glLoadIdentity" => gl_load_identity as *const c_void,
        "glEnableClientState" => gl_enable_client_state as *const c_void,
        "glDisableClientState" => gl_disable_client_state as *const c_void,
        "glVertexPointer" => gl_vertex_pointer as *const c_void,
        "glColorPointer" => gl_color_pointer as *const c_void,
        "glTexCoordPointer" => gl_tex_coord_pointer as *const c_void,
        "glTexEnvi" => gl_tex_envi as *const c_void,
        "glColor4f" => gl_color4f as *const c_void,
        "glActiveTexture" | "glActiveTextureARB" => gl_active_texture as *const c_void,
        "glDepthRange" => gl_depth_range as *const c_void,
        "glDepthRangef" => gl_depth_rangef as *const c_void,

        "glGenBuffers" => gl_gen_buffers as *const c_void,
        "glDeleteBuffers" => gl_delete_buffers as *const c_void,
        "glBindBuffer" => gl_bind_buffer as *const c_void,
        "glBufferData" => gl_buffer_data as *const c_void,
        "glBufferSubData" => gl_buffer_sub_data as *const c_void,

        "glCreateShader" => gl_create_shader as *const c_void,
        "glDeleteShader" => gl_delete_shader as *const c_void,
        "glShaderSource" => gl_shader_source as *const c_void,
        "glCompileShader" => gl_compile_shader as *const c_void,
        "glGetShaderiv" => gl_get_shaderiv as *const c_void,
        "glGetShaderInfoLog" => gl_get_shader_info_log as *const c_void,
        "glCreateProgram" => gl_create_program as *const c_void,
        "glDeleteProgram" => gl_delete_program as *const c_void,
        "glAttachShader" => gl_attach_shader as *const c_void,
        "glDetachShader" => gl_detach_shader as *const c_void,
        "glLinkProgram" => gl_link_program as *const c_void,
        "glGetProgramiv" => gl_get_programiv as *const c_void,
        "glGetProgramInfoLog" => gl_get_program_info_log as *const c_void,
        "glUseProgram" => gl_use_program as *const c_void,
        "glBindAttribLocation" => gl_bind_attrib_location as *const c_void,
        "glGetActiveAttrib" => gl_get_active_attrib as *const c_void,
        "glGetActiveUniform" => gl_get_active_uniform as *const c_void,
        "glGetAttribLocation" => gl_get_attrib_location as *const c_void,
        "glGetUniformLocation" => gl_get_uniform_location as *const c_void,
        "glUniform1i" => gl_uniform1i as *const c_void,
        "glUniform1f" => gl_uniform1f as *const c_void,
        "glUniform2fv" => gl_uniform2fv as *const c_void,
        "glUniform4fv" => gl_uniform4fv as *const c_void,
        "glUniformMatrix4fv" => gl_uniform_matrix4fv as *const c_void,
        "glEnableVertexAttribArray" => gl_enable_vertex_attrib_array as *const c_void,
        "glDisableVertexAttribArray" => gl_disable_vertex_attrib_array as *const c_void,
        "glVertexAttribPointer" => gl_vertex_attrib_pointer as *const c_void,
        "glVertexAttrib4fv" => gl_vertex_attrib4fv as *const c_void,

        "glGenerateMipmap" => gl_generate_mipmap as *const c_void,

        "glGenFramebuffers" => gl_gen_framebuffers as *const c_void,
        "glDeleteFramebuffers" => gl_delete_framebuffers as *const c_void,
        "glBindFramebuffer" => gl_bind_framebuffer as *const c_void,
        "glCheckFramebufferStatus" => gl_check_framebuffer_status as *const c_void,
        "glFramebufferRenderbuffer" => gl_framebuffer_renderbuffer as *const c_void,
        "glGenRenderbuffers" => gl_gen_renderbuffers as *const c_void,
        "glDeleteRenderbuffers" => gl_delete_renderbuffers as *const c_void,
        "glBindRenderbuffer" => gl_bind_renderbuffer as *const c_void,
        "glRenderbufferStorageMultisample" => gl_renderbuffer_storage_multisample as *const c_void,
        "glBlitFramebuffer" => gl_blit_framebuffer as *const c_void,

        "glGenSamplers" => gl_gen_samplers as *const c_void,
        "glDeleteSamplers" => gl_delete_samplers as *const c_void,
        "glBindSampler" => gl_bind_sampler as *const c_void,
        "glSamplerParameteri" => gl_sampler_parameteri as *const c_void,
        "glSamplerParameterf" => gl_sampler_parameterf as *const c_void,

        "glGenVertexArrays" => gl_gen_vertex_arrays as *const c_void,
        "glDeleteVertexArrays" => gl_delete_vertex_arrays as *const c_void,
        "glBindVertexArray" => gl_bind_vertex_array as *const c_void,

        "glGetStringi" => gl_get_stringi as *const c_void,
        "glGetGraphicsResetStatus" => gl_get_graphics_reset_status as *const c_void,

        _ => ptr::null(),
    };

    f
}

/// Loader over the fake driver with no window attached.
pub struct FakeLoader {
    pub has_context: bool,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self { has_context: true }
    }
}

impl GlSymbolLoader for FakeLoader {
    fn has_current_context(&self) -> bool {
        self.has_context
    }

    fn get_proc_address(&mut self, symbol: &str) -> *const c_void {
        lookup(symbol)
    }
}

// ============================================================
// Windows
// ============================================================

pub struct FakeContext {
    id: u32,
    requested_samples: i32,
}

impl GlSymbolLoader for FakeContext {
    fn has_current_context(&self) -> bool {
        with(|s| s.current_context != 0)
    }

    fn get_proc_address(&mut self, symbol: &str) -> *const c_void {
        lookup(symbol)
    }
}

impl GlContext for FakeContext {
    fn make_current(&mut self) -> Result<(), String> {
        with(|s| {
            if s.fail_make_current {
                return Err("context unavailable".to_string());
            }
            s.current_context = self.id;
            Ok(())
        })
    }

    fn is_current(&self) -> bool {
        with(|s| s.current_context == self.id)
    }

    fn swap_buffers(&mut self) -> Result<(), String> {
        with(|s| s.swaps += 1);
        Ok(())
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<(), String> {
        with(|s| {
            if !s.vsync_supported {
                return Err("swap control not supported".to_string());
            }
            s.swap_interval = interval;
            Ok(())
        })
    }

    fn swap_interval(&self) -> i32 {
        with(|s| s.swap_interval)
    }

    fn samples(&self) -> i32 {
        if self.requested_samples < 2 {
            return 0;
        }
        with(|s| self.requested_samples.min(s.max_window_samples))
    }
}

pub struct FakeWindow {
    width: i32,
    height: i32,
    context: FakeContext,
}

impl GlWindow for FakeWindow {
    fn drawable_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn set_title(&mut self, title: &str) {
        with(|s| s.window_title = title.to_string());
    }

    fn set_mode(&mut self, width: i32, height: i32, _is_fullscreen: bool) -> Result<(), String> {
        if width <= 0 || height <= 0 {
            return Err(format!("invalid mode {}x{}", width, height));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn show(&mut self, is_visible: bool) {
        with(|s| s.windows_visible.push(is_visible));
    }

    fn context(&mut self) -> &mut dyn GlContext {
        &mut self.context
    }

    fn recreate_context(&mut self) -> Result<(), String> {
        let old_id = self.context.id;
        self.context.id = with(|s| {
            s.context_recreations += 1;
            s.drop_objects();
            if s.current_context == old_id {
                s.current_context = 0;
            }
            let id = s.next_context;
            s.next_context += 1;
            id
        });
        Ok(())
    }
}

impl Drop for FakeWindow {
    fn drop(&mut self) {
        let id = self.context.id;
        with(|s| {
            s.live_windows -= 1;
            if s.current_context == id {
                s.current_context = 0;
            }
        });
    }
}

pub struct FakeWindowMgr;

impl FakeWindowMgr {
    pub fn new() -> Self {
        Self
    }
}

impl WindowMgr for FakeWindowMgr {
    fn create_window(&mut self, attributes: &GlWindowAttributes) -> Result<Box<dyn GlWindow>, String> {
        let id = with(|s| {
            if s.rejected_profiles.contains(&attributes.profile) {
                return Err(format!("{:?} contexts not supported", attributes.profile));
            }

            s.created_windows.push(attributes.clone());
            s.live_windows += 1;
            let id = s.next_context;
            s.next_context += 1;
            Ok(id)
        })?;

        Ok(Box::new(FakeWindow {
            width: attributes.width,
            height: attributes.height,
            context: FakeContext {
                id,
                requested_samples: attributes.multisample_count,
            },
        }))
    }
}
