// gl.rs -- OpenGL types, constants and the resolved entry point table
//
// Only the subset of OpenGL the renderer actually calls is declared here.

#![allow(non_snake_case, clippy::too_many_arguments, clippy::missing_transmute_annotations)]

use crate::sys::GlSymbolLoader;
use std::os::raw::{c_char, c_void};

pub type GLenum = u32;
pub type GLboolean = u8;
pub type GLbitfield = u32;
pub type GLvoid = c_void;
pub type GLint = i32;
pub type GLubyte = u8;
pub type GLuint = u32;
pub type GLsizei = i32;
pub type GLfloat = f32;
pub type GLclampf = f32;
pub type GLchar = c_char;
pub type GLsizeiptr = isize;
pub type GLintptr = isize;

// ==============================
// Constants
// ==============================

pub const GL_FALSE: GLboolean = 0;
pub const GL_TRUE: GLboolean = 1;

pub const GL_NO_ERROR: GLenum = 0;
pub const GL_INVALID_ENUM: GLenum = 0x0500;
pub const GL_INVALID_VALUE: GLenum = 0x0501;
pub const GL_INVALID_OPERATION: GLenum = 0x0502;
pub const GL_OUT_OF_MEMORY: GLenum = 0x0505;
pub const GL_INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

// Primitive types
pub const GL_POINTS: GLenum = 0x0000;
pub const GL_LINES: GLenum = 0x0001;
pub const GL_LINE_STRIP: GLenum = 0x0003;
pub const GL_TRIANGLES: GLenum = 0x0004;
pub const GL_TRIANGLE_STRIP: GLenum = 0x0005;

// Blending factors
pub const GL_ZERO: GLenum = 0;
pub const GL_ONE: GLenum = 1;
pub const GL_SRC_COLOR: GLenum = 0x0300;
pub const GL_SRC_ALPHA: GLenum = 0x0302;
pub const GL_ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;

// Faces and winding
pub const GL_FRONT: GLenum = 0x0404;
pub const GL_BACK: GLenum = 0x0405;
pub const GL_FRONT_AND_BACK: GLenum = 0x0408;
pub const GL_CW: GLenum = 0x0900;
pub const GL_CCW: GLenum = 0x0901;

// Capabilities
pub const GL_CULL_FACE: GLenum = 0x0B44;
pub const GL_DEPTH_TEST: GLenum = 0x0B71;
pub const GL_BLEND: GLenum = 0x0BE2;
pub const GL_SCISSOR_TEST: GLenum = 0x0C11;
pub const GL_TEXTURE_2D: GLenum = 0x0DE1;

pub const GL_LEQUAL: GLenum = 0x0203;

pub const GL_DEPTH_BUFFER_BIT: GLbitfield = 0x0000_0100;
pub const GL_COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;

// Queries
pub const GL_VIEWPORT: GLenum = 0x0BA2;
pub const GL_MAX_TEXTURE_SIZE: GLenum = 0x0D33;
pub const GL_MAX_VIEWPORT_DIMS: GLenum = 0x0D3A;
pub const GL_SAMPLES: GLenum = 0x80A9;
pub const GL_MAX_VERTEX_ATTRIBS: GLenum = 0x8869;
pub const GL_MAX_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FF;
pub const GL_MAX_SAMPLES: GLenum = 0x8D57;
pub const GL_NUM_EXTENSIONS: GLenum = 0x821D;
pub const GL_CONTEXT_PROFILE_MASK: GLenum = 0x9126;
pub const GL_CONTEXT_CORE_PROFILE_BIT: GLint = 0x0000_0001;

pub const GL_VENDOR: GLenum = 0x1F00;
pub const GL_RENDERER: GLenum = 0x1F01;
pub const GL_VERSION: GLenum = 0x1F02;
pub const GL_EXTENSIONS: GLenum = 0x1F03;

// Pixel storage and formats
pub const GL_UNPACK_ALIGNMENT: GLenum = 0x0CF5;
pub const GL_PACK_ALIGNMENT: GLenum = 0x0D05;
pub const GL_UNSIGNED_BYTE: GLenum = 0x1401;
pub const GL_UNSIGNED_SHORT: GLenum = 0x1403;
pub const GL_INT: GLenum = 0x1404;
pub const GL_UNSIGNED_INT: GLenum = 0x1405;
pub const GL_FLOAT: GLenum = 0x1406;
pub const GL_RGB: GLenum = 0x1907;
pub const GL_RGBA: GLenum = 0x1908;
pub const GL_RGBA8: GLenum = 0x8058;

// Textures
pub const GL_NEAREST: GLenum = 0x2600;
pub const GL_LINEAR: GLenum = 0x2601;
pub const GL_NEAREST_MIPMAP_NEAREST: GLenum = 0x2700;
pub const GL_LINEAR_MIPMAP_NEAREST: GLenum = 0x2701;
pub const GL_NEAREST_MIPMAP_LINEAR: GLenum = 0x2702;
pub const GL_LINEAR_MIPMAP_LINEAR: GLenum = 0x2703;
pub const GL_TEXTURE_MAG_FILTER: GLenum = 0x2800;
pub const GL_TEXTURE_MIN_FILTER: GLenum = 0x2801;
pub const GL_TEXTURE_WRAP_S: GLenum = 0x2802;
pub const GL_TEXTURE_WRAP_T: GLenum = 0x2803;
pub const GL_CLAMP: GLenum = 0x2900;
pub const GL_REPEAT: GLenum = 0x2901;
pub const GL_CLAMP_TO_EDGE: GLenum = 0x812F;
pub const GL_TEXTURE_BASE_LEVEL: GLenum = 0x813C;
pub const GL_TEXTURE_MAX_LEVEL: GLenum = 0x813D;
pub const GL_GENERATE_MIPMAP: GLenum = 0x8191;
pub const GL_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;
pub const GL_TEXTURE0: GLenum = 0x84C0;

// Fixed-function
pub const GL_MODELVIEW: GLenum = 0x1700;
pub const GL_PROJECTION: GLenum = 0x1701;
pub const GL_TEXTURE_ENV: GLenum = 0x2300;
pub const GL_TEXTURE_ENV_MODE: GLenum = 0x2200;
pub const GL_MODULATE: GLenum = 0x2100;
pub const GL_VERTEX_ARRAY: GLenum = 0x8074;
pub const GL_COLOR_ARRAY: GLenum = 0x8076;
pub const GL_TEXTURE_COORD_ARRAY: GLenum = 0x8078;

// Buffers
pub const GL_ARRAY_BUFFER: GLenum = 0x8892;
pub const GL_ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const GL_STREAM_DRAW: GLenum = 0x88E0;
pub const GL_STATIC_DRAW: GLenum = 0x88E4;
pub const GL_DYNAMIC_DRAW: GLenum = 0x88E8;
pub const GL_DYNAMIC_STORAGE_BIT: GLbitfield = 0x0100;

// Shaders
pub const GL_FRAGMENT_SHADER: GLenum = 0x8B30;
pub const GL_VERTEX_SHADER: GLenum = 0x8B31;
pub const GL_FLOAT_VEC2: GLenum = 0x8B50;
pub const GL_FLOAT_VEC3: GLenum = 0x8B51;
pub const GL_FLOAT_VEC4: GLenum = 0x8B52;
pub const GL_FLOAT_MAT4: GLenum = 0x8B5C;
pub const GL_SAMPLER_2D: GLenum = 0x8B5E;
pub const GL_COMPILE_STATUS: GLenum = 0x8B81;
pub const GL_LINK_STATUS: GLenum = 0x8B82;
pub const GL_INFO_LOG_LENGTH: GLenum = 0x8B84;
pub const GL_ACTIVE_UNIFORMS: GLenum = 0x8B86;
pub const GL_ACTIVE_UNIFORM_MAX_LENGTH: GLenum = 0x8B87;
pub const GL_ACTIVE_ATTRIBUTES: GLenum = 0x8B89;
pub const GL_ACTIVE_ATTRIBUTE_MAX_LENGTH: GLenum = 0x8B8A;

// Framebuffers
pub const GL_READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const GL_DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const GL_FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
pub const GL_COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const GL_DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const GL_FRAMEBUFFER: GLenum = 0x8D40;
pub const GL_RENDERBUFFER: GLenum = 0x8D41;
pub const GL_DEPTH_COMPONENT16: GLenum = 0x81A5;

// Robustness
pub const GL_GUILTY_CONTEXT_RESET: GLenum = 0x8253;
pub const GL_INNOCENT_CONTEXT_RESET: GLenum = 0x8254;
pub const GL_UNKNOWN_CONTEXT_RESET: GLenum = 0x8255;

// ==============================
// Entry point table
// ==============================

macro_rules! gl_api {
    (
        core {
            $( $cname:ident = $csym:literal : fn($($carg:ty),*) $(-> $cret:ty)?; )*
        }
        optional {
            $( $oname:ident = $osym:literal $(| $oalias:literal)* : fn($($oarg:ty),*) $(-> $oret:ty)?; )*
        }
    ) => {
        /// Entry points resolved for one GL context.
        ///
        /// Required entry points are plain function pointers; optional ones
        /// are `None` when neither the core name nor any alias resolved.
        pub struct GlFns {
            $( pub $cname: unsafe extern "system" fn($($carg),*) $(-> $cret)?, )*
            $( pub $oname: Option<unsafe extern "system" fn($($oarg),*) $(-> $oret)?>, )*
        }

        impl GlFns {
            /// Every entry point a context must provide.
            pub const REQUIRED_SYMBOLS: &'static [&'static str] = &[$($csym),*];

            /// Resolve the table. Unresolved required symbols are appended to
            /// `missing` and no table is returned.
            pub fn load<L: GlSymbolLoader + ?Sized>(loader: &mut L, missing: &mut Vec<&'static str>) -> Option<Self> {
                $(
                    let $cname = loader.get_proc_address($csym);
                    if $cname.is_null() {
                        missing.push($csym);
                    }
                )*

                if !missing.is_empty() {
                    return None;
                }

                $(
                    #[allow(unused_mut)]
                    let mut $oname = loader.get_proc_address($osym);
                    $(
                        if $oname.is_null() {
                            $oname = loader.get_proc_address($oalias);
                        }
                    )*
                )*

                // SAFETY: each pointer was returned by the context's loader for
                // the symbol whose signature is declared next to it.
                unsafe {
                    Some(Self {
                        $(
                            $cname: std::mem::transmute::<*const c_void, unsafe extern "system" fn($($carg),*) $(-> $cret)?>($cname),
                        )*
                        $(
                            $oname: if $oname.is_null() {
                                None
                            } else {
                                Some(std::mem::transmute::<*const c_void, unsafe extern "system" fn($($oarg),*) $(-> $oret)?>($oname))
                            },
                        )*
                    })
                }
            }
        }
    };
}

gl_api! {
    core {
        bind_texture = "glBindTexture": fn(GLenum, GLuint);
        blend_func = "glBlendFunc": fn(GLenum, GLenum);
        clear = "glClear": fn(GLbitfield);
        clear_color = "glClearColor": fn(GLclampf, GLclampf, GLclampf, GLclampf);
        cull_face = "glCullFace": fn(GLenum);
        delete_textures = "glDeleteTextures": fn(GLsizei, *const GLuint);
        depth_func = "glDepthFunc": fn(GLenum);
        depth_mask = "glDepthMask": fn(GLboolean);
        disable = "glDisable": fn(GLenum);
        draw_arrays = "glDrawArrays": fn(GLenum, GLint, GLsizei);
        draw_elements = "glDrawElements": fn(GLenum, GLsizei, GLenum, *const c_void);
        enable = "glEnable": fn(GLenum);
        finish = "glFinish": fn();
        flush = "glFlush": fn();
        front_face = "glFrontFace": fn(GLenum);
        gen_textures = "glGenTextures": fn(GLsizei, *mut GLuint);
        get_error = "glGetError": fn() -> GLenum;
        get_floatv = "glGetFloatv": fn(GLenum, *mut GLfloat);
        get_integerv = "glGetIntegerv": fn(GLenum, *mut GLint);
        get_string = "glGetString": fn(GLenum) -> *const GLubyte;
        pixel_storei = "glPixelStorei": fn(GLenum, GLint);
        read_pixels = "glReadPixels": fn(GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *mut c_void);
        scissor = "glScissor": fn(GLint, GLint, GLsizei, GLsizei);
        tex_image_2d = "glTexImage2D": fn(GLenum, GLint, GLint, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void);
        tex_parameterf = "glTexParameterf": fn(GLenum, GLenum, GLfloat);
        tex_parameteri = "glTexParameteri": fn(GLenum, GLenum, GLint);
        tex_sub_image_2d = "glTexSubImage2D": fn(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
        viewport = "glViewport": fn(GLint, GLint, GLsizei, GLsizei);
    }
    optional {
        // Fixed-function (absent from core profiles and ES)
        matrix_mode = "glMatrixMode": fn(GLenum);
        load_matrixf = "glLoadMatrixf": fn(*const GLfloat);
        load_identity = "glLoadIdentity": fn();
        enable_client_state = "glEnableClientState": fn(GLenum);
        disable_client_state = "glDisableClientState": fn(GLenum);
        vertex_pointer = "glVertexPointer": fn(GLint, GLenum, GLsizei, *const c_void);
        color_pointer = "glColorPointer": fn(GLint, GLenum, GLsizei, *const c_void);
        tex_coord_pointer = "glTexCoordPointer": fn(GLint, GLenum, GLsizei, *const c_void);
        tex_envi = "glTexEnvi": fn(GLenum, GLenum, GLint);
        color4f = "glColor4f": fn(GLfloat, GLfloat, GLfloat, GLfloat);

        active_texture = "glActiveTexture" | "glActiveTextureARB": fn(GLenum);

        // Desktop takes doubles, ES takes floats.
        depth_range = "glDepthRange": fn(f64, f64);
        depth_rangef = "glDepthRangef": fn(GLfloat, GLfloat);

        // Buffer objects
        gen_buffers = "glGenBuffers" | "glGenBuffersARB": fn(GLsizei, *mut GLuint);
        delete_buffers = "glDeleteBuffers" | "glDeleteBuffersARB": fn(GLsizei, *const GLuint);
        bind_buffer = "glBindBuffer" | "glBindBufferARB": fn(GLenum, GLuint);
        buffer_data = "glBufferData" | "glBufferDataARB": fn(GLenum, GLsizeiptr, *const c_void, GLenum);
        buffer_sub_data = "glBufferSubData" | "glBufferSubDataARB": fn(GLenum, GLintptr, GLsizeiptr, *const c_void);

        // Shaders and programs
        create_shader = "glCreateShader": fn(GLenum) -> GLuint;
        delete_shader = "glDeleteShader": fn(GLuint);
        shader_source = "glShaderSource": fn(GLuint, GLsizei, *const *const GLchar, *const GLint);
        compile_shader = "glCompileShader": fn(GLuint);
        get_shaderiv = "glGetShaderiv": fn(GLuint, GLenum, *mut GLint);
        get_shader_info_log = "glGetShaderInfoLog": fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);
        create_program = "glCreateProgram": fn() -> GLuint;
        delete_program = "glDeleteProgram": fn(GLuint);
        attach_shader = "glAttachShader": fn(GLuint, GLuint);
        detach_shader = "glDetachShader": fn(GLuint, GLuint);
        link_program = "glLinkProgram": fn(GLuint);
        get_programiv = "glGetProgramiv": fn(GLuint, GLenum, *mut GLint);
        get_program_info_log = "glGetProgramInfoLog": fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);
        use_program = "glUseProgram": fn(GLuint);
        bind_attrib_location = "glBindAttribLocation": fn(GLuint, GLuint, *const GLchar);
        get_active_attrib = "glGetActiveAttrib": fn(GLuint, GLuint, GLsizei, *mut GLsizei, *mut GLint, *mut GLenum, *mut GLchar);
        get_active_uniform = "glGetActiveUniform": fn(GLuint, GLuint, GLsizei, *mut GLsizei, *mut GLint, *mut GLenum, *mut GLchar);
        get_attrib_location = "glGetAttribLocation": fn(GLuint, *const GLchar) -> GLint;
        get_uniform_location = "glGetUniformLocation": fn(GLuint, *const GLchar) -> GLint;
        uniform1i = "glUniform1i": fn(GLint, GLint);
        uniform1f = "glUniform1f": fn(GLint, GLfloat);
        uniform2fv = "glUniform2fv": fn(GLint, GLsizei, *const GLfloat);
        uniform4fv = "glUniform4fv": fn(GLint, GLsizei, *const GLfloat);
        uniform_matrix4fv = "glUniformMatrix4fv": fn(GLint, GLsizei, GLboolean, *const GLfloat);
        enable_vertex_attrib_array = "glEnableVertexAttribArray": fn(GLuint);
        disable_vertex_attrib_array = "glDisableVertexAttribArray": fn(GLuint);
        vertex_attrib_pointer = "glVertexAttribPointer": fn(GLuint, GLint, GLenum, GLboolean, GLsizei, *const c_void);
        vertex_attrib4fv = "glVertexAttrib4fv": fn(GLuint, *const GLfloat);

        generate_mipmap = "glGenerateMipmap" | "glGenerateMipmapEXT": fn(GLenum);

        // Framebuffer objects
        gen_framebuffers = "glGenFramebuffers" | "glGenFramebuffersEXT": fn(GLsizei, *mut GLuint);
        delete_framebuffers = "glDeleteFramebuffers" | "glDeleteFramebuffersEXT": fn(GLsizei, *const GLuint);
        bind_framebuffer = "glBindFramebuffer" | "glBindFramebufferEXT": fn(GLenum, GLuint);
        check_framebuffer_status = "glCheckFramebufferStatus" | "glCheckFramebufferStatusEXT": fn(GLenum) -> GLenum;
        framebuffer_renderbuffer = "glFramebufferRenderbuffer" | "glFramebufferRenderbufferEXT": fn(GLenum, GLenum, GLenum, GLuint);
        gen_renderbuffers = "glGenRenderbuffers" | "glGenRenderbuffersEXT": fn(GLsizei, *mut GLuint);
        delete_renderbuffers = "glDeleteRenderbuffers" | "glDeleteRenderbuffersEXT": fn(GLsizei, *const GLuint);
        bind_renderbuffer = "glBindRenderbuffer" | "glBindRenderbufferEXT": fn(GLenum, GLuint);
        renderbuffer_storage_multisample = "glRenderbufferStorageMultisample" | "glRenderbufferStorageMultisampleEXT": fn(GLenum, GLsizei, GLenum, GLsizei, GLsizei);
        blit_framebuffer = "glBlitFramebuffer" | "glBlitFramebufferEXT": fn(GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLbitfield, GLenum);

        // Sampler objects
        gen_samplers = "glGenSamplers": fn(GLsizei, *mut GLuint);
        delete_samplers = "glDeleteSamplers": fn(GLsizei, *const GLuint);
        bind_sampler = "glBindSampler": fn(GLuint, GLuint);
        sampler_parameteri = "glSamplerParameteri": fn(GLuint, GLenum, GLint);
        sampler_parameterf = "glSamplerParameterf": fn(GLuint, GLenum, GLfloat);

        // Vertex array objects
        gen_vertex_arrays = "glGenVertexArrays" | "glGenVertexArraysOES" | "glGenVertexArraysAPPLE": fn(GLsizei, *mut GLuint);
        delete_vertex_arrays = "glDeleteVertexArrays" | "glDeleteVertexArraysOES" | "glDeleteVertexArraysAPPLE": fn(GLsizei, *const GLuint);
        bind_vertex_array = "glBindVertexArray" | "glBindVertexArrayOES" | "glBindVertexArrayAPPLE": fn(GLuint);

        buffer_storage = "glBufferStorage" | "glBufferStorageEXT": fn(GLenum, GLsizeiptr, *const c_void, GLbitfield);

        // Direct state access
        create_buffers = "glCreateBuffers": fn(GLsizei, *mut GLuint);
        named_buffer_storage = "glNamedBufferStorage": fn(GLuint, GLsizeiptr, *const c_void, GLbitfield);
        named_buffer_sub_data = "glNamedBufferSubData": fn(GLuint, GLintptr, GLsizeiptr, *const c_void);
        create_textures = "glCreateTextures": fn(GLenum, GLsizei, *mut GLuint);
        texture_parameteri = "glTextureParameteri": fn(GLuint, GLenum, GLint);
        texture_sub_image_2d = "glTextureSubImage2D": fn(GLuint, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
        generate_texture_mipmap = "glGenerateTextureMipmap": fn(GLuint);

        // Separate shader objects
        gen_program_pipelines = "glGenProgramPipelines": fn(GLsizei, *mut GLuint);
        delete_program_pipelines = "glDeleteProgramPipelines": fn(GLsizei, *const GLuint);
        bind_program_pipeline = "glBindProgramPipeline": fn(GLuint);
        use_program_stages = "glUseProgramStages": fn(GLuint, GLbitfield, GLuint);

        get_stringi = "glGetStringi": fn(GLenum, GLuint) -> *const GLubyte;
        get_graphics_reset_status = "glGetGraphicsResetStatus" | "glGetGraphicsResetStatusARB" | "glGetGraphicsResetStatusKHR" | "glGetGraphicsResetStatusEXT": fn() -> GLenum;
    }
}

impl GlFns {
    /// Fetch and clear the pending GL error.
    pub fn take_error(&self) -> GLenum {
        // SAFETY: glGetError has no preconditions beyond a current context.
        unsafe { (self.get_error)() }
    }
}

/// Human-readable name of a GL error code.
pub fn error_name(code: GLenum) -> &'static str {
    match code {
        GL_NO_ERROR => "GL_NO_ERROR",
        GL_INVALID_ENUM => "GL_INVALID_ENUM",
        GL_INVALID_VALUE => "GL_INVALID_VALUE",
        GL_INVALID_OPERATION => "GL_INVALID_OPERATION",
        GL_OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        GL_INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        _ => "unknown GL error",
    }
}
