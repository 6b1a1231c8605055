//! OpenGL renderer.
//!
//! `OglRenderer` owns the window and context it renders into, every GPU
//! resource created through it, and the GL state cache. The game talks to it
//! with typed ids and per-frame command buffers.
//!
//! Lifecycle: `Uninitialized -> Probing -> Initialized -> (Lost) -> Uninitialized`.
//! A failed `initialize` always unwinds to `Uninitialized`.

use super::api::{check_errors, OglApi};
use super::buffer::OglBuffer;
use super::device_features::{self, OglContextKind, OglDeviceFeatures};
use super::extensions::OglExtensionMgr;
use super::framebuffer::OglMsaaFramebuffer;
use super::gl::*;
use super::sampler::OglSampler;
use super::shader::OglShader;
use super::shader_source::OglGlslDialect;
use super::shader_stage::{OglShaderStage, OglShaderVar};
use super::state::OglState;
use super::texture_2d::OglTexture2d;
use super::vertex_input::{OglAttribModel, OglVertexInput};
use crate::r3r::ids::R3rIdGenerator;
use crate::r3r::*;
use crate::sys::{GlContextProfile, GlWindow, GlWindowAttributes, WindowMgr};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::os::raw::c_void;
use std::rc::Rc;

/// Sample counts tried when probing window multisampling.
const PROBE_SAMPLE_COUNTS: [i32; 5] = [2, 4, 8, 16, 32];

const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, //
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OglRendererBackend {
    /// Fixed-function pipeline.
    Gl1x,
    /// Shader pipeline, desktop or ES.
    Gl2x,
}

impl OglRendererBackend {
    pub fn from_path(path: R3rRendererPath) -> Option<Self> {
        match path {
            R3rRendererPath::Gl1x => Some(OglRendererBackend::Gl1x),
            R3rRendererPath::Gl2x | R3rRendererPath::Gl32Core | R3rRendererPath::Gles20 => {
                Some(OglRendererBackend::Gl2x)
            }
            R3rRendererPath::None | R3rRendererPath::Autodetect => None,
        }
    }

    pub fn attrib_model(self) -> OglAttribModel {
        match self {
            OglRendererBackend::Gl1x => OglAttribModel::FixedFunction,
            OglRendererBackend::Gl2x => OglAttribModel::Generic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OglRendererState {
    Uninitialized,
    Probing,
    Initialized,
    Lost,
}

/// Context attributes requested for a renderer path.
pub fn window_attributes(path: R3rRendererPath, param: &R3rWindowInitParam, is_visible: bool) -> GlWindowAttributes {
    let (profile, major_version, minor_version) = match path {
        R3rRendererPath::Gl2x => (GlContextProfile::Compatibility, 2, 0),
        R3rRendererPath::Gl32Core => (GlContextProfile::Core, 3, 2),
        R3rRendererPath::Gles20 => (GlContextProfile::Es, 2, 0),
        _ => (GlContextProfile::Compatibility, 0, 0),
    };

    GlWindowAttributes {
        title: param.title.clone(),
        is_positioned: param.is_positioned,
        x: param.x,
        y: param.y,
        width: param.width,
        height: param.height,
        is_fullscreen: param.is_fullscreen,
        is_visible,
        profile,
        major_version,
        minor_version,
        multisample_count: 0,
        depth_bits: 16,
        ..GlWindowAttributes::default()
    }
}

/// Column-major 4x4 product `a * b`.
pub fn mat4_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut result = [0.0f32; 16];

    for column in 0..4 {
        for row in 0..4 {
            result[column * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[column * 4 + k]).sum();
        }
    }

    result
}

fn gl_primitive(kind: R3rPrimitiveType) -> GLenum {
    match kind {
        R3rPrimitiveType::PointList => GL_POINTS,
        R3rPrimitiveType::LineList => GL_LINES,
        R3rPrimitiveType::LineStrip => GL_LINE_STRIP,
        R3rPrimitiveType::TriangleList => GL_TRIANGLES,
        R3rPrimitiveType::TriangleStrip => GL_TRIANGLE_STRIP,
    }
}

fn gl_blending_factor(factor: R3rBlendingFactor) -> GLenum {
    match factor {
        R3rBlendingFactor::Zero => GL_ZERO,
        R3rBlendingFactor::One => GL_ONE,
        R3rBlendingFactor::SrcColor => GL_SRC_COLOR,
        R3rBlendingFactor::SrcAlpha => GL_SRC_ALPHA,
        R3rBlendingFactor::OneMinusSrcAlpha => GL_ONE_MINUS_SRC_ALPHA,
    }
}

fn gl_index_type(byte_depth: usize) -> Option<GLenum> {
    match byte_depth {
        1 => Some(GL_UNSIGNED_BYTE),
        2 => Some(GL_UNSIGNED_SHORT),
        4 => Some(GL_UNSIGNED_INT),
        _ => None,
    }
}

/// Byte range of the indices a draw reads, or `None` if it overflows.
fn index_byte_range(param: &R3rDrawIndexedParam) -> Option<std::ops::Range<usize>> {
    let start = param
        .index_offset
        .checked_mul(param.index_byte_depth)?
        .checked_add(param.index_buffer_offset)?;
    let end = param.vertex_count.checked_mul(param.index_byte_depth)?.checked_add(start)?;
    Some(start..end)
}

pub struct OglRenderer {
    state_kind: OglRendererState,
    path: R3rRendererPath,
    backend: OglRendererBackend,

    api: OglApi,
    extensions: OglExtensionMgr,
    r3r_features: R3rDeviceFeatures,
    ogl_features: OglDeviceFeatures,
    device_info: R3rDeviceInfo,
    gl_state: OglState,
    error_message: String,

    aa_kind: R3rAaKind,
    aa_degree: i32,
    is_vsync: bool,

    ids: R3rIdGenerator,
    buffers: BTreeMap<u32, OglBuffer>,
    textures: BTreeMap<u32, OglTexture2d>,
    samplers: BTreeMap<u32, OglSampler>,
    vertex_inputs: BTreeMap<u32, OglVertexInput>,
    shaders: BTreeMap<u32, OglShader>,
    stages: BTreeMap<u32, OglShaderStage>,
    msaa_fbo: Option<OglMsaaFramebuffer>,

    current_texture: Option<R3rTexture2dId>,
    current_sampler: Option<R3rSamplerId>,
    current_vertex_input: Option<R3rVertexInputId>,
    current_stage: Option<R3rShaderStageId>,
    /// Model, view and projection (1.x backend).
    fixed_matrices: [[f32; 16]; 3],

    // Declared last: GL objects above must go before their context.
    window: Option<Box<dyn GlWindow>>,
}

impl Default for OglRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OglRenderer {
    pub fn new() -> Self {
        Self {
            state_kind: OglRendererState::Uninitialized,
            path: R3rRendererPath::None,
            backend: OglRendererBackend::Gl2x,
            api: OglApi::new(),
            extensions: OglExtensionMgr::new(),
            r3r_features: R3rDeviceFeatures::default(),
            ogl_features: OglDeviceFeatures::default(),
            device_info: R3rDeviceInfo::default(),
            gl_state: OglState::new(),
            error_message: String::new(),
            aa_kind: R3rAaKind::None,
            aa_degree: R3rLimits::MIN_AA_OFF,
            is_vsync: false,
            ids: R3rIdGenerator::new(),
            buffers: BTreeMap::new(),
            textures: BTreeMap::new(),
            samplers: BTreeMap::new(),
            vertex_inputs: BTreeMap::new(),
            shaders: BTreeMap::new(),
            stages: BTreeMap::new(),
            msaa_fbo: None,
            current_texture: None,
            current_sampler: None,
            current_vertex_input: None,
            current_stage: None,
            fixed_matrices: [IDENTITY_MATRIX; 3],
            window: None,
        }
    }

    // ============================================================
    // Identification
    // ============================================================

    pub fn get_name(&self) -> &'static str {
        match self.path {
            R3rRendererPath::Gl1x => "GL1",
            R3rRendererPath::Gl2x => "GL2",
            R3rRendererPath::Gl32Core => "GL3.2C",
            R3rRendererPath::Gles20 => "GLES2.0",
            _ => "none",
        }
    }

    pub fn get_description(&self) -> &'static str {
        self.path.description()
    }

    pub fn get_path(&self) -> R3rRendererPath {
        self.path
    }

    pub fn get_backend(&self) -> OglRendererBackend {
        self.backend
    }

    pub fn get_state(&self) -> OglRendererState {
        self.state_kind
    }

    pub fn is_initialized(&self) -> bool {
        self.state_kind == OglRendererState::Initialized
    }

    pub fn get_device_features(&self) -> &R3rDeviceFeatures {
        &self.r3r_features
    }

    pub fn get_ogl_device_features(&self) -> &OglDeviceFeatures {
        &self.ogl_features
    }

    pub fn get_device_info(&self) -> &R3rDeviceInfo {
        &self.device_info
    }

    pub fn get_extensions(&self) -> &OglExtensionMgr {
        &self.extensions
    }

    pub fn get_glsl_dialect(&self) -> OglGlslDialect {
        OglGlslDialect::for_context(self.ogl_features.context_kind)
    }

    /// Text of the last failed create or initialize.
    pub fn get_error_message(&self) -> &str {
        &self.error_message
    }

    pub fn get_aa_kind(&self) -> R3rAaKind {
        self.aa_kind
    }

    pub fn get_aa_degree(&self) -> i32 {
        self.aa_degree
    }

    pub fn is_vsync(&self) -> bool {
        self.is_vsync
    }

    fn record<T>(&mut self, result: R3rResult<T>) -> R3rResult<T> {
        if let Err(ref e) = result {
            self.error_message = e.to_string();
        }
        result
    }

    // ============================================================
    // Probing
    // ============================================================

    /// Check whether `path` works here and report what it can do.
    ///
    /// Uses throwaway windows only; the renderer is left uninitialized.
    pub fn probe(&mut self, mgr: &mut dyn WindowMgr, path: R3rRendererPath) -> R3rResult<R3rDeviceFeatures> {
        if self.state_kind != OglRendererState::Uninitialized {
            let result = Err(R3rError::contract("Probing requires an uninitialized renderer."));
            return self.record(result);
        }

        let paths: Vec<R3rRendererPath> = match path {
            R3rRendererPath::Autodetect => R3rRendererPath::AUTODETECT_ORDER.to_vec(),
            R3rRendererPath::None => {
                let result = Err(R3rError::init("No renderer path to probe."));
                return self.record(result);
            }
            concrete => vec![concrete],
        };

        let mut last_error = R3rError::init("No renderer path available.");

        for candidate in paths {
            info!("[R3R] Probing {}.", candidate.description());

            self.state_kind = OglRendererState::Probing;
            let result = self.probe_path(mgr, candidate);
            self.uninitialize();

            match result {
                Ok(features) => return Ok(features),
                Err(e) => {
                    warn!("[R3R] {} probe failed: {}", candidate.description(), e);
                    last_error = e;
                }
            }
        }

        self.record(Err(last_error))
    }

    fn probe_path(&mut self, mgr: &mut dyn WindowMgr, path: R3rRendererPath) -> R3rResult<R3rDeviceFeatures> {
        let param = R3rWindowInitParam {
            title: "probe".to_string(),
            width: 1,
            height: 1,
            ..R3rWindowInitParam::default()
        };

        self.open_window(mgr, path, &param, 0)?;
        self.initialize_context(path)?;

        let mut features = self.r3r_features.clone();
        features.is_vsync_available = self.probe_vsync();

        // The probe context goes before any throwaway window exists.
        let fbo_max_samples = self.ogl_features.framebuffer_max_samples;
        self.uninitialize();
        self.state_kind = OglRendererState::Probing;

        let window_max_samples = probe_window_msaa(mgr, path);
        device_features::msaa_combine(window_max_samples, fbo_max_samples, &mut features);

        Ok(features)
    }

    fn probe_vsync(&mut self) -> bool {
        match self.window.as_mut() {
            Some(window) => device_features::vsync_probe(window.context()),
            None => false,
        }
    }

    // ============================================================
    // Initialization
    // ============================================================

    pub fn initialize(&mut self, mgr: &mut dyn WindowMgr, param: &R3rInitParam) -> R3rResult<()> {
        if self.state_kind != OglRendererState::Uninitialized {
            let result = Err(R3rError::contract("Renderer already initialized."));
            return self.record(result);
        }

        if let Err(e) = validate_init_param(param) {
            return self.record(Err(e));
        }

        let paths: Vec<R3rRendererPath> = match param.renderer_path {
            R3rRendererPath::Autodetect => R3rRendererPath::AUTODETECT_ORDER.to_vec(),
            concrete => vec![concrete],
        };

        let mut last_error = R3rError::init("No renderer path available.");

        for path in paths {
            info!("[R3R] Initializing {}.", path.description());

            match self.initialize_path(mgr, path, param) {
                Ok(()) => {
                    self.error_message.clear();
                    info!("[R3R] Using {}.", path.description());
                    return Ok(());
                }
                Err(e) => {
                    warn!("[R3R] {} failed: {}", path.description(), e);
                    self.uninitialize();
                    last_error = e;
                }
            }
        }

        error!("[R3R] {}", last_error);
        self.record(Err(last_error))
    }

    fn initialize_path(&mut self, mgr: &mut dyn WindowMgr, path: R3rRendererPath, param: &R3rInitParam) -> R3rResult<()> {
        self.state_kind = OglRendererState::Probing;

        self.open_window(mgr, path, &param.window, 0)?;
        self.initialize_context(path)?;

        let is_vsync_available = self.probe_vsync();

        let fbo_max_samples = self.ogl_features.framebuffer_max_samples;
        let window_max_samples = if fbo_max_samples < R3rLimits::MIN_AA_ON {
            let samples = probe_window_msaa(mgr, path);
            self.make_current()?;
            samples
        } else {
            0
        };

        let mut features = self.r3r_features.clone();
        features.is_vsync_available = is_vsync_available;
        device_features::msaa_combine(window_max_samples, fbo_max_samples, &mut features);

        let wants_msaa = param.aa_kind == R3rAaKind::Msaa && features.msaa_is_available;
        let aa_degree = if wants_msaa {
            R3rLimits::clamp_aa(param.aa_value, features.msaa_max_degree)
        } else {
            R3rLimits::MIN_AA_OFF
        };

        if wants_msaa && features.msaa_is_render_to_window && aa_degree >= R3rLimits::MIN_AA_ON {
            // Multisampling belongs to the pixel format; reopen the window with it.
            self.close_context();
            self.open_window(mgr, path, &param.window, aa_degree)?;
            self.initialize_context(path)?;
        }

        self.r3r_features = features;
        self.aa_kind = param.aa_kind;
        self.aa_degree = aa_degree;

        let gl = self.gl()?;
        self.initialize_defaults(&gl)?;

        if let Err(e) = self.apply_vsync(param.is_vsync) {
            warn!("[R3R] {}", e);
        }

        if wants_msaa && !self.r3r_features.msaa_is_render_to_window {
            self.create_msaa_fbo(&gl)?;
        }

        device_features::log_features(&self.r3r_features, &self.ogl_features);

        if let Some(window) = self.window.as_mut() {
            window.show(true);
        }

        self.state_kind = OglRendererState::Initialized;
        Ok(())
    }

    fn open_window(
        &mut self,
        mgr: &mut dyn WindowMgr,
        path: R3rRendererPath,
        param: &R3rWindowInitParam,
        samples: i32,
    ) -> R3rResult<()> {
        let backend = OglRendererBackend::from_path(path)
            .ok_or_else(|| R3rError::init(format!("\"{}\" is not a concrete renderer path.", path)))?;

        let mut attributes = window_attributes(path, param, false);
        attributes.multisample_count = samples;

        let window = mgr.create_window(&attributes).map_err(R3rError::init)?;

        self.window = Some(window);
        self.path = path;
        self.backend = backend;
        self.make_current()
    }

    fn make_current(&mut self) -> R3rResult<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| R3rError::contract("No window."))?;

        let context = window.context();
        if context.is_current() {
            return Ok(());
        }

        context.make_current().map_err(R3rError::init)
    }

    /// Load entry points and probe the current context for `path`.
    fn initialize_context(&mut self, path: R3rRendererPath) -> R3rResult<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| R3rError::contract("No window."))?;

        if !self.api.initialize(window.context()) {
            return Err(R3rError::init("Failed to load OpenGL entry points."));
        }

        let gl = self.gl()?;
        let version = self.api.get_version().clone();

        info!("[OGL] Vendor: {}", self.api.get_vendor());
        info!("[OGL] Renderer: {}", self.api.get_renderer());
        info!("[OGL] Version: {}", version.get_original_string());

        self.extensions.initialize(&gl, &version);

        let (r3r, mut ogl) = device_features::probe_all(&gl, &version, &mut self.extensions);

        if self.backend == OglRendererBackend::Gl1x {
            // Vertex arrays do not reliably capture client-side array state.
            ogl.is_vao_available = false;
        }

        check_path_support(path, &version, &ogl)?;

        self.r3r_features = r3r;
        self.ogl_features = ogl;
        self.device_info = R3rDeviceInfo {
            name: self.api.get_renderer().to_string(),
            vendor: self.api.get_vendor().to_string(),
            version: version.get_original_string().to_string(),
        };
        self.gl_state.reset();
        Ok(())
    }

    fn initialize_defaults(&mut self, gl: &GlFns) -> R3rResult<()> {
        // SAFETY: plain enum/int arguments.
        unsafe {
            (gl.pixel_storei)(GL_UNPACK_ALIGNMENT, 1);
            (gl.pixel_storei)(GL_PACK_ALIGNMENT, 1);
            (gl.depth_func)(GL_LEQUAL);

            if let Some(f) = gl.active_texture {
                f(GL_TEXTURE0);
            }
        }

        if self.backend == OglRendererBackend::Gl1x {
            // SAFETY: plain enum/int arguments.
            unsafe {
                if let Some(f) = gl.tex_envi {
                    f(GL_TEXTURE_ENV, GL_TEXTURE_ENV_MODE, GL_MODULATE as GLint);
                }
            }
            self.apply_fixed_matrices(gl);
        }

        check_errors(gl, "initialize defaults")
    }

    fn apply_vsync(&mut self, is_enabled: bool) -> R3rResult<()> {
        self.is_vsync = false;

        if !self.r3r_features.is_vsync_available {
            return Err(R3rError::contract("Vsync not available."));
        }

        let window = self
            .window
            .as_mut()
            .ok_or_else(|| R3rError::contract("No window."))?;

        window
            .context()
            .set_swap_interval(if is_enabled { 1 } else { 0 })
            .map_err(R3rError::contract)?;

        self.is_vsync = is_enabled;
        Ok(())
    }

    fn create_msaa_fbo(&mut self, gl: &Rc<GlFns>) -> R3rResult<()> {
        self.msaa_fbo = None;

        if self.aa_kind != R3rAaKind::Msaa || self.aa_degree < R3rLimits::MIN_AA_ON {
            return Ok(());
        }

        let (width, height) = match self.window.as_ref() {
            Some(window) => window.drawable_size(),
            None => return Err(R3rError::contract("No window.")),
        };

        let fbo = OglMsaaFramebuffer::new(gl, &mut self.gl_state, width, height, self.aa_degree)?;
        debug!("[OGL] Multisample framebuffer {}x{} x{}.", width, height, self.aa_degree);
        self.msaa_fbo = Some(fbo);
        Ok(())
    }

    /// Release every GL object, the context and the window. Safe to call
    /// any number of times.
    pub fn uninitialize(&mut self) {
        let is_lost = self.state_kind == OglRendererState::Lost;

        if self.window.is_some() {
            if is_lost {
                self.abandon_objects();
            } else if self.make_current().is_err() {
                warn!("[OGL] Failed to make the context current for teardown.");
                self.abandon_objects();
            }
        }

        self.buffers.clear();
        self.textures.clear();
        self.samplers.clear();
        self.vertex_inputs.clear();
        self.stages.clear();
        self.shaders.clear();
        self.msaa_fbo = None;

        self.close_context();

        self.r3r_features = R3rDeviceFeatures::default();
        self.ogl_features = OglDeviceFeatures::default();
        self.device_info = R3rDeviceInfo::default();
        self.aa_kind = R3rAaKind::None;
        self.aa_degree = R3rLimits::MIN_AA_OFF;
        self.is_vsync = false;
        self.path = R3rRendererPath::None;
        self.state_kind = OglRendererState::Uninitialized;
    }

    fn close_context(&mut self) {
        self.api.uninitialize();
        self.extensions.uninitialize();
        self.gl_state.reset();
        self.current_texture = None;
        self.current_sampler = None;
        self.current_vertex_input = None;
        self.current_stage = None;
        self.fixed_matrices = [IDENTITY_MATRIX; 3];
        self.window = None;
    }

    fn abandon_objects(&mut self) {
        self.buffers.values_mut().for_each(OglBuffer::abandon);
        self.textures.values_mut().for_each(OglTexture2d::abandon);
        self.samplers.values_mut().for_each(OglSampler::abandon);
        self.vertex_inputs.values_mut().for_each(OglVertexInput::abandon);
        self.stages.values_mut().for_each(OglShaderStage::abandon);
        self.shaders.values_mut().for_each(OglShader::abandon);
        if let Some(fbo) = self.msaa_fbo.as_mut() {
            fbo.abandon();
        }
    }

    /// Make the context current ahead of a release. On failure the object
    /// is dropped without GL calls.
    fn make_current_for_destroy(&mut self, id: impl std::fmt::Display) -> bool {
        if self.window.is_none() || self.state_kind == OglRendererState::Lost {
            return false;
        }

        match self.make_current() {
            Ok(()) => true,
            Err(e) => {
                warn!("[R3R] Abandoning {}: {}", id, e);
                false
            }
        }
    }

    fn gl(&self) -> R3rResult<Rc<GlFns>> {
        self.api
            .gl()
            .cloned()
            .ok_or_else(|| R3rError::contract("OpenGL entry points not loaded."))
    }

    /// Current context and its table, for any call on a live renderer.
    fn begin_call(&mut self) -> R3rResult<Rc<GlFns>> {
        if self.state_kind != OglRendererState::Initialized {
            return Err(R3rError::contract("Renderer not initialized."));
        }

        self.make_current()?;
        self.gl()
    }

    // ============================================================
    // Window
    // ============================================================

    pub fn set_window_title(&mut self, title: &str) -> R3rResult<()> {
        if self.state_kind != OglRendererState::Initialized {
            return Err(R3rError::contract("Renderer not initialized."));
        }

        if let Some(window) = self.window.as_mut() {
            window.set_title(title);
        }
        Ok(())
    }

    pub fn set_window_mode(&mut self, width: i32, height: i32, is_fullscreen: bool) -> R3rResult<()> {
        let gl = self.begin_call()?;

        if width <= 0 || height <= 0 {
            return self.record(Err(R3rError::contract(format!("Window size {}x{} out of range.", width, height))));
        }

        if let Some(window) = self.window.as_mut() {
            let result = window.set_mode(width, height, is_fullscreen).map_err(R3rError::contract);
            self.record(result)?;
        }

        if self.msaa_fbo.is_some() {
            let result = self.create_msaa_fbo(&gl);
            self.record(result)?;
        }

        Ok(())
    }

    /// Drawable size in pixels.
    pub fn get_drawable_size(&self) -> (i32, i32) {
        self.window.as_ref().map_or((0, 0), |w| w.drawable_size())
    }

    pub fn enable_vsync(&mut self, is_enabled: bool) -> R3rResult<()> {
        self.begin_call()?;
        let result = self.apply_vsync(is_enabled);
        self.record(result)
    }

    /// Change anti-aliasing.
    ///
    /// Window multisampling cannot change on a live context: the request is
    /// stored and takes effect on the next `initialize`.
    pub fn set_anti_aliasing(&mut self, kind: R3rAaKind, degree: i32) -> R3rResult<()> {
        let gl = self.begin_call()?;

        match kind {
            R3rAaKind::None => {
                self.aa_kind = R3rAaKind::None;
                self.aa_degree = R3rLimits::MIN_AA_OFF;
                self.msaa_fbo = None;
                Ok(())
            }
            R3rAaKind::Msaa => {
                if !self.r3r_features.msaa_is_available {
                    return self.record(Err(R3rError::contract("MSAA not available.")));
                }

                let degree = R3rLimits::clamp_aa(degree, self.r3r_features.msaa_max_degree);

                if self.r3r_features.msaa_is_requires_restart {
                    info!("[R3R] MSAA x{} will be applied upon restart.", degree);
                    return Ok(());
                }

                self.aa_kind = R3rAaKind::Msaa;
                self.aa_degree = degree;
                let result = self.create_msaa_fbo(&gl);
                self.record(result)
            }
        }
    }

    // ============================================================
    // Buffers
    // ============================================================

    pub fn index_buffer_create(&mut self, param: &R3rBufferInitParam) -> R3rResult<R3rBufferId> {
        self.buffer_create(R3rBufferType::Index, param)
    }

    pub fn vertex_buffer_create(&mut self, param: &R3rBufferInitParam) -> R3rResult<R3rBufferId> {
        self.buffer_create(R3rBufferType::Vertex, param)
    }

    fn buffer_create(&mut self, kind: R3rBufferType, param: &R3rBufferInitParam) -> R3rResult<R3rBufferId> {
        let gl = self.begin_call()?;
        let result = OglBuffer::new(&gl, &self.ogl_features, &mut self.gl_state, kind, param);
        let buffer = self.record(result)?;

        let id = R3rBufferId(self.ids.next_raw());
        self.buffers.insert(id.get(), buffer);
        Ok(id)
    }

    pub fn buffer_update(&mut self, id: R3rBufferId, param: &R3rBufferUpdateParam<'_>) -> R3rResult<()> {
        self.begin_call()?;

        let result = match self.buffers.get_mut(&id.get()) {
            Some(buffer) => buffer.update(&self.ogl_features, &mut self.gl_state, param),
            None => Err(R3rError::UnknownResource(R3rBufferId::KIND, id.get())),
        };

        self.record(result)
    }

    pub fn buffer_destroy(&mut self, id: R3rBufferId) {
        let is_current = self.make_current_for_destroy(id);

        match self.buffers.remove(&id.get()) {
            Some(mut buffer) => {
                if !is_current {
                    buffer.abandon();
                }
                self.gl_state.forget_name(buffer.gl_name());
            }
            None => debug!("[R3R] Ignoring destroy of unknown {}.", id),
        }
    }

    // ============================================================
    // Textures
    // ============================================================

    pub fn texture_2d_create(&mut self, param: &R3rTexture2dInitParam) -> R3rResult<R3rTexture2dId> {
        let gl = self.begin_call()?;
        let result = OglTexture2d::new(&gl, &self.r3r_features, &self.ogl_features, &mut self.gl_state, param);
        let texture = self.record(result)?;

        let id = R3rTexture2dId(self.ids.next_raw());
        self.textures.insert(id.get(), texture);
        Ok(id)
    }

    pub fn texture_2d_update(&mut self, id: R3rTexture2dId, param: &R3rTexture2dUpdateParam<'_>) -> R3rResult<()> {
        self.begin_call()?;

        let result = match self.textures.get_mut(&id.get()) {
            Some(texture) => texture.update(&mut self.gl_state, param),
            None => Err(R3rError::UnknownResource(R3rTexture2dId::KIND, id.get())),
        };

        self.record(result)
    }

    pub fn texture_2d_generate_mipmaps(&mut self, id: R3rTexture2dId) -> R3rResult<()> {
        self.begin_call()?;

        let result = match self.textures.get_mut(&id.get()) {
            Some(texture) => texture.generate_mipmaps(&self.ogl_features, &mut self.gl_state),
            None => Err(R3rError::UnknownResource(R3rTexture2dId::KIND, id.get())),
        };

        self.record(result)
    }

    pub fn texture_2d_destroy(&mut self, id: R3rTexture2dId) {
        let is_current = self.make_current_for_destroy(id);

        match self.textures.remove(&id.get()) {
            Some(mut texture) => {
                if !is_current {
                    texture.abandon();
                }
                self.gl_state.forget_name(texture.gl_name());
                if self.current_texture == Some(id) {
                    self.current_texture = None;
                }
            }
            None => debug!("[R3R] Ignoring destroy of unknown {}.", id),
        }
    }

    // ============================================================
    // Samplers
    // ============================================================

    pub fn sampler_create(&mut self, param: &R3rSamplerInitParam) -> R3rResult<R3rSamplerId> {
        let gl = self.begin_call()?;
        let result = OglSampler::new(&gl, &self.r3r_features, &self.ogl_features, param);
        let sampler = self.record(result)?;

        let id = R3rSamplerId(self.ids.next_raw());
        self.samplers.insert(id.get(), sampler);
        Ok(id)
    }

    pub fn sampler_update(&mut self, id: R3rSamplerId, state: &R3rSamplerState) -> R3rResult<()> {
        self.begin_call()?;

        let result = match self.samplers.get_mut(&id.get()) {
            Some(sampler) => {
                sampler.update(&self.r3r_features, &self.ogl_features, state);
                Ok(())
            }
            None => Err(R3rError::UnknownResource(R3rSamplerId::KIND, id.get())),
        };

        self.record(result)
    }

    pub fn sampler_destroy(&mut self, id: R3rSamplerId) {
        let is_current = self.make_current_for_destroy(id);

        match self.samplers.remove(&id.get()) {
            Some(mut sampler) => {
                if !is_current {
                    sampler.abandon();
                }
                self.gl_state.forget_name(sampler.gl_name());
                if self.current_sampler == Some(id) {
                    self.current_sampler = None;
                }
            }
            None => debug!("[R3R] Ignoring destroy of unknown {}.", id),
        }
    }

    // ============================================================
    // Vertex inputs
    // ============================================================

    pub fn vertex_input_create(&mut self, param: &R3rVertexInputInitParam) -> R3rResult<R3rVertexInputId> {
        let gl = self.begin_call()?;
        let result = OglVertexInput::new(
            &gl,
            &self.r3r_features,
            &self.ogl_features,
            &mut self.gl_state,
            self.backend.attrib_model(),
            &self.buffers,
            param,
        );
        let input = self.record(result)?;

        let id = R3rVertexInputId(self.ids.next_raw());
        self.vertex_inputs.insert(id.get(), input);
        Ok(id)
    }

    pub fn vertex_input_destroy(&mut self, id: R3rVertexInputId) {
        let is_current = self.make_current_for_destroy(id);

        match self.vertex_inputs.remove(&id.get()) {
            Some(mut input) => {
                if !is_current {
                    input.abandon();
                }
                // The vertex array binding may have referred to it.
                self.gl_state.reset();
                if self.current_vertex_input == Some(id) {
                    self.current_vertex_input = None;
                }
            }
            None => debug!("[R3R] Ignoring destroy of unknown {}.", id),
        }
    }

    // ============================================================
    // Shaders
    // ============================================================

    pub fn shader_create(&mut self, param: &R3rShaderInitParam<'_>) -> R3rResult<R3rShaderId> {
        let gl = self.begin_call()?;

        if self.backend == OglRendererBackend::Gl1x {
            return self.record(Err(R3rError::contract("Shaders are not supported by the fixed-function path.")));
        }

        let result = OglShader::new(&gl, param);
        let shader = self.record(result)?;

        let id = R3rShaderId(self.ids.next_raw());
        self.shaders.insert(id.get(), shader);
        Ok(id)
    }

    pub fn shader_destroy(&mut self, id: R3rShaderId) {
        let is_current = self.make_current_for_destroy(id);

        if self.stages.values().any(|s| s.uses_shader(id)) {
            warn!("[R3R] Destroying {} still used by a shader stage.", id);
        }

        match self.shaders.remove(&id.get()) {
            Some(mut shader) if !is_current => shader.abandon(),
            Some(_) => {}
            None => debug!("[R3R] Ignoring destroy of unknown {}.", id),
        }
    }

    pub fn shader_stage_create(&mut self, param: &R3rShaderStageInitParam) -> R3rResult<R3rShaderStageId> {
        let gl = self.begin_call()?;

        if self.backend == OglRendererBackend::Gl1x {
            return self.record(Err(R3rError::contract(
                "Shader stages are not supported by the fixed-function path.",
            )));
        }

        let id = R3rShaderStageId(self.ids.next_raw());
        let result = OglShaderStage::new(&gl, id, &self.shaders, param);
        let stage = self.record(result)?;

        self.stages.insert(id.get(), stage);
        Ok(id)
    }

    pub fn shader_stage_destroy(&mut self, id: R3rShaderStageId) {
        let is_current = self.make_current_for_destroy(id);

        match self.stages.remove(&id.get()) {
            Some(mut stage) => {
                if !is_current {
                    stage.abandon();
                }
                self.gl_state.forget_name(stage.gl_name());
                if self.current_stage == Some(id) {
                    self.current_stage = None;
                }
            }
            None => debug!("[R3R] Ignoring destroy of unknown {}.", id),
        }
    }

    pub fn shader_stage_find_var(&self, id: R3rShaderStageId, name: &str) -> Option<R3rShaderVarId> {
        self.stages.get(&id.get()).and_then(|s| s.find_var(name))
    }

    pub fn shader_stage_get_var(&self, var: R3rShaderVarId) -> Option<&OglShaderVar> {
        self.stages.get(&var.stage().get()).and_then(|s| s.var(var))
    }

    // ============================================================
    // Commands
    // ============================================================

    /// Run every enabled command buffer once, in order.
    pub fn execute_commands(&mut self, cmd_mgr: &R3rCmdMgr) -> R3rResult<()> {
        let gl = self.begin_call()?;

        if let Some(fbo) = self.msaa_fbo.as_ref() {
            fbo.bind(&mut self.gl_state);
        }

        for buffer in cmd_mgr.buffers().filter(|b| b.is_enabled()) {
            for cmd in buffer.iter() {
                if let Err(e) = self.execute_command(&gl, cmd) {
                    error!("[R3R] Command \"{}\" failed: {}", cmd.name(), e);
                    return self.record(Err(e));
                }
            }
        }

        Ok(())
    }

    fn execute_command(&mut self, gl: &Rc<GlFns>, cmd: &R3rCmd) -> R3rResult<()> {
        match cmd {
            R3rCmd::Clear { color } => self.command_execute_clear(gl, *color),

            R3rCmd::SetViewport(viewport) => {
                self.gl_state.set_viewport(gl, *viewport);
                Ok(())
            }
            R3rCmd::EnableScissor(is_enabled) => {
                self.gl_state.enable_scissor(gl, *is_enabled);
                Ok(())
            }
            R3rCmd::SetScissorBox(scissor_box) => {
                self.gl_state.set_scissor_box(gl, *scissor_box);
                Ok(())
            }

            R3rCmd::EnableCulling(is_enabled) => {
                self.gl_state.enable_culling(gl, *is_enabled);
                Ok(())
            }
            R3rCmd::SetCullingFace(face) => {
                let mode = match face {
                    R3rCullingFace::Clockwise => GL_CW,
                    R3rCullingFace::CounterClockwise => GL_CCW,
                };
                self.gl_state.set_front_face(gl, mode);
                Ok(())
            }
            R3rCmd::SetCullingMode(mode) => {
                let mode = match mode {
                    R3rCullingMode::Back => GL_BACK,
                    R3rCullingMode::Front => GL_FRONT,
                    R3rCullingMode::Both => GL_FRONT_AND_BACK,
                };
                self.gl_state.set_cull_face(gl, mode);
                Ok(())
            }

            R3rCmd::EnableDepthTest(is_enabled) => {
                self.gl_state.enable_depth_test(gl, *is_enabled);
                Ok(())
            }
            R3rCmd::EnableDepthWrite(is_enabled) => {
                self.gl_state.enable_depth_write(gl, *is_enabled);
                Ok(())
            }

            R3rCmd::EnableBlending(is_enabled) => {
                self.gl_state.enable_blending(gl, *is_enabled);
                Ok(())
            }
            R3rCmd::SetBlendingFunc(func) => {
                let src = gl_blending_factor(func.src_factor);
                let dst = gl_blending_factor(func.dst_factor);
                self.gl_state.set_blending_func(gl, *func, src, dst);
                Ok(())
            }

            R3rCmd::SetTexture(id) => self.command_execute_set_texture(gl, *id),
            R3rCmd::SetSampler(id) => self.command_execute_set_sampler(gl, *id),
            R3rCmd::SetVertexInput(id) => self.command_execute_set_vertex_input(*id),
            R3rCmd::SetShaderStage(id) => self.command_execute_set_shader_stage(gl, *id),

            R3rCmd::SetInt32Uniform { var, value } => self.command_execute_set_uniform(*var, R3rShaderVarValue::Int32(*value)),
            R3rCmd::SetFloat32Uniform { var, value } => {
                self.command_execute_set_uniform(*var, R3rShaderVarValue::Float32(*value))
            }
            R3rCmd::SetVec2Uniform { var, value } => self.command_execute_set_uniform(*var, R3rShaderVarValue::Vec2(*value)),
            R3rCmd::SetVec4Uniform { var, value } => self.command_execute_set_uniform(*var, R3rShaderVarValue::Vec4(*value)),
            R3rCmd::SetMat4Uniform { var, value } => self.command_execute_set_uniform(*var, R3rShaderVarValue::Mat4(*value)),
            R3rCmd::SetSampler2dUniform { var, value } => {
                self.command_execute_set_uniform(*var, R3rShaderVarValue::Sampler2d(*value))
            }

            R3rCmd::SetFixedMatrix { kind, value } => self.command_execute_set_fixed_matrix(gl, *kind, value),

            R3rCmd::DrawQuads { count, index_offset } => {
                if *count == 0 {
                    return Ok(());
                }

                let (vertex_count, index_offset) = match (count.checked_mul(6), index_offset.checked_mul(6)) {
                    (Some(vertex_count), Some(index_offset)) => (vertex_count, index_offset),
                    _ => {
                        return Err(R3rError::contract(format!(
                            "Quad range {}+{} overflows.",
                            index_offset, count
                        )))
                    }
                };

                let param = R3rDrawIndexedParam {
                    primitive_type: R3rPrimitiveType::TriangleList,
                    vertex_count,
                    index_byte_depth: 2,
                    index_buffer_offset: 0,
                    index_offset,
                };
                self.command_execute_draw_indexed(gl, &param)
            }
            R3rCmd::DrawIndexed(param) => self.command_execute_draw_indexed(gl, param),
        }
    }

    fn command_execute_clear(&mut self, gl: &GlFns, color: Rgba8) -> R3rResult<()> {
        let [r, g, b, a] = color.to_f32();

        // Clearing depth needs depth writes on.
        self.gl_state.enable_depth_write(gl, true);

        // SAFETY: plain float/bitfield arguments.
        unsafe {
            (gl.clear_color)(r, g, b, a);
            (gl.clear)(GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT);
        }

        check_errors(gl, "glClear")
    }

    fn command_execute_set_texture(&mut self, gl: &GlFns, id: Option<R3rTexture2dId>) -> R3rResult<()> {
        match id {
            Some(id) => {
                let texture = self
                    .textures
                    .get(&id.get())
                    .ok_or(R3rError::UnknownResource(R3rTexture2dId::KIND, id.get()))?;
                texture.bind(gl, &mut self.gl_state);
            }
            None => self.gl_state.bind_texture_2d(gl, 0),
        }

        if self.backend == OglRendererBackend::Gl1x {
            self.gl_state.enable_texture_2d(gl, id.is_some());
        }

        self.current_texture = id;
        Ok(())
    }

    fn command_execute_set_sampler(&mut self, gl: &GlFns, id: Option<R3rSamplerId>) -> R3rResult<()> {
        let name = match id {
            Some(id) => self
                .samplers
                .get(&id.get())
                .ok_or(R3rError::UnknownResource(R3rSamplerId::KIND, id.get()))?
                .gl_name(),
            None => 0,
        };

        if self.r3r_features.is_sampler_available {
            self.gl_state.bind_sampler(gl, name);
        }

        self.current_sampler = id;
        Ok(())
    }

    fn command_execute_set_vertex_input(&mut self, id: Option<R3rVertexInputId>) -> R3rResult<()> {
        if let Some(id) = id {
            if !self.vertex_inputs.contains_key(&id.get()) {
                return Err(R3rError::UnknownResource(R3rVertexInputId::KIND, id.get()));
            }
        }

        self.current_vertex_input = id;
        Ok(())
    }

    fn command_execute_set_shader_stage(&mut self, gl: &GlFns, id: Option<R3rShaderStageId>) -> R3rResult<()> {
        if self.backend == OglRendererBackend::Gl1x && id.is_some() {
            return Err(R3rError::contract("Shader stages are not supported by the fixed-function path."));
        }

        let name = match id {
            Some(id) => self
                .stages
                .get(&id.get())
                .ok_or(R3rError::UnknownResource(R3rShaderStageId::KIND, id.get()))?
                .gl_name(),
            None => 0,
        };

        if self.backend == OglRendererBackend::Gl2x {
            self.gl_state.use_program(gl, name);
        }

        self.current_stage = id;
        Ok(())
    }

    fn command_execute_set_uniform(&mut self, var: R3rShaderVarId, value: R3rShaderVarValue) -> R3rResult<()> {
        if self.backend == OglRendererBackend::Gl1x {
            return Err(R3rError::contract("Uniforms are not supported by the fixed-function path."));
        }

        let stage = self
            .stages
            .get_mut(&var.stage().get())
            .ok_or(R3rError::UnknownResource(R3rShaderStageId::KIND, var.stage().get()))?;

        stage.set_uniform(&mut self.gl_state, var, value)
    }

    fn command_execute_set_fixed_matrix(&mut self, gl: &GlFns, kind: R3rMatrixKind, value: &[f32; 16]) -> R3rResult<()> {
        if self.backend != OglRendererBackend::Gl1x {
            return Err(R3rError::contract("Fixed matrices require the fixed-function path."));
        }

        let slot = match kind {
            R3rMatrixKind::Model => 0,
            R3rMatrixKind::View => 1,
            R3rMatrixKind::Projection => 2,
        };

        self.fixed_matrices[slot] = *value;
        self.apply_fixed_matrices(gl);
        check_errors(gl, "glLoadMatrixf")
    }

    fn apply_fixed_matrices(&self, gl: &GlFns) {
        let (matrix_mode, load_matrixf) = match (gl.matrix_mode, gl.load_matrixf) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };

        let [model, view, projection] = &self.fixed_matrices;
        let model_view = mat4_mul(view, model);

        // SAFETY: each matrix holds sixteen floats.
        unsafe {
            matrix_mode(GL_PROJECTION);
            load_matrixf(projection.as_ptr());
            matrix_mode(GL_MODELVIEW);
            load_matrixf(model_view.as_ptr());
        }
    }

    fn command_execute_draw_indexed(&mut self, gl: &GlFns, param: &R3rDrawIndexedParam) -> R3rResult<()> {
        if param.vertex_count == 0 {
            return Ok(());
        }

        let index_type = gl_index_type(param.index_byte_depth)
            .ok_or_else(|| R3rError::contract(format!("Index byte depth {} not supported.", param.index_byte_depth)))?;

        let vertex_count = GLsizei::try_from(param.vertex_count)
            .map_err(|_| R3rError::contract(format!("Vertex count {} out of range.", param.vertex_count)))?;

        let byte_range = index_byte_range(param).ok_or_else(|| {
            R3rError::contract(format!(
                "Index range at {}+{} of {} indices overflows.",
                param.index_buffer_offset, param.index_offset, param.vertex_count
            ))
        })?;

        if self.backend == OglRendererBackend::Gl2x && self.current_stage.is_none() {
            return Err(R3rError::contract("No shader stage set."));
        }

        let input_id = self
            .current_vertex_input
            .ok_or_else(|| R3rError::contract("No vertex input set."))?;

        let input = self
            .vertex_inputs
            .get(&input_id.get())
            .ok_or(R3rError::UnknownResource(R3rVertexInputId::KIND, input_id.get()))?;

        if !self.r3r_features.is_sampler_available {
            if let Some(texture_id) = self.current_texture {
                let sampler_state = self
                    .current_sampler
                    .and_then(|id| self.samplers.get(&id.get()))
                    .map(|s| *s.state())
                    .unwrap_or_default();

                if let Some(texture) = self.textures.get_mut(&texture_id.get()) {
                    texture.apply_sampler_state(&self.r3r_features, &self.ogl_features, &mut self.gl_state, &sampler_state);
                }
            }
        }

        input.bind(gl, &mut self.gl_state, self.backend.attrib_model(), &self.buffers)?;

        let index_buffer_id = input
            .index_buffer()
            .ok_or_else(|| R3rError::contract("Vertex input has no index buffer."))?;

        let index_buffer = self
            .buffers
            .get(&index_buffer_id.get())
            .ok_or(R3rError::UnknownResource(R3rBufferId::KIND, index_buffer_id.get()))?;

        if byte_range.end > index_buffer.size() {
            return Err(R3rError::contract(format!(
                "Index range {}..{} exceeds {} bytes.",
                byte_range.start,
                byte_range.end,
                index_buffer.size()
            )));
        }

        let ptr: *const c_void = index_buffer.data_pointer(byte_range.start);

        // SAFETY: the index range was checked against the buffer; `ptr` is an
        // offset into the bound element buffer or points into its shadow copy.
        unsafe {
            (gl.draw_elements)(
                gl_primitive(param.primitive_type),
                vertex_count,
                index_type,
                ptr,
            );
        }

        check_errors(gl, "glDrawElements")
    }

    // ============================================================
    // Presentation
    // ============================================================

    pub fn present(&mut self) -> R3rResult<()> {
        self.begin_call()?;

        if let Some(fbo) = self.msaa_fbo.as_ref() {
            let result = fbo.resolve(&mut self.gl_state);
            self.record(result)?;
        }

        let result = match self.window.as_mut() {
            Some(window) => window.context().swap_buffers().map_err(R3rError::contract),
            None => Err(R3rError::contract("No window.")),
        };

        self.record(result)
    }

    /// Read the default framebuffer as RGB rows, top row first.
    pub fn read_pixels_rgb_888(&mut self) -> R3rResult<R3rRgb888Image> {
        let gl = self.begin_call()?;

        if let Some(fbo) = self.msaa_fbo.as_ref() {
            fbo.resolve(&mut self.gl_state)?;
        }

        let (width, height) = self.get_drawable_size();
        if width <= 0 || height <= 0 {
            return Err(R3rError::contract("Empty drawable."));
        }

        let row_size = width as usize * 3;
        let mut pixels = vec![0u8; row_size * height as usize];

        // SAFETY: `pixels` holds width*height RGB texels with pack alignment 1.
        unsafe {
            (gl.pixel_storei)(GL_PACK_ALIGNMENT, 1);
            (gl.read_pixels)(0, 0, width, height, GL_RGB, GL_UNSIGNED_BYTE, pixels.as_mut_ptr() as *mut c_void);
        }

        check_errors(&gl, "glReadPixels")?;

        // GL returns the bottom row first.
        R3rUtils::flip_rows(&mut pixels, row_size);

        Ok(R3rRgb888Image { width, height, pixels })
    }

    // ============================================================
    // Device loss
    // ============================================================

    fn reset_status(&self) -> GLenum {
        if !self.ogl_features.is_robustness_available {
            return GL_NO_ERROR;
        }

        match self.api.gl().and_then(|gl| gl.get_graphics_reset_status) {
            // SAFETY: no arguments.
            Some(f) => unsafe { f() },
            None => GL_NO_ERROR,
        }
    }

    /// True once the driver reported a context reset.
    pub fn device_is_lost(&mut self) -> bool {
        match self.state_kind {
            OglRendererState::Lost => true,
            OglRendererState::Initialized => {
                let status = self.reset_status();
                if status != GL_NO_ERROR {
                    warn!("[OGL] Device lost (reset status 0x{:04X}).", status);
                    self.state_kind = OglRendererState::Lost;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn device_is_ready_to_reset(&mut self) -> bool {
        match self.state_kind {
            OglRendererState::Lost => self.reset_status() == GL_NO_ERROR,
            OglRendererState::Initialized => true,
            _ => false,
        }
    }

    /// Recreate the context and every GPU object behind the existing ids.
    ///
    /// Buffers come back with their contents, shaders are recompiled and
    /// stages relinked. Texture storage is reallocated; its contents must be
    /// uploaded again by the owner.
    pub fn device_reset(&mut self) -> R3rResult<()> {
        let result = self.device_reset_internal();

        if result.is_err() {
            self.state_kind = OglRendererState::Lost;
        }

        self.record(result)
    }

    fn device_reset_internal(&mut self) -> R3rResult<()> {
        let is_lost = match self.state_kind {
            OglRendererState::Lost => true,
            OglRendererState::Initialized => false,
            _ => return Err(R3rError::contract("Renderer not initialized.")),
        };

        info!("[R3R] Resetting the device.");

        if is_lost || self.make_current().is_err() {
            self.abandon_objects();
        } else {
            self.buffers.values_mut().for_each(OglBuffer::release);
            self.textures.values_mut().for_each(OglTexture2d::release);
            self.samplers.values_mut().for_each(OglSampler::release);
            self.vertex_inputs.values_mut().for_each(OglVertexInput::release);
            self.stages.values_mut().for_each(OglShaderStage::release);
            self.shaders.values_mut().for_each(OglShader::release);
        }

        self.msaa_fbo = None;
        self.api.uninitialize();
        self.extensions.uninitialize();
        self.gl_state.reset();
        self.current_texture = None;
        self.current_sampler = None;
        self.current_vertex_input = None;
        self.current_stage = None;

        {
            let window = self
                .window
                .as_mut()
                .ok_or_else(|| R3rError::contract("No window."))?;
            window.recreate_context().map_err(R3rError::init)?;
        }

        self.make_current()?;

        // Window-level probes (vsync, MSAA) survive the reset.
        let kept = self.r3r_features.clone();
        self.initialize_context(self.path)?;
        self.r3r_features.is_vsync_available = kept.is_vsync_available;
        self.r3r_features.is_vsync_requires_restart = kept.is_vsync_requires_restart;
        self.r3r_features.msaa_is_available = kept.msaa_is_available;
        self.r3r_features.msaa_is_render_to_window = kept.msaa_is_render_to_window;
        self.r3r_features.msaa_is_requires_restart = kept.msaa_is_requires_restart;
        self.r3r_features.msaa_max_degree = kept.msaa_max_degree;

        let gl = self.gl()?;

        for buffer in self.buffers.values_mut() {
            buffer.recreate(&gl, &self.ogl_features, &mut self.gl_state)?;
        }

        for texture in self.textures.values_mut() {
            texture.recreate(&gl, &self.ogl_features, &mut self.gl_state)?;
        }

        for sampler in self.samplers.values_mut() {
            sampler.recreate(&gl, &self.r3r_features, &self.ogl_features)?;
        }

        for shader in self.shaders.values_mut() {
            shader.recreate(&gl)?;
        }

        for stage in self.stages.values_mut() {
            stage.recreate(&gl, &self.shaders)?;
        }

        let model = self.backend.attrib_model();
        for input in self.vertex_inputs.values_mut() {
            input.recreate(&gl, &self.ogl_features, &mut self.gl_state, model, &self.buffers)?;
        }

        self.initialize_defaults(&gl)?;

        let is_vsync = self.is_vsync;
        if self.r3r_features.is_vsync_available {
            self.apply_vsync(is_vsync)?;
        }

        if self.aa_kind == R3rAaKind::Msaa && !self.r3r_features.msaa_is_render_to_window {
            self.create_msaa_fbo(&gl)?;
        }

        self.state_kind = OglRendererState::Initialized;
        info!("[R3R] Device reset complete.");
        Ok(())
    }
}

impl Drop for OglRenderer {
    fn drop(&mut self) {
        self.uninitialize();
    }
}

fn validate_init_param(param: &R3rInitParam) -> R3rResult<()> {
    if param.renderer_path == R3rRendererPath::None {
        return Err(R3rError::init("No renderer path selected."));
    }

    if param.window.width <= 0 || param.window.height <= 0 {
        return Err(R3rError::init(format!(
            "Window size {}x{} out of range.",
            param.window.width, param.window.height
        )));
    }

    if param.aa_kind == R3rAaKind::Msaa && param.aa_value < 0 {
        return Err(R3rError::init(format!("Anti-aliasing degree {} out of range.", param.aa_value)));
    }

    Ok(())
}

/// Does the probed context satisfy what `path` needs?
pub fn check_path_support(
    path: R3rRendererPath,
    version: &super::version::OglVersion,
    features: &OglDeviceFeatures,
) -> R3rResult<()> {
    let missing = |what: &str| Err(R3rError::init(format!("{} requires {}.", path.description(), what)));

    match path {
        R3rRendererPath::Gl1x => {
            if features.context_kind == OglContextKind::Es {
                return missing("a desktop context");
            }
            if !features.is_fixed_function_available {
                return missing("fixed-function entry points");
            }
        }
        R3rRendererPath::Gl2x => {
            if !version.is_desktop_at_least(2, 0) {
                return missing("desktop OpenGL 2.0");
            }
        }
        R3rRendererPath::Gl32Core => {
            if !version.is_desktop_at_least(3, 2) || features.context_kind != OglContextKind::Core {
                return missing("a desktop OpenGL 3.2 core context");
            }
            if !features.is_vao_available {
                return missing("vertex array objects");
            }
        }
        R3rRendererPath::Gles20 => {
            if !version.is_es_at_least(2, 0) {
                return missing("OpenGL ES 2.0");
            }
        }
        R3rRendererPath::None | R3rRendererPath::Autodetect => return missing("a concrete path"),
    }

    if path != R3rRendererPath::Gl1x {
        if !features.is_shader_available {
            return missing("shader entry points");
        }
        if !features.is_buffer_available {
            return missing("buffer objects");
        }
    }

    Ok(())
}

/// Highest window sample count that actually materializes, or 0.
fn probe_window_msaa(mgr: &mut dyn WindowMgr, path: R3rRendererPath) -> i32 {
    let param = R3rWindowInitParam {
        title: "probe".to_string(),
        width: 1,
        height: 1,
        ..R3rWindowInitParam::default()
    };

    let mut max_samples = 0;

    for samples in PROBE_SAMPLE_COUNTS {
        let mut attributes = window_attributes(path, &param, false);
        attributes.multisample_count = samples;

        let mut window = match mgr.create_window(&attributes) {
            Ok(w) => w,
            Err(e) => {
                debug!("[OGL] No window with {} samples: {}", samples, e);
                break;
            }
        };

        let actual = window.context().samples();
        if actual < samples {
            break;
        }

        max_samples = actual;
    }

    debug!("[OGL] Window MSAA ceiling: {}.", max_samples);
    max_samples
}
