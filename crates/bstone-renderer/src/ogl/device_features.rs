//! Device capability probing.
//!
//! Each probe checks version/profile shortcuts first, then the extension
//! registry, and always requires the matching entry points. A missing
//! capability is recorded as unavailable and never reported as an error.

use super::api::get_integer;
use super::extensions::{OglEntryPoints, OglExtensionId, OglExtensionMgr};
use super::gl::*;
use super::version::OglVersion;
use crate::r3r::{R3rDeviceFeatures, R3rLimits};
use crate::sys::GlContext;
use log::{debug, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OglContextKind {
    #[default]
    None,
    Compatibility,
    Core,
    Es,
}

/// How mipmaps get generated on this device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OglMipmapKind {
    #[default]
    None,
    /// glGenerateMipmap.
    Function,
    /// GL_GENERATE_MIPMAP texture parameter.
    Sgis,
}

/// GL-specific capabilities, alongside `R3rDeviceFeatures`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OglDeviceFeatures {
    pub context_kind: OglContextKind,
    pub is_fixed_function_available: bool,
    pub is_multitexture_available: bool,
    pub is_buffer_available: bool,
    pub is_shader_available: bool,
    pub mipmap_kind: OglMipmapKind,
    pub is_framebuffer_available: bool,
    pub is_framebuffer_multisample_available: bool,
    pub framebuffer_max_samples: i32,
    pub is_vao_available: bool,
    pub is_buffer_storage_available: bool,
    pub is_dsa_available: bool,
    pub is_sso_available: bool,
    pub is_robustness_available: bool,
    pub is_clamp_to_edge_available: bool,
}

// ============================================================
// Individual probes
// ============================================================

pub fn context_kind_probe(gl: &GlFns, version: &OglVersion) -> OglContextKind {
    if version.is_es() {
        return OglContextKind::Es;
    }

    if version.is_desktop_at_least(3, 2) {
        let mask = get_integer(gl, GL_CONTEXT_PROFILE_MASK);
        if mask & GL_CONTEXT_CORE_PROFILE_BIT != 0 {
            return OglContextKind::Core;
        }
    }

    OglContextKind::Compatibility
}

pub fn anisotropy_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr, features: &mut R3rDeviceFeatures) {
    let is_advertised = version.is_desktop_at_least(4, 6)
        || ext.probe(gl, OglExtensionId::ArbTextureFilterAnisotropic)
        || ext.probe(gl, OglExtensionId::ExtTextureFilterAnisotropic);

    let mut max_value: GLfloat = 0.0;
    if is_advertised {
        // SAFETY: one float is written into `max_value`.
        unsafe { (gl.get_floatv)(GL_MAX_TEXTURE_MAX_ANISOTROPY, &mut max_value) };
    }

    let max_degree = max_value as i32;
    features.is_anisotropy_available = is_advertised && max_degree >= R3rLimits::MIN_ANISOTROPY_ON;
    features.max_anisotropy_degree = if features.is_anisotropy_available {
        max_degree.clamp(R3rLimits::MIN_ANISOTROPY_ON, R3rLimits::MAX_ANISOTROPY)
    } else {
        R3rLimits::MIN_ANISOTROPY_OFF
    };
}

pub fn npot_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> bool {
    version.is_desktop_at_least(2, 0)
        || version.is_es_at_least(3, 0)
        || ext.probe(gl, OglExtensionId::ArbTextureNonPowerOfTwo)
        || ext.probe(gl, OglExtensionId::OesTextureNpot)
}

pub fn mipmap_probe(
    gl: &GlFns,
    version: &OglVersion,
    context_kind: OglContextKind,
    ext: &mut OglExtensionMgr,
) -> OglMipmapKind {
    let has_function = version.is_desktop_at_least(3, 0)
        || version.is_es_at_least(2, 0)
        || ext.probe(gl, OglExtensionId::ArbFramebufferObject)
        || ext.probe(gl, OglExtensionId::ExtFramebufferObject);

    if has_function && OglEntryPoints::Mipmap.are_resolved(gl) {
        return OglMipmapKind::Function;
    }

    if context_kind == OglContextKind::Compatibility && ext.probe(gl, OglExtensionId::SgisGenerateMipmap) {
        return OglMipmapKind::Sgis;
    }

    OglMipmapKind::None
}

/// Returns (framebuffer available, multisample available, max samples).
pub fn framebuffer_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> (bool, bool, i32) {
    let is_core = version.is_desktop_at_least(3, 0) || version.is_es_at_least(2, 0);
    let is_arb = ext.probe(gl, OglExtensionId::ArbFramebufferObject);

    let is_available = (is_core || is_arb || ext.probe(gl, OglExtensionId::ExtFramebufferObject))
        && OglEntryPoints::Framebuffer.are_resolved(gl);

    if !is_available {
        return (false, false, 0);
    }

    let is_multisample = (version.is_desktop_at_least(3, 0)
        || version.is_es_at_least(3, 0)
        || is_arb
        || (ext.probe(gl, OglExtensionId::ExtFramebufferMultisample)
            && ext.probe(gl, OglExtensionId::ExtFramebufferBlit)))
        && OglEntryPoints::FramebufferMultisample.are_resolved(gl);

    let max_samples = if is_multisample {
        get_integer(gl, GL_MAX_SAMPLES).max(0)
    } else {
        0
    };

    (true, is_multisample, max_samples)
}

pub fn sampler_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> bool {
    (version.is_desktop_at_least(3, 3)
        || version.is_es_at_least(3, 0)
        || ext.probe(gl, OglExtensionId::ArbSamplerObjects))
        && OglEntryPoints::Sampler.are_resolved(gl)
}

pub fn vao_probe(
    gl: &GlFns,
    version: &OglVersion,
    context_kind: OglContextKind,
    ext: &mut OglExtensionMgr,
) -> bool {
    (context_kind == OglContextKind::Core
        || version.is_desktop_at_least(3, 0)
        || version.is_es_at_least(3, 0)
        || ext.probe(gl, OglExtensionId::ArbVertexArrayObject)
        || ext.probe(gl, OglExtensionId::OesVertexArrayObject))
        && OglEntryPoints::VertexArray.are_resolved(gl)
}

pub fn buffer_storage_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> bool {
    (version.is_desktop_at_least(4, 4)
        || ext.probe(gl, OglExtensionId::ArbBufferStorage)
        || ext.probe(gl, OglExtensionId::ExtBufferStorage))
        && OglEntryPoints::BufferStorage.are_resolved(gl)
}

pub fn dsa_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> bool {
    (version.is_desktop_at_least(4, 5) || ext.probe(gl, OglExtensionId::ArbDirectStateAccess))
        && OglEntryPoints::DirectStateAccess.are_resolved(gl)
}

pub fn sso_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> bool {
    (version.is_desktop_at_least(4, 1)
        || version.is_es_at_least(3, 1)
        || ext.probe(gl, OglExtensionId::ArbSeparateShaderObjects))
        && OglEntryPoints::SeparateShaderObjects.are_resolved(gl)
}

pub fn robustness_probe(gl: &GlFns, version: &OglVersion, ext: &mut OglExtensionMgr) -> bool {
    (version.is_desktop_at_least(4, 5)
        || version.is_es_at_least(3, 2)
        || ext.probe(gl, OglExtensionId::ArbRobustness)
        || ext.probe(gl, OglExtensionId::KhrRobustness))
        && OglEntryPoints::Robustness.are_resolved(gl)
}

/// Try to turn vsync on and read the interval back. Leaves vsync off.
pub fn vsync_probe(context: &mut dyn GlContext) -> bool {
    if context.set_swap_interval(1).is_err() {
        return false;
    }

    let is_available = context.swap_interval() == 1;
    let _ = context.set_swap_interval(0);
    is_available
}

/// Merge window and framebuffer MSAA ceilings into the feature set.
///
/// Framebuffer MSAA is preferred since it can change without a restart.
pub fn msaa_combine(window_max_samples: i32, fbo_max_samples: i32, features: &mut R3rDeviceFeatures) {
    if fbo_max_samples >= R3rLimits::MIN_AA_ON {
        features.msaa_is_available = true;
        features.msaa_is_render_to_window = false;
        features.msaa_is_requires_restart = false;
        features.msaa_max_degree = fbo_max_samples.min(R3rLimits::MAX_AA);
    } else if window_max_samples >= R3rLimits::MIN_AA_ON {
        features.msaa_is_available = true;
        features.msaa_is_render_to_window = true;
        features.msaa_is_requires_restart = true;
        features.msaa_max_degree = window_max_samples.min(R3rLimits::MAX_AA);
    } else {
        features.msaa_is_available = false;
        features.msaa_is_render_to_window = false;
        features.msaa_is_requires_restart = false;
        features.msaa_max_degree = R3rLimits::MIN_AA_OFF;
    }
}

// ============================================================
// Full probe
// ============================================================

/// Probe everything that can be read from the current context.
///
/// MSAA window ceilings and vsync need the context collaborator and are
/// probed by the renderer.
pub fn probe_all(
    gl: &GlFns,
    version: &OglVersion,
    ext: &mut OglExtensionMgr,
) -> (R3rDeviceFeatures, OglDeviceFeatures) {
    let mut r3r = R3rDeviceFeatures::default();
    let mut ogl = OglDeviceFeatures::default();

    ogl.context_kind = context_kind_probe(gl, version);

    ogl.is_fixed_function_available = ogl.context_kind == OglContextKind::Compatibility
        && OglEntryPoints::FixedFunction.are_resolved(gl);

    ogl.is_multitexture_available = (version.is_desktop_at_least(1, 3)
        || version.is_es()
        || ext.probe(gl, OglExtensionId::ArbMultitexture))
        && OglEntryPoints::Multitexture.are_resolved(gl);

    ogl.is_buffer_available = (version.is_desktop_at_least(1, 5)
        || version.is_es_at_least(2, 0)
        || ext.probe(gl, OglExtensionId::ArbVertexBufferObject))
        && OglEntryPoints::Buffer.are_resolved(gl);

    ogl.is_shader_available = (version.is_desktop_at_least(2, 0) || version.is_es_at_least(2, 0))
        && OglEntryPoints::Shader.are_resolved(gl);

    ogl.is_clamp_to_edge_available = version.is_es() || version.is_desktop_at_least(1, 2);

    anisotropy_probe(gl, version, ext, &mut r3r);

    r3r.is_npot_available = npot_probe(gl, version, ext);

    ogl.mipmap_kind = mipmap_probe(gl, version, ogl.context_kind, ext);
    r3r.is_mipmap_available = ogl.mipmap_kind != OglMipmapKind::None;

    let (is_fbo, is_fbo_msaa, fbo_max_samples) = framebuffer_probe(gl, version, ext);
    ogl.is_framebuffer_available = is_fbo;
    ogl.is_framebuffer_multisample_available = is_fbo_msaa;
    ogl.framebuffer_max_samples = fbo_max_samples;

    r3r.is_sampler_available = sampler_probe(gl, version, ext);
    ogl.is_vao_available = vao_probe(gl, version, ogl.context_kind, ext);
    ogl.is_buffer_storage_available = buffer_storage_probe(gl, version, ext);
    ogl.is_dsa_available = dsa_probe(gl, version, ext);
    ogl.is_sso_available = sso_probe(gl, version, ext);
    ogl.is_robustness_available = robustness_probe(gl, version, ext);

    r3r.max_texture_dimension = get_integer(gl, GL_MAX_TEXTURE_SIZE);

    let mut viewport_dims: [GLint; 2] = [0; 2];
    // SAFETY: GL_MAX_VIEWPORT_DIMS writes two integers.
    unsafe { (gl.get_integerv)(GL_MAX_VIEWPORT_DIMS, viewport_dims.as_mut_ptr()) };
    r3r.max_viewport_width = viewport_dims[0];
    r3r.max_viewport_height = viewport_dims[1];

    r3r.max_vertex_input_locations = if ogl.is_shader_available {
        get_integer(gl, GL_MAX_VERTEX_ATTRIBS)
    } else {
        R3rLimits::MIN_VERTEX_INPUT_LOCATIONS
    };

    msaa_combine(0, fbo_max_samples, &mut r3r);

    debug!("[OGL] Device features: {:?}", ogl);
    (r3r, ogl)
}

/// Print the probed features to the console.
pub fn log_features(r3r: &R3rDeviceFeatures, ogl: &OglDeviceFeatures) {
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    info!("[OGL] Context kind: {:?}", ogl.context_kind);
    info!("[OGL] Max texture dimension: {}", r3r.max_texture_dimension);
    info!("[OGL] Max viewport: {}x{}", r3r.max_viewport_width, r3r.max_viewport_height);
    info!(
        "[OGL] Anisotropy: {} (max degree {})",
        yes_no(r3r.is_anisotropy_available),
        r3r.max_anisotropy_degree
    );
    info!("[OGL] NPOT textures: {}", yes_no(r3r.is_npot_available));
    info!("[OGL] Mipmap generation: {:?}", ogl.mipmap_kind);
    info!("[OGL] Sampler objects: {}", yes_no(r3r.is_sampler_available));
    info!("[OGL] Framebuffer objects: {}", yes_no(ogl.is_framebuffer_available));
    info!("[OGL] Vertex array objects: {}", yes_no(ogl.is_vao_available));
    info!("[OGL] Buffer storage: {}", yes_no(ogl.is_buffer_storage_available));
    info!("[OGL] Direct state access: {}", yes_no(ogl.is_dsa_available));
    info!("[OGL] Separate shader objects: {}", yes_no(ogl.is_sso_available));
    info!(
        "[OGL] MSAA: {} (max {}, {})",
        yes_no(r3r.msaa_is_available),
        r3r.msaa_max_degree,
        if r3r.msaa_is_render_to_window { "window" } else { "framebuffer" }
    );
    info!("[OGL] Vsync: {}", yes_no(r3r.is_vsync_available));
}
