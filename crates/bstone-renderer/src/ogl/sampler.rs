// sampler.rs -- sampler objects and filter/address translation
//
// Without sampler objects the same state is applied to each texture as
// texture parameters right before drawing.

use super::device_features::OglDeviceFeatures;
use super::gl::*;
use super::handle::{self, OglHandle};
use crate::r3r::*;
use std::rc::Rc;

pub fn gl_mag_filter(filter: R3rFilterType) -> GLenum {
    match filter {
        R3rFilterType::Nearest => GL_NEAREST,
        R3rFilterType::Linear => GL_LINEAR,
    }
}

pub fn gl_min_filter(filter: R3rFilterType, mipmap_mode: R3rMipmapMode) -> GLenum {
    match (mipmap_mode, filter) {
        (R3rMipmapMode::None, R3rFilterType::Nearest) => GL_NEAREST,
        (R3rMipmapMode::None, R3rFilterType::Linear) => GL_LINEAR,
        (R3rMipmapMode::Nearest, R3rFilterType::Nearest) => GL_NEAREST_MIPMAP_NEAREST,
        (R3rMipmapMode::Nearest, R3rFilterType::Linear) => GL_LINEAR_MIPMAP_NEAREST,
        (R3rMipmapMode::Linear, R3rFilterType::Nearest) => GL_NEAREST_MIPMAP_LINEAR,
        (R3rMipmapMode::Linear, R3rFilterType::Linear) => GL_LINEAR_MIPMAP_LINEAR,
    }
}

/// GL_CLAMP on 1.1 contexts without GL_CLAMP_TO_EDGE.
pub fn gl_address_mode(mode: R3rAddressMode, is_clamp_to_edge_available: bool) -> GLenum {
    match mode {
        R3rAddressMode::Repeat => GL_REPEAT,
        R3rAddressMode::Clamp if is_clamp_to_edge_available => GL_CLAMP_TO_EDGE,
        R3rAddressMode::Clamp => GL_CLAMP,
    }
}

/// The state with anisotropy clamped to what the device supports.
pub fn effective_state(state: &R3rSamplerState, features: &R3rDeviceFeatures) -> R3rSamplerState {
    let mut result = *state;
    result.anisotropy = if features.is_anisotropy_available {
        R3rLimits::clamp_anisotropy(state.anisotropy, features.max_anisotropy_degree)
    } else {
        R3rLimits::MIN_ANISOTROPY_OFF
    };
    result
}

/// Write sampler state as parameters of the texture bound to GL_TEXTURE_2D.
pub fn apply_to_bound_texture(
    gl: &GlFns,
    state: &R3rSamplerState,
    r3r_features: &R3rDeviceFeatures,
    ogl_features: &OglDeviceFeatures,
) {
    let state = effective_state(state, r3r_features);
    let clamp = ogl_features.is_clamp_to_edge_available;

    // SAFETY: plain enum/int arguments against the bound texture.
    unsafe {
        (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_MAG_FILTER, gl_mag_filter(state.mag_filter) as GLint);
        (gl.tex_parameteri)(
            GL_TEXTURE_2D,
            GL_TEXTURE_MIN_FILTER,
            gl_min_filter(state.min_filter, state.mipmap_mode) as GLint,
        );
        (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_WRAP_S, gl_address_mode(state.address_mode_u, clamp) as GLint);
        (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_WRAP_T, gl_address_mode(state.address_mode_v, clamp) as GLint);

        if r3r_features.is_anisotropy_available {
            (gl.tex_parameterf)(GL_TEXTURE_2D, GL_TEXTURE_MAX_ANISOTROPY, state.anisotropy as GLfloat);
        }
    }
}

/// A sampler resource.
///
/// Holds a GL sampler object when the device has them; otherwise only the
/// state is kept and the renderer applies it per texture.
pub struct OglSampler {
    state: R3rSamplerState,
    handle: Option<OglHandle>,
}

impl OglSampler {
    pub fn new(
        gl: &Rc<GlFns>,
        r3r_features: &R3rDeviceFeatures,
        ogl_features: &OglDeviceFeatures,
        param: &R3rSamplerInitParam,
    ) -> R3rResult<Self> {
        let mut sampler = Self {
            state: param.state,
            handle: None,
        };
        sampler.recreate(gl, r3r_features, ogl_features)?;
        Ok(sampler)
    }

    pub fn state(&self) -> &R3rSamplerState {
        &self.state
    }

    pub fn gl_name(&self) -> GLuint {
        self.handle.as_ref().map_or(0, OglHandle::get)
    }

    pub fn update(
        &mut self,
        r3r_features: &R3rDeviceFeatures,
        ogl_features: &OglDeviceFeatures,
        state: &R3rSamplerState,
    ) {
        self.state = *state;
        self.apply(r3r_features, ogl_features);
    }

    /// Create the GL object again (after a device reset).
    pub fn recreate(
        &mut self,
        gl: &Rc<GlFns>,
        r3r_features: &R3rDeviceFeatures,
        ogl_features: &OglDeviceFeatures,
    ) -> R3rResult<()> {
        self.handle = None;

        if !r3r_features.is_sampler_available {
            return Ok(());
        }

        let gen = gl
            .gen_samplers
            .ok_or_else(|| R3rError::contract("Sampler objects not available."))?;

        let name = handle::gen_name(gen);
        if name == 0 {
            return Err(R3rError::contract("Failed to create a sampler object."));
        }

        self.handle = Some(OglHandle::new(gl, name, handle::delete_sampler));
        self.apply(r3r_features, ogl_features);
        Ok(())
    }

    pub fn release(&mut self) {
        self.handle = None;
    }

    pub fn abandon(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.abandon();
        }
    }

    fn apply(&self, r3r_features: &R3rDeviceFeatures, ogl_features: &OglDeviceFeatures) {
        let handle = match self.handle.as_ref() {
            Some(h) => h,
            None => return,
        };

        let gl = handle.gl();
        let (pi, pf) = match (gl.sampler_parameteri, gl.sampler_parameterf) {
            (Some(pi), Some(pf)) => (pi, pf),
            _ => return,
        };

        let name = handle.get();
        let state = effective_state(&self.state, r3r_features);
        let clamp = ogl_features.is_clamp_to_edge_available;

        // SAFETY: plain enum/int arguments against a live sampler name.
        unsafe {
            pi(name, GL_TEXTURE_MAG_FILTER, gl_mag_filter(state.mag_filter) as GLint);
            pi(name, GL_TEXTURE_MIN_FILTER, gl_min_filter(state.min_filter, state.mipmap_mode) as GLint);
            pi(name, GL_TEXTURE_WRAP_S, gl_address_mode(state.address_mode_u, clamp) as GLint);
            pi(name, GL_TEXTURE_WRAP_T, gl_address_mode(state.address_mode_v, clamp) as GLint);

            if r3r_features.is_anisotropy_available {
                pf(name, GL_TEXTURE_MAX_ANISOTROPY, state.anisotropy as GLfloat);
            }
        }
    }
}
