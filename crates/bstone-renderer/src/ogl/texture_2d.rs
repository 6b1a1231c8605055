// texture_2d.rs -- 2D RGBA textures

use super::api::check_errors;
use super::device_features::{OglContextKind, OglDeviceFeatures, OglMipmapKind};
use super::gl::*;
use super::handle::{self, OglHandle};
use super::sampler;
use super::state::OglState;
use crate::r3r::*;
use std::os::raw::c_void;
use std::rc::Rc;

pub struct OglTexture2d {
    width: i32,
    height: i32,
    mipmap_count: i32,
    handle: OglHandle,
    /// Sampler state last written as texture parameters.
    applied_state: Option<R3rSamplerState>,
}

impl OglTexture2d {
    pub fn new(
        gl: &Rc<GlFns>,
        r3r_features: &R3rDeviceFeatures,
        ogl_features: &OglDeviceFeatures,
        state: &mut OglState,
        param: &R3rTexture2dInitParam,
    ) -> R3rResult<Self> {
        validate_param(r3r_features, param)?;

        let mut texture = Self {
            width: param.width,
            height: param.height,
            mipmap_count: param.mipmap_count,
            handle: OglHandle::new(gl, 0, handle::delete_texture),
            applied_state: None,
        };

        texture.recreate(gl, ogl_features, state)?;
        Ok(texture)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn mipmap_count(&self) -> i32 {
        self.mipmap_count
    }

    pub fn gl_name(&self) -> GLuint {
        self.handle.get()
    }

    pub fn bind(&self, gl: &GlFns, state: &mut OglState) {
        state.bind_texture_2d(gl, self.handle.get());
    }

    /// Upload one whole mipmap level.
    pub fn update(&mut self, state: &mut OglState, param: &R3rTexture2dUpdateParam<'_>) -> R3rResult<()> {
        if param.mipmap_level < 0 || param.mipmap_level >= self.mipmap_count {
            return Err(R3rError::contract(format!(
                "Mipmap level {} out of range (0..{}).",
                param.mipmap_level, self.mipmap_count
            )));
        }

        let level_width = R3rUtils::mipmap_dimension(self.width, param.mipmap_level);
        let level_height = R3rUtils::mipmap_dimension(self.height, param.mipmap_level);
        let texel_count = (level_width * level_height) as usize;

        if param.image.len() != texel_count {
            return Err(R3rError::contract(format!(
                "Expected {} texels for a {}x{} level, got {}.",
                texel_count,
                level_width,
                level_height,
                param.image.len()
            )));
        }

        let gl = self.handle.gl();
        state.bind_texture_2d(gl, self.handle.get());

        // SAFETY: `image` holds exactly level_width * level_height RGBA8 texels.
        unsafe {
            (gl.tex_sub_image_2d)(
                GL_TEXTURE_2D,
                param.mipmap_level,
                0,
                0,
                level_width,
                level_height,
                GL_RGBA,
                GL_UNSIGNED_BYTE,
                param.image.as_ptr() as *const c_void,
            );
        }

        check_errors(gl, "glTexSubImage2D")
    }

    /// Generate levels 1.. from level 0 on the GPU.
    pub fn generate_mipmaps(&mut self, features: &OglDeviceFeatures, state: &mut OglState) -> R3rResult<()> {
        if self.mipmap_count <= 1 {
            return Err(R3rError::contract("Base mipmap only."));
        }

        match features.mipmap_kind {
            OglMipmapKind::Function => {
                let gl = self.handle.gl();
                state.bind_texture_2d(gl, self.handle.get());
                if let Some(f) = gl.generate_mipmap {
                    // SAFETY: plain enum argument against the bound texture.
                    unsafe { f(GL_TEXTURE_2D) };
                }
                check_errors(gl, "glGenerateMipmap")
            }
            // Regenerated by the driver on every level 0 upload.
            OglMipmapKind::Sgis => Ok(()),
            OglMipmapKind::None => Err(R3rError::contract("Mipmap generation not available.")),
        }
    }

    /// Write sampler state as texture parameters unless it is already there.
    pub fn apply_sampler_state(
        &mut self,
        r3r_features: &R3rDeviceFeatures,
        ogl_features: &OglDeviceFeatures,
        state: &mut OglState,
        sampler_state: &R3rSamplerState,
    ) {
        if self.applied_state.as_ref() == Some(sampler_state) {
            return;
        }

        let gl = self.handle.gl();
        state.bind_texture_2d(gl, self.handle.get());
        sampler::apply_to_bound_texture(gl, sampler_state, r3r_features, ogl_features);
        self.applied_state = Some(*sampler_state);
    }

    /// Allocate fresh storage for every level. Contents are undefined until
    /// the owner uploads them again.
    pub fn recreate(&mut self, gl: &Rc<GlFns>, features: &OglDeviceFeatures, state: &mut OglState) -> R3rResult<()> {
        self.handle.reset();
        self.applied_state = None;

        let name = handle::gen_name(gl.gen_textures);
        if name == 0 {
            return Err(R3rError::contract("Failed to create a texture object."));
        }

        self.handle = OglHandle::new(gl, name, handle::delete_texture);
        state.bind_texture_2d(gl, name);

        let internal_format = if features.context_kind == OglContextKind::Es {
            GL_RGBA
        } else {
            GL_RGBA8
        };

        // SAFETY: plain enum/int arguments; null data only allocates.
        unsafe {
            if features.context_kind != OglContextKind::Es {
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_BASE_LEVEL, 0);
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_TEXTURE_MAX_LEVEL, self.mipmap_count - 1);
            }

            if features.mipmap_kind == OglMipmapKind::Sgis && self.mipmap_count > 1 {
                (gl.tex_parameteri)(GL_TEXTURE_2D, GL_GENERATE_MIPMAP, GL_TRUE as GLint);
            }

            for level in 0..self.mipmap_count {
                (gl.tex_image_2d)(
                    GL_TEXTURE_2D,
                    level,
                    internal_format as GLint,
                    R3rUtils::mipmap_dimension(self.width, level),
                    R3rUtils::mipmap_dimension(self.height, level),
                    0,
                    GL_RGBA,
                    GL_UNSIGNED_BYTE,
                    std::ptr::null(),
                );
            }
        }

        check_errors(gl, "glTexImage2D")
    }

    pub fn release(&mut self) {
        self.handle.reset();
        self.applied_state = None;
    }

    pub fn abandon(&mut self) {
        self.handle.abandon();
    }
}

fn validate_param(features: &R3rDeviceFeatures, param: &R3rTexture2dInitParam) -> R3rResult<()> {
    let max_dimension = features.max_texture_dimension;

    if param.width < R3rLimits::MIN_TEXTURE_DIMENSION || param.width > max_dimension {
        return Err(R3rError::contract(format!("Texture width {} out of range.", param.width)));
    }

    if param.height < R3rLimits::MIN_TEXTURE_DIMENSION || param.height > max_dimension {
        return Err(R3rError::contract(format!("Texture height {} out of range.", param.height)));
    }

    if !features.is_npot_available && (!R3rUtils::is_pot_value(param.width) || !R3rUtils::is_pot_value(param.height)) {
        return Err(R3rError::contract(format!(
            "Non-power-of-two texture {}x{} not supported.",
            param.width, param.height
        )));
    }

    let max_mipmap_count = R3rUtils::calculate_mipmap_count(param.width, param.height);
    if param.mipmap_count < 1 || param.mipmap_count > max_mipmap_count {
        return Err(R3rError::contract(format!(
            "Mipmap count {} out of range (1..={}).",
            param.mipmap_count, max_mipmap_count
        )));
    }

    Ok(())
}
