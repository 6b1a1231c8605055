// config.rs -- video configuration read from "vid_*" cvars

use crate::r3r::*;
use bstone_common::common::{VGA_HEIGHT, VGA_WIDTH};
use bstone_common::cvar::{CvarContext, CVAR_ARCHIVE, CVAR_LATCH, CVAR_ZERO};
use log::warn;

pub const VID_RENDERER: &str = "vid_renderer";
pub const VID_WIDTH: &str = "vid_width";
pub const VID_HEIGHT: &str = "vid_height";
pub const VID_FULLSCREEN: &str = "vid_fullscreen";
pub const VID_VSYNC: &str = "vid_vsync";
pub const VID_AA_KIND: &str = "vid_aa_kind";
pub const VID_AA_DEGREE: &str = "vid_aa_degree";
pub const VID_TEXTURE_ANISOTROPY: &str = "vid_texture_anisotropy";
pub const VID_2D_TEXTURE_FILTER: &str = "vid_2d_texture_filter";
pub const VID_TEXTURE_MIPMAP: &str = "vid_texture_mipmap";
pub const DEVELOPER: &str = "developer";

/// Validated video settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VidCfg {
    pub renderer_path: R3rRendererPath,
    pub width: i32,
    pub height: i32,
    pub is_fullscreen: bool,
    pub is_vsync: bool,
    pub aa_kind: R3rAaKind,
    pub aa_degree: i32,
    pub texture_anisotropy: i32,
    pub texture_2d_filter: R3rFilterType,
    pub is_texture_mipmap: bool,
    pub is_developer: bool,
}

impl Default for VidCfg {
    fn default() -> Self {
        Self {
            renderer_path: R3rRendererPath::Autodetect,
            width: 640,
            height: 480,
            is_fullscreen: false,
            is_vsync: true,
            aa_kind: R3rAaKind::None,
            aa_degree: R3rLimits::MIN_AA_OFF,
            texture_anisotropy: R3rLimits::MIN_ANISOTROPY_OFF,
            texture_2d_filter: R3rFilterType::Nearest,
            is_texture_mipmap: false,
            is_developer: false,
        }
    }
}

impl VidCfg {
    /// Create every video cvar with its default. Existing values are kept.
    pub fn register(cvars: &mut CvarContext) {
        let defaults = Self::default();
        let latched = CVAR_ARCHIVE | CVAR_LATCH;

        cvars.get(VID_RENDERER, defaults.renderer_path.cvar_name(), latched);
        cvars.get(VID_WIDTH, &defaults.width.to_string(), latched);
        cvars.get(VID_HEIGHT, &defaults.height.to_string(), latched);
        cvars.get(VID_FULLSCREEN, "0", latched);
        cvars.get(VID_VSYNC, "1", CVAR_ARCHIVE);
        cvars.get(VID_AA_KIND, "none", CVAR_ARCHIVE);
        cvars.get(VID_AA_DEGREE, &defaults.aa_degree.to_string(), CVAR_ARCHIVE);
        cvars.get(VID_TEXTURE_ANISOTROPY, &defaults.texture_anisotropy.to_string(), CVAR_ARCHIVE);
        cvars.get(VID_2D_TEXTURE_FILTER, "nearest", CVAR_ARCHIVE);
        cvars.get(VID_TEXTURE_MIPMAP, "0", CVAR_ARCHIVE);
        cvars.get(DEVELOPER, "0", CVAR_ZERO);
    }

    /// Read the cvars. Unknown names fall back to the default with a warning;
    /// numbers are clamped to what the renderer accepts.
    pub fn from_cvars(cvars: &CvarContext) -> Self {
        let defaults = Self::default();

        let renderer_path = parse_name(cvars, VID_RENDERER, R3rRendererPath::from_cvar_name, defaults.renderer_path);
        let aa_kind = parse_name(cvars, VID_AA_KIND, R3rAaKind::from_cvar_name, defaults.aa_kind);
        let texture_2d_filter = parse_name(
            cvars,
            VID_2D_TEXTURE_FILTER,
            R3rFilterType::from_cvar_name,
            defaults.texture_2d_filter,
        );

        let aa_degree = cvars.variable_int(VID_AA_DEGREE);
        let anisotropy = cvars.variable_int(VID_TEXTURE_ANISOTROPY);

        Self {
            renderer_path,
            width: cvars.variable_int(VID_WIDTH).max(VGA_WIDTH as i32),
            height: cvars.variable_int(VID_HEIGHT).max(VGA_HEIGHT as i32),
            is_fullscreen: cvars.variable_int(VID_FULLSCREEN) != 0,
            is_vsync: cvars.variable_int(VID_VSYNC) != 0,
            aa_kind,
            aa_degree: R3rLimits::clamp_aa(aa_degree, R3rLimits::MAX_AA),
            texture_anisotropy: R3rLimits::clamp_anisotropy(anisotropy, R3rLimits::MAX_ANISOTROPY),
            texture_2d_filter,
            is_texture_mipmap: cvars.variable_int(VID_TEXTURE_MIPMAP) != 0,
            is_developer: cvars.variable_int(DEVELOPER) != 0,
        }
    }

    pub fn init_param(&self, title: &str) -> R3rInitParam {
        R3rInitParam {
            renderer_path: self.renderer_path,
            window: R3rWindowInitParam {
                title: title.to_string(),
                width: self.width,
                height: self.height,
                is_fullscreen: self.is_fullscreen,
                ..R3rWindowInitParam::default()
            },
            aa_kind: self.aa_kind,
            aa_value: self.aa_degree,
            is_vsync: self.is_vsync,
        }
    }

    /// Sampler state for the 2D screen texture, limited by the device.
    pub fn sampler_state(&self, features: &R3rDeviceFeatures) -> R3rSamplerState {
        let mipmap_mode = if self.is_texture_mipmap {
            R3rMipmapMode::Linear
        } else {
            R3rMipmapMode::None
        };

        let anisotropy = if features.is_anisotropy_available {
            R3rLimits::clamp_anisotropy(self.texture_anisotropy, features.max_anisotropy_degree)
        } else {
            R3rLimits::MIN_ANISOTROPY_OFF
        };

        R3rSamplerState {
            mag_filter: self.texture_2d_filter,
            min_filter: self.texture_2d_filter,
            mipmap_mode,
            address_mode_u: R3rAddressMode::Clamp,
            address_mode_v: R3rAddressMode::Clamp,
            anisotropy,
        }
    }
}

fn parse_name<T: Copy>(cvars: &CvarContext, name: &str, parse: fn(&str) -> Option<T>, default: T) -> T {
    let value = cvars.variable_string(name);

    if value.is_empty() {
        return default;
    }

    parse(value).unwrap_or_else(|| {
        warn!("[R3R] Invalid {} value \"{}\".", name, value);
        default
    })
}
