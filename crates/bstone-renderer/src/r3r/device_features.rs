// device_features.rs -- backend-independent capability report

/// What the device can do, as seen by the game.
///
/// Filled once while probing or initializing; read-only afterwards. Missing
/// capabilities are recorded as `false` with the matching "off" limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R3rDeviceFeatures {
    pub is_vsync_available: bool,
    pub is_vsync_requires_restart: bool,

    pub max_texture_dimension: i32,
    pub max_viewport_width: i32,
    pub max_viewport_height: i32,

    pub is_anisotropy_available: bool,
    pub max_anisotropy_degree: i32,

    pub is_npot_available: bool,
    pub is_mipmap_available: bool,
    pub is_sampler_available: bool,

    pub msaa_is_available: bool,
    pub msaa_is_render_to_window: bool,
    pub msaa_is_requires_restart: bool,
    pub msaa_max_degree: i32,

    pub max_vertex_input_locations: i32,
}

impl Default for R3rDeviceFeatures {
    fn default() -> Self {
        use crate::r3r::limits::R3rLimits;

        Self {
            is_vsync_available: false,
            is_vsync_requires_restart: false,
            max_texture_dimension: 0,
            max_viewport_width: 0,
            max_viewport_height: 0,
            is_anisotropy_available: false,
            max_anisotropy_degree: R3rLimits::MIN_ANISOTROPY_OFF,
            is_npot_available: false,
            is_mipmap_available: false,
            is_sampler_available: false,
            msaa_is_available: false,
            msaa_is_render_to_window: false,
            msaa_is_requires_restart: false,
            msaa_max_degree: R3rLimits::MIN_AA_OFF,
            max_vertex_input_locations: 0,
        }
    }
}

/// Identification strings reported by the driver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct R3rDeviceInfo {
    pub name: String,
    pub vendor: String,
    pub version: String,
}
