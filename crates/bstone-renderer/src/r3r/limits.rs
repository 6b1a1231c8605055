// limits.rs -- renderer-wide numeric limits

/// Floors and ceilings every backend clamps its capabilities to.
pub struct R3rLimits;

impl R3rLimits {
    /// Anisotropy degree meaning "filtering off".
    pub const MIN_ANISOTROPY_OFF: i32 = 1;
    /// Smallest degree that actually enables anisotropic filtering.
    pub const MIN_ANISOTROPY_ON: i32 = 2;
    pub const MAX_ANISOTROPY: i32 = 16;

    /// Sample count meaning "anti-aliasing off".
    pub const MIN_AA_OFF: i32 = 1;
    /// Smallest sample count that actually enables MSAA.
    pub const MIN_AA_ON: i32 = 2;
    pub const MAX_AA: i32 = 32;

    pub const MIN_TEXTURE_DIMENSION: i32 = 1;
    /// Largest power of two an `i32` dimension can hold.
    pub const MAX_POT_DIMENSION: i32 = 1 << 30;
    pub const MAX_MIPMAP_COUNT: i32 = 31;

    /// Attribute locations required by the built-in vertex layout.
    pub const MIN_VERTEX_INPUT_LOCATIONS: i32 = 3;

    /// Clamp a requested anisotropy degree against a device maximum.
    pub fn clamp_anisotropy(value: i32, device_max: i32) -> i32 {
        if value < Self::MIN_ANISOTROPY_ON || device_max < Self::MIN_ANISOTROPY_ON {
            return Self::MIN_ANISOTROPY_OFF;
        }

        value.min(device_max).min(Self::MAX_ANISOTROPY)
    }

    /// Clamp a requested MSAA sample count against a device maximum.
    pub fn clamp_aa(value: i32, device_max: i32) -> i32 {
        if value < Self::MIN_AA_ON || device_max < Self::MIN_AA_ON {
            return Self::MIN_AA_OFF;
        }

        value.min(device_max).min(Self::MAX_AA)
    }
}
