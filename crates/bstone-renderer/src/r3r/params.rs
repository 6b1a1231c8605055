// params.rs -- parameter blocks for renderer operations

use super::ids::{R3rBufferId, R3rShaderId};
use super::types::*;

// ============================================================
// Renderer
// ============================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R3rWindowInitParam {
    pub title: String,
    pub is_positioned: bool,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_fullscreen: bool,
}

impl Default for R3rWindowInitParam {
    fn default() -> Self {
        Self {
            title: bstone_common::common::DEFAULT_WINDOW_TITLE.to_string(),
            is_positioned: false,
            x: 0,
            y: 0,
            width: 640,
            height: 480,
            is_fullscreen: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R3rInitParam {
    pub renderer_path: R3rRendererPath,
    pub window: R3rWindowInitParam,
    pub aa_kind: R3rAaKind,
    pub aa_value: i32,
    pub is_vsync: bool,
}

impl Default for R3rInitParam {
    fn default() -> Self {
        Self {
            renderer_path: R3rRendererPath::Autodetect,
            window: R3rWindowInitParam::default(),
            aa_kind: R3rAaKind::None,
            aa_value: 1,
            is_vsync: true,
        }
    }
}

// ============================================================
// Buffers
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct R3rBufferInitParam {
    pub usage: R3rBufferUsage,
    /// Size in bytes.
    pub size: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct R3rBufferUpdateParam<'a> {
    /// Byte offset into the buffer.
    pub offset: usize,
    pub data: &'a [u8],
}

// ============================================================
// Textures and samplers
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct R3rTexture2dInitParam {
    pub pixel_format: R3rPixelFormat,
    pub width: i32,
    pub height: i32,
    /// Number of mipmap levels, 1 for none.
    pub mipmap_count: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct R3rTexture2dUpdateParam<'a> {
    pub mipmap_level: i32,
    /// Whole level, row-major, bottom row first as GL expects.
    pub image: &'a [Rgba8],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct R3rSamplerState {
    pub mag_filter: R3rFilterType,
    pub min_filter: R3rFilterType,
    pub mipmap_mode: R3rMipmapMode,
    pub address_mode_u: R3rAddressMode,
    pub address_mode_v: R3rAddressMode,
    pub anisotropy: i32,
}

impl Default for R3rSamplerState {
    fn default() -> Self {
        Self {
            mag_filter: R3rFilterType::Nearest,
            min_filter: R3rFilterType::Nearest,
            mipmap_mode: R3rMipmapMode::None,
            address_mode_u: R3rAddressMode::Clamp,
            address_mode_v: R3rAddressMode::Clamp,
            anisotropy: super::limits::R3rLimits::MIN_ANISOTROPY_OFF,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct R3rSamplerInitParam {
    pub state: R3rSamplerState,
}

// ============================================================
// Vertex input
// ============================================================

#[derive(Clone, Debug, PartialEq)]
pub struct R3rVertexAttribDescr {
    /// Use `default_value` instead of a buffer.
    pub is_default: bool,
    pub location: R3rVertexAttribLocation,
    pub format: R3rVertexAttribFormat,
    pub vertex_buffer: Option<R3rBufferId>,
    /// Byte offset of the first element.
    pub offset: usize,
    /// Byte distance between elements.
    pub stride: usize,
    pub default_value: [f32; 4],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct R3rVertexInputInitParam {
    pub index_buffer: Option<R3rBufferId>,
    pub attrib_descrs: Vec<R3rVertexAttribDescr>,
}

// ============================================================
// Shaders
// ============================================================

#[derive(Clone, Copy, Debug)]
pub struct R3rShaderInitParam<'a> {
    pub kind: R3rShaderType,
    pub source: &'a str,
}

/// Attribute name bound to an explicit location before linking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R3rShaderStageInputBinding {
    pub index: i32,
    pub name: String,
}

impl R3rShaderStageInputBinding {
    pub fn new(index: i32, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R3rShaderStageInitParam {
    pub vertex_shader: R3rShaderId,
    pub fragment_shader: R3rShaderId,
    pub input_bindings: Vec<R3rShaderStageInputBinding>,
}
