// types.rs -- renderer-agnostic enums and plain value types

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Renderer implementation to bring up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum R3rRendererPath {
    #[default]
    None,
    /// Try every concrete path, best first.
    Autodetect,
    /// OpenGL 1.x fixed-function.
    Gl1x,
    /// OpenGL 2.x shaders on a compatibility context.
    Gl2x,
    /// OpenGL 3.2 core profile.
    Gl32Core,
    /// OpenGL ES 2.0.
    Gles20,
}

impl R3rRendererPath {
    /// Concrete paths in autodetection order.
    pub const AUTODETECT_ORDER: [R3rRendererPath; 4] = [
        R3rRendererPath::Gl32Core,
        R3rRendererPath::Gl2x,
        R3rRendererPath::Gles20,
        R3rRendererPath::Gl1x,
    ];

    /// Name used by the "vid_renderer" cvar.
    pub fn cvar_name(self) -> &'static str {
        match self {
            R3rRendererPath::None => "none",
            R3rRendererPath::Autodetect => "auto",
            R3rRendererPath::Gl1x => "gl_1_x",
            R3rRendererPath::Gl2x => "gl_2_x",
            R3rRendererPath::Gl32Core => "gl_3_2_c",
            R3rRendererPath::Gles20 => "gles_2_0",
        }
    }

    pub fn from_cvar_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [
            R3rRendererPath::Autodetect,
            R3rRendererPath::Gl1x,
            R3rRendererPath::Gl2x,
            R3rRendererPath::Gl32Core,
            R3rRendererPath::Gles20,
        ]
        .into_iter()
        .find(|p| p.cvar_name().eq_ignore_ascii_case(name))
    }

    pub fn description(self) -> &'static str {
        match self {
            R3rRendererPath::None => "None",
            R3rRendererPath::Autodetect => "Autodetect",
            R3rRendererPath::Gl1x => "OpenGL 1.x",
            R3rRendererPath::Gl2x => "OpenGL 2.x",
            R3rRendererPath::Gl32Core => "OpenGL 3.2 core",
            R3rRendererPath::Gles20 => "OpenGL ES 2.0",
        }
    }

    pub fn is_concrete(self) -> bool {
        !matches!(self, R3rRendererPath::None | R3rRendererPath::Autodetect)
    }
}

impl fmt::Display for R3rRendererPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rAaKind {
    #[default]
    None,
    Msaa,
}

impl R3rAaKind {
    pub fn from_cvar_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(R3rAaKind::None),
            "msaa" => Some(R3rAaKind::Msaa),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rPrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

/// Winding of front-facing polygons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rCullingFace {
    Clockwise,
    #[default]
    CounterClockwise,
}

/// Which faces are culled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rCullingMode {
    #[default]
    Back,
    Front,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rBlendingFactor {
    Zero,
    One,
    SrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct R3rBlendingFunc {
    pub src_factor: R3rBlendingFactor,
    pub dst_factor: R3rBlendingFactor,
}

impl Default for R3rBlendingFunc {
    fn default() -> Self {
        Self {
            src_factor: R3rBlendingFactor::SrcAlpha,
            dst_factor: R3rBlendingFactor::OneMinusSrcAlpha,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rFilterType {
    #[default]
    Nearest,
    Linear,
}

impl R3rFilterType {
    pub fn from_cvar_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" => Some(R3rFilterType::Nearest),
            "linear" => Some(R3rFilterType::Linear),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rMipmapMode {
    #[default]
    None,
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rAddressMode {
    #[default]
    Clamp,
    Repeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rBufferType {
    Index,
    Vertex,
}

impl R3rBufferType {
    pub fn name(self) -> &'static str {
        match self {
            R3rBufferType::Index => "index",
            R3rBufferType::Vertex => "vertex",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rBufferUsage {
    /// Rewritten every frame.
    #[default]
    StreamDraw,
    /// Written once.
    StaticDraw,
    /// Rewritten occasionally.
    DynamicDraw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum R3rPixelFormat {
    #[default]
    Rgba8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rShaderType {
    Vertex,
    Fragment,
}

impl R3rShaderType {
    pub fn name(self) -> &'static str {
        match self {
            R3rShaderType::Vertex => "vertex",
            R3rShaderType::Fragment => "fragment",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rShaderVarKind {
    Attribute,
    Uniform,
    Sampler,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rShaderVarTypeId {
    Int32,
    Float32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler2d,
}

impl R3rShaderVarTypeId {
    /// Byte size of one value of this type.
    pub fn value_size(self) -> usize {
        match self {
            R3rShaderVarTypeId::Int32 => 4,
            R3rShaderVarTypeId::Float32 => 4,
            R3rShaderVarTypeId::Vec2 => 8,
            R3rShaderVarTypeId::Vec3 => 12,
            R3rShaderVarTypeId::Vec4 => 16,
            R3rShaderVarTypeId::Mat4 => 64,
            R3rShaderVarTypeId::Sampler2d => 4,
        }
    }
}

/// A uniform value as submitted by a command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum R3rShaderVarValue {
    Int32(i32),
    Float32(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
    Sampler2d(i32),
}

impl R3rShaderVarValue {
    pub fn type_id(&self) -> R3rShaderVarTypeId {
        match self {
            R3rShaderVarValue::Int32(_) => R3rShaderVarTypeId::Int32,
            R3rShaderVarValue::Float32(_) => R3rShaderVarTypeId::Float32,
            R3rShaderVarValue::Vec2(_) => R3rShaderVarTypeId::Vec2,
            R3rShaderVarValue::Vec4(_) => R3rShaderVarTypeId::Vec4,
            R3rShaderVarValue::Mat4(_) => R3rShaderVarTypeId::Mat4,
            R3rShaderVarValue::Sampler2d(_) => R3rShaderVarTypeId::Sampler2d,
        }
    }

    pub fn value_size(&self) -> usize {
        self.type_id().value_size()
    }
}

/// Fixed vertex attribute slots shared by the shader and fixed-function paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum R3rVertexAttribLocation {
    Position,
    Color,
    TexCoords,
}

impl R3rVertexAttribLocation {
    pub fn index(self) -> u32 {
        match self {
            R3rVertexAttribLocation::Position => 0,
            R3rVertexAttribLocation::Color => 1,
            R3rVertexAttribLocation::TexCoords => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rVertexAttribFormat {
    /// Four normalized unsigned bytes.
    Rgba8Unorm,
    /// Two 32-bit floats.
    Rg32Sfloat,
    /// Three 32-bit floats.
    Rgb32Sfloat,
}

impl R3rVertexAttribFormat {
    pub fn component_count(self) -> i32 {
        match self {
            R3rVertexAttribFormat::Rgba8Unorm => 4,
            R3rVertexAttribFormat::Rg32Sfloat => 2,
            R3rVertexAttribFormat::Rgb32Sfloat => 3,
        }
    }

    pub fn size(self) -> usize {
        match self {
            R3rVertexAttribFormat::Rgba8Unorm => 4,
            R3rVertexAttribFormat::Rg32Sfloat => 8,
            R3rVertexAttribFormat::Rgb32Sfloat => 12,
        }
    }
}

/// Matrix slots of the fixed-function transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum R3rMatrixKind {
    Model,
    View,
    Projection,
}

/// 32-bit RGBA color, one byte per channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct R3rViewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Default for R3rViewport {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct R3rScissorBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Screen contents as tightly packed RGB rows, top row first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct R3rRgb888Image {
    pub width: i32,
    pub height: i32,
    pub pixels: Vec<u8>,
}
