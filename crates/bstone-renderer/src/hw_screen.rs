// hw_screen.rs -- 320x200 indexed screen drawn as one textured quad
//
// The game writes palette indices into the screen buffer. Each `present`
// converts them through the current palette, uploads the texture and draws
// it letterboxed to 4:3 in the window.

use crate::config::VidCfg;
use crate::indexed_texture::IndexedTexture;
use crate::ogl::shader_source;
use crate::ogl::{OglRenderer, OglRendererBackend};
use crate::palette::{RgbaPalette, VgaPalette};
use crate::r3r::*;
use bstone_common::common::{VGA_HEIGHT, VGA_WIDTH};
use bytemuck::{Pod, Zeroable};
use log::{debug, info};
use std::mem::{offset_of, size_of};

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, //
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const CLEAR_COLOR: Rgba8 = Rgba8 { r: 0, g: 0, b: 0, a: 255 };

const DISPLAY_ASPECT_NUM: i32 = 4;
const DISPLAY_ASPECT_DEN: i32 = 3;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct HwScreenVertex {
    pub xyz: [f32; 3],
    pub rgba: Rgba8,
    pub uv: [f32; 2],
}

/// Column-major orthographic projection.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> [f32; 16] {
    let mut m = [0.0; 16];
    m[0] = 2.0 / (right - left);
    m[5] = 2.0 / (top - bottom);
    m[10] = -2.0 / (far - near);
    m[12] = -(right + left) / (right - left);
    m[13] = -(top + bottom) / (top - bottom);
    m[14] = -(far + near) / (far - near);
    m[15] = 1.0;
    m
}

/// Largest 4:3 rectangle centered in the drawable.
pub fn letterbox_viewport(drawable_width: i32, drawable_height: i32) -> R3rViewport {
    let drawable_width = drawable_width.max(1);
    let drawable_height = drawable_height.max(1);

    let (width, height) = if drawable_width * DISPLAY_ASPECT_DEN > drawable_height * DISPLAY_ASPECT_NUM {
        (drawable_height * DISPLAY_ASPECT_NUM / DISPLAY_ASPECT_DEN, drawable_height)
    } else {
        (drawable_width, drawable_width * DISPLAY_ASPECT_DEN / DISPLAY_ASPECT_NUM)
    };

    R3rViewport {
        x: (drawable_width - width) / 2,
        y: (drawable_height - height) / 2,
        width: width.max(1),
        height: height.max(1),
        ..R3rViewport::default()
    }
}

/// Quad covering the VGA area; `u_max`/`v_max` skip the padding of a POT texture.
fn quad_vertices(u_max: f32, v_max: f32) -> [HwScreenVertex; 4] {
    let w = VGA_WIDTH as f32;
    let h = VGA_HEIGHT as f32;
    let white = Rgba8::new(255, 255, 255, 255);

    // Row 0 of the screen buffer is the top of the screen.
    [
        HwScreenVertex { xyz: [0.0, 0.0, 0.0], rgba: white, uv: [0.0, v_max] },
        HwScreenVertex { xyz: [w, 0.0, 0.0], rgba: white, uv: [u_max, v_max] },
        HwScreenVertex { xyz: [w, h, 0.0], rgba: white, uv: [u_max, 0.0] },
        HwScreenVertex { xyz: [0.0, h, 0.0], rgba: white, uv: [0.0, 0.0] },
    ]
}

struct HwScreenStage {
    vertex_shader: R3rShaderId,
    fragment_shader: R3rShaderId,
    stage: R3rShaderStageId,
    model_var: Option<R3rShaderVarId>,
    view_var: Option<R3rShaderVarId>,
    projection_var: Option<R3rShaderVarId>,
    sampler_var: Option<R3rShaderVarId>,
}

pub struct HwScreen {
    palette: RgbaPalette,
    screen: IndexedTexture,

    index_buffer: Option<R3rBufferId>,
    vertex_buffer: Option<R3rBufferId>,
    vertex_input: Option<R3rVertexInputId>,
    sampler: Option<R3rSamplerId>,
    stage: Option<HwScreenStage>,

    cmd_mgr: R3rCmdMgr,
    cmd_buffer: R3rCmdBufferId,
}

impl HwScreen {
    /// Create every GPU object needed to show the screen.
    /// On failure the objects created so far are released.
    pub fn new(renderer: &mut OglRenderer, cfg: &VidCfg) -> R3rResult<Self> {
        let features = renderer.get_device_features().clone();

        let screen = IndexedTexture::new(
            VGA_WIDTH as i32,
            VGA_HEIGHT as i32,
            features.is_npot_available,
            cfg.is_texture_mipmap,
        )?;

        let mut cmd_mgr = R3rCmdMgr::new();
        let cmd_buffer = cmd_mgr.create_buffer(16);

        let mut hw = Self {
            palette: RgbaPalette::default(),
            screen,
            index_buffer: None,
            vertex_buffer: None,
            vertex_input: None,
            sampler: None,
            stage: None,
            cmd_mgr,
            cmd_buffer,
        };

        if let Err(err) = hw.create_objects(renderer, cfg, &features) {
            hw.destroy(renderer);
            return Err(err);
        }

        info!(
            "[R3R] Screen texture {}x{} ({}x{} allocated).",
            hw.screen.width(),
            hw.screen.height(),
            hw.screen.actual_width(),
            hw.screen.actual_height()
        );

        Ok(hw)
    }

    fn create_objects(&mut self, renderer: &mut OglRenderer, cfg: &VidCfg, features: &R3rDeviceFeatures) -> R3rResult<()> {
        self.screen.create(renderer)?;

        let index_bytes: &[u8] = bytemuck::cast_slice(&QUAD_INDICES);
        let index_buffer = renderer.index_buffer_create(&R3rBufferInitParam {
            usage: R3rBufferUsage::StaticDraw,
            size: index_bytes.len(),
        })?;
        self.index_buffer = Some(index_buffer);
        renderer.buffer_update(index_buffer, &R3rBufferUpdateParam { offset: 0, data: index_bytes })?;

        let u_max = self.screen.width() as f32 / self.screen.actual_width() as f32;
        let v_max = self.screen.height() as f32 / self.screen.actual_height() as f32;
        let vertices = quad_vertices(u_max, v_max);
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&vertices);

        let vertex_buffer = renderer.vertex_buffer_create(&R3rBufferInitParam {
            usage: R3rBufferUsage::StaticDraw,
            size: vertex_bytes.len(),
        })?;
        self.vertex_buffer = Some(vertex_buffer);
        renderer.buffer_update(vertex_buffer, &R3rBufferUpdateParam { offset: 0, data: vertex_bytes })?;

        let attrib = |location, format, offset| R3rVertexAttribDescr {
            is_default: false,
            location,
            format,
            vertex_buffer: Some(vertex_buffer),
            offset,
            stride: size_of::<HwScreenVertex>(),
            default_value: [0.0; 4],
        };

        self.vertex_input = Some(renderer.vertex_input_create(&R3rVertexInputInitParam {
            index_buffer: Some(index_buffer),
            attrib_descrs: vec![
                attrib(
                    R3rVertexAttribLocation::Position,
                    R3rVertexAttribFormat::Rgb32Sfloat,
                    offset_of!(HwScreenVertex, xyz),
                ),
                attrib(
                    R3rVertexAttribLocation::Color,
                    R3rVertexAttribFormat::Rgba8Unorm,
                    offset_of!(HwScreenVertex, rgba),
                ),
                attrib(
                    R3rVertexAttribLocation::TexCoords,
                    R3rVertexAttribFormat::Rg32Sfloat,
                    offset_of!(HwScreenVertex, uv),
                ),
            ],
        })?);

        self.sampler = Some(renderer.sampler_create(&R3rSamplerInitParam {
            state: cfg.sampler_state(features),
        })?);

        if renderer.get_backend() != OglRendererBackend::Gl1x {
            self.create_stage(renderer)?;
        }

        Ok(())
    }

    fn create_stage(&mut self, renderer: &mut OglRenderer) -> R3rResult<()> {
        let dialect = renderer.get_glsl_dialect();

        let vertex_shader = renderer.shader_create(&R3rShaderInitParam {
            kind: R3rShaderType::Vertex,
            source: &shader_source::screen_vertex_source(dialect),
        })?;

        let fragment_shader = match renderer.shader_create(&R3rShaderInitParam {
            kind: R3rShaderType::Fragment,
            source: &shader_source::screen_fragment_source(dialect),
        }) {
            Ok(id) => id,
            Err(err) => {
                renderer.shader_destroy(vertex_shader);
                return Err(err);
            }
        };

        let stage = renderer.shader_stage_create(&R3rShaderStageInitParam {
            vertex_shader,
            fragment_shader,
            input_bindings: vec![
                R3rShaderStageInputBinding::new(
                    R3rVertexAttribLocation::Position.index() as i32,
                    shader_source::POSITION_NAME,
                ),
                R3rShaderStageInputBinding::new(R3rVertexAttribLocation::Color.index() as i32, shader_source::COLOR_NAME),
                R3rShaderStageInputBinding::new(
                    R3rVertexAttribLocation::TexCoords.index() as i32,
                    shader_source::TX_COORDS_NAME,
                ),
            ],
        });

        let stage = match stage {
            Ok(id) => id,
            Err(err) => {
                renderer.shader_destroy(fragment_shader);
                renderer.shader_destroy(vertex_shader);
                return Err(err);
            }
        };

        let find = |name: &str| {
            let var = renderer.shader_stage_find_var(stage, name);
            if var.is_none() {
                debug!("[R3R] Screen shader has no \"{}\".", name);
            }
            var
        };

        self.stage = Some(HwScreenStage {
            vertex_shader,
            fragment_shader,
            stage,
            model_var: find(shader_source::MODEL_MAT_NAME),
            view_var: find(shader_source::VIEW_MAT_NAME),
            projection_var: find(shader_source::PROJECTION_MAT_NAME),
            sampler_var: find(shader_source::SAMPLER_NAME),
        });

        Ok(())
    }

    /// Replace `count` palette entries starting at `offset` (6-bit VGA components).
    pub fn update_palette(&mut self, vga: &VgaPalette, offset: usize, count: usize) -> R3rResult<()> {
        self.palette.update_from_vga(vga, offset, count)
    }

    pub fn palette(&self) -> &RgbaPalette {
        &self.palette
    }

    /// Row-major palette indices, `VGA_WIDTH` by `VGA_HEIGHT`.
    pub fn screen_buffer_mut(&mut self) -> &mut [u8] {
        self.screen.indexed_mut()
    }

    /// Apply changed filter, mipmap or anisotropy settings.
    pub fn apply_sampler_cfg(&mut self, renderer: &mut OglRenderer, cfg: &VidCfg) -> R3rResult<()> {
        let sampler = self.sampler.ok_or_else(|| R3rError::contract("Screen has no sampler."))?;
        let state = cfg.sampler_state(renderer.get_device_features());
        renderer.sampler_update(sampler, &state)
    }

    fn record(&mut self, drawable_size: (i32, i32)) -> R3rResult<()> {
        let texture = self.screen.texture_id();
        let sampler = self.sampler;
        let vertex_input = self.vertex_input;

        let projection = ortho(0.0, VGA_WIDTH as f32, 0.0, VGA_HEIGHT as f32, -1.0, 1.0);
        let (drawable_width, drawable_height) = drawable_size;

        let buffer = self
            .cmd_mgr
            .get_mut(self.cmd_buffer)
            .ok_or_else(|| R3rError::contract("Screen command buffer missing."))?;

        buffer.clear();

        buffer.push(R3rCmd::SetViewport(R3rViewport {
            width: drawable_width.max(1),
            height: drawable_height.max(1),
            ..R3rViewport::default()
        }));
        buffer.push(R3rCmd::Clear { color: CLEAR_COLOR });
        buffer.push(R3rCmd::SetViewport(letterbox_viewport(drawable_width, drawable_height)));

        buffer.push(R3rCmd::EnableCulling(false));
        buffer.push(R3rCmd::EnableDepthTest(false));
        buffer.push(R3rCmd::EnableDepthWrite(false));
        buffer.push(R3rCmd::EnableBlending(false));

        buffer.push(R3rCmd::SetTexture(texture));
        buffer.push(R3rCmd::SetSampler(sampler));
        buffer.push(R3rCmd::SetVertexInput(vertex_input));

        match &self.stage {
            Some(stage) => {
                buffer.push(R3rCmd::SetShaderStage(Some(stage.stage)));

                for (var, value) in [
                    (stage.model_var, IDENTITY),
                    (stage.view_var, IDENTITY),
                    (stage.projection_var, projection),
                ] {
                    if let Some(var) = var {
                        buffer.push(R3rCmd::SetMat4Uniform { var, value });
                    }
                }

                if let Some(var) = stage.sampler_var {
                    buffer.push(R3rCmd::SetSampler2dUniform { var, value: 0 });
                }
            }
            None => {
                buffer.push(R3rCmd::SetFixedMatrix {
                    kind: R3rMatrixKind::Model,
                    value: IDENTITY,
                });
                buffer.push(R3rCmd::SetFixedMatrix {
                    kind: R3rMatrixKind::View,
                    value: IDENTITY,
                });
                buffer.push(R3rCmd::SetFixedMatrix {
                    kind: R3rMatrixKind::Projection,
                    value: projection,
                });
            }
        }

        buffer.push(R3rCmd::DrawQuads { count: 1, index_offset: 0 });
        Ok(())
    }

    /// Upload the screen, draw it and swap buffers.
    pub fn present(&mut self, renderer: &mut OglRenderer) -> R3rResult<()> {
        self.screen.upload(renderer, &self.palette)?;
        self.record(renderer.get_drawable_size())?;
        renderer.execute_commands(&self.cmd_mgr)?;
        renderer.present()
    }

    pub fn destroy(&mut self, renderer: &mut OglRenderer) {
        if let Some(stage) = self.stage.take() {
            renderer.shader_stage_destroy(stage.stage);
            renderer.shader_destroy(stage.fragment_shader);
            renderer.shader_destroy(stage.vertex_shader);
        }

        if let Some(id) = self.sampler.take() {
            renderer.sampler_destroy(id);
        }

        if let Some(id) = self.vertex_input.take() {
            renderer.vertex_input_destroy(id);
        }

        if let Some(id) = self.vertex_buffer.take() {
            renderer.buffer_destroy(id);
        }

        if let Some(id) = self.index_buffer.take() {
            renderer.buffer_destroy(id);
        }

        self.screen.destroy(renderer);
    }
}
