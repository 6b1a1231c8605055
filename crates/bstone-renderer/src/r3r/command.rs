// command.rs -- per-frame command buffers
//
// The game records value-typed commands into buffers owned by a manager;
// the renderer walks every enabled buffer in creation order.

use super::ids::*;
use super::types::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct R3rDrawIndexedParam {
    pub primitive_type: R3rPrimitiveType,
    /// Number of indices to draw.
    pub vertex_count: usize,
    /// Size of one index: 1, 2 or 4.
    pub index_byte_depth: usize,
    /// Byte offset of the first index in the buffer.
    pub index_buffer_offset: usize,
    /// Index of the first index, added to `index_buffer_offset`.
    pub index_offset: usize,
}

/// One recorded command.
#[derive(Clone, Debug, PartialEq)]
pub enum R3rCmd {
    Clear { color: Rgba8 },

    SetViewport(R3rViewport),
    EnableScissor(bool),
    SetScissorBox(R3rScissorBox),

    EnableCulling(bool),
    SetCullingFace(R3rCullingFace),
    SetCullingMode(R3rCullingMode),

    EnableDepthTest(bool),
    EnableDepthWrite(bool),

    EnableBlending(bool),
    SetBlendingFunc(R3rBlendingFunc),

    SetTexture(Option<R3rTexture2dId>),
    SetSampler(Option<R3rSamplerId>),
    SetVertexInput(Option<R3rVertexInputId>),
    SetShaderStage(Option<R3rShaderStageId>),

    SetInt32Uniform { var: R3rShaderVarId, value: i32 },
    SetFloat32Uniform { var: R3rShaderVarId, value: f32 },
    SetVec2Uniform { var: R3rShaderVarId, value: [f32; 2] },
    SetVec4Uniform { var: R3rShaderVarId, value: [f32; 4] },
    SetMat4Uniform { var: R3rShaderVarId, value: [f32; 16] },
    SetSampler2dUniform { var: R3rShaderVarId, value: i32 },

    /// Fixed-function transform (1.x backend only).
    SetFixedMatrix { kind: R3rMatrixKind, value: [f32; 16] },

    /// Draw `count` quads of six 16-bit indices each, starting at quad `index_offset`.
    DrawQuads { count: usize, index_offset: usize },
    DrawIndexed(R3rDrawIndexedParam),
}

impl R3rCmd {
    pub fn name(&self) -> &'static str {
        match self {
            R3rCmd::Clear { .. } => "clear",
            R3rCmd::SetViewport(_) => "set viewport",
            R3rCmd::EnableScissor(_) => "enable scissor",
            R3rCmd::SetScissorBox(_) => "set scissor box",
            R3rCmd::EnableCulling(_) => "enable culling",
            R3rCmd::SetCullingFace(_) => "set culling face",
            R3rCmd::SetCullingMode(_) => "set culling mode",
            R3rCmd::EnableDepthTest(_) => "enable depth test",
            R3rCmd::EnableDepthWrite(_) => "enable depth write",
            R3rCmd::EnableBlending(_) => "enable blending",
            R3rCmd::SetBlendingFunc(_) => "set blending function",
            R3rCmd::SetTexture(_) => "set texture",
            R3rCmd::SetSampler(_) => "set sampler",
            R3rCmd::SetVertexInput(_) => "set vertex input",
            R3rCmd::SetShaderStage(_) => "set shader stage",
            R3rCmd::SetInt32Uniform { .. } => "set int32 uniform",
            R3rCmd::SetFloat32Uniform { .. } => "set float32 uniform",
            R3rCmd::SetVec2Uniform { .. } => "set vec2 uniform",
            R3rCmd::SetVec4Uniform { .. } => "set vec4 uniform",
            R3rCmd::SetMat4Uniform { .. } => "set mat4 uniform",
            R3rCmd::SetSampler2dUniform { .. } => "set sampler2d uniform",
            R3rCmd::SetFixedMatrix { .. } => "set fixed matrix",
            R3rCmd::DrawQuads { .. } => "draw quads",
            R3rCmd::DrawIndexed(_) => "draw indexed",
        }
    }
}

/// An ordered list of commands.
#[derive(Clone, Debug, Default)]
pub struct R3rCmdBuffer {
    is_enabled: bool,
    commands: Vec<R3rCmd>,
}

impl R3rCmdBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            is_enabled: true,
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn enable(&mut self, is_enabled: bool) {
        self.is_enabled = is_enabled;
    }

    pub fn push(&mut self, cmd: R3rCmd) {
        self.commands.push(cmd);
    }

    /// Forget every recorded command; the allocation is kept for the next frame.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R3rCmd> {
        self.commands.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct R3rCmdBufferId(usize);

/// Owns the command buffers submitted to the renderer each frame.
#[derive(Debug, Default)]
pub struct R3rCmdMgr {
    buffers: Vec<Option<R3rCmdBuffer>>,
}

impl R3rCmdMgr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_buffer(&mut self, initial_capacity: usize) -> R3rCmdBufferId {
        let buffer = R3rCmdBuffer::with_capacity(initial_capacity);

        if let Some(slot) = self.buffers.iter().position(Option::is_none) {
            self.buffers[slot] = Some(buffer);
            return R3rCmdBufferId(slot);
        }

        self.buffers.push(Some(buffer));
        R3rCmdBufferId(self.buffers.len() - 1)
    }

    pub fn destroy_buffer(&mut self, id: R3rCmdBufferId) {
        if let Some(slot) = self.buffers.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn get(&self, id: R3rCmdBufferId) -> Option<&R3rCmdBuffer> {
        self.buffers.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: R3rCmdBufferId) -> Option<&mut R3rCmdBuffer> {
        self.buffers.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live buffers in creation order.
    pub fn buffers(&self) -> impl Iterator<Item = &R3rCmdBuffer> {
        self.buffers.iter().flatten()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_buffer_records_in_order() {
        let mut buffer = R3rCmdBuffer::with_capacity(4);
        assert!(buffer.is_enabled());
        buffer.push(R3rCmd::EnableDepthTest(false));
        buffer.push(R3rCmd::DrawQuads { count: 1, index_offset: 0 });
        let names: Vec<_> = buffer.iter().map(R3rCmd::name).collect();
        assert_eq!(names, vec!["enable depth test", "draw quads"]);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_cmd_mgr_reuses_slots() {
        let mut mgr = R3rCmdMgr::new();
        let a = mgr.create_buffer(8);
        let b = mgr.create_buffer(8);
        assert_ne!(a, b);
        mgr.destroy_buffer(a);
        assert!(mgr.get(a).is_none());
        assert_eq!(mgr.buffer_count(), 1);
        let c = mgr.create_buffer(8);
        assert_eq!(a, c);
        assert_eq!(mgr.buffer_count(), 2);
    }
}
