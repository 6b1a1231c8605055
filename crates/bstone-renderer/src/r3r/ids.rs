// ids.rs -- typed resource ids handed out by the renderer
//
// Ids are never reused while the renderer lives and stay valid across a
// device reset.

use std::fmt;

macro_rules! r3r_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Resource kind, for messages.
            pub const KIND: &'static str = $kind;

            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} #{}", $kind, self.0)
            }
        }
    };
}

r3r_id!(
    /// Index or vertex buffer.
    R3rBufferId,
    "buffer"
);
r3r_id!(R3rTexture2dId, "texture");
r3r_id!(R3rSamplerId, "sampler");
r3r_id!(
    /// Vertex attribute layout plus index buffer.
    R3rVertexInputId,
    "vertex input"
);
r3r_id!(R3rShaderId, "shader");
r3r_id!(
    /// Linked vertex + fragment program.
    R3rShaderStageId,
    "shader stage"
);

/// A variable introspected from a shader stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct R3rShaderVarId {
    pub(crate) stage: R3rShaderStageId,
    pub(crate) index: u32,
}

impl R3rShaderVarId {
    pub const KIND: &'static str = "shader variable";

    pub fn stage(self) -> R3rShaderStageId {
        self.stage
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

/// Monotonic id source shared by every resource kind.
#[derive(Debug)]
pub(crate) struct R3rIdGenerator {
    next: u32,
}

impl R3rIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_raw(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_is_monotonic() {
        let mut gen = R3rIdGenerator::new();
        let a = R3rTexture2dId(gen.next_raw());
        let b = R3rTexture2dId(gen.next_raw());
        assert_eq!(a.get(), 1);
        assert!(b > a);
        assert_eq!(b.to_string(), "texture #2");
    }
}
