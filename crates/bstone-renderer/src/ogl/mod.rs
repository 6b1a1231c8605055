//! OpenGL backend of the renderer.
//!
//! `OglApi` resolves entry points into a `GlFns` table, `OglExtensionMgr` and
//! `device_features` decide which code paths the context supports, and
//! `OglRenderer` drives everything through the game-facing `r3r` interface.

pub mod api;
pub mod buffer;
pub mod device_features;
pub mod extensions;
pub mod framebuffer;
pub mod gl;
pub mod handle;
pub mod renderer;
pub mod sampler;
pub mod shader;
pub mod shader_source;
pub mod shader_stage;
pub mod state;
pub mod texture_2d;
pub mod version;
pub mod vertex_input;

pub use api::OglApi;
pub use device_features::OglDeviceFeatures;
pub use extensions::{OglExtensionId, OglExtensionMgr};
pub use renderer::{OglRenderer, OglRendererBackend, OglRendererState};
pub use version::OglVersion;
