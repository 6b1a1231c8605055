//! Renderer-agnostic layer ("3D renderer").
//!
//! The game talks to the renderer through the types in this module: typed
//! resource ids, init/update parameter blocks, command buffers and the
//! backend-independent device feature set. `crate::ogl` implements it.

pub mod command;
pub mod device_features;
pub mod error;
pub mod ids;
pub mod limits;
pub mod params;
pub mod types;
pub mod utils;

pub use command::{R3rCmd, R3rCmdBuffer, R3rCmdBufferId, R3rCmdMgr, R3rDrawIndexedParam};
pub use device_features::{R3rDeviceFeatures, R3rDeviceInfo};
pub use error::{R3rError, R3rResult};
pub use ids::*;
pub use limits::R3rLimits;
pub use params::*;
pub use types::*;
pub use utils::R3rUtils;
