#![allow(clippy::new_without_default, clippy::float_cmp)]
// Shared engine services: console logging, console variables and build constants.

pub mod common;
pub mod cvar;
pub mod logger;
