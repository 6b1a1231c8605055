#![allow(clippy::new_without_default, clippy::too_many_arguments, clippy::float_cmp)]
// OpenGL rendering layer: renderer-agnostic commands, the GL backend and the
// palette pipeline that turns the game's indexed pixels into RGBA textures.

pub mod config;
pub mod hw_screen;
pub mod indexed_texture;
pub mod ogl;
pub mod palette;
pub mod r3r;
pub mod sys;

#[cfg(test)]
pub(crate) mod fake_gl;
