// Platform layer: winit windows with glutin GL contexts for the renderer.

pub mod gl_library;
pub mod glw_imp;
