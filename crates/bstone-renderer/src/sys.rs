//! Window and GL context collaborators.
//!
//! The renderer never talks to the platform directly. The application hands
//! it a `WindowMgr` that creates windows with a GL context attached; the
//! renderer owns each window it creates and drives its context through
//! `GlContext`.

use std::os::raw::c_void;

/// Resolves GL entry points for the current context.
pub trait GlSymbolLoader {
    /// True if some GL context is current on the calling thread.
    fn has_current_context(&self) -> bool;

    /// Address of `symbol`, or null if it is not provided.
    fn get_proc_address(&mut self, symbol: &str) -> *const c_void;
}

/// Requested context flavor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GlContextProfile {
    #[default]
    Compatibility,
    Core,
    Es,
}

/// Everything needed to create a window with a GL context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlWindowAttributes {
    pub title: String,
    pub is_positioned: bool,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_fullscreen: bool,
    pub is_visible: bool,

    pub profile: GlContextProfile,
    /// Requested version, 0.0 for "any".
    pub major_version: u8,
    pub minor_version: u8,
    /// 0 or 1 disables window multisampling.
    pub multisample_count: i32,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub is_double_buffering: bool,
}

impl Default for GlWindowAttributes {
    fn default() -> Self {
        Self {
            title: String::new(),
            is_positioned: false,
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            is_fullscreen: false,
            is_visible: false,
            profile: GlContextProfile::Compatibility,
            major_version: 0,
            minor_version: 0,
            multisample_count: 0,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 0,
            depth_bits: 0,
            is_double_buffering: true,
        }
    }
}

/// A GL context bound to one window surface.
pub trait GlContext: GlSymbolLoader {
    fn make_current(&mut self) -> Result<(), String>;

    fn is_current(&self) -> bool;

    fn swap_buffers(&mut self) -> Result<(), String>;

    fn set_swap_interval(&mut self, interval: i32) -> Result<(), String>;

    fn swap_interval(&self) -> i32;

    /// Samples per pixel of the default framebuffer.
    fn samples(&self) -> i32;
}

/// A window owning a GL context.
pub trait GlWindow {
    /// Size of the drawable area in pixels.
    fn drawable_size(&self) -> (i32, i32);

    fn set_title(&mut self, title: &str);

    fn set_mode(&mut self, width: i32, height: i32, is_fullscreen: bool) -> Result<(), String>;

    fn show(&mut self, is_visible: bool);

    fn context(&mut self) -> &mut dyn GlContext;

    /// Replace the context with a fresh one created from the same attributes.
    fn recreate_context(&mut self) -> Result<(), String>;
}

/// Creates windows for the renderer.
pub trait WindowMgr {
    fn create_window(&mut self, attributes: &GlWindowAttributes) -> Result<Box<dyn GlWindow>, String>;
}
