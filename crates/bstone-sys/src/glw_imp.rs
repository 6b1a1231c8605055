// glw_imp.rs -- windows and GL contexts using winit + glutin
//
// Implements the renderer's window collaborator. Each window owns one glutin
// context and surface; symbols the context loader cannot resolve are looked
// up in the system GL library.

use std::ffi::{c_void, CString};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use glutin::config::{Api, ColorBufferType, Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributes, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    PossiblyCurrentGlContext, Version,
};
use glutin::display::{Display, GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow as GlutinWindowExt};
use log::{debug, info, warn};
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window};

use bstone_renderer::sys::{GlContext, GlContextProfile, GlSymbolLoader, GlWindow, GlWindowAttributes, WindowMgr};

use crate::gl_library::GlLibrary;

// =============================================================================
// Config selection
// =============================================================================

/// Rank a config by its sample count. Counts at or under the request beat
/// larger ones; the closest to the request wins within each group.
pub fn samples_rank(samples: u8, requested: u8) -> (bool, u8) {
    if samples <= requested.max(1) {
        (true, samples)
    } else {
        (false, u8::MAX - samples)
    }
}

fn template_for(attributes: &GlWindowAttributes) -> ConfigTemplateBuilder {
    let api = match attributes.profile {
        GlContextProfile::Es => Api::GLES2,
        GlContextProfile::Compatibility | GlContextProfile::Core => Api::OPENGL,
    };

    let mut template = ConfigTemplateBuilder::new()
        .with_api(api)
        .with_buffer_type(ColorBufferType::Rgb {
            r_size: attributes.red_bits,
            g_size: attributes.green_bits,
            b_size: attributes.blue_bits,
        })
        .with_alpha_size(attributes.alpha_bits)
        .with_depth_size(attributes.depth_bits)
        .with_single_buffering(!attributes.is_double_buffering);

    if attributes.multisample_count > 1 {
        template = template.with_multisampling(attributes.multisample_count.min(u8::MAX as i32) as u8);
    }

    template
}

fn context_attributes_for(attributes: &GlWindowAttributes, window: &Window) -> Result<ContextAttributes, String> {
    let version = if attributes.major_version == 0 {
        None
    } else {
        Some(Version::new(attributes.major_version, attributes.minor_version))
    };

    let builder = match attributes.profile {
        GlContextProfile::Es => ContextAttributesBuilder::new().with_context_api(ContextApi::Gles(version)),
        GlContextProfile::Core => ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(version))
            .with_profile(GlProfile::Core),
        GlContextProfile::Compatibility => ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(version))
            .with_profile(GlProfile::Compatibility),
    };

    let handle = window
        .window_handle()
        .map_err(|e| format!("Window handle unavailable: {}", e))?
        .as_raw();

    Ok(builder.build(Some(handle)))
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

// =============================================================================
// Context
// =============================================================================

pub struct GlwContext {
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    display: Display,
    config: Config,
    context_attributes: ContextAttributes,
    library: Option<Rc<GlLibrary>>,
    swap_interval: i32,
}

impl GlwContext {
    fn create(
        config: &Config,
        context_attributes: &ContextAttributes,
        surface: &Surface<WindowSurface>,
    ) -> Result<PossiblyCurrentContext, String> {
        let display = config.display();

        // SAFETY: the attributes carry the handle of the window the surface was
        // created for, and that window outlives the context.
        let not_current = unsafe { display.create_context(config, context_attributes) }
            .map_err(|e| format!("Context creation failed: {}", e))?;

        not_current
            .make_current(surface)
            .map_err(|e| format!("Failed to make the context current: {}", e))
    }
}

impl GlSymbolLoader for GlwContext {
    fn has_current_context(&self) -> bool {
        self.context.is_current()
    }

    fn get_proc_address(&mut self, symbol: &str) -> *const c_void {
        let name = match CString::new(symbol) {
            Ok(name) => name,
            Err(_) => return std::ptr::null(),
        };

        let address = self.display.get_proc_address(&name);
        if !address.is_null() {
            return address;
        }

        match &self.library {
            Some(library) => library.get(symbol),
            None => std::ptr::null(),
        }
    }
}

impl GlContext for GlwContext {
    fn make_current(&mut self) -> Result<(), String> {
        self.context
            .make_current(&self.surface)
            .map_err(|e| format!("Failed to make the context current: {}", e))
    }

    fn is_current(&self) -> bool {
        self.context.is_current()
    }

    fn swap_buffers(&mut self) -> Result<(), String> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| format!("Failed to swap buffers: {}", e))
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<(), String> {
        let swap_interval = if interval > 0 {
            SwapInterval::Wait(non_zero(interval as u32))
        } else {
            SwapInterval::DontWait
        };

        self.surface
            .set_swap_interval(&self.context, swap_interval)
            .map_err(|e| format!("Failed to set swap interval {}: {}", interval, e))?;

        self.swap_interval = interval.max(0);
        Ok(())
    }

    fn swap_interval(&self) -> i32 {
        self.swap_interval
    }

    fn samples(&self) -> i32 {
        self.config.num_samples() as i32
    }
}

// =============================================================================
// Window
// =============================================================================

pub struct GlwWindow {
    // Dropped before the window it renders to.
    gl: GlwContext,
    window: Window,
}

impl GlwWindow {
    fn resize_surface(&mut self) {
        let size = self.window.inner_size();
        self.gl
            .surface
            .resize(&self.gl.context, non_zero(size.width), non_zero(size.height));
    }
}

impl GlWindow for GlwWindow {
    fn drawable_size(&self) -> (i32, i32) {
        let size = self.window.inner_size();
        (size.width as i32, size.height as i32)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn set_mode(&mut self, width: i32, height: i32, is_fullscreen: bool) -> Result<(), String> {
        if width <= 0 || height <= 0 {
            return Err(format!("Invalid window size {}x{}.", width, height));
        }

        if is_fullscreen {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            self.window.set_fullscreen(None);
            let _ = self
                .window
                .request_inner_size(PhysicalSize::new(width as u32, height as u32));
        }

        self.resize_surface();
        Ok(())
    }

    fn show(&mut self, is_visible: bool) {
        self.window.set_visible(is_visible);
    }

    fn context(&mut self) -> &mut dyn GlContext {
        &mut self.gl
    }

    fn recreate_context(&mut self) -> Result<(), String> {
        let context = GlwContext::create(&self.gl.config, &self.gl.context_attributes, &self.gl.surface)?;
        self.gl.context = context;
        self.gl.swap_interval = 0;
        info!("Recreated GL context.");
        Ok(())
    }
}

// =============================================================================
// Window manager
// =============================================================================

/// Owns the event loop every window is created on.
pub struct GlwWindowMgr {
    event_loop: EventLoop<()>,
    library: Option<Rc<GlLibrary>>,
    library_profile: Option<GlContextProfile>,
}

impl GlwWindowMgr {
    pub fn new() -> Result<Self, String> {
        let event_loop = EventLoop::new().map_err(|e| format!("Event loop creation failed: {}", e))?;

        Ok(Self {
            event_loop,
            library: None,
            library_profile: None,
        })
    }

    fn library_for(&mut self, profile: GlContextProfile) -> Option<Rc<GlLibrary>> {
        let is_es = profile == GlContextProfile::Es;
        let cached_is_es = self.library_profile.map(|p| p == GlContextProfile::Es);

        if cached_is_es != Some(is_es) {
            self.library = match GlLibrary::open(profile) {
                Ok(library) => {
                    debug!("Opened {}.", library.name());
                    Some(Rc::new(library))
                }
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            self.library_profile = Some(profile);
        }

        self.library.clone()
    }

    /// Dispatch pending window events without blocking.
    /// Returns true once the event loop has exited.
    pub fn pump_events<A: ApplicationHandler>(&mut self, app: &mut A) -> bool {
        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), app);
        matches!(status, PumpStatus::Exit(_))
    }
}

impl WindowMgr for GlwWindowMgr {
    fn create_window(&mut self, attributes: &GlWindowAttributes) -> Result<Box<dyn GlWindow>, String> {
        debug!(
            "Creating window {}x{} ({:?} {}.{}, {} samples).",
            attributes.width,
            attributes.height,
            attributes.profile,
            attributes.major_version,
            attributes.minor_version,
            attributes.multisample_count
        );

        let mut window_attributes = Window::default_attributes()
            .with_title(attributes.title.as_str())
            .with_inner_size(PhysicalSize::new(
                attributes.width.max(1) as u32,
                attributes.height.max(1) as u32,
            ))
            .with_visible(attributes.is_visible);

        if attributes.is_positioned {
            window_attributes = window_attributes.with_position(PhysicalPosition::new(attributes.x, attributes.y));
        }

        if attributes.is_fullscreen {
            window_attributes = window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let requested_samples = attributes.multisample_count.clamp(0, u8::MAX as i32) as u8;

        let (window, config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes))
            .build(&self.event_loop, template_for(attributes), |configs| {
                // glutin fails the build on an empty match before picking.
                configs
                    .reduce(|best, config| {
                        let rank = samples_rank(config.num_samples(), requested_samples);
                        if rank > samples_rank(best.num_samples(), requested_samples) {
                            config
                        } else {
                            best
                        }
                    })
                    .expect("config list is never empty")
            })
            .map_err(|e| format!("No matching GL config: {}", e))?;

        let window = window.ok_or_else(|| "Window creation failed.".to_string())?;

        let surface_attributes = window
            .build_surface_attributes(SurfaceAttributesBuilder::<WindowSurface>::new())
            .map_err(|e| format!("Surface attributes failed: {}", e))?;

        let display = config.display();

        // SAFETY: the surface is dropped before `window` (see GlwWindow).
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .map_err(|e| format!("Surface creation failed: {}", e))?;

        let context_attributes = context_attributes_for(attributes, &window)?;
        let context = GlwContext::create(&config, &context_attributes, &surface)?;
        let library = self.library_for(attributes.profile);

        debug!("Window created with {} samples.", config.num_samples());

        Ok(Box::new(GlwWindow {
            gl: GlwContext {
                context,
                surface,
                display,
                config,
                context_attributes,
                library,
                swap_interval: 0,
            },
            window,
        }))
    }
}
