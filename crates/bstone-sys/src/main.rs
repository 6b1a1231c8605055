// Entry point -- opens the renderer and presents the VGA screen every tick.
//
// Startup order:
//   1. Register the video cvars and apply "+set" pairs from the command line
//   2. Install the console logger (developer output follows the cvar)
//   3. Initialize the renderer, falling back through the detected paths
//   4. Pump window events, fill the screen buffer, present

use std::process::ExitCode;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use bstone_common::common::{version_string, DEFAULT_WINDOW_TITLE, PALETTE_SIZE, VGA_HEIGHT, VGA_MAX_COMPONENT, VGA_WIDTH};
use bstone_common::cvar::{cvar_init, with_cvar_ctx};
use bstone_common::logger::ConsoleLogger;
use bstone_renderer::config::{VidCfg, DEVELOPER};
use bstone_renderer::hw_screen::HwScreen;
use bstone_renderer::ogl::OglRenderer;
use bstone_renderer::palette::VgaPalette;
use bstone_sys::glw_imp::GlwWindowMgr;

/// VGA mode 13h refresh rate; frames are paced to it when vsync is off.
const TICK_RATE: u64 = 70;

struct BstoneApp {
    should_exit: bool,
}

impl ApplicationHandler for BstoneApp {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.should_exit = true,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.should_exit = true,
            _ => {}
        }
    }
}

/// A 256-entry ramp cycling through the hues, in 6-bit VGA components.
fn demo_palette() -> VgaPalette {
    let mut palette: VgaPalette = [[0; 3]; PALETTE_SIZE];

    for (i, entry) in palette.iter_mut().enumerate() {
        let ramp = (i % 64) as u8;
        let fall = VGA_MAX_COMPONENT - ramp;

        *entry = match i / 64 {
            0 => [ramp, 0, fall],
            1 => [VGA_MAX_COMPONENT, ramp, 0],
            2 => [fall, VGA_MAX_COMPONENT, ramp],
            _ => [0, fall, VGA_MAX_COMPONENT],
        };
    }

    palette
}

fn fill_screen(buffer: &mut [u8], frame: u32) {
    for (y, row) in buffer.chunks_mut(VGA_WIDTH).enumerate() {
        for (x, index) in row.iter_mut().enumerate() {
            *index = ((x as u32 + y as u32 * 2 + frame) & 0xFF) as u8;
        }
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    cvar_init();
    let (cfg, rest) = with_cvar_ctx(|cvars| {
        VidCfg::register(cvars);
        let rest = cvars.parse_command_line(&args);
        (VidCfg::from_cvars(cvars), rest)
    })
    .ok_or_else(|| "Cvar system not initialized.".to_string())?;

    ConsoleLogger::init(cfg.is_developer);
    info!("{}", version_string());

    if !rest.is_empty() {
        warn!("Ignoring arguments: {}", rest.join(" "));
    }

    if cfg.is_developer {
        with_cvar_ctx(|cvars| {
            cvars.list("vid_");
            cvars.list(DEVELOPER);
        });
    }

    let mut mgr = GlwWindowMgr::new()?;
    let mut renderer = OglRenderer::new();

    renderer
        .initialize(&mut mgr, &cfg.init_param(DEFAULT_WINDOW_TITLE))
        .map_err(|e| format!("No usable renderer: {}", e))?;

    info!("Renderer: {} ({}).", renderer.get_name(), renderer.get_description());

    let result = main_loop(&mut mgr, &mut renderer, &cfg);

    renderer.uninitialize();
    result
}

fn main_loop(mgr: &mut GlwWindowMgr, renderer: &mut OglRenderer, cfg: &VidCfg) -> Result<(), String> {
    let mut hw = HwScreen::new(renderer, cfg).map_err(|e| e.to_string())?;

    let result = (|| -> Result<(), String> {
        hw.update_palette(&demo_palette(), 0, PALETTE_SIZE)
            .map_err(|e| e.to_string())?;

        let mut app = BstoneApp { should_exit: false };
        let tick = Duration::from_micros(1_000_000 / TICK_RATE);
        let mut frame = 0u32;

        while !app.should_exit {
            let frame_start = Instant::now();

            if mgr.pump_events(&mut app) {
                break;
            }

            if renderer.device_is_lost() {
                if renderer.device_is_ready_to_reset() {
                    renderer.device_reset().map_err(|e| e.to_string())?;
                } else {
                    std::thread::sleep(tick);
                }
                continue;
            }

            fill_screen(hw.screen_buffer_mut(), frame);
            hw.present(renderer).map_err(|e| e.to_string())?;
            frame = frame.wrapping_add(1);

            let elapsed = frame_start.elapsed();
            if !cfg.is_vsync && elapsed < tick {
                std::thread::sleep(tick - elapsed);
            }
        }

        info!("Presented {} frames of {}x{}.", frame, VGA_WIDTH, VGA_HEIGHT);
        Ok(())
    })();

    hw.destroy(renderer);
    result
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
