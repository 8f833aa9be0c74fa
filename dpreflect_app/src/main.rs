//! Dual-paraboloid reflections demo
//!
//! Renders the scene with the software device and shows the result in a GLFW
//! window. Controls: WASD to move, Space/C to fly, mouse to look, F12 for a
//! screenshot, Escape to quit.
//!
//! Set `DPREFLECT_CONFIG` to a `.toml` or `.ron` file to override the defaults.

mod presenter;
mod window;

use std::path::PathBuf;

use reflect_engine::assets::{image_loader, AssetError, ContentManager};
use reflect_engine::config::{Config, ConfigError};
use reflect_engine::core::ApplicationConfig;
use reflect_engine::foundation::logging;
use reflect_engine::foundation::math::Vec2;
use reflect_engine::foundation::time::Timer;
use reflect_engine::input::InputState;
use reflect_engine::render::{Color, SoftwareDevice};
use reflect_engine::scene::{Overlay, SceneComposer, SceneError};
use thiserror::Error;

use crate::presenter::{PresentError, Presenter};
use crate::window::{Window, WindowError};

/// Environment variable naming a config file
const CONFIG_ENV: &str = "DPREFLECT_CONFIG";

/// Application errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The config file could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The window or GL context could not be created
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// The blit program could not be built
    #[error("Presentation error: {0}")]
    Present(#[from] PresentError),

    /// The scene failed to build or resize
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// A screenshot could not be written
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Shows overlay text in the window title
struct TitleOverlay {
    base: String,
    text: String,
    shown: String,
}

impl TitleOverlay {
    fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            text: String::new(),
            shown: String::new(),
        }
    }

    /// Push the latest text to the title bar if it changed
    fn refresh(&mut self, window: &mut Window) {
        let title = format!("{} - {}", self.base, self.text);
        if title != self.shown {
            window.set_title(&title);
            self.shown = title;
        }
    }
}

impl Overlay for TitleOverlay {
    fn draw_text(&mut self, text: &str, _position: Vec2, _color: Color) {
        self.text.clear();
        self.text.push_str(text);
    }
}

fn load_config() -> Result<ApplicationConfig, AppError> {
    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = ApplicationConfig::load_from_file(&path)?;
            log::info!("Loaded configuration from {:?}", path);
            config
        }
        None => ApplicationConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn save_screenshot(device: &SoftwareDevice, frame: u64) -> Result<(), AppError> {
    let surface = device.back_buffer();
    let path = format!("screenshot_{frame:06}.png");
    image_loader::save_png(&path, surface.width(), surface.height(), surface.to_rgba8())?;
    Ok(())
}

fn run(config: &ApplicationConfig) -> Result<(), AppError> {
    let mut window = Window::new(&config.window)?;
    let presenter = Presenter::new(|name| window.proc_address(name))?;

    let (width, height) = window.framebuffer_size();
    let mut device = SoftwareDevice::new(width.max(1), height.max(1));
    let mut content = ContentManager::from_config(&config.assets);
    let mut scene = SceneComposer::new(config, &mut content, &mut device)?;
    log::info!("Loaded {} assets", content.cached_count());

    let mut input = InputState::new();
    let mut overlay = TitleOverlay::new(&config.window.title);
    let mut timer = Timer::new();

    while !window.should_close() && !scene.exit_requested() {
        window.poll_input(&mut input);
        if let Some((width, height)) = window.take_resize() {
            scene.resize(&mut device, width, height)?;
        }

        let elapsed = timer.tick();
        if let Err(e) = scene.frame(&mut device, &mut overlay, &input, elapsed) {
            log::warn!("Frame {} failed: {}", timer.frame_count(), e);
        }

        if scene.take_screenshot_request() {
            if let Err(e) = save_screenshot(&device, timer.frame_count()) {
                log::warn!("Screenshot failed: {}", e);
            }
        }

        let (width, height) = window.framebuffer_size();
        presenter.present(device.back_buffer(), width, height);
        window.swap_buffers();

        overlay.refresh(&mut window);
    }

    log::info!(
        "Exiting after {} frames, {:.1} fps average",
        timer.frame_count(),
        timer.average_fps()
    );
    scene.release(&mut device);
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    logging::init(&config.engine.log_level);
    log::info!("Starting dual-paraboloid reflections demo");

    if let Err(e) = run(&config) {
        log::error!("Application error: {}", e);
        std::process::exit(1);
    }
}
