//! Window management using GLFW
//!
//! Creates the window with an OpenGL 3.3 core context and turns its events into
//! an [`InputState`] once per frame.

use glfw::Context;
use reflect_engine::core::WindowConfig;
use reflect_engine::foundation::math::Vec2;
use reflect_engine::input::{InputState, KeyCode};
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not start
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// No window or context was created
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    last_cursor: Option<(f64, f64)>,
    resized: Option<(u32, u32)>,
}

impl Window {
    /// Open a window and make its GL context current
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        glfw.set_swap_interval(if config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Opened {}x{} window '{}'", config.width, config.height, config.title);
        Ok(Self {
            glfw,
            window,
            events,
            last_cursor: None,
            resized: None,
        })
    }

    /// Resolve a GL entry point for the current context
    pub fn proc_address(&mut self, name: &str) -> *const std::ffi::c_void {
        self.window.get_proc_address(name) as *const _
    }

    /// Whether the window was asked to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Replace the title bar text
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Poll events into `input`
    ///
    /// The mouse delta is the previous cursor position minus the current one,
    /// summed over every cursor event this frame.
    pub fn poll_input(&mut self, input: &mut InputState) {
        input.begin_frame();
        self.glfw.poll_events();

        let mut delta = Vec2::zeros();
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::Key(key, _, action, _) => {
                    if let Some(code) = map_key(key) {
                        match action {
                            glfw::Action::Press => input.set_key(code, true),
                            glfw::Action::Release => input.set_key(code, false),
                            glfw::Action::Repeat => {}
                        }
                    }
                }
                glfw::WindowEvent::CursorPos(x, y) => {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        delta += Vec2::new((last_x - x) as f32, (last_y - y) as f32);
                    }
                    self.last_cursor = Some((x, y));
                }
                glfw::WindowEvent::FramebufferSize(width, height) => {
                    log::debug!("Framebuffer resized to {}x{}", width, height);
                    self.resized = Some((width.max(0) as u32, height.max(0) as u32));
                }
                _ => {}
            }
        }
        input.set_mouse_delta(delta);
    }

    /// Take the last framebuffer size change since the previous call
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.resized.take()
    }
}

fn map_key(key: glfw::Key) -> Option<KeyCode> {
    Some(match key {
        glfw::Key::W => KeyCode::W,
        glfw::Key::A => KeyCode::A,
        glfw::Key::S => KeyCode::S,
        glfw::Key::D => KeyCode::D,
        glfw::Key::Space => KeyCode::Space,
        glfw::Key::C => KeyCode::C,
        glfw::Key::Escape => KeyCode::Escape,
        glfw::Key::F12 => KeyCode::F12,
        _ => return None,
    })
}
