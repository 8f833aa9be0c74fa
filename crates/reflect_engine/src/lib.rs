//! # Reflect Engine
//!
//! Real-time reflections with dual-paraboloid environment maps.
//!
//! ## Features
//!
//! - **Paraboloid Capture**: The scene around a focal point is rendered into
//!   two hemisphere maps every frame and sampled by a reflective object
//! - **Drawables**: Mesh, inside-out environment and billboard draw styles
//!   driven by named shader parameters
//! - **Software Device**: A rasterizing [`render::GraphicsDevice`] with render
//!   targets, so the whole pipeline runs and tests without a GPU
//! - **Configuration**: TOML or RON files describing window, cameras and scene
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reflect_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut device = SoftwareDevice::new(config.window.width, config.window.height);
//!     let mut content = ContentManager::from_config(&config.assets);
//!     let mut scene = SceneComposer::new(&config, &mut content, &mut device)?;
//!
//!     scene.frame(&mut device, &mut NullOverlay, &InputState::new(), 1.0 / 60.0)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod core;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ContentManager},
        config::{Config, ConfigError},
        core::ApplicationConfig,
        foundation::{
            math::{Mat4, Vec2, Vec3, Vec4},
            time::Timer,
        },
        input::{InputState, KeyCode},
        render::{
            Camera, Color, Effect, GraphicsDevice, RecordingDevice, RenderError, SoftwareDevice,
            TextureRef,
        },
        scene::{
            DrawStyle, Drawable, DrawableDesc, NullOverlay, Overlay, SceneComposer, SceneDescription,
            SceneError,
        },
    };
}
