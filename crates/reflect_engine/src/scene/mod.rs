//! # Scene
//!
//! Drawables built from a [`SceneDescription`], the paraboloid capture pass and
//! the [`SceneComposer`] that runs each frame.

pub mod capture;
pub mod composer;
pub mod description;
pub mod drawable;
pub mod frame_rate;

pub use capture::{CaptureOutput, CaptureTargets};
pub use composer::{NullOverlay, Overlay, SceneComposer};
pub use description::{DrawStyle, DrawableDesc, SceneDescription};
pub use drawable::Drawable;
pub use frame_rate::FrameRateCounter;

use thiserror::Error;

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::render::RenderError;

/// Scene errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// The device rejected a command
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Content could not be loaded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// The scene description is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A mesh-drawn drawable names no mesh
    #[error("Drawable '{0}' has no mesh")]
    MissingMesh(String),
}
