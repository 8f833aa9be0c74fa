//! # Rendering System
//!
//! Everything between a drawable and a pixel: the camera, mesh geometry,
//! textures, effects (shader programs with named parameters and techniques),
//! and the graphics-device command interface with its two implementations.
//!
//! ## Architecture
//!
//! - **Camera / Mesh**: plain data, no device knowledge
//! - **Effect**: parameter slots plus techniques whose passes hold shader kernels
//! - **GraphicsDevice**: the command interface drawables issue against
//! - **SoftwareDevice**: rasterizes on the CPU into color+depth surfaces
//! - **RecordingDevice**: logs commands for tests and diagnostics

pub mod device;
pub mod effect;
pub mod lighting;
pub mod primitives;
pub mod recording;
pub mod software;
pub mod texture;

pub use device::{ClearFlags, CullMode, DepthStencilState, GraphicsDevice, RasterizerState, RenderTargetId};
pub use effect::{Effect, ParameterHandle, ParameterKind, ParameterValue, TechniqueId};
pub use lighting::{Light, MAX_LIGHTS};
pub use primitives::{Camera, Mesh, Model, Vertex};
pub use recording::{DeviceCommand, RecordingDevice};
pub use software::SoftwareDevice;
pub use texture::{Color, CubeTexture, SamplerState, Texture2D, TextureRef};

use thiserror::Error;

/// Errors raised by the rendering layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A render target handle does not name a live surface
    #[error("Unknown render target")]
    UnknownRenderTarget,

    /// Render target dimensions are unusable
    #[error("Invalid render target size {width}x{height}")]
    InvalidTargetSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// A draw was issued before any pass was applied
    #[error("No effect pass applied before drawing")]
    NoActivePass,

    /// An indexed draw was issued without bound geometry
    #[error("No geometry bound")]
    NoGeometry,

    /// A draw referenced indices or vertices outside the bound buffers
    #[error("Draw out of range: {0}")]
    DrawOutOfRange(String),

    /// A pass index beyond the technique's pass list
    #[error("Technique '{technique}' has no pass {index}")]
    UnknownPass {
        /// Technique name
        technique: String,
        /// Requested pass
        index: usize,
    },

    /// A technique name or id the effect does not have
    #[error("Effect '{effect}' has no technique '{technique}'")]
    UnknownTechnique {
        /// Effect name
        effect: String,
        /// Requested technique
        technique: String,
    },

    /// An effect asset name with no built-in implementation
    #[error("Unknown effect '{0}'")]
    UnknownEffect(String),

    /// An effect definition is malformed
    #[error("Invalid effect: {0}")]
    InvalidEffect(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
