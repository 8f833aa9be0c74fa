//! # Graphics Device Abstraction
//!
//! The command surface drawables and the capture pipeline talk to. It mirrors a
//! classic immediate-mode device: bind a render target (or the back buffer),
//! clear it, set pipeline state, bind geometry, apply an effect pass, issue
//! indexed draws.
//!
//! ## State model
//! Rasterizer, depth-stencil and sampler state are device-wide and persist until
//! changed. An applied pass may override cull and depth state for the draws that
//! follow it; the override ends at the next `apply_pass` and never changes the
//! device-wide values.
//!
//! ## Implementations
//! - [`crate::render::software::SoftwareDevice`]: CPU rasterizer
//! - [`crate::render::recording::RecordingDevice`]: headless command log

use std::sync::Arc;

use bitflags::bitflags;

use crate::render::effect::Effect;
use crate::render::primitives::{IndexBuffer, Vertex, VertexBuffer};
use crate::render::texture::{Color, SamplerState};
use crate::render::RenderResult;

slotmap::new_key_type! {
    /// Handle to an off-screen color+depth surface owned by a device
    pub struct RenderTargetId;
}

bitflags! {
    /// Buffers affected by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u8 {
        /// Color buffer
        const TARGET = 0b01;
        /// Depth buffer
        const DEPTH = 0b10;
    }
}

/// Which triangles the rasterizer discards
///
/// Front faces wind counter-clockwise in normalized device coordinates (y up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// Draw everything
    None,
    /// Discard back faces; the default
    Back,
    /// Discard front faces; used to see the inside of closed meshes
    Front,
}

/// Rasterizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerState {
    /// Face culling
    pub cull: CullMode,
}

impl RasterizerState {
    /// Cull back faces
    pub const CULL_BACK: Self = Self { cull: CullMode::Back };
    /// Cull front faces
    pub const CULL_FRONT: Self = Self { cull: CullMode::Front };
    /// No culling
    pub const CULL_NONE: Self = Self { cull: CullMode::None };
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self::CULL_BACK
    }
}

/// Depth test and write configuration; the comparison is less-or-equal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilState {
    /// Compare fragments against the depth buffer
    pub depth_test: bool,
    /// Store fragment depth on success
    pub depth_write: bool,
}

impl DepthStencilState {
    /// Test and write
    pub const DEFAULT: Self = Self { depth_test: true, depth_write: true };
    /// Test without writing
    pub const READ_ONLY: Self = Self { depth_test: true, depth_write: false };
    /// Neither test nor write
    pub const NONE: Self = Self { depth_test: false, depth_write: false };
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Command interface of a graphics device
pub trait GraphicsDevice {
    /// Size of the back buffer in pixels
    fn back_buffer_size(&self) -> (u32, u32);

    /// Resize the back buffer; its contents are discarded
    fn resize_back_buffer(&mut self, width: u32, height: u32);

    /// Allocate an off-screen color+depth surface
    fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<RenderTargetId>;

    /// Free a surface; unknown ids are ignored
    fn release_render_target(&mut self, target: RenderTargetId);

    /// Direct subsequent draws to a surface, or to the back buffer with `None`
    fn set_render_target(&mut self, target: Option<RenderTargetId>) -> RenderResult<()>;

    /// Currently bound surface; `None` is the back buffer
    fn render_target(&self) -> Option<RenderTargetId>;

    /// Clear the bound surface; depth clears to 1
    fn clear(&mut self, flags: ClearFlags, color: Color);

    /// Set the device-wide rasterizer state
    fn set_rasterizer_state(&mut self, state: RasterizerState);

    /// Current device-wide rasterizer state
    fn rasterizer_state(&self) -> RasterizerState;

    /// Set the device-wide depth-stencil state
    fn set_depth_stencil_state(&mut self, state: DepthStencilState);

    /// Set the sampler state used by every texture fetch
    fn set_sampler_state(&mut self, state: SamplerState);

    /// Current sampler state
    fn sampler_state(&self) -> SamplerState;

    /// Bind the vertex and index buffers for indexed draws
    ///
    /// `vertex_offset` is added to every index before the vertex fetch.
    fn set_geometry(&mut self, vertices: Arc<VertexBuffer>, indices: Arc<IndexBuffer>, vertex_offset: usize);

    /// Commit the effect's current parameter values and a pass of its current technique
    fn apply_pass(&mut self, effect: &Effect, pass_index: usize) -> RenderResult<()>;

    /// Draw triangles from the bound buffers
    fn draw_indexed_primitives(&mut self, start_index: usize, primitive_count: usize) -> RenderResult<()>;

    /// Draw triangles from caller-supplied arrays
    fn draw_user_indexed_primitives(&mut self, vertices: &[Vertex], indices: &[u16]) -> RenderResult<()>;
}
