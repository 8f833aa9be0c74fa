//! # Software Graphics Device
//!
//! A CPU implementation of [`GraphicsDevice`]. Every surface (the back buffer and
//! each render target) is a linear RGBA color buffer plus a depth buffer.
//! Render targets can be bound as draw destinations and sampled as textures
//! through [`TextureRef::Target`](crate::render::texture::TextureRef::Target).
//!
//! ## Draw flow
//! 1. `apply_pass` prepares the pass kernel with the effect's current values.
//! 2. Each draw runs the vertex stage once per referenced vertex.
//! 3. Triangles go through [`raster::draw_triangle`].

pub mod raster;
pub mod surface;

mod sampler;

use std::sync::Arc;

use slotmap::SlotMap;

use crate::render::device::{
    ClearFlags, DepthStencilState, GraphicsDevice, RasterizerState, RenderTargetId,
};
use crate::render::effect::kernel::{PreparedShader, VertexOutput};
use crate::render::effect::{Effect, PassState};
use crate::render::primitives::{IndexBuffer, Vertex, VertexBuffer};
use crate::render::texture::{Color, SamplerState};
use crate::render::{RenderError, RenderResult};

pub use raster::{RasterState, RasterStats};
pub use surface::Surface;

use sampler::DeviceSampler;

struct ActivePass {
    shader: Box<dyn PreparedShader>,
    state: PassState,
}

struct BoundGeometry {
    vertices: Arc<VertexBuffer>,
    indices: Arc<IndexBuffer>,
    vertex_offset: usize,
}

/// Device statistics accumulated since the last [`SoftwareDevice::reset_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Draw calls issued
    pub draw_calls: usize,
    /// Raster work done by those calls
    pub raster: RasterStats,
}

/// CPU rasterizing graphics device
pub struct SoftwareDevice {
    back_buffer: Surface,
    targets: SlotMap<RenderTargetId, Surface>,
    bound: Option<RenderTargetId>,
    rasterizer: RasterizerState,
    depth_stencil: DepthStencilState,
    sampler: SamplerState,
    geometry: Option<BoundGeometry>,
    active: Option<ActivePass>,
    stats: DeviceStats,
}

impl SoftwareDevice {
    /// Create a device with a back buffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        log::info!("Software device created with {}x{} back buffer", width, height);
        Self {
            back_buffer: Surface::new(width, height),
            targets: SlotMap::with_key(),
            bound: None,
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            sampler: SamplerState::default(),
            geometry: None,
            active: None,
            stats: DeviceStats::default(),
        }
    }

    /// The back buffer
    pub fn back_buffer(&self) -> &Surface {
        &self.back_buffer
    }

    /// A render target's surface
    pub fn render_target_surface(&self, target: RenderTargetId) -> Option<&Surface> {
        self.targets.get(target)
    }

    /// Number of live render targets
    pub fn render_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Accumulated statistics
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Zero the statistics
    pub fn reset_stats(&mut self) {
        self.stats = DeviceStats::default();
    }

    fn raster_state(&self, pass: PassState) -> RasterState {
        RasterState {
            cull: pass.cull.unwrap_or(self.rasterizer.cull),
            depth: pass.depth.unwrap_or(self.depth_stencil),
        }
    }

    fn bound_surface_mut(&mut self) -> Option<&mut Surface> {
        match self.bound {
            Some(id) => self.targets.get_mut(id),
            None => Some(&mut self.back_buffer),
        }
    }

    /// Shade and fill triangles into the bound surface
    fn rasterize(&mut self, triangles: &[[VertexOutput; 3]]) -> RenderResult<()> {
        let active = self.active.as_ref().ok_or(RenderError::NoActivePass)?;
        let state = self.raster_state(active.state);

        // Check the destination out so render targets stay readable while it is written.
        let mut surface = match self.bound {
            Some(id) => std::mem::take(self.targets.get_mut(id).ok_or(RenderError::UnknownRenderTarget)?),
            None => std::mem::take(&mut self.back_buffer),
        };

        let mut stats = RasterStats::default();
        {
            let sampler = DeviceSampler { targets: &self.targets, state: self.sampler };
            for triangle in triangles {
                stats += raster::draw_triangle(&mut surface, triangle, state, active.shader.as_ref(), &sampler);
            }
        }

        match self.bound {
            Some(id) => {
                if let Some(slot) = self.targets.get_mut(id) {
                    *slot = surface;
                }
            }
            None => self.back_buffer = surface,
        }

        self.stats.draw_calls += 1;
        self.stats.raster += stats;
        log::trace!(
            "Draw: {} triangles in, {} rasterized, {} fragments",
            triangles.len(),
            stats.triangles,
            stats.fragments
        );
        Ok(())
    }
}

/// Run the vertex stage over indexed triangles, shading each vertex once
fn shade_triangles<I>(shader: &dyn PreparedShader, vertices: &[Vertex], indices: I) -> RenderResult<Vec<[VertexOutput; 3]>>
where
    I: ExactSizeIterator<Item = usize>,
{
    let mut cache: Vec<Option<VertexOutput>> = vec![None; vertices.len()];
    let mut fetch = |index: usize| -> RenderResult<VertexOutput> {
        let slot = cache.get_mut(index).ok_or_else(|| {
            RenderError::DrawOutOfRange(format!("vertex {index} of {}", vertices.len()))
        })?;
        Ok(*slot.get_or_insert_with(|| shader.vertex(&vertices[index])))
    };

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    let indices: Vec<usize> = indices.collect();
    for tri in indices.chunks_exact(3) {
        triangles.push([fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?]);
    }
    Ok(triangles)
}

impl GraphicsDevice for SoftwareDevice {
    fn back_buffer_size(&self) -> (u32, u32) {
        (self.back_buffer.width(), self.back_buffer.height())
    }

    fn resize_back_buffer(&mut self, width: u32, height: u32) {
        log::debug!("Back buffer resized to {}x{}", width, height);
        self.back_buffer = Surface::new(width, height);
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<RenderTargetId> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }
        let id = self.targets.insert(Surface::new(width, height));
        log::debug!("Created {}x{} render target {:?}", width, height, id);
        Ok(id)
    }

    fn release_render_target(&mut self, target: RenderTargetId) {
        if self.targets.remove(target).is_some() {
            log::debug!("Released render target {:?}", target);
        }
        if self.bound == Some(target) {
            self.bound = None;
        }
    }

    fn set_render_target(&mut self, target: Option<RenderTargetId>) -> RenderResult<()> {
        if let Some(id) = target {
            if !self.targets.contains_key(id) {
                return Err(RenderError::UnknownRenderTarget);
            }
        }
        self.bound = target;
        Ok(())
    }

    fn render_target(&self) -> Option<RenderTargetId> {
        self.bound
    }

    fn clear(&mut self, flags: ClearFlags, color: Color) {
        if let Some(surface) = self.bound_surface_mut() {
            surface.clear(flags, color);
        }
    }

    fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.rasterizer = state;
    }

    fn rasterizer_state(&self) -> RasterizerState {
        self.rasterizer
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
        self.depth_stencil = state;
    }

    fn set_sampler_state(&mut self, state: SamplerState) {
        self.sampler = state;
    }

    fn sampler_state(&self) -> SamplerState {
        self.sampler
    }

    fn set_geometry(&mut self, vertices: Arc<VertexBuffer>, indices: Arc<IndexBuffer>, vertex_offset: usize) {
        self.geometry = Some(BoundGeometry { vertices, indices, vertex_offset });
    }

    fn apply_pass(&mut self, effect: &Effect, pass_index: usize) -> RenderResult<()> {
        let pass = effect.passes().get(pass_index).ok_or_else(|| RenderError::UnknownPass {
            technique: effect.current_technique_name().to_string(),
            index: pass_index,
        })?;

        self.active = Some(ActivePass {
            shader: pass.kernel().prepare(effect.parameters()),
            state: pass.state(),
        });
        Ok(())
    }

    fn draw_indexed_primitives(&mut self, start_index: usize, primitive_count: usize) -> RenderResult<()> {
        let geometry = self.geometry.as_ref().ok_or(RenderError::NoGeometry)?;
        let active = self.active.as_ref().ok_or(RenderError::NoActivePass)?;

        let end = start_index + primitive_count * 3;
        let indices = geometry.indices.indices().get(start_index..end).ok_or_else(|| {
            RenderError::DrawOutOfRange(format!(
                "indices {start_index}..{end} of {}",
                geometry.indices.len()
            ))
        })?;

        let offset = geometry.vertex_offset;
        let triangles = shade_triangles(
            active.shader.as_ref(),
            geometry.vertices.vertices(),
            indices.iter().map(|&i| i as usize + offset),
        )?;
        self.rasterize(&triangles)
    }

    fn draw_user_indexed_primitives(&mut self, vertices: &[Vertex], indices: &[u16]) -> RenderResult<()> {
        let active = self.active.as_ref().ok_or(RenderError::NoActivePass)?;
        let triangles = shade_triangles(active.shader.as_ref(), vertices, indices.iter().map(|&i| usize::from(i)))?;
        self.rasterize(&triangles)
    }
}
