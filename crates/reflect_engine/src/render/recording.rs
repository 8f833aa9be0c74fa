//! Headless command log
//!
//! [`RecordingDevice`] implements [`GraphicsDevice`] without touching pixels. Every
//! call is appended to a log so tests and diagnostics can check what a frame
//! issued, and in which order.

use std::sync::Arc;

use slotmap::SlotMap;

use crate::render::device::{
    ClearFlags, DepthStencilState, GraphicsDevice, RasterizerState, RenderTargetId,
};
use crate::render::effect::{paraboloid, Effect};
use crate::render::primitives::{IndexBuffer, Vertex, VertexBuffer};
use crate::render::texture::{Color, SamplerState};
use crate::render::{RenderError, RenderResult};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// A render target was created
    CreateRenderTarget {
        /// New handle
        id: RenderTargetId,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// A render target was released
    ReleaseRenderTarget(RenderTargetId),
    /// Draw destination changed; `None` is the back buffer
    SetRenderTarget(Option<RenderTargetId>),
    /// The bound surface was cleared
    Clear {
        /// Buffers cleared
        flags: ClearFlags,
        /// Clear color
        color: Color,
    },
    /// Rasterizer state changed
    SetRasterizerState(RasterizerState),
    /// Depth-stencil state changed
    SetDepthStencilState(DepthStencilState),
    /// Sampler state changed
    SetSamplerState(SamplerState),
    /// Vertex and index buffers bound
    SetGeometry {
        /// Vertices in the bound buffer
        vertex_count: usize,
        /// Indices in the bound buffer
        index_count: usize,
        /// Base vertex
        vertex_offset: usize,
    },
    /// An effect pass was applied
    ApplyPass {
        /// Effect name
        effect: String,
        /// Active technique
        technique: String,
        /// Pass index
        pass: usize,
        /// Value of the paraboloid `Direction` parameter, when declared and set
        direction: Option<f32>,
    },
    /// Indexed draw from bound buffers
    DrawIndexed {
        /// Destination at draw time
        target: Option<RenderTargetId>,
        /// First index
        start_index: usize,
        /// Triangles drawn
        primitive_count: usize,
    },
    /// Indexed draw from caller arrays
    DrawUser {
        /// Destination at draw time
        target: Option<RenderTargetId>,
        /// Vertices supplied
        vertex_count: usize,
        /// Triangles drawn
        primitive_count: usize,
    },
}

impl DeviceCommand {
    /// Whether this is a draw of either kind
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::DrawIndexed { .. } | Self::DrawUser { .. })
    }

    /// Destination of a draw
    pub fn draw_target(&self) -> Option<Option<RenderTargetId>> {
        match self {
            Self::DrawIndexed { target, .. } | Self::DrawUser { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// Graphics device that records commands instead of executing them
#[derive(Debug)]
pub struct RecordingDevice {
    size: (u32, u32),
    targets: SlotMap<RenderTargetId, (u32, u32)>,
    bound: Option<RenderTargetId>,
    rasterizer: RasterizerState,
    sampler: SamplerState,
    geometry: Option<(usize, usize)>,
    pass_applied: bool,
    commands: Vec<DeviceCommand>,
}

impl RecordingDevice {
    /// Create a device with a back buffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            targets: SlotMap::with_key(),
            bound: None,
            rasterizer: RasterizerState::default(),
            sampler: SamplerState::default(),
            geometry: None,
            pass_applied: false,
            commands: Vec::new(),
        }
    }

    /// Everything recorded so far
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Draw commands issued while `target` was bound
    pub fn draws_to(&self, target: Option<RenderTargetId>) -> impl Iterator<Item = &DeviceCommand> + '_ {
        self.commands
            .iter()
            .filter(move |command| command.draw_target() == Some(target))
    }

    /// Size of a live render target
    pub fn render_target_size(&self, target: RenderTargetId) -> Option<(u32, u32)> {
        self.targets.get(target).copied()
    }

    /// Number of live render targets
    pub fn render_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Drop the log, keeping device state
    pub fn clear_log(&mut self) {
        self.commands.clear();
    }
}

impl GraphicsDevice for RecordingDevice {
    fn back_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize_back_buffer(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<RenderTargetId> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }
        let id = self.targets.insert((width, height));
        self.commands.push(DeviceCommand::CreateRenderTarget { id, width, height });
        Ok(id)
    }

    fn release_render_target(&mut self, target: RenderTargetId) {
        if self.targets.remove(target).is_some() {
            self.commands.push(DeviceCommand::ReleaseRenderTarget(target));
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
        self.commands.push(DeviceCommand::SetRenderTarget(target));
        Ok(())
    }

    fn render_target(&self) -> Option<RenderTargetId> {
        self.bound
    }

    fn clear(&mut self, flags: ClearFlags, color: Color) {
        self.commands.push(DeviceCommand::Clear { flags, color });
    }

    fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.rasterizer = state;
        self.commands.push(DeviceCommand::SetRasterizerState(state));
    }

    fn rasterizer_state(&self) -> RasterizerState {
        self.rasterizer
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
        self.commands.push(DeviceCommand::SetDepthStencilState(state));
    }

    fn set_sampler_state(&mut self, state: SamplerState) {
        self.sampler = state;
        self.commands.push(DeviceCommand::SetSamplerState(state));
    }

    fn sampler_state(&self) -> SamplerState {
        self.sampler
    }

    fn set_geometry(&mut self, vertices: Arc<VertexBuffer>, indices: Arc<IndexBuffer>, vertex_offset: usize) {
        self.geometry = Some((vertices.len(), indices.len()));
        self.commands.push(DeviceCommand::SetGeometry {
            vertex_count: vertices.len(),
            index_count: indices.len(),
            vertex_offset,
        });
    }

    fn apply_pass(&mut self, effect: &Effect, pass_index: usize) -> RenderResult<()> {
        if pass_index >= effect.passes().len() {
            return Err(RenderError::UnknownPass {
                technique: effect.current_technique_name().to_string(),
                index: pass_index,
            });
        }
        self.pass_applied = true;
        self.commands.push(DeviceCommand::ApplyPass {
            effect: effect.name().to_string(),
            technique: effect.current_technique_name().to_string(),
            pass: pass_index,
            direction: effect.parameters().float(paraboloid::DIRECTION),
        });
        Ok(())
    }

    fn draw_indexed_primitives(&mut self, start_index: usize, primitive_count: usize) -> RenderResult<()> {
        let (_, index_count) = self.geometry.ok_or(RenderError::NoGeometry)?;
        if !self.pass_applied {
            return Err(RenderError::NoActivePass);
        }
        let end = start_index + primitive_count * 3;
        if end > index_count {
            return Err(RenderError::DrawOutOfRange(format!("indices {start_index}..{end} of {index_count}")));
        }
        self.commands.push(DeviceCommand::DrawIndexed {
            target: self.bound,
            start_index,
            primitive_count,
        });
        Ok(())
    }

    fn draw_user_indexed_primitives(&mut self, vertices: &[Vertex], indices: &[u16]) -> RenderResult<()> {
        if !self.pass_applied {
            return Err(RenderError::NoActivePass);
        }
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= vertices.len()) {
            return Err(RenderError::DrawOutOfRange(format!("vertex {bad} of {}", vertices.len())));
        }
        self.commands.push(DeviceCommand::DrawUser {
            target: self.bound,
            vertex_count: vertices.len(),
            primitive_count: indices.len() / 3,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::effect::library;
    use crate::render::texture::colors;

    #[test]
    fn test_draws_record_bound_target() {
        let mut device = RecordingDevice::new(8, 8);
        let target = device.create_render_target(8, 8).unwrap();
        let effect = library::create(library::TEXTURE).unwrap();

        device.set_render_target(Some(target)).unwrap();
        device.clear(ClearFlags::all(), colors::TRANSPARENT);
        device.apply_pass(&effect, 0).unwrap();
        let vertices = [Vertex::default(); 3];
        device.draw_user_indexed_primitives(&vertices, &[0, 1, 2]).unwrap();
        device.set_render_target(None).unwrap();

        assert_eq!(device.draws_to(Some(target)).count(), 1);
        assert_eq!(device.draws_to(None).count(), 0);
        assert_eq!(device.commands().iter().filter(|c| c.is_draw()).count(), 1);
        assert_eq!(device.render_target_size(target), Some((8, 8)));
    }

    #[test]
    fn test_apply_pass_records_technique_and_direction() {
        let mut device = RecordingDevice::new(8, 8);
        let mut effect = library::create(library::PHONG).unwrap();
        effect.set_current_technique_by_name(paraboloid::TECHNIQUE).unwrap();
        effect.set(paraboloid::DIRECTION, -1.0);
        device.apply_pass(&effect, 0).unwrap();

        assert_eq!(
            device.commands().last(),
            Some(&DeviceCommand::ApplyPass {
                effect: library::PHONG.to_string(),
                technique: paraboloid::TECHNIQUE.to_string(),
                pass: 0,
                direction: Some(-1.0),
            })
        );
        assert!(matches!(device.apply_pass(&effect, 1), Err(RenderError::UnknownPass { .. })));
    }

    #[test]
    fn test_draw_validation() {
        let mut device = RecordingDevice::new(8, 8);
        assert_eq!(device.draw_indexed_primitives(0, 1), Err(RenderError::NoGeometry));

        let effect = library::create(library::TEXTURE).unwrap();
        device.apply_pass(&effect, 0).unwrap();
        let vertices = [Vertex::default(); 3];
        assert!(matches!(
            device.draw_user_indexed_primitives(&vertices, &[0, 1, 3]),
            Err(RenderError::DrawOutOfRange(_))
        ));

        let target = device.create_render_target(4, 4).unwrap();
        device.set_render_target(Some(target)).unwrap();
        device.release_render_target(target);
        assert_eq!(device.render_target(), None);
        device.clear_log();
        assert!(device.commands().is_empty());
    }
}
