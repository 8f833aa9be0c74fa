//! Texture fetches against loaded images and the device's render targets

use slotmap::SlotMap;

use crate::foundation::math::{Vec2, Vec3};
use crate::render::device::RenderTargetId;
use crate::render::effect::kernel::TextureSampler;
use crate::render::software::surface::Surface;
use crate::render::texture::{colors, Color, CubeTexture, SamplerState, TextureRef};

/// Sampler handed to fragment stages during a draw
///
/// The surface being drawn into is checked out of `targets` for the duration
/// of the draw, so reading it back samples transparent black.
pub(crate) struct DeviceSampler<'a> {
    pub(crate) targets: &'a SlotMap<RenderTargetId, Surface>,
    pub(crate) state: SamplerState,
}

impl TextureSampler for DeviceSampler<'_> {
    fn sample_2d(&self, texture: &TextureRef, uv: Vec2) -> Color {
        match texture {
            TextureRef::Image(image) => image.sample(uv, self.state),
            TextureRef::Target(id) => self
                .targets
                .get(*id)
                .map_or(colors::TRANSPARENT, |surface| surface.sample(uv, self.state)),
        }
    }

    fn sample_cube(&self, cube: &CubeTexture, direction: &Vec3) -> Color {
        cube.sample(direction, self.state)
    }
}
