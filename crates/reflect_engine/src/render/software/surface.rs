//! Color+depth surfaces

use crate::render::device::ClearFlags;
use crate::render::texture::{colors, sample_texels, to_rgba8, Color, SamplerState};
use crate::foundation::math::Vec2;

/// A color buffer with a matching depth buffer
///
/// Rows are stored top to bottom. Depth clears to 1 (far).
#[derive(Debug, Clone, Default)]
pub struct Surface {
    width: u32,
    height: u32,
    color: Vec<Color>,
    depth: Vec<f32>,
}

impl Surface {
    /// Allocate a surface cleared to transparent black and far depth
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![colors::TRANSPARENT; len],
            depth: vec![1.0; len],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color buffer
    pub fn color(&self) -> &[Color] {
        &self.color
    }

    /// Depth buffer
    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Color at a pixel, if inside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width && y < self.height).then(|| self.color[(y * self.width + x) as usize])
    }

    /// Reset the selected buffers
    pub fn clear(&mut self, flags: ClearFlags, color: Color) {
        if flags.contains(ClearFlags::TARGET) {
            self.color.fill(color);
        }
        if flags.contains(ClearFlags::DEPTH) {
            self.depth.fill(1.0);
        }
    }

    /// Number of pixels with non-zero alpha
    pub fn covered_pixels(&self) -> usize {
        self.color.iter().filter(|c| c.w > 0.0).count()
    }

    /// Sample the color buffer like a texture
    pub fn sample(&self, uv: Vec2, sampler: SamplerState) -> Color {
        sample_texels(&self.color, self.width, self.height, uv, sampler)
    }

    /// Depth test at a pixel index; stores color and optionally depth on success
    pub(crate) fn write(&mut self, index: usize, depth: f32, color: Color, test: bool, write_depth: bool) -> bool {
        if test && depth > self.depth[index] {
            return false;
        }
        self.color[index] = color;
        if write_depth {
            self.depth[index] = depth;
        }
        true
    }

    /// Whether a fragment at this pixel would pass a less-or-equal depth test
    pub(crate) fn depth_passes(&self, index: usize, depth: f32) -> bool {
        depth <= self.depth[index]
    }

    /// Convert to tightly packed 8-bit RGBA, top row first
    pub fn to_rgba8(&self) -> Vec<u8> {
        let pixels: Vec<[u8; 4]> = self.color.iter().map(to_rgba8).collect();
        bytemuck::cast_slice(&pixels).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_selects_buffers() {
        let mut surface = Surface::new(2, 2);
        surface.write(0, 0.5, colors::WHITE, true, true);

        surface.clear(ClearFlags::TARGET, colors::BLACK);
        assert_eq!(surface.pixel(0, 0), Some(colors::BLACK));
        assert_eq!(surface.depth()[0], 0.5);

        surface.clear(ClearFlags::DEPTH, colors::WHITE);
        assert_eq!(surface.pixel(0, 0), Some(colors::BLACK));
        assert_eq!(surface.depth()[0], 1.0);
    }

    #[test]
    fn test_depth_test_is_less_or_equal() {
        let mut surface = Surface::new(1, 1);
        assert!(surface.write(0, 0.5, colors::WHITE, true, true));
        assert!(surface.write(0, 0.5, colors::RED, true, true));
        assert!(!surface.write(0, 0.6, colors::BLACK, true, true));
        assert_eq!(surface.pixel(0, 0), Some(colors::RED));
    }

    #[test]
    fn test_rgba8_layout() {
        let mut surface = Surface::new(2, 1);
        surface.clear(ClearFlags::TARGET, colors::RED);
        assert_eq!(surface.to_rgba8(), vec![255, 0, 0, 255, 255, 0, 0, 255]);
        assert_eq!(surface.covered_pixels(), 2);
        assert_eq!(surface.pixel(2, 0), None);
    }
}
