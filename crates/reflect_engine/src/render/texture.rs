//! Texture resources and sampling
//!
//! Textures are stored as linear RGBA floats so the software device can filter
//! them and render targets with the same code path. Shader programs refer to 2D
//! textures through [`TextureRef`], which is either a loaded image or a render
//! target owned by the device; cube textures are always loaded images.

use std::sync::Arc;

use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::render::device::RenderTargetId;

/// RGBA color with components in `[0, 1]`
pub type Color = Vec4;

/// Common colors
pub mod colors {
    use super::Color;

    /// Fully transparent black, the capture-target clear color
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque black, the back-buffer clear color
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque red, the frame-rate overlay color
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
}

/// Texel filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest texel
    Point,
    /// Bilinear blend of the four nearest texels
    Linear,
}

/// How coordinates outside `[0, 1]` are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAddressMode {
    /// Repeat the texture
    Wrap,
    /// Clamp to the edge texel
    Clamp,
}

/// Sampler configuration applied to every texture fetch of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    /// Filtering mode
    pub filter: TextureFilter,
    /// Addressing mode for both axes
    pub address: TextureAddressMode,
}

impl SamplerState {
    /// Bilinear filtering with wrapping; the device default
    pub const LINEAR_WRAP: Self = Self { filter: TextureFilter::Linear, address: TextureAddressMode::Wrap };
    /// Bilinear filtering clamped at the edges
    pub const LINEAR_CLAMP: Self = Self { filter: TextureFilter::Linear, address: TextureAddressMode::Clamp };
    /// Nearest filtering with wrapping, used for the environment sphere
    pub const POINT_WRAP: Self = Self { filter: TextureFilter::Point, address: TextureAddressMode::Wrap };
}

impl Default for SamplerState {
    fn default() -> Self {
        Self::LINEAR_WRAP
    }
}

/// A 2D texture held in CPU memory
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    width: u32,
    height: u32,
    texels: Vec<Color>,
}

impl Texture2D {
    /// Create a texture from linear texels laid out row by row, top row first
    ///
    /// Returns `None` when the texel count does not match the dimensions.
    pub fn from_texels(width: u32, height: u32, texels: Vec<Color>) -> Option<Self> {
        (width > 0 && height > 0 && texels.len() == (width * height) as usize)
            .then_some(Self { width, height, texels })
    }

    /// Create a texture from 8-bit RGBA bytes
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != (width * height * 4) as usize {
            return None;
        }
        let texels = bytes
            .chunks_exact(4)
            .map(|p| Color::new(
                f32::from(p[0]) / 255.0,
                f32::from(p[1]) / 255.0,
                f32::from(p[2]) / 255.0,
                f32::from(p[3]) / 255.0,
            ))
            .collect();
        Self::from_texels(width, height, texels)
    }

    /// A single-color texture
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![color; (width * height) as usize],
        }
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw texels, row by row
    pub fn texels(&self) -> &[Color] {
        &self.texels
    }

    /// Sample at normalized coordinates
    pub fn sample(&self, uv: Vec2, sampler: SamplerState) -> Color {
        sample_texels(&self.texels, self.width, self.height, uv, sampler)
    }
}

/// Cube face order used by [`CubeTexture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    /// +X
    PositiveX = 0,
    /// -X
    NegativeX = 1,
    /// +Y
    PositiveY = 2,
    /// -Y
    NegativeY = 3,
    /// +Z
    PositiveZ = 4,
    /// -Z
    NegativeZ = 5,
}

impl CubeFace {
    /// All faces in storage order
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// File-name suffix used when loading faces from disk
    pub fn suffix(self) -> &'static str {
        match self {
            Self::PositiveX => "px",
            Self::NegativeX => "nx",
            Self::PositiveY => "py",
            Self::NegativeY => "ny",
            Self::PositiveZ => "pz",
            Self::NegativeZ => "nz",
        }
    }

    /// Select the face a direction points at and its face coordinates
    pub fn from_direction(dir: &Vec3) -> (Self, Vec2) {
        let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
        let (face, u, v, major) = if ax >= ay && ax >= az {
            if dir.x > 0.0 {
                (Self::PositiveX, -dir.z, -dir.y, ax)
            } else {
                (Self::NegativeX, dir.z, -dir.y, ax)
            }
        } else if ay >= az {
            if dir.y > 0.0 {
                (Self::PositiveY, dir.x, dir.z, ay)
            } else {
                (Self::NegativeY, dir.x, -dir.z, ay)
            }
        } else if dir.z > 0.0 {
            (Self::PositiveZ, dir.x, -dir.y, az)
        } else {
            (Self::NegativeZ, -dir.x, -dir.y, az)
        };

        let major = major.max(f32::EPSILON);
        (face, Vec2::new(u / major * 0.5 + 0.5, v / major * 0.5 + 0.5))
    }

    /// Direction through face coordinates `uv`; inverse of [`Self::from_direction`]
    pub fn direction(self, uv: Vec2) -> Vec3 {
        let s = uv.x * 2.0 - 1.0;
        let t = uv.y * 2.0 - 1.0;
        match self {
            Self::PositiveX => Vec3::new(1.0, -t, -s),
            Self::NegativeX => Vec3::new(-1.0, -t, s),
            Self::PositiveY => Vec3::new(s, 1.0, t),
            Self::NegativeY => Vec3::new(s, -1.0, -t),
            Self::PositiveZ => Vec3::new(s, -t, 1.0),
            Self::NegativeZ => Vec3::new(-s, -t, -1.0),
        }
    }
}

/// Six square faces sampled by direction
#[derive(Debug, Clone, PartialEq)]
pub struct CubeTexture {
    faces: [Texture2D; 6],
}

impl CubeTexture {
    /// Build from faces in [`CubeFace::ALL`] order
    pub fn new(faces: [Texture2D; 6]) -> Self {
        Self { faces }
    }

    /// Access a single face
    pub fn face(&self, face: CubeFace) -> &Texture2D {
        &self.faces[face as usize]
    }

    /// Sample along a direction; the direction need not be normalized
    pub fn sample(&self, dir: &Vec3, sampler: SamplerState) -> Color {
        let (face, uv) = CubeFace::from_direction(dir);
        let sampler = SamplerState { address: TextureAddressMode::Clamp, ..sampler };
        self.face(face).sample(uv, sampler)
    }
}

/// A 2D texture input to a shader program
#[derive(Debug, Clone, PartialEq)]
pub enum TextureRef {
    /// A loaded image
    Image(Arc<Texture2D>),
    /// A render target owned by the graphics device
    Target(RenderTargetId),
}

impl From<Arc<Texture2D>> for TextureRef {
    fn from(texture: Arc<Texture2D>) -> Self {
        Self::Image(texture)
    }
}

impl From<RenderTargetId> for TextureRef {
    fn from(target: RenderTargetId) -> Self {
        Self::Target(target)
    }
}

/// Filter a texel grid at normalized coordinates
///
/// Shared by loaded textures and device render targets.
pub fn sample_texels(texels: &[Color], width: u32, height: u32, uv: Vec2, sampler: SamplerState) -> Color {
    if texels.is_empty() || width == 0 || height == 0 {
        return colors::TRANSPARENT;
    }

    let (w, h) = (width as i64, height as i64);
    let fetch = |x: i64, y: i64| -> Color {
        let (x, y) = match sampler.address {
            TextureAddressMode::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
            TextureAddressMode::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };
        texels[(y * w + x) as usize]
    };

    let u = uv.x * width as f32;
    let v = uv.y * height as f32;

    match sampler.filter {
        TextureFilter::Point => fetch(u.floor() as i64, v.floor() as i64),
        TextureFilter::Linear => {
            let fx = u - 0.5;
            let fy = v - 0.5;
            let x0 = fx.floor();
            let y0 = fy.floor();
            let tx = fx - x0;
            let ty = fy - y0;
            let (x0, y0) = (x0 as i64, y0 as i64);

            let top = fetch(x0, y0).lerp(&fetch(x0 + 1, y0), tx);
            let bottom = fetch(x0, y0 + 1).lerp(&fetch(x0 + 1, y0 + 1), tx);
            top.lerp(&bottom, ty)
        }
    }
}

/// Convert a linear color to 8-bit RGBA
pub fn to_rgba8(color: &Color) -> [u8; 4] {
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), quantize(color.w)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn checker() -> Texture2D {
        Texture2D::from_texels(2, 1, vec![colors::BLACK, colors::WHITE]).unwrap()
    }

    #[test]
    fn test_point_sampling_picks_texel() {
        let tex = checker();
        assert_eq!(tex.sample(Vec2::new(0.25, 0.5), SamplerState::POINT_WRAP), colors::BLACK);
        assert_eq!(tex.sample(Vec2::new(0.75, 0.5), SamplerState::POINT_WRAP), colors::WHITE);
    }

    #[test]
    fn test_point_sampling_wraps() {
        let tex = checker();
        assert_eq!(tex.sample(Vec2::new(1.25, 0.5), SamplerState::POINT_WRAP), colors::BLACK);
    }

    #[test]
    fn test_linear_sampling_blends_between_centers() {
        let tex = checker();
        let mid = tex.sample(Vec2::new(0.5, 0.5), SamplerState::LINEAR_CLAMP);
        assert_relative_eq!(mid.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_rgba8_conversion_rejects_bad_length() {
        assert!(Texture2D::from_rgba8(2, 2, &[0; 15]).is_none());
        let tex = Texture2D::from_rgba8(1, 1, &[255, 0, 0, 255]).unwrap();
        assert_eq!(tex.texels()[0], colors::RED);
    }

    #[test]
    fn test_cube_face_selection() {
        assert_eq!(CubeFace::from_direction(&Vec3::new(2.0, 0.1, 0.1)).0, CubeFace::PositiveX);
        assert_eq!(CubeFace::from_direction(&Vec3::new(0.0, -3.0, 0.5)).0, CubeFace::NegativeY);
        let (face, uv) = CubeFace::from_direction(&Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(face, CubeFace::NegativeZ);
        assert_relative_eq!(uv, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_face_direction_inverts_selection() {
        let uv = Vec2::new(0.2, 0.7);
        for face in CubeFace::ALL {
            let (back, back_uv) = CubeFace::from_direction(&face.direction(uv));
            assert_eq!(back, face);
            assert_relative_eq!(back_uv, uv, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_cube_sampling_reads_selected_face() {
        let faces = CubeFace::ALL.map(|face| {
            let shade = face as usize as f32 / 5.0;
            Texture2D::solid(2, 2, Color::new(shade, shade, shade, 1.0))
        });
        let cube = CubeTexture::new(faces);
        let color = cube.sample(&Vec3::new(0.0, 0.0, 1.0), SamplerState::LINEAR_WRAP);
        assert_relative_eq!(color.x, 0.8, epsilon = 1e-5);
    }
}
