//! Built-in content
//!
//! Stand-ins for the demo's content pipeline outputs, generated on first use so
//! the scene runs without a content directory.

use crate::foundation::math::{Vec2, Vec3};
use crate::render::primitives::Mesh;
use crate::render::texture::{colors, Color, CubeFace, CubeTexture, Texture2D};

/// High-tessellation unit sphere
pub const SPHERE_HIGH_POLY: &str = "Models/SphereHighPoly";
/// Textured ground plane
pub const GROUND: &str = "Models/Ground";
/// 1×1 white
pub const WHITE_TEXTURE: &str = "Textures/whitetex";
/// Wood grain
pub const WOOD_TEXTURE: &str = "Textures/wood";
/// Sky cube
pub const SKY_CUBE: &str = "Textures/graceCUBE";

const SPHERE_RINGS: u32 = 24;
const SPHERE_SEGMENTS: u32 = 32;

const GROUND_VERTS: u32 = 21;
const GROUND_SPACING: f32 = 5.0;

const WOOD_SIZE: u32 = 64;
const SKY_FACE_SIZE: u32 = 64;

/// Built-in mesh by asset path
pub fn mesh(path: &str) -> Option<Mesh> {
    match path {
        SPHERE_HIGH_POLY => Some(Mesh::uv_sphere(SPHERE_RINGS, SPHERE_SEGMENTS)),
        GROUND => Some(Mesh::tri_grid(GROUND_VERTS, GROUND_VERTS, GROUND_SPACING, GROUND_SPACING, Vec3::zeros())),
        _ => None,
    }
}

/// Built-in 2D texture by asset path
pub fn texture(path: &str) -> Option<Texture2D> {
    match path {
        WHITE_TEXTURE => Some(Texture2D::solid(1, 1, colors::WHITE)),
        WOOD_TEXTURE => Some(wood(WOOD_SIZE)),
        _ => None,
    }
}

/// Built-in cube texture by asset path
pub fn cube_texture(path: &str) -> Option<CubeTexture> {
    (path == SKY_CUBE).then(|| sky(SKY_FACE_SIZE))
}

/// Concentric growth rings with a little waviness
fn wood(size: u32) -> Texture2D {
    let light = Color::new(0.76, 0.56, 0.34, 1.0);
    let dark = Color::new(0.45, 0.29, 0.16, 1.0);

    let mut texels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let u = x as f32 / size as f32;
            let v = y as f32 / size as f32;
            let wobble = (v * 9.0 * std::f32::consts::TAU).sin() * 0.02;
            let radius = ((u - 0.5 + wobble).powi(2) + (v * 0.15).powi(2)).sqrt();
            let ring = (radius * 40.0).fract();
            let t = (ring * std::f32::consts::PI).sin().powi(4);
            texels.push(light.lerp(&dark, t));
        }
    }
    Texture2D::from_texels(size, size, texels).unwrap_or_else(|| Texture2D::solid(size, size, light))
}

/// Gradient sky above a warm horizon and dark ground, with a sun
fn sky(size: u32) -> CubeTexture {
    let zenith = Vec3::new(0.18, 0.36, 0.78);
    let horizon = Vec3::new(0.86, 0.78, 0.66);
    let ground = Vec3::new(0.22, 0.2, 0.18);
    let sun_dir = Vec3::new(1.0, 0.6, 1.0).normalize();

    let faces = CubeFace::ALL.map(|face| {
        let mut texels = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let uv = Vec2::new((x as f32 + 0.5) / size as f32, (y as f32 + 0.5) / size as f32);
                let dir = face.direction(uv).normalize();
                let base = if dir.y >= 0.0 {
                    horizon.lerp(&zenith, dir.y.sqrt())
                } else {
                    horizon.lerp(&ground, (-dir.y * 4.0).min(1.0))
                };
                let sun = dir.dot(&sun_dir).max(0.0).powf(256.0);
                let rgb = (base + Vec3::repeat(sun)).map(|c| c.min(1.0));
                texels.push(Color::new(rgb.x, rgb.y, rgb.z, 1.0));
            }
        }
        Texture2D::from_texels(size, size, texels).unwrap_or_else(|| Texture2D::solid(size, size, colors::BLACK))
    });
    CubeTexture::new(faces)
}
