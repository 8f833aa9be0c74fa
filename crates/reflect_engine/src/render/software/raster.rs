//! Triangle setup and scan conversion
//!
//! Triangles arrive in homogeneous clip space. They are rejected when a vertex
//! is not finite or every vertex lies on the discarded side of the
//! user clip distance, clipped against the near plane (`z >= 0`), projected,
//! culled by NDC winding and filled with edge functions sampled at pixel
//! centers. Depth is interpolated linearly in screen space, varyings with
//! perspective correction.

use crate::foundation::math::{Vec2, Vec4};
use crate::render::device::{CullMode, DepthStencilState};
use crate::render::effect::kernel::{PreparedShader, TextureSampler, Varyings, VertexOutput};
use crate::render::software::surface::Surface;

/// Pipeline state in effect for a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    /// Face culling
    pub cull: CullMode,
    /// Depth handling
    pub depth: DepthStencilState,
}

/// Per-draw counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Triangles that reached scan conversion
    pub triangles: usize,
    /// Fragments written to the surface
    pub fragments: usize,
}

impl std::ops::AddAssign for RasterStats {
    fn add_assign(&mut self, rhs: Self) {
        self.triangles += rhs.triangles;
        self.fragments += rhs.fragments;
    }
}

struct ScreenVertex {
    position: Vec2,
    depth: f32,
    inv_w: f32,
}

/// Clip, cull and fill one triangle
pub fn draw_triangle(
    surface: &mut Surface,
    triangle: &[VertexOutput; 3],
    state: RasterState,
    shader: &dyn PreparedShader,
    sampler: &dyn TextureSampler,
) -> RasterStats {
    let mut stats = RasterStats::default();

    if triangle.iter().any(|v| !v.clip.iter().all(|c| c.is_finite())) {
        return stats;
    }
    if triangle.iter().all(|v| v.varyings.clip_distance < 0.0) {
        return stats;
    }

    let polygon = clip_near(triangle);
    for i in 1..polygon.len().saturating_sub(1) {
        stats += fill(surface, [&polygon[0], &polygon[i], &polygon[i + 1]], state, shader, sampler);
    }
    stats
}

/// Sutherland-Hodgman against `z >= 0`; returns a convex polygon of 0, 3 or 4 vertices
fn clip_near(triangle: &[VertexOutput; 3]) -> Vec<VertexOutput> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = &triangle[i];
        let b = &triangle[(i + 1) % 3];
        let a_in = a.clip.z >= 0.0;
        let b_in = b.clip.z >= 0.0;

        if a_in {
            out.push(*a);
        }
        if a_in != b_in {
            let t = a.clip.z / (a.clip.z - b.clip.z);
            out.push(VertexOutput {
                clip: a.clip.lerp(&b.clip, t),
                varyings: Varyings::lerp(&a.varyings, &b.varyings, t),
            });
        }
    }
    out
}

fn to_screen(clip: &Vec4, width: f32, height: f32) -> Option<ScreenVertex> {
    if clip.w <= f32::EPSILON {
        return None;
    }
    let inv_w = 1.0 / clip.w;
    let ndc = clip.xyz() * inv_w;
    Some(ScreenVertex {
        position: Vec2::new((ndc.x * 0.5 + 0.5) * width, (0.5 - ndc.y * 0.5) * height),
        depth: ndc.z,
        inv_w,
    })
}

fn edge(a: &Vec2, b: &Vec2, p: &Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn fill(
    surface: &mut Surface,
    vertices: [&VertexOutput; 3],
    state: RasterState,
    shader: &dyn PreparedShader,
    sampler: &dyn TextureSampler,
) -> RasterStats {
    let mut stats = RasterStats::default();
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return stats;
    }

    let screen = [
        to_screen(&vertices[0].clip, width as f32, height as f32),
        to_screen(&vertices[1].clip, width as f32, height as f32),
        to_screen(&vertices[2].clip, width as f32, height as f32),
    ];
    let [Some(s0), Some(s1), Some(s2)] = screen else {
        return stats;
    };

    // Screen space flips y, so counter-clockwise in NDC is negative here.
    let area = edge(&s0.position, &s1.position, &s2.position);
    if area.abs() <= f32::EPSILON {
        return stats;
    }
    let front_facing = area < 0.0;
    let culled = match state.cull {
        CullMode::None => false,
        CullMode::Back => !front_facing,
        CullMode::Front => front_facing,
    };
    if culled {
        return stats;
    }
    stats.triangles = 1;

    let min_x = s0.position.x.min(s1.position.x).min(s2.position.x).floor().max(0.0) as u32;
    let min_y = s0.position.y.min(s1.position.y).min(s2.position.y).floor().max(0.0) as u32;
    let max_x = (s0.position.x.max(s1.position.x).max(s2.position.x).ceil() as i64).min(i64::from(width) - 1);
    let max_y = (s0.position.y.max(s1.position.y).max(s2.position.y).ceil() as i64).min(i64::from(height) - 1);
    if max_x < 0 || max_y < 0 {
        return stats;
    }

    let inv_area = 1.0 / area;
    for y in min_y..=max_y as u32 {
        for x in min_x..=max_x as u32 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let b0 = edge(&s1.position, &s2.position, &p) * inv_area;
            let b1 = edge(&s2.position, &s0.position, &p) * inv_area;
            let b2 = edge(&s0.position, &s1.position, &p) * inv_area;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }

            let depth = b0 * s0.depth + b1 * s1.depth + b2 * s2.depth;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let index = (y * width + x) as usize;
            if state.depth.depth_test && !surface.depth_passes(index, depth) {
                continue;
            }

            let p0 = b0 * s0.inv_w;
            let p1 = b1 * s1.inv_w;
            let p2 = b2 * s2.inv_w;
            let sum = p0 + p1 + p2;
            if sum <= 0.0 {
                continue;
            }
            let weights = [p0 / sum, p1 / sum, p2 / sum];
            let varyings = Varyings::blend(
                [&vertices[0].varyings, &vertices[1].varyings, &vertices[2].varyings],
                weights,
            );

            if let Some(color) = shader.fragment(&varyings, sampler) {
                surface.write(index, depth, color, false, state.depth.depth_write);
                stats.fragments += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};
    use crate::render::primitives::Vertex;
    use crate::render::texture::{colors, Color, CubeTexture, TextureRef};

    struct Solid(Color);

    impl PreparedShader for Solid {
        fn vertex(&self, _vertex: &Vertex) -> VertexOutput {
            unreachable!()
        }

        fn fragment(&self, input: &Varyings, _sampler: &dyn TextureSampler) -> Option<Color> {
            (input.clip_distance >= 0.0).then_some(self.0)
        }
    }

    struct NoTextures;

    impl TextureSampler for NoTextures {
        fn sample_2d(&self, _texture: &TextureRef, _uv: Vec2) -> Color {
            colors::TRANSPARENT
        }

        fn sample_cube(&self, _cube: &CubeTexture, _direction: &Vec3) -> Color {
            colors::TRANSPARENT
        }
    }

    fn vertex(x: f32, y: f32, z: f32) -> VertexOutput {
        VertexOutput { clip: Vec4::new(x, y, z, 1.0), varyings: Varyings::default() }
    }

    const STATE: RasterState = RasterState { cull: CullMode::Back, depth: DepthStencilState::DEFAULT };

    // Counter-clockwise in NDC, covering the lower-left half of the viewport.
    fn ccw(z: f32) -> [VertexOutput; 3] {
        [vertex(-1.0, -1.0, z), vertex(1.0, -1.0, z), vertex(-1.0, 1.0, z)]
    }

    #[test]
    fn test_front_face_fills_half_the_surface() {
        let mut surface = Surface::new(8, 8);
        let stats = draw_triangle(&mut surface, &ccw(0.5), STATE, &Solid(colors::WHITE), &NoTextures);
        assert_eq!(stats.triangles, 1);
        assert!(stats.fragments >= 28 && stats.fragments <= 36, "{}", stats.fragments);
        assert_eq!(surface.pixel(0, 7), Some(colors::WHITE));
        assert_eq!(surface.pixel(7, 0), Some(colors::TRANSPARENT));
    }

    #[test]
    fn test_back_face_is_culled() {
        let mut surface = Surface::new(8, 8);
        let [a, b, c] = ccw(0.5);
        let stats = draw_triangle(&mut surface, &[a, c, b], STATE, &Solid(colors::WHITE), &NoTextures);
        assert_eq!(stats.fragments, 0);

        let front_only = RasterState { cull: CullMode::Front, ..STATE };
        let stats = draw_triangle(&mut surface, &[a, c, b], front_only, &Solid(colors::WHITE), &NoTextures);
        assert!(stats.fragments > 0);
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut surface = Surface::new(8, 8);
        draw_triangle(&mut surface, &ccw(0.2), STATE, &Solid(colors::RED), &NoTextures);
        draw_triangle(&mut surface, &ccw(0.8), STATE, &Solid(colors::WHITE), &NoTextures);
        assert_eq!(surface.pixel(0, 7), Some(colors::RED));
    }

    #[test]
    fn test_triangle_behind_near_plane_is_dropped() {
        let mut surface = Surface::new(8, 8);
        let stats = draw_triangle(&mut surface, &ccw(-0.5), STATE, &Solid(colors::WHITE), &NoTextures);
        assert_eq!(stats, RasterStats::default());
    }

    #[test]
    fn test_partial_near_clip_keeps_visible_part() {
        let [a, b, mut c] = ccw(0.5);
        c.clip.z = -0.5;
        let polygon = clip_near(&[a, b, c]);
        assert_eq!(polygon.len(), 4);
        assert!(polygon.iter().all(|v| v.clip.z >= -1e-6));
    }

    #[test]
    fn test_non_finite_and_hemisphere_rejection() {
        let mut surface = Surface::new(8, 8);
        let [a, b, mut c] = ccw(0.5);
        c.clip.x = f32::INFINITY;
        assert_eq!(draw_triangle(&mut surface, &[a, b, c], STATE, &Solid(colors::WHITE), &NoTextures).triangles, 0);

        let mut tri = ccw(0.5);
        for v in &mut tri {
            v.varyings.clip_distance = -0.1;
        }
        assert_eq!(draw_triangle(&mut surface, &tri, STATE, &Solid(colors::WHITE), &NoTextures).triangles, 0);
    }
}
