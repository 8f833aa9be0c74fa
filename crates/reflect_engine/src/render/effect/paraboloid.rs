//! # Paraboloid projection
//!
//! The `BuildDP` technique of every capturable effect wraps that effect's
//! regular kernel in a [`ParaboloidKernel`]. The inner vertex stage runs with
//! `WorldViewProj = world * paraboloid_view` (the capture camera's projection
//! is identity), so its clip output is a view-space position relative to the
//! focal point. The wrapper replaces it with the paraboloid mapping:
//!
//! ```text
//! p.z *= Direction           // +1 front hemisphere, -1 back
//! n    = p / |p|
//! x, y = n.x / (1 + n.z), n.y / (1 + n.z)
//! z    = (|p| - NEAR) / (FAR - NEAR)
//! ```
//!
//! Fragments on the far side of the hemisphere (`n.z < 0`) are discarded.
//! Culling is disabled for these passes because the mapping mirrors winding
//! between the two hemispheres.

use std::sync::Arc;

use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::render::device::CullMode;
use crate::render::effect::kernel::{PreparedShader, ShaderKernel, TextureSampler, Varyings, VertexOutput};
use crate::render::effect::{EffectPass, ParameterBlock, PassState, Technique};
use crate::render::primitives::Vertex;
use crate::render::texture::Color;

/// Name of the capture technique
pub const TECHNIQUE: &str = "BuildDP";

/// Parameter selecting the hemisphere
pub const DIRECTION: &str = "Direction";

/// Distance mapped to depth 0
pub const NEAR: f32 = 0.1;

/// Distance mapped to depth 1
pub const FAR: f32 = 1000.0;

/// Map a view-space position onto the paraboloid for one hemisphere
///
/// Returns the clip position (`w = 1`) and the hemisphere clip distance.
pub fn project(view_position: &Vec3, direction: f32) -> (Vec4, f32) {
    let p = Vec3::new(view_position.x, view_position.y, view_position.z * direction);
    let length = p.norm();
    if length <= f32::EPSILON {
        return (Vec4::new(0.0, 0.0, 0.0, 1.0), 0.0);
    }

    let n = p / length;
    let denom = 1.0 + n.z;
    let depth = (length - NEAR) / (FAR - NEAR);
    (Vec4::new(n.x / denom, n.y / denom, depth, 1.0), n.z)
}

/// Texture coordinates of a unit direction in one hemisphere's map
///
/// `direction` is already expressed in the paraboloid basis. The front map
/// holds `z >= 0`, the back map `z < 0`.
pub fn lookup(direction: &Vec3) -> (bool, Vec2) {
    let front = direction.z >= 0.0;
    let denom = if front { 1.0 + direction.z } else { 1.0 - direction.z };
    let x = direction.x / denom;
    let y = direction.y / denom;
    (front, Vec2::new(0.5 * x + 0.5, 0.5 - 0.5 * y))
}

/// Wraps a kernel so its output lands on a paraboloid map
#[derive(Debug)]
pub struct ParaboloidKernel {
    inner: Arc<dyn ShaderKernel>,
}

impl ParaboloidKernel {
    /// Wrap an existing kernel
    pub fn new(inner: Arc<dyn ShaderKernel>) -> Self {
        Self { inner }
    }
}

impl ShaderKernel for ParaboloidKernel {
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader> {
        Box::new(PreparedParaboloid {
            inner: self.inner.prepare(parameters),
            direction: parameters.float(DIRECTION).unwrap_or(1.0),
        })
    }
}

struct PreparedParaboloid {
    inner: Box<dyn PreparedShader>,
    direction: f32,
}

impl PreparedShader for PreparedParaboloid {
    fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        let mut out = self.inner.vertex(vertex);
        let w = if out.clip.w.abs() > f32::EPSILON { out.clip.w } else { 1.0 };
        let (clip, clip_distance) = project(&(out.clip.xyz() / w), self.direction);
        out.clip = clip;
        out.varyings.clip_distance = clip_distance;
        out
    }

    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color> {
        if input.clip_distance < 0.0 {
            return None;
        }
        self.inner.fragment(input, sampler)
    }
}

/// A `BuildDP` technique wrapping `inner`, with culling disabled
pub fn technique(inner: Arc<dyn ShaderKernel>) -> Technique {
    let pass = EffectPass::new("P0", Arc::new(ParaboloidKernel::new(inner)))
        .with_state(PassState { cull: Some(CullMode::None), depth: None });
    Technique::new(TECHNIQUE, vec![pass])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_point_maps_to_center() {
        let (clip, distance) = project(&Vec3::new(0.0, 0.0, 10.0), 1.0);
        assert_relative_eq!(clip.x, 0.0);
        assert_relative_eq!(clip.y, 0.0);
        assert_relative_eq!(distance, 1.0);
        assert_relative_eq!(clip.z, (10.0 - NEAR) / (FAR - NEAR));
    }

    #[test]
    fn test_horizon_maps_to_unit_circle() {
        let (clip, distance) = project(&Vec3::new(5.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(clip.x, 1.0);
        assert_relative_eq!(distance, 0.0);
    }

    #[test]
    fn test_direction_selects_hemisphere() {
        let behind = Vec3::new(0.0, 1.0, -4.0);
        assert!(project(&behind, 1.0).1 < 0.0);
        assert!(project(&behind, -1.0).1 > 0.0);
    }

    #[test]
    fn test_lookup_matches_projection() {
        for (point, direction) in [
            (Vec3::new(1.0, 2.0, 3.0), 1.0),
            (Vec3::new(-2.0, 0.5, -3.0), -1.0),
        ] {
            let (clip, _) = project(&point, direction);
            let (front, uv) = lookup(&point.normalize());
            assert_eq!(front, direction > 0.0);
            assert_relative_eq!(uv.x, 0.5 * clip.x + 0.5, epsilon = 1e-5);
            assert_relative_eq!(uv.y, 0.5 - 0.5 * clip.y, epsilon = 1e-5);
        }
    }
}
