//! Shader kernels: the programmable stages behind an effect pass
//!
//! A [`ShaderKernel`] is the compiled form of a pass. Before a draw the device
//! calls [`ShaderKernel::prepare`] with the effect's current parameter values;
//! the returned [`PreparedShader`] owns everything the vertex and fragment
//! stages read, so parameter changes after `apply_pass` do not affect draws
//! already set up.

use std::fmt;

use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3, Vec4};
use crate::render::effect::ParameterBlock;
use crate::render::primitives::Vertex;
use crate::render::texture::{Color, CubeTexture, TextureRef};

/// Values interpolated across a triangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Varyings {
    /// World-space position
    pub world_position: Vec3,
    /// World-space normal, unnormalized after interpolation
    pub normal: Vec3,
    /// Texture coordinate
    pub tex_coord: Vec2,
    /// Object-space position
    pub local_position: Vec3,
    /// Fragments with a negative interpolated value are discarded
    pub clip_distance: f32,
}

impl Varyings {
    /// Linear blend `a + (b - a) * t`
    pub fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        Self {
            world_position: a.world_position.lerp(&b.world_position, t),
            normal: a.normal.lerp(&b.normal, t),
            tex_coord: a.tex_coord.lerp(&b.tex_coord, t),
            local_position: a.local_position.lerp(&b.local_position, t),
            clip_distance: a.clip_distance + (b.clip_distance - a.clip_distance) * t,
        }
    }

    /// Weighted sum of three vertices; weights are expected to sum to one
    pub fn blend(v: [&Self; 3], w: [f32; 3]) -> Self {
        Self {
            world_position: v[0].world_position * w[0] + v[1].world_position * w[1] + v[2].world_position * w[2],
            normal: v[0].normal * w[0] + v[1].normal * w[1] + v[2].normal * w[2],
            tex_coord: v[0].tex_coord * w[0] + v[1].tex_coord * w[1] + v[2].tex_coord * w[2],
            local_position: v[0].local_position * w[0] + v[1].local_position * w[1] + v[2].local_position * w[2],
            clip_distance: v[0].clip_distance * w[0] + v[1].clip_distance * w[1] + v[2].clip_distance * w[2],
        }
    }
}

/// Vertex stage result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    /// Homogeneous clip-space position
    pub clip: Vec4,
    /// Values handed to the fragment stage
    pub varyings: Varyings,
}

/// The standard transform set pushed by drawables
///
/// Missing parameters default to identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transforms {
    /// `World`
    pub world: Mat4,
    /// `WorldInvTrans`
    pub world_inv_trans: Mat4,
    /// `WorldViewProj`
    pub world_view_proj: Mat4,
}

impl Transforms {
    /// Read `World`, `WorldInvTrans` and `WorldViewProj`
    pub fn from_parameters(parameters: &ParameterBlock) -> Self {
        let world = parameters.matrix("World").unwrap_or_else(Mat4::identity);
        Self {
            world,
            world_inv_trans: parameters
                .matrix("WorldInvTrans")
                .unwrap_or_else(|| world.inverse_transpose()),
            world_view_proj: parameters.matrix("WorldViewProj").unwrap_or_else(Mat4::identity),
        }
    }

    /// Run a vertex through the transforms
    pub fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        let local = vertex.position();
        let position = local.push(1.0);
        VertexOutput {
            clip: self.world_view_proj * position,
            varyings: Varyings {
                world_position: (self.world * position).xyz(),
                normal: self.world_inv_trans.transform_vector(&vertex.normal()),
                tex_coord: vertex.tex_coord(),
                local_position: local,
                clip_distance: 0.0,
            },
        }
    }
}

/// Mirror an incident direction about a unit normal
pub fn reflect(incident: &Vec3, normal: &Vec3) -> Vec3 {
    incident - normal * (2.0 * incident.dot(normal))
}

/// Texture access offered to fragment stages
///
/// Resolves render-target references and applies the device's sampler state.
pub trait TextureSampler {
    /// Sample a 2D texture at normalized coordinates
    fn sample_2d(&self, texture: &TextureRef, uv: Vec2) -> Color;

    /// Sample a cube texture along a direction
    fn sample_cube(&self, cube: &CubeTexture, direction: &Vec3) -> Color;
}

/// Per-draw shader stages with parameters already resolved
pub trait PreparedShader {
    /// Transform one vertex
    fn vertex(&self, vertex: &Vertex) -> VertexOutput;

    /// Shade one fragment; `None` discards it
    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color>;
}

/// Compiled program for one effect pass
pub trait ShaderKernel: Send + Sync + fmt::Debug {
    /// Resolve parameters for the draws that follow
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_blend_with_unit_weight_returns_vertex() {
        let a = Varyings { tex_coord: Vec2::new(1.0, 0.0), clip_distance: -1.0, ..Default::default() };
        let b = Varyings { tex_coord: Vec2::new(0.0, 1.0), clip_distance: 1.0, ..Default::default() };
        let c = Varyings::default();

        let blended = Varyings::blend([&a, &b, &c], [0.0, 1.0, 0.0]);
        assert_eq!(blended, b);
    }

    #[test]
    fn test_reflect_flips_normal_component() {
        let r = reflect(&Vec3::new(1.0, -1.0, 0.0), &Vec3::y());
        assert_relative_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_transforms_carry_local_and_world_positions() {
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
        let transforms = Transforms {
            world: Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)),
            world_inv_trans: Mat4::identity(),
            world_view_proj: Mat4::identity(),
        };
        let out = transforms.vertex(&vertex);
        assert_relative_eq!(out.clip, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_relative_eq!(out.varyings.world_position, Vec3::new(2.0, 2.0, 3.0));
        assert_relative_eq!(out.varyings.local_position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Varyings { world_position: Vec3::new(0.0, 0.0, 0.0), ..Default::default() };
        let b = Varyings { world_position: Vec3::new(2.0, 4.0, 6.0), clip_distance: 2.0, ..Default::default() };

        let mid = Varyings::lerp(&a, &b, 0.5);
        assert_relative_eq!(mid.world_position, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(mid.clip_distance, 1.0);
    }
}
