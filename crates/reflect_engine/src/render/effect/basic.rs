//! Fixed-function fallback for drawables without a shader program
//!
//! Takes separate `World`, `View` and `Projection` matrices, an optional
//! texture, and lights with the three-light default rig when
//! `LightingEnabled` is non-zero.

use std::sync::Arc;

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::effect::kernel::{PreparedShader, ShaderKernel, TextureSampler, Transforms, Varyings, VertexOutput};
use crate::render::effect::{Effect, EffectPass, ParameterBlock, ParameterKind, Technique};
use crate::render::lighting::{default_rig, Light};
use crate::render::primitives::Vertex;
use crate::render::texture::{colors, Color, TextureRef};
use crate::render::RenderResult;

/// Asset-style name of the fallback effect
pub const NAME: &str = "BasicEffect";

#[derive(Debug)]
struct BasicKernel;

struct PreparedBasic {
    transforms: Transforms,
    texture: Option<TextureRef>,
    lights: Option<[Light; 3]>,
}

impl ShaderKernel for BasicKernel {
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader> {
        let world = parameters.matrix("World").unwrap_or_else(Mat4::identity);
        let view = parameters.matrix("View").unwrap_or_else(Mat4::identity);
        let projection = parameters.matrix("Projection").unwrap_or_else(Mat4::identity);

        let enabled = |name: &str| parameters.float(name).is_some_and(|v| v != 0.0);

        Box::new(PreparedBasic {
            transforms: Transforms {
                world,
                world_inv_trans: world.inverse_transpose(),
                world_view_proj: projection * view * world,
            },
            texture: parameters.texture("Texture").filter(|_| enabled("TextureEnabled")),
            lights: enabled("LightingEnabled").then(default_rig::lights),
        })
    }
}

impl PreparedShader for PreparedBasic {
    fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        self.transforms.vertex(vertex)
    }

    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color> {
        let albedo = self
            .texture
            .as_ref()
            .map_or(colors::WHITE, |tex| sampler.sample_2d(tex, input.tex_coord));

        let Some(lights) = &self.lights else {
            return Some(albedo);
        };

        let normal = input.normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
        let light = lights
            .iter()
            .fold(default_rig::AMBIENT, |acc, light| acc + light.diffuse.xyz() * light.lambert(&normal));
        let lit = albedo.xyz().component_mul(&light);
        Some(Color::new(lit.x, lit.y, lit.z, albedo.w))
    }
}

/// The fallback effect; technique `BasicEffect`
pub(super) fn effect() -> RenderResult<Effect> {
    Effect::builder(NAME)
        .parameter("World", ParameterKind::Matrix)
        .parameter("View", ParameterKind::Matrix)
        .parameter("Projection", ParameterKind::Matrix)
        .parameter("Texture", ParameterKind::Texture)
        .parameter("TextureEnabled", ParameterKind::Float)
        .parameter("LightingEnabled", ParameterKind::Float)
        .technique(Technique::new(NAME, vec![EffectPass::new("P0", Arc::new(BasicKernel))]))
        .build()
}
