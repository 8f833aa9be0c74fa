//! Unlit texturing

use std::sync::Arc;

use crate::render::effect::kernel::{PreparedShader, ShaderKernel, TextureSampler, Transforms, Varyings, VertexOutput};
use crate::render::effect::{paraboloid, Effect, EffectPass, ParameterBlock, ParameterKind, Technique};
use crate::render::primitives::Vertex;
use crate::render::texture::{colors, Color, TextureRef};
use crate::render::RenderResult;

#[derive(Debug)]
struct TextureKernel;

struct PreparedTexture {
    transforms: Transforms,
    diffuse_tex: Option<TextureRef>,
    tex_scale: f32,
}

impl ShaderKernel for TextureKernel {
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader> {
        Box::new(PreparedTexture {
            transforms: Transforms::from_parameters(parameters),
            diffuse_tex: parameters.texture("DiffuseTex"),
            tex_scale: parameters.float("TexScale").unwrap_or(1.0),
        })
    }
}

impl PreparedShader for PreparedTexture {
    fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        self.transforms.vertex(vertex)
    }

    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color> {
        Some(
            self.diffuse_tex
                .as_ref()
                .map_or(colors::WHITE, |tex| sampler.sample_2d(tex, input.tex_coord * self.tex_scale)),
        )
    }
}

/// `Shaders/Texture`: techniques `Texture` and `BuildDP`
pub(super) fn effect(name: &str) -> RenderResult<Effect> {
    let kernel: Arc<dyn ShaderKernel> = Arc::new(TextureKernel);

    Effect::builder(name)
        .parameter("World", ParameterKind::Matrix)
        .parameter("WorldViewProj", ParameterKind::Matrix)
        .parameter("DiffuseTex", ParameterKind::Texture)
        .parameter("TexScale", ParameterKind::Float)
        .parameter(paraboloid::DIRECTION, ParameterKind::Float)
        .technique(Technique::new("Texture", vec![EffectPass::new("P0", Arc::clone(&kernel))]))
        .technique(paraboloid::technique(kernel))
        .build()
}
