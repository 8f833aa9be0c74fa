//! Cube-map sky lookup by object-space direction

use std::sync::Arc;

use crate::render::effect::kernel::{PreparedShader, ShaderKernel, TextureSampler, Transforms, Varyings, VertexOutput};
use crate::render::effect::{paraboloid, Effect, EffectPass, ParameterBlock, ParameterKind, Technique};
use crate::render::primitives::Vertex;
use crate::render::texture::{colors, Color, CubeTexture, TextureRef};
use crate::render::RenderResult;

#[derive(Debug)]
struct EnvironmentKernel;

struct PreparedEnvironment {
    transforms: Transforms,
    env_map: Option<Arc<CubeTexture>>,
    tint: Option<TextureRef>,
}

impl ShaderKernel for EnvironmentKernel {
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader> {
        Box::new(PreparedEnvironment {
            transforms: Transforms::from_parameters(parameters),
            env_map: parameters.texture_cube("EnvMap"),
            tint: parameters.texture("DiffuseTex"),
        })
    }
}

impl PreparedShader for PreparedEnvironment {
    fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        self.transforms.vertex(vertex)
    }

    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color> {
        let sky = self
            .env_map
            .as_ref()
            .map_or(colors::BLACK, |cube| sampler.sample_cube(cube, &input.local_position));
        let tint = self
            .tint
            .as_ref()
            .map_or(colors::WHITE, |tex| sampler.sample_2d(tex, input.tex_coord));
        Some(sky.component_mul(&tint))
    }
}

/// `Shaders/EnvironmentMap`: techniques `EnvironmentMap` and `BuildDP`
pub(super) fn effect(name: &str) -> RenderResult<Effect> {
    let kernel: Arc<dyn ShaderKernel> = Arc::new(EnvironmentKernel);

    Effect::builder(name)
        .parameter("World", ParameterKind::Matrix)
        .parameter("WorldViewProj", ParameterKind::Matrix)
        .parameter("DiffuseTex", ParameterKind::Texture)
        .parameter("EnvMap", ParameterKind::TextureCube)
        .parameter(paraboloid::DIRECTION, ParameterKind::Float)
        .technique(Technique::new("EnvironmentMap", vec![EffectPass::new("P0", Arc::clone(&kernel))]))
        .technique(paraboloid::technique(kernel))
        .build()
}
