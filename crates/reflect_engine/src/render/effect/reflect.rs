//! Dual-paraboloid reflection lookup
//!
//! The view vector is mirrored about the surface normal, rotated into the
//! paraboloid basis and used to address whichever hemisphere map it falls in.
//! This effect has no `BuildDP` technique, so reflective drawables never
//! appear in their own maps.

use std::sync::Arc;

use crate::foundation::math::{Mat3, Vec3};
use crate::render::effect::kernel::{
    reflect, PreparedShader, ShaderKernel, TextureSampler, Transforms, Varyings, VertexOutput,
};
use crate::render::effect::{paraboloid, Effect, EffectPass, ParameterBlock, ParameterKind, Technique};
use crate::render::primitives::Vertex;
use crate::render::texture::{colors, Color, TextureRef};
use crate::render::RenderResult;

#[derive(Debug)]
struct ReflectKernel;

struct PreparedReflect {
    transforms: Transforms,
    eye: Vec3,
    basis: Mat3,
    front: Option<TextureRef>,
    back: Option<TextureRef>,
}

impl ShaderKernel for ReflectKernel {
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader> {
        let basis = parameters
            .matrix("ParaboloidBasis")
            .map_or_else(Mat3::identity, |m| m.fixed_view::<3, 3>(0, 0).into_owned());

        Box::new(PreparedReflect {
            transforms: Transforms::from_parameters(parameters),
            eye: parameters.vector3("EyePosition").unwrap_or_else(Vec3::zeros),
            basis,
            front: parameters.texture("Front"),
            back: parameters.texture("Back"),
        })
    }
}

impl PreparedShader for PreparedReflect {
    fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        self.transforms.vertex(vertex)
    }

    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color> {
        let normal = input.normal.try_normalize(f32::EPSILON)?;
        let incident = (input.world_position - self.eye).try_normalize(f32::EPSILON)?;
        let r = (self.basis * reflect(&incident, &normal)).try_normalize(f32::EPSILON)?;

        let (front, uv) = paraboloid::lookup(&r);
        let map = if front { self.front.as_ref() } else { self.back.as_ref() };
        let color = map.map_or(colors::BLACK, |tex| sampler.sample_2d(tex, uv));

        Some(Color::new(color.x, color.y, color.z, 1.0))
    }
}

/// `Shaders/DPMReflect`: technique `Reflect`
pub(super) fn effect(name: &str) -> RenderResult<Effect> {
    Effect::builder(name)
        .parameter("World", ParameterKind::Matrix)
        .parameter("WorldInvTrans", ParameterKind::Matrix)
        .parameter("WorldViewProj", ParameterKind::Matrix)
        .parameter("EyePosition", ParameterKind::Vector3)
        .parameter("ParaboloidBasis", ParameterKind::Matrix)
        .parameter("Front", ParameterKind::Texture)
        .parameter("Back", ParameterKind::Texture)
        .technique(Technique::new("Reflect", vec![EffectPass::new("P0", Arc::new(ReflectKernel))]))
        .build()
}
