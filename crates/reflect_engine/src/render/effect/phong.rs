//! Per-pixel Phong shading with up to three directional lights

use std::sync::Arc;

use crate::foundation::math::{Vec3, Vec4};
use crate::render::effect::kernel::{
    reflect, PreparedShader, ShaderKernel, TextureSampler, Transforms, Varyings, VertexOutput,
};
use crate::render::effect::{paraboloid, Effect, EffectPass, ParameterBlock, ParameterKind, Technique};
use crate::render::lighting::{Light, MAX_LIGHTS};
use crate::render::primitives::Vertex;
use crate::render::texture::{colors, Color, TextureRef};
use crate::render::RenderResult;

const SPECULAR_POWER: f32 = 32.0;
const SPECULAR_INTENSITY: f32 = 0.5;

#[derive(Debug)]
struct PhongKernel;

struct PreparedPhong {
    transforms: Transforms,
    eye: Option<Vec3>,
    diffuse_tex: Option<TextureRef>,
    tex_scale: f32,
    lights: Vec<Light>,
}

impl ShaderKernel for PhongKernel {
    fn prepare(&self, parameters: &ParameterBlock) -> Box<dyn PreparedShader> {
        let lights = (0..MAX_LIGHTS)
            .filter_map(|i| {
                let [dir, diffuse, ambient] = Light::parameter_names(i);
                let direction = parameters.vector3(&dir)?;
                Some(Light::directional(
                    direction,
                    parameters.vector4(&diffuse).unwrap_or_else(Vec4::zeros),
                    parameters.vector4(&ambient).unwrap_or_else(Vec4::zeros),
                ))
            })
            .collect();

        Box::new(PreparedPhong {
            transforms: Transforms::from_parameters(parameters),
            eye: parameters.vector3("EyePosition"),
            diffuse_tex: parameters.texture("DiffuseTex"),
            tex_scale: parameters.float("TexScale").unwrap_or(1.0),
            lights,
        })
    }
}

impl PreparedShader for PreparedPhong {
    fn vertex(&self, vertex: &Vertex) -> VertexOutput {
        self.transforms.vertex(vertex)
    }

    fn fragment(&self, input: &Varyings, sampler: &dyn TextureSampler) -> Option<Color> {
        let normal = input.normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
        let albedo = self
            .diffuse_tex
            .as_ref()
            .map_or(colors::WHITE, |tex| sampler.sample_2d(tex, input.tex_coord * self.tex_scale));

        if self.lights.is_empty() {
            return Some(albedo);
        }

        let to_eye = self
            .eye
            .and_then(|eye| (eye - input.world_position).try_normalize(f32::EPSILON));

        let mut diffuse = Vec3::zeros();
        let mut ambient = Vec3::zeros();
        let mut specular = Vec3::zeros();
        for light in &self.lights {
            let lambert = light.lambert(&normal);
            diffuse += light.diffuse.xyz() * lambert;
            ambient += light.ambient.xyz();

            if let Some(to_eye) = to_eye.filter(|_| lambert > 0.0) {
                let r = reflect(&light.direction, &normal);
                let highlight = r.dot(&to_eye).max(0.0).powf(SPECULAR_POWER);
                specular += light.diffuse.xyz() * (highlight * SPECULAR_INTENSITY);
            }
        }
        ambient /= self.lights.len() as f32;

        let lit = albedo.xyz().component_mul(&(ambient + diffuse)) + specular;
        Some(Color::new(lit.x, lit.y, lit.z, albedo.w))
    }
}

/// `Shaders/Phong`: techniques `Phong` and `BuildDP`
pub(super) fn effect(name: &str) -> RenderResult<Effect> {
    let kernel: Arc<dyn ShaderKernel> = Arc::new(PhongKernel);

    let mut builder = Effect::builder(name)
        .parameter("World", ParameterKind::Matrix)
        .parameter("WorldInvTrans", ParameterKind::Matrix)
        .parameter("WorldViewProj", ParameterKind::Matrix)
        .parameter("EyePosition", ParameterKind::Vector3)
        .parameter("DiffuseTex", ParameterKind::Texture)
        .parameter("TexScale", ParameterKind::Float)
        .parameter(paraboloid::DIRECTION, ParameterKind::Float);
    for i in 0..MAX_LIGHTS {
        let [dir, diffuse, ambient] = Light::parameter_names(i);
        builder = builder
            .parameter(dir, ParameterKind::Vector3)
            .parameter(diffuse, ParameterKind::Vector4)
            .parameter(ambient, ParameterKind::Vector4);
    }

    builder
        .technique(Technique::new("Phong", vec![EffectPass::new("P0", Arc::clone(&kernel))]))
        .technique(paraboloid::technique(kernel))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use approx::assert_relative_eq;

    struct White;

    impl TextureSampler for White {
        fn sample_2d(&self, _texture: &TextureRef, _uv: Vec2) -> Color {
            colors::WHITE
        }

        fn sample_cube(&self, _cube: &crate::render::texture::CubeTexture, _direction: &Vec3) -> Color {
            colors::WHITE
        }
    }

    fn shade(effect: &Effect, normal: Vec3) -> Color {
        let prepared = effect.passes()[0].kernel().prepare(effect.parameters());
        let input = Varyings { normal, world_position: Vec3::zeros(), ..Default::default() };
        prepared.fragment(&input, &White).unwrap()
    }

    #[test]
    fn test_declares_both_techniques() {
        let effect = effect("Shaders/Phong").unwrap();
        assert!(effect.has_technique("Phong"));
        assert!(effect.has_technique(paraboloid::TECHNIQUE));
        assert_eq!(effect.current_technique_name(), "Phong");
    }

    #[test]
    fn test_unlit_returns_albedo() {
        let effect = effect("Shaders/Phong").unwrap();
        assert_eq!(shade(&effect, Vec3::y()), colors::WHITE);
    }

    #[test]
    fn test_lit_side_is_brighter() {
        let mut effect = effect("Shaders/Phong").unwrap();
        effect.set("LightDir0", -Vec3::y());
        effect.set("LightDiffuse0", Vec4::new(1.0, 1.0, 1.0, 1.0));
        effect.set("LightAmbient0", Vec4::new(0.1, 0.1, 0.1, 1.0));

        let top = shade(&effect, Vec3::y());
        let bottom = shade(&effect, -Vec3::y());
        assert!(top.x > bottom.x);
        assert_relative_eq!(bottom.x, 0.1, epsilon = 1e-5);
    }
}
