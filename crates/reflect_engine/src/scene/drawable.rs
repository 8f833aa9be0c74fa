//! # Mesh Drawable
//!
//! A transform, a mesh, an optional shader program and the textures and lights
//! fed to it. One type covers every object in the scene; [`DrawStyle`] selects
//! how draws are issued.
//!
//! ## Transform
//! Two angles accumulate independently and wrap at a full turn. The world
//! matrix is rebuilt every update as
//!
//! ```text
//! world = spin(rotation_axis, rotation) * translate(position)
//!       * orient(orientation_axis, orientation) * scale
//! ```
//!
//! so the spin is applied last and swings a translated object around the
//! origin.
//!
//! ## Parameters pushed before every draw
//! | Name            | Value                                   |
//! |-----------------|-----------------------------------------|
//! | `World`         | bone transform then world               |
//! | `WorldInvTrans` | inverse-transpose of `World`            |
//! | `WorldViewProj` | camera view-projection times `World`    |
//! | `EyePosition`   | camera position                         |
//! | `DiffuseTex`    | the 2D texture, when one is loaded      |
//! | `TexScale`      | texture coordinate multiplier           |
//!
//! Names the program does not declare are skipped.

use std::sync::Arc;

use crate::assets::ContentManager;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::device::{GraphicsDevice, RasterizerState};
use crate::render::effect::{library, Effect};
use crate::render::lighting::{Light, MAX_LIGHTS};
use crate::render::primitives::{Camera, Model, Vertex};
use crate::render::texture::{CubeTexture, SamplerState, Texture2D, TextureRef};
use crate::scene::description::{DrawStyle, DrawableDesc};
use crate::scene::SceneError;

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];
const QUAD_TECHNIQUE: &str = "Texture";

/// A renderable object
#[derive(Debug)]
pub struct Drawable {
    id: usize,
    name: String,
    style: DrawStyle,

    position: Vec3,
    velocity: Vec3,
    scale: Vec3,
    rotation: f32,
    rotation_axis: Vec3,
    orientation: f32,
    orientation_axis: Vec3,
    total_rotation: f32,
    total_orientation: f32,
    world: Mat4,

    mesh_asset: Option<String>,
    effect_asset: Option<String>,
    texture_asset: Option<String>,
    env_texture_asset: Option<String>,

    model: Option<Arc<Model>>,
    effect: Option<Effect>,
    fallback: Option<Effect>,
    texture: Option<Arc<Texture2D>>,
    env_texture: Option<Arc<CubeTexture>>,
    texture_scale: f32,
    lights: Vec<Light>,
    lighting_enabled: bool,
    reflector: bool,
}

impl Drawable {
    /// Build from a description; lit drawables take up to three scene lights
    ///
    /// Nothing is loaded until [`Self::load_content`].
    pub fn from_desc(id: usize, desc: &DrawableDesc, lights: &[Light]) -> Self {
        let mut drawable = Self {
            id,
            name: desc.name.clone(),
            style: desc.style,
            position: Vec3::from(desc.position),
            velocity: Vec3::from(desc.velocity),
            scale: Vec3::from(desc.scale),
            rotation: desc.rotation,
            rotation_axis: Vec3::from(desc.rotation_axis),
            orientation: desc.orientation,
            orientation_axis: Vec3::from(desc.orientation_axis),
            total_rotation: 0.0,
            total_orientation: 0.0,
            world: Mat4::identity(),
            mesh_asset: desc.mesh.clone(),
            effect_asset: desc.effect.clone(),
            texture_asset: desc.texture.clone(),
            env_texture_asset: desc.environment_texture.clone(),
            model: None,
            effect: None,
            fallback: None,
            texture: None,
            env_texture: None,
            texture_scale: desc.texture_scale,
            lights: if desc.lit { lights.iter().take(MAX_LIGHTS).copied().collect() } else { Vec::new() },
            lighting_enabled: desc.lighting_enabled,
            reflector: desc.reflector,
        };
        drawable.rebuild_world();
        drawable
    }

    /// Load the program, mesh and textures and bind the constant parameters
    pub fn load_content(&mut self, content: &mut ContentManager) -> Result<(), SceneError> {
        if let Some(path) = &self.effect_asset {
            let mut effect = content.load_effect(path)?;
            for (i, light) in self.lights.iter().enumerate() {
                let [dir, diffuse, ambient] = Light::parameter_names(i);
                effect.set(&dir, light.direction);
                effect.set(&diffuse, light.diffuse);
                effect.set(&ambient, light.ambient);
            }
            self.effect = Some(effect);
        } else {
            self.fallback = Some(library::basic_effect()?);
        }

        if let Some(path) = &self.mesh_asset {
            self.model = Some(content.load_model(path)?);
        } else if self.style != DrawStyle::BillboardQuad {
            return Err(SceneError::MissingMesh(self.name.clone()));
        }

        if let Some(path) = &self.texture_asset {
            self.texture = Some(content.load_texture(path)?);
        }

        if let Some(path) = &self.env_texture_asset {
            let cube = content.load_cube_texture(path)?;
            if let Some(effect) = &mut self.effect {
                effect.set("EnvMap", Arc::clone(&cube));
            }
            self.env_texture = Some(cube);
        }

        log::debug!("Loaded content for drawable {} '{}'", self.id, self.name);
        Ok(())
    }

    /// Advance the animation by `elapsed` seconds and rebuild the world matrix
    pub fn update(&mut self, elapsed: f32) {
        self.total_rotation = utils::wrap_angle(self.total_rotation + elapsed * self.rotation);
        self.total_orientation = utils::wrap_angle(self.total_orientation + elapsed * self.orientation);
        self.position += self.velocity;
        self.rebuild_world();
    }

    fn rebuild_world(&mut self) {
        self.world = Mat4::axis_angle(&self.rotation_axis, self.total_rotation)
            * Mat4::new_translation(&self.position)
            * Mat4::axis_angle(&self.orientation_axis, self.total_orientation)
            * Mat4::new_nonuniform_scaling(&self.scale);
    }

    /// Draw with `camera` using the program's current technique
    pub fn draw(&mut self, device: &mut dyn GraphicsDevice, camera: &Camera) -> Result<(), SceneError> {
        match self.style {
            DrawStyle::Standard => {
                device.set_rasterizer_state(RasterizerState::CULL_BACK);
                if self.effect.is_some() {
                    self.draw_custom(device, camera)
                } else {
                    self.draw_fallback(device, camera)
                }
            }
            DrawStyle::EnvironmentInsideOut => self.draw_environment(device, camera),
            DrawStyle::BillboardQuad => self.draw_quad(device, camera),
        }
    }

    /// Draw once with `technique` active and `direction` pushed, then restore
    ///
    /// Returns `Ok(false)` without drawing when the drawable has no program or
    /// the program lacks the technique. The previous technique is restored
    /// whether or not the draw succeeds.
    pub fn draw_with_technique(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        technique: &str,
        parameter: (&str, f32),
    ) -> Result<bool, SceneError> {
        let Some(effect) = self.effect.as_mut() else {
            log::debug!("Drawable '{}' has no program, skipping {}", self.name, technique);
            return Ok(false);
        };
        let Some(id) = effect.technique(technique) else {
            log::debug!("Drawable '{}' has no {} technique, skipping", self.name, technique);
            return Ok(false);
        };

        let previous = effect.current_technique();
        effect.set_current_technique(id)?;
        effect.set(parameter.0, parameter.1);

        let result = self.draw(device, camera);

        if let Some(effect) = self.effect.as_mut() {
            effect.set_current_technique(previous)?;
        }
        result.map(|()| true)
    }

    fn push_transforms(effect: &mut Effect, world: &Mat4, camera: &Camera) {
        effect.set("World", *world);
        effect.set("WorldInvTrans", world.inverse_transpose());
        effect.set("WorldViewProj", camera.view_proj() * world);
        effect.set("EyePosition", camera.position());
    }

    fn draw_custom(&mut self, device: &mut dyn GraphicsDevice, camera: &Camera) -> Result<(), SceneError> {
        let (Some(effect), Some(model)) = (self.effect.as_mut(), self.model.as_ref()) else {
            return Ok(());
        };

        for mesh in &model.meshes {
            let world = self.world * mesh.bone_transform;
            Self::push_transforms(effect, &world, camera);
            if let Some(texture) = &self.texture {
                effect.set("DiffuseTex", TextureRef::Image(Arc::clone(texture)));
            }
            effect.set("TexScale", self.texture_scale);

            for part in &mesh.parts {
                device.set_geometry(Arc::clone(&part.vertex_buffer), Arc::clone(&part.index_buffer), part.vertex_offset);
                for pass in 0..effect.passes().len() {
                    device.apply_pass(effect, pass)?;
                    device.draw_indexed_primitives(part.start_index, part.primitive_count)?;
                }
            }
        }
        Ok(())
    }

    fn draw_fallback(&mut self, device: &mut dyn GraphicsDevice, camera: &Camera) -> Result<(), SceneError> {
        let (Some(effect), Some(model)) = (self.fallback.as_mut(), self.model.as_ref()) else {
            return Ok(());
        };

        effect.set("View", *camera.view());
        effect.set("Projection", *camera.projection());
        if let Some(texture) = &self.texture {
            effect.set("Texture", TextureRef::Image(Arc::clone(texture)));
            effect.set("TextureEnabled", 1.0);
        }
        effect.set("LightingEnabled", if self.lighting_enabled { 1.0 } else { 0.0 });

        for mesh in &model.meshes {
            effect.set("World", self.world * mesh.bone_transform);
            for part in &mesh.parts {
                device.set_geometry(Arc::clone(&part.vertex_buffer), Arc::clone(&part.index_buffer), part.vertex_offset);
                device.apply_pass(effect, 0)?;
                device.draw_indexed_primitives(part.start_index, part.primitive_count)?;
            }
        }
        Ok(())
    }

    /// Sky sphere: follows the viewer and shows its inside
    fn draw_environment(&mut self, device: &mut dyn GraphicsDevice, camera: &Camera) -> Result<(), SceneError> {
        let (Some(effect), Some(model)) = (self.effect.as_mut(), self.model.as_ref()) else {
            return Ok(());
        };

        let previous_sampler = device.sampler_state();
        device.set_sampler_state(SamplerState::POINT_WRAP);
        device.set_rasterizer_state(RasterizerState::CULL_FRONT);

        let world = Mat4::new_translation(&camera.position()) * self.world;
        effect.set("WorldViewProj", camera.view_proj() * world);

        let result = (|| -> Result<(), SceneError> {
            for mesh in &model.meshes {
                for part in &mesh.parts {
                    device.set_geometry(
                        Arc::clone(&part.vertex_buffer),
                        Arc::clone(&part.index_buffer),
                        part.vertex_offset,
                    );
                    for pass in 0..effect.passes().len() {
                        device.apply_pass(effect, pass)?;
                        device.draw_indexed_primitives(part.start_index, part.primitive_count)?;
                    }
                }
            }
            Ok(())
        })();

        device.set_rasterizer_state(RasterizerState::CULL_BACK);
        device.set_sampler_state(previous_sampler);
        result
    }

    /// Camera-centered quad through the program's `Texture` technique
    fn draw_quad(&mut self, device: &mut dyn GraphicsDevice, camera: &Camera) -> Result<(), SceneError> {
        let Some(effect) = self.effect.as_mut() else {
            return Ok(());
        };

        let (sx, sy) = (self.scale.x, self.scale.y);
        let normal = [0.0, 0.0, 1.0];
        let vertices = [
            Vertex::new([-sx, sy, 1.0], normal, [1.0, 1.0]),
            Vertex::new([sx, sy, 1.0], normal, [0.0, 1.0]),
            Vertex::new([sx, -sy, 1.0], normal, [0.0, 0.0]),
            Vertex::new([-sx, -sy, 1.0], normal, [1.0, 0.0]),
        ];

        let previous = effect.current_technique();
        effect.set_current_technique_by_name(QUAD_TECHNIQUE)?;

        let world = Mat4::new_translation(&camera.position()) * self.world;
        effect.set("WorldViewProj", camera.view_proj() * world);
        if let Some(texture) = &self.texture {
            effect.set("DiffuseTex", TextureRef::Image(Arc::clone(texture)));
        }

        device.set_rasterizer_state(RasterizerState::CULL_NONE);
        let result = (|| -> Result<(), SceneError> {
            for pass in 0..effect.passes().len() {
                device.apply_pass(effect, pass)?;
                device.draw_user_indexed_primitives(&vertices, &QUAD_INDICES)?;
            }
            Ok(())
        })();
        device.set_rasterizer_state(RasterizerState::CULL_BACK);

        effect.set_current_technique(previous)?;
        result
    }

    /// Index in the scene
    pub fn id(&self) -> usize {
        self.id
    }

    /// Name from the description
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Draw strategy
    pub fn style(&self) -> DrawStyle {
        self.style
    }

    /// Whether this drawable shows the paraboloid reflection
    pub fn is_reflector(&self) -> bool {
        self.reflector
    }

    /// Current world matrix
    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    /// Current position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the drawable; the world matrix follows on the next update
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.rebuild_world();
    }

    /// Accumulated spin angle in `[0, 2π)`
    pub fn total_rotation(&self) -> f32 {
        self.total_rotation
    }

    /// Accumulated orientation angle in `[0, 2π)`
    pub fn total_orientation(&self) -> f32 {
        self.total_orientation
    }

    /// Lights bound to the program
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// The shader program, if any
    pub fn effect(&self) -> Option<&Effect> {
        self.effect.as_ref()
    }

    /// Mutable shader program, if any
    pub fn effect_mut(&mut self) -> Option<&mut Effect> {
        self.effect.as_mut()
    }

    /// The loaded mesh
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// Whether the program declares `technique`
    pub fn has_technique(&self, technique: &str) -> bool {
        self.effect.as_ref().is_some_and(|effect| effect.has_technique(technique))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::procedural;
    use crate::foundation::math::constants;
    use crate::render::effect::paraboloid;
    use crate::render::recording::{DeviceCommand, RecordingDevice};
    use approx::assert_relative_eq;

    fn content() -> ContentManager {
        ContentManager::new(std::env::temp_dir().join("reflect_engine_no_content"))
    }

    fn loaded(desc: &DrawableDesc) -> Drawable {
        let mut drawable = Drawable::from_desc(0, desc, &[]);
        drawable.load_content(&mut content()).unwrap();
        drawable
    }

    fn camera() -> Camera {
        let mut camera = Camera::new();
        camera.look_at(Vec3::new(0.0, 5.0, 20.0), Vec3::zeros(), Vec3::y());
        camera.set_lens(constants::PI / 4.0, 1.0, 0.1, 1000.0);
        camera.build_view();
        camera
    }

    #[test]
    fn test_angles_wrap_independently() {
        let desc = DrawableDesc { rotation: 1.0, orientation: 0.5, ..DrawableDesc::default() };
        let mut drawable = Drawable::from_desc(0, &desc, &[]);
        let dt = 0.1;
        for _ in 0..100 {
            drawable.update(dt);
        }
        assert_relative_eq!(drawable.total_rotation(), 10.0_f32.rem_euclid(constants::TAU), epsilon = 1e-3);
        assert_relative_eq!(drawable.total_orientation(), 5.0_f32.rem_euclid(constants::TAU), epsilon = 1e-3);
    }

    #[test]
    fn test_spin_swings_translated_object() {
        let desc = DrawableDesc {
            rotation: constants::PI * 0.5,
            ..DrawableDesc::default().at(Vec3::new(8.0, 0.0, 0.0))
        };
        let mut drawable = Drawable::from_desc(0, &desc, &[]);
        drawable.update(1.0);
        let center = drawable.world().transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(center.coords, Vec3::new(0.0, 0.0, -8.0), epsilon = 1e-4);
    }

    #[test]
    fn test_velocity_applies_per_update() {
        let desc = DrawableDesc { velocity: [1.0, 0.0, 0.0], ..DrawableDesc::default() };
        let mut drawable = Drawable::from_desc(0, &desc, &[]);
        drawable.update(0.5);
        drawable.update(0.001);
        assert_relative_eq!(drawable.position(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_lights_are_pushed_at_load() {
        let desc = DrawableDesc { lit: true, ..DrawableDesc::new("s", procedural::SPHERE_HIGH_POLY).with_effect(library::PHONG) };
        let lights = crate::scene::SceneDescription::default_lights();
        let mut drawable = Drawable::from_desc(0, &desc, &lights);
        drawable.load_content(&mut content()).unwrap();

        let params = drawable.effect().unwrap().parameters();
        assert_eq!(params.vector3("LightDir2"), Some(lights[2].direction));
        assert_eq!(params.vector4("LightDiffuse0"), Some(lights[0].diffuse));
    }

    #[test]
    fn test_custom_draw_pushes_transforms_and_draws_each_part() {
        let desc = DrawableDesc::new("s", procedural::SPHERE_HIGH_POLY).with_effect(library::PHONG);
        let mut drawable = loaded(&desc);
        let camera = camera();
        let mut device = RecordingDevice::new(8, 8);

        drawable.draw(&mut device, &camera).unwrap();

        let params = drawable.effect().unwrap().parameters();
        assert_eq!(params.matrix("WorldViewProj"), Some(camera.view_proj() * drawable.world()));
        assert_eq!(params.float("TexScale"), Some(1.0));
        assert_eq!(device.draws_to(None).count(), drawable.model().unwrap().part_count());
        assert!(device.commands().contains(&DeviceCommand::SetRasterizerState(RasterizerState::CULL_BACK)));
    }

    #[test]
    fn test_environment_follows_camera_and_restores_culling() {
        let desc = DrawableDesc {
            style: DrawStyle::EnvironmentInsideOut,
            ..DrawableDesc::new("sky", procedural::SPHERE_HIGH_POLY).with_effect(library::ENVIRONMENT_MAP).scaled(500.0)
        };
        let mut drawable = loaded(&desc);
        let camera = camera();
        let mut device = RecordingDevice::new(8, 8);
        drawable.draw(&mut device, &camera).unwrap();

        let expected = camera.view_proj() * Mat4::new_translation(&camera.position()) * drawable.world();
        let params = drawable.effect().unwrap().parameters();
        assert_relative_eq!(params.matrix("WorldViewProj").unwrap(), expected, epsilon = 1e-3);
        assert_eq!(params.matrix("World"), None);

        let commands = device.commands();
        assert!(commands.contains(&DeviceCommand::SetRasterizerState(RasterizerState::CULL_FRONT)));
        assert_eq!(commands.last(), Some(&DeviceCommand::SetSamplerState(SamplerState::default())));
        assert_eq!(device.rasterizer_state(), RasterizerState::CULL_BACK);
    }

    #[test]
    fn test_quad_restores_previous_technique() {
        let desc = DrawableDesc {
            style: DrawStyle::BillboardQuad,
            mesh: None,
            ..DrawableDesc::default().with_effect(library::TEXTURE).scaled(2.0)
        };
        let mut drawable = loaded(&desc);
        drawable.effect_mut().unwrap().set_current_technique_by_name(paraboloid::TECHNIQUE).unwrap();
        let mut device = RecordingDevice::new(8, 8);

        drawable.draw(&mut device, &camera()).unwrap();

        assert_eq!(drawable.effect().unwrap().current_technique_name(), paraboloid::TECHNIQUE);
        assert!(device.commands().iter().any(|c| matches!(
            c,
            DeviceCommand::DrawUser { vertex_count: 4, primitive_count: 2, .. }
        )));
        assert!(device.commands().iter().any(|c| matches!(
            c,
            DeviceCommand::ApplyPass { technique, .. } if technique == QUAD_TECHNIQUE
        )));
    }

    #[test]
    fn test_draw_with_missing_technique_is_skipped() {
        let desc = DrawableDesc::new("r", procedural::SPHERE_HIGH_POLY).with_effect(library::DPM_REFLECT);
        let mut drawable = loaded(&desc);
        let mut device = RecordingDevice::new(8, 8);
        let drawn = drawable
            .draw_with_technique(&mut device, &camera(), paraboloid::TECHNIQUE, (paraboloid::DIRECTION, 1.0))
            .unwrap();
        assert!(!drawn);
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_fallback_path_without_program() {
        let desc = DrawableDesc::new("plain", procedural::SPHERE_HIGH_POLY).with_texture(procedural::WHITE_TEXTURE);
        let mut drawable = loaded(&desc);
        let mut device = RecordingDevice::new(8, 8);
        drawable.draw(&mut device, &camera()).unwrap();

        assert!(drawable.effect().is_none());
        assert!(!drawable.has_technique(paraboloid::TECHNIQUE));
        assert!(device.commands().iter().any(|c| matches!(
            c,
            DeviceCommand::ApplyPass { effect, .. } if effect == "BasicEffect"
        )));
    }

    #[test]
    fn test_missing_mesh_asset_fails_load() {
        let desc = DrawableDesc::new("dragon", "Models/Dragon").with_effect(library::DPM_REFLECT);
        let mut drawable = Drawable::from_desc(0, &desc, &[]);
        assert!(matches!(
            drawable.load_content(&mut content()),
            Err(SceneError::Asset(crate::assets::AssetError::NotFound(_)))
        ));
    }
}
