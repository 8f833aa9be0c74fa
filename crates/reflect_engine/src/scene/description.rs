//! Serializable scene layout
//!
//! The default description reproduces the classic demo: a reflective object at
//! the paraboloid focal point, a sky sphere, a wooden ground plane and a ring of
//! eight lit spheres spinning about +Y.

use serde::{Deserialize, Serialize};

use crate::assets::procedural;
use crate::config::ConfigError;
use crate::foundation::math::{utils, Vec3, Vec4};
use crate::render::effect::library;
use crate::render::lighting::{Light, MAX_LIGHTS};

/// How a drawable issues its draws
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawStyle {
    /// Mesh drawn with its program, or the fixed-function fallback without one
    #[default]
    Standard,
    /// Closed mesh seen from inside, recentered on the viewer every draw
    EnvironmentInsideOut,
    /// Screen-facing quad built from the scale, recentered on the viewer
    BillboardQuad,
}

/// One drawable in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawableDesc {
    /// Name used in logs
    pub name: String,
    /// Draw strategy
    pub style: DrawStyle,
    /// Mesh asset path; required except for billboards
    pub mesh: Option<String>,
    /// Shader program asset path; `None` selects the fixed-function fallback
    pub effect: Option<String>,
    /// 2D texture asset path
    pub texture: Option<String>,
    /// Cube texture asset path, bound as `EnvMap`
    pub environment_texture: Option<String>,
    /// Multiplier on texture coordinates
    pub texture_scale: f32,
    /// Initial position
    pub position: [f32; 3],
    /// Added to the position every update
    pub velocity: [f32; 3],
    /// Non-uniform scale
    pub scale: [f32; 3],
    /// Spin angular velocity in radians per second
    pub rotation: f32,
    /// Spin axis, applied after translation
    pub rotation_axis: [f32; 3],
    /// Orientation angular velocity in radians per second
    pub orientation: f32,
    /// Orientation axis, applied before translation
    pub orientation_axis: [f32; 3],
    /// Receive the scene lights
    pub lit: bool,
    /// Default lighting on the fixed-function path
    pub lighting_enabled: bool,
    /// This drawable shows the paraboloid reflection; it is placed at the focal
    /// point and excluded from the capture passes
    pub reflector: bool,
}

impl Default for DrawableDesc {
    fn default() -> Self {
        Self {
            name: "drawable".to_string(),
            style: DrawStyle::Standard,
            mesh: None,
            effect: None,
            texture: None,
            environment_texture: None,
            texture_scale: 1.0,
            position: [0.0; 3],
            velocity: [0.0; 3],
            scale: [1.0; 3],
            rotation: 0.0,
            rotation_axis: [0.0, 1.0, 0.0],
            orientation: 0.0,
            orientation_axis: [0.0, 1.0, 0.0],
            lit: false,
            lighting_enabled: true,
            reflector: false,
        }
    }
}

impl DrawableDesc {
    /// A drawable with a name and mesh, everything else default
    pub fn new(name: impl Into<String>, mesh: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh.into()),
            ..Self::default()
        }
    }

    /// Set the shader program
    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }

    /// Set the 2D texture
    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    /// Set the position
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position.into();
        self
    }

    /// Set a uniform scale
    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = [scale; 3];
        self
    }
}

/// Drawables and the lights shared by every lit drawable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Up to three directional lights
    pub lights: Vec<Light>,
    /// Drawables in draw order
    pub drawables: Vec<DrawableDesc>,
}

impl SceneDescription {
    /// The three colored lights of the demo
    pub fn default_lights() -> Vec<Light> {
        let ambient = Vec4::new(0.15, 0.15, 0.15, 1.0);
        vec![
            Light::directional(Vec3::new(1.0, -1.0, 1.0), Vec4::new(1.0, 0.3, 0.3, 1.0), ambient),
            Light::directional(Vec3::new(0.0, 1.0, 1.0), Vec4::new(0.15, 0.15, 0.5, 1.0), ambient),
            Light::directional(Vec3::new(-1.0, -1.0, -1.0), Vec4::new(0.15, 0.5, 0.15, 1.0), ambient),
        ]
    }

    /// Index of the reflective drawable
    pub fn reflector(&self) -> Option<usize> {
        self.drawables.iter().position(|d| d.reflector)
    }

    /// Check the description is drawable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lights.len() > MAX_LIGHTS {
            return Err(ConfigError::Invalid(format!(
                "at most {MAX_LIGHTS} lights are supported, got {}",
                self.lights.len()
            )));
        }
        if self.drawables.is_empty() {
            return Err(ConfigError::Invalid("scene has no drawables".to_string()));
        }

        let reflectors = self.drawables.iter().filter(|d| d.reflector).count();
        if reflectors > 1 {
            return Err(ConfigError::Invalid(format!("expected one reflector, found {reflectors}")));
        }

        for desc in &self.drawables {
            let needs_mesh = desc.style != DrawStyle::BillboardQuad;
            if needs_mesh && desc.mesh.is_none() {
                return Err(ConfigError::Invalid(format!("drawable '{}' has no mesh", desc.name)));
            }
            let needs_effect = desc.reflector || desc.style != DrawStyle::Standard;
            if needs_effect && desc.effect.is_none() {
                return Err(ConfigError::Invalid(format!("drawable '{}' needs a shader program", desc.name)));
            }
            if desc.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                return Err(ConfigError::Invalid(format!("drawable '{}' has a degenerate scale", desc.name)));
            }
        }
        Ok(())
    }
}

impl Default for SceneDescription {
    fn default() -> Self {
        let mut drawables = vec![
            DrawableDesc {
                reflector: true,
                ..DrawableDesc::new("reflector", procedural::SPHERE_HIGH_POLY)
                    .with_effect(library::DPM_REFLECT)
                    .scaled(3.0)
            },
            DrawableDesc {
                style: DrawStyle::EnvironmentInsideOut,
                environment_texture: Some(procedural::SKY_CUBE.to_string()),
                ..DrawableDesc::new("environment", procedural::SPHERE_HIGH_POLY)
                    .with_effect(library::ENVIRONMENT_MAP)
                    .with_texture(procedural::WHITE_TEXTURE)
                    .scaled(500.0)
            },
            DrawableDesc {
                lighting_enabled: false,
                ..DrawableDesc::new("ground", procedural::GROUND)
                    .with_effect(library::TEXTURE)
                    .with_texture(procedural::WOOD_TEXTURE)
                    .at(Vec3::new(0.0, -5.0, 0.0))
                    .scaled(1.5)
            },
        ];

        for i in 0..8 {
            let ring = utils::vector2_from_polar((i + 1) as f32 / 8.0) * 8.0;
            drawables.push(DrawableDesc {
                rotation: 1.0,
                rotation_axis: [0.0, 1.0, 0.0],
                lit: true,
                ..DrawableDesc::new(format!("sphere{i}"), procedural::SPHERE_HIGH_POLY)
                    .with_effect(library::PHONG)
                    .with_texture(procedural::WHITE_TEXTURE)
                    .at(Vec3::new(ring.x, 0.0, ring.y))
            });
        }

        Self {
            lights: Self::default_lights(),
            drawables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_scene_layout() {
        let scene = SceneDescription::default();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.drawables.len(), 11);
        assert_eq!(scene.reflector(), Some(0));
        assert_eq!(scene.lights.len(), 3);

        let ring: Vec<_> = scene.drawables.iter().filter(|d| d.lit).collect();
        assert_eq!(ring.len(), 8);
        for desc in ring {
            assert_relative_eq!(Vec3::from(desc.position).norm(), 8.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_validation_failures() {
        let mut scene = SceneDescription::default();
        scene.drawables[1].reflector = true;
        assert!(scene.validate().is_err());

        let mut scene = SceneDescription::default();
        scene.drawables[1].effect = None;
        assert!(scene.validate().is_err());

        let mut scene = SceneDescription::default();
        scene.lights.push(scene.lights[0]);
        assert!(scene.validate().is_err());

        let scene = SceneDescription { drawables: Vec::new(), ..SceneDescription::default() };
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_ron_round_trip() {
        let scene = SceneDescription::default();
        let text = ron::to_string(&scene).unwrap();
        let back: SceneDescription = ron::from_str(&text).unwrap();
        assert_eq!(back.drawables.len(), scene.drawables.len());
        assert_eq!(back.drawables[1].style, DrawStyle::EnvironmentInsideOut);
    }
}
