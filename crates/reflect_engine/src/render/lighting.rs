//! Lighting system
//!
//! Drawables carry up to [`MAX_LIGHTS`] directional lights. Shader programs
//! receive them as `LightDir{i}`, `LightDiffuse{i}` and `LightAmbient{i}`.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec3, Vec4};

/// Maximum number of lights a drawable forwards to its shader program
pub const MAX_LIGHTS: usize = 3;

/// Directional light source
///
/// The direction points the way the light travels, so a surface facing the
/// light has `dot(normal, -direction) > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Unit direction the light travels
    pub direction: Vec3,
    /// Diffuse RGBA
    pub diffuse: Vec4,
    /// Ambient RGBA
    pub ambient: Vec4,
}

impl Light {
    /// Create a directional light; the direction is normalized
    ///
    /// A zero direction falls back to straight down.
    pub fn directional(direction: Vec3, diffuse: Vec4, ambient: Vec4) -> Self {
        Self {
            direction: direction.try_normalize(f32::EPSILON).unwrap_or(-Vec3::y()),
            diffuse,
            ambient,
        }
    }

    /// Shader parameter names for the light in slot `index`
    pub fn parameter_names(index: usize) -> [String; 3] {
        [
            format!("LightDir{index}"),
            format!("LightDiffuse{index}"),
            format!("LightAmbient{index}"),
        ]
    }

    /// Lambert term for a unit surface normal
    pub fn lambert(&self, normal: &Vec3) -> f32 {
        normal.dot(&-self.direction).max(0.0)
    }
}

/// The three-light rig used by the fixed-function fallback path
///
/// Key, fill and back lights with the matching ambient term.
pub mod default_rig {
    use super::{Light, Vec3, Vec4};

    /// Ambient color added on top of the three lights
    pub const AMBIENT: Vec3 = Vec3::new(0.053_333_32, 0.098_823_54, 0.181_960_8);

    /// Key, fill and back lights
    pub fn lights() -> [Light; 3] {
        let none = Vec4::zeros();
        [
            Light::directional(
                Vec3::new(-0.526_540_8, -0.573_576_5, -0.627_506_9),
                Vec4::new(1.0, 0.960_784_4, 0.807_843_2, 1.0),
                none,
            ),
            Light::directional(
                Vec3::new(0.719_846_4, 0.342_020_1, 0.604_022_7),
                Vec4::new(0.964_705_9, 0.760_784_4, 0.407_843_2, 1.0),
                none,
            ),
            Light::directional(
                Vec3::new(0.454_519_5, -0.766_044_4, 0.454_519_5),
                Vec4::new(0.323_137_3, 0.360_784_4, 0.393_725_5, 1.0),
                none,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_normalizes() {
        let light = Light::directional(Vec3::new(1.0, -1.0, 1.0), Vec4::zeros(), Vec4::zeros());
        assert_relative_eq!(light.direction.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_direction_points_down() {
        let light = Light::directional(Vec3::zeros(), Vec4::zeros(), Vec4::zeros());
        assert_eq!(light.direction, -Vec3::y());
    }

    #[test]
    fn test_lambert_faces_light() {
        let light = Light::directional(-Vec3::y(), Vec4::zeros(), Vec4::zeros());
        assert_relative_eq!(light.lambert(&Vec3::y()), 1.0);
        assert_relative_eq!(light.lambert(&-Vec3::y()), 0.0);
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(Light::parameter_names(2), ["LightDir2", "LightDiffuse2", "LightAmbient2"]);
    }
}
