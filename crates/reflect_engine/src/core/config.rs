//! # Unified Configuration System
//!
//! All configuration consumed by the demo lives here: window, main camera,
//! paraboloid camera, content lookup, logging and the scene description.
//! Every section has defaults reproducing the classic dual-paraboloid demo, so
//! a config file only needs to name what it changes.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging
//! - **Window Config**: back buffer size, title, vsync
//! - **Camera Config**: free-look camera placement, lens and movement speeds
//! - **Paraboloid Config**: where the reflection maps are captured from
//! - **Asset Config**: content root directory
//! - **Scene**: drawables and lights, see [`crate::scene::SceneDescription`]

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::scene::SceneDescription;

/// # Engine Configuration
///
/// Core behavior that affects the entire engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, used when `RUST_LOG` is unset
    pub log_level: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Window Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Back buffer width in pixels
    pub width: u32,
    /// Back buffer height in pixels
    pub height: u32,
    /// Window title prefix; the frame rate is appended
    pub title: String,
    /// Synchronize presentation with the display refresh
    pub vsync: bool,
}

impl WindowConfig {
    /// Aspect ratio of the back buffer
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Dual Paraboloid Reflections".to_string(),
            vsync: false,
        }
    }
}

/// # Camera Configuration
///
/// Placement and lens of the free-look viewing camera plus its movement rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial eye position
    pub position: [f32; 3],
    /// Initial look-at point
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Walk/strafe/fly speed in units per second
    pub velocity: f32,
    /// Mouse-look sensitivity, multiplied with the frame time
    pub mouse_scale: f32,
}

impl CameraConfig {
    /// Initial eye position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Initial look-at point as a vector
    pub fn target(&self) -> Vec3 {
        Vec3::from(self.target)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 20.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            velocity: 20.0,
            mouse_scale: 0.5,
        }
    }
}

/// # Paraboloid Configuration
///
/// The focal point is where the two hemispheres are captured from; the
/// reflective drawable is placed there. Only the world origin is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParaboloidConfig {
    /// Capture origin
    pub focal_point: [f32; 3],
    /// Point defining the front hemisphere axis
    pub target: [f32; 3],
}

impl ParaboloidConfig {
    /// Capture origin as a vector
    pub fn focal_point(&self) -> Vec3 {
        Vec3::from(self.focal_point)
    }

    /// Front axis target as a vector
    pub fn target(&self) -> Vec3 {
        Vec3::from(self.target)
    }

    /// The paraboloid projection works in a view space centered on the world
    /// origin, so the focal point must stay there
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.focal_point() != Vec3::zeros() {
            return Err(ConfigError::Invalid(format!(
                "paraboloid focal point must be the origin, got {:?}",
                self.focal_point
            )));
        }
        if self.target().norm() <= f32::EPSILON {
            return Err(ConfigError::Invalid("paraboloid focal point and target coincide".to_string()));
        }
        Ok(())
    }
}

impl Default for ParaboloidConfig {
    fn default() -> Self {
        Self {
            focal_point: [0.0, 0.0, 0.0],
            target: [0.0, 0.0, 6.0],
        }
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory searched before the built-in catalogue
    pub content_root: String,
}

impl AssetConfig {
    /// Create a new asset configuration
    pub fn new() -> Self {
        Self {
            content_root: "content".to_string(),
        }
    }

    /// Set content directory
    pub fn with_content_root(mut self, dir: impl Into<String>) -> Self {
        self.content_root = dir.into();
        self
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Window configuration
    pub window: WindowConfig,
    /// Main camera configuration
    pub camera: CameraConfig,
    /// Paraboloid capture configuration
    pub paraboloid: ParaboloidConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
    /// Scene contents
    pub scene: SceneDescription,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera fov must be within (0, 180) degrees, got {}",
                camera.fov_degrees
            )));
        }
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(ConfigError::Invalid(format!(
                "camera clip range must satisfy 0 < near < far, got {}..{}",
                camera.near, camera.far
            )));
        }
        if (camera.position() - camera.target()).norm() <= f32::EPSILON {
            return Err(ConfigError::Invalid("camera position and target coincide".to_string()));
        }
        self.paraboloid.validate()?;
        self.scene.validate()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.camera.velocity, 20.0);
    }

    #[test]
    fn test_rejects_inverted_clip_range() {
        let mut config = ApplicationConfig::default();
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_off_origin_focal_point() {
        let mut config = ApplicationConfig::default();
        config.paraboloid.focal_point = [1.0, 2.0, 3.0];
        config.paraboloid.target = [1.0, 2.0, 9.0];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ApplicationConfig::default();
        config.paraboloid.target = [0.0; 3];
        assert!(matches!(config.paraboloid.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_builder_setters() {
        let engine = EngineConfig::new().with_log_level("trace");
        assert_eq!(engine.log_level, "trace");

        let assets = AssetConfig::new().with_content_root("/srv/content");
        assert_eq!(assets.content_root, "/srv/content");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApplicationConfig = toml::from_str(
            r#"
            [window]
            width = 640
            height = 360
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.title, WindowConfig::default().title);
        assert_eq!(config.camera.fov_degrees, 45.0);
        assert!(!config.scene.drawables.is_empty());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = std::env::temp_dir().join("reflect_engine_config_test.toml");
        let config = ApplicationConfig::default();
        config.save_to_file(&path).unwrap();

        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.scene.drawables.len(), config.scene.drawables.len());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = ApplicationConfig::load_from_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
    }
}
