//! # Scene Composer
//!
//! Owns the cameras, the drawables and the capture targets and runs the frame:
//!
//! 1. Input moves and turns the main camera; its view is rebuilt.
//! 2. Every drawable updates.
//! 3. The paraboloid maps are captured.
//! 4. `Front`, `Back` and `ParaboloidBasis` are pushed to the reflector.
//! 5. The back buffer is cleared to black and every drawable draws with the
//!    main camera.
//! 6. The frame rate goes to the overlay.

use crate::assets::ContentManager;
use crate::core::{ApplicationConfig, CameraConfig};
use crate::foundation::math::{utils, Mat4, Vec2};
use crate::input::{InputState, KeyCode};
use crate::render::device::{ClearFlags, DepthStencilState, GraphicsDevice};
use crate::render::primitives::Camera;
use crate::render::texture::{colors, Color, TextureRef};
use crate::scene::capture::{self, CaptureOutput, CaptureTargets};
use crate::scene::drawable::Drawable;
use crate::scene::frame_rate::FrameRateCounter;
use crate::scene::SceneError;

/// Where the frame-rate text is placed
pub const FPS_POSITION: Vec2 = Vec2::new(30.0, 30.0);

/// Receives diagnostic text once per frame
pub trait Overlay {
    /// Show `text` at a pixel position
    fn draw_text(&mut self, text: &str, position: Vec2, color: Color);
}

/// Overlay that discards everything
#[derive(Debug, Default)]
pub struct NullOverlay;

impl Overlay for NullOverlay {
    fn draw_text(&mut self, _text: &str, _position: Vec2, _color: Color) {}
}

/// The demo scene and its frame sequencing
#[derive(Debug)]
pub struct SceneComposer {
    camera: Camera,
    paraboloid_camera: Camera,
    drawables: Vec<Drawable>,
    reflector: Option<usize>,
    targets: CaptureTargets,
    last_capture: Option<CaptureOutput>,
    frame_rate: FrameRateCounter,
    velocity: f32,
    mouse_scale: f32,
    exit_requested: bool,
    screenshot_requested: bool,
}

impl SceneComposer {
    /// Build the scene, load its content and create the capture targets
    ///
    /// # Arguments
    /// * `config` - Cameras and scene description
    /// * `content` - Asset source; a missing asset is an error
    /// * `device` - Targets are sized to its back buffer
    pub fn new(
        config: &ApplicationConfig,
        content: &mut ContentManager,
        device: &mut dyn GraphicsDevice,
    ) -> Result<Self, SceneError> {
        config.paraboloid.validate()?;
        config.scene.validate()?;
        let (width, height) = device.back_buffer_size();

        let camera = main_camera(&config.camera, width, height);

        let mut paraboloid_camera = Camera::new();
        paraboloid_camera.look_at_keep_up(config.paraboloid.focal_point(), config.paraboloid.target());
        paraboloid_camera.set_projection(Mat4::identity());
        paraboloid_camera.build_view();

        let reflector = config.scene.reflector();
        let mut drawables = Vec::with_capacity(config.scene.drawables.len());
        for (id, desc) in config.scene.drawables.iter().enumerate() {
            let mut drawable = Drawable::from_desc(id, desc, &config.scene.lights);
            if desc.reflector {
                drawable.set_position(config.paraboloid.focal_point());
            }
            drawable.load_content(content)?;
            drawables.push(drawable);
        }

        let targets = CaptureTargets::create(device, width, height)?;
        log::info!(
            "Scene ready: {} drawables, reflector {:?}, {}x{} paraboloid maps",
            drawables.len(),
            reflector.map(|i| drawables[i].name().to_string()),
            width,
            height
        );

        Ok(Self {
            camera,
            paraboloid_camera,
            drawables,
            reflector,
            targets,
            last_capture: None,
            frame_rate: FrameRateCounter::new(),
            velocity: config.camera.velocity,
            mouse_scale: config.camera.mouse_scale,
            exit_requested: false,
            screenshot_requested: false,
        })
    }

    /// Apply input, move the camera and animate the drawables
    pub fn update(&mut self, input: &InputState, elapsed: f32) {
        self.frame_rate.update(elapsed);

        if input.is_down(KeyCode::Escape) {
            self.exit_requested = true;
        }
        if input.was_pressed(KeyCode::F12) {
            self.screenshot_requested = true;
        }

        let step = self.velocity * elapsed;
        if input.is_down(KeyCode::W) {
            self.camera.walk(-step);
        }
        if input.is_down(KeyCode::S) {
            self.camera.walk(step);
        }
        if input.is_down(KeyCode::A) {
            self.camera.strafe(-step);
        }
        if input.is_down(KeyCode::D) {
            self.camera.strafe(step);
        }
        if input.is_down(KeyCode::Space) {
            self.camera.fly(step);
        }
        if input.is_down(KeyCode::C) {
            self.camera.fly(-step);
        }

        self.camera.update_mouse(input.mouse_delta(), elapsed * self.mouse_scale);
        self.camera.build_view();

        for drawable in &mut self.drawables {
            drawable.update(elapsed);
        }
    }

    /// Capture the paraboloid maps and draw the frame to the back buffer
    ///
    /// A drawable that fails to draw is logged and skipped.
    pub fn draw(&mut self, device: &mut dyn GraphicsDevice, overlay: &mut dyn Overlay) -> Result<(), SceneError> {
        self.paraboloid_camera.build_view();
        let output = capture::capture(
            device,
            &mut self.drawables,
            self.reflector,
            &self.paraboloid_camera,
            &self.targets,
        )?;

        if let Some(effect) = self.reflector.and_then(|i| self.drawables[i].effect_mut()) {
            effect.set("Front", TextureRef::Target(output.front));
            effect.set("Back", TextureRef::Target(output.back));
            effect.set("ParaboloidBasis", output.paraboloid_view);
        }
        self.last_capture = Some(output);

        device.set_render_target(None)?;
        device.clear(ClearFlags::TARGET | ClearFlags::DEPTH, colors::BLACK);
        device.set_depth_stencil_state(DepthStencilState::DEFAULT);

        for drawable in &mut self.drawables {
            if let Err(e) = drawable.draw(device, &self.camera) {
                log::warn!("Drawing '{}' failed: {}", drawable.name(), e);
            }
        }

        overlay.draw_text(&format!("FPS: {}", self.frame_rate.rate()), FPS_POSITION, colors::RED);
        self.frame_rate.frame_drawn();
        Ok(())
    }

    /// One complete frame
    pub fn frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        overlay: &mut dyn Overlay,
        input: &InputState,
        elapsed: f32,
    ) -> Result<(), SceneError> {
        self.update(input, elapsed);
        self.draw(device, overlay)
    }

    /// Follow a back-buffer size change
    ///
    /// The capture targets are recreated only when the size actually changed.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> Result<(), SceneError> {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }

        device.resize_back_buffer(width, height);
        self.camera.set_aspect(width as f32 / height as f32);
        self.camera.build_view();
        self.targets = self.targets.resized(device, width, height)?;
        Ok(())
    }

    /// Release device resources
    pub fn release(self, device: &mut dyn GraphicsDevice) {
        self.targets.release(device);
    }

    /// Whether exit was requested
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Take a pending screenshot request
    pub fn take_screenshot_request(&mut self) -> bool {
        std::mem::take(&mut self.screenshot_requested)
    }

    /// Main camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable main camera
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Paraboloid capture camera
    pub fn paraboloid_camera(&self) -> &Camera {
        &self.paraboloid_camera
    }

    /// Drawables in draw order
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// The reflective drawable
    pub fn reflector(&self) -> Option<&Drawable> {
        self.reflector.map(|i| &self.drawables[i])
    }

    /// Current capture targets
    pub fn capture_targets(&self) -> CaptureTargets {
        self.targets
    }

    /// Output of the most recent capture
    pub fn last_capture(&self) -> Option<&CaptureOutput> {
        self.last_capture.as_ref()
    }

    /// Frame rate counter
    pub fn frame_rate(&self) -> &FrameRateCounter {
        &self.frame_rate
    }
}

fn main_camera(config: &CameraConfig, width: u32, height: u32) -> Camera {
    let mut camera = Camera::new();
    camera.look_at_keep_up(config.position(), config.target());
    camera.set_lens(
        utils::deg_to_rad(config.fov_degrees),
        width as f32 / height.max(1) as f32,
        config.near,
        config.far,
    );
    camera.build_view();
    camera
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::procedural;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use crate::render::effect::library;
    use crate::render::recording::RecordingDevice;
    use crate::render::software::SoftwareDevice;
    use crate::scene::description::{DrawableDesc, SceneDescription};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Captured(Vec<String>);

    impl Overlay for Captured {
        fn draw_text(&mut self, text: &str, _position: Vec2, _color: Color) {
            self.0.push(text.to_string());
        }
    }

    fn content() -> ContentManager {
        ContentManager::new(std::env::temp_dir().join("reflect_engine_no_content"))
    }

    fn two_sphere_config(size: u32) -> ApplicationConfig {
        let mut config = ApplicationConfig::default();
        config.window.width = size;
        config.window.height = size;
        config.scene = SceneDescription {
            lights: SceneDescription::default_lights(),
            drawables: vec![
                DrawableDesc {
                    reflector: true,
                    ..DrawableDesc::new("reflector", procedural::SPHERE_HIGH_POLY).with_effect(library::DPM_REFLECT)
                },
                // Straddles the hemisphere boundary so both maps see part of it.
                DrawableDesc {
                    lit: true,
                    ..DrawableDesc::new("lit", procedural::SPHERE_HIGH_POLY)
                        .with_effect(library::PHONG)
                        .at(Vec3::new(4.0, 0.0, 0.0))
                        .scaled(2.0)
                },
            ],
        };
        config
    }

    #[test]
    fn test_end_to_end_frame_fills_both_maps() {
        let config = two_sphere_config(32);
        let mut device = SoftwareDevice::new(32, 32);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();
        let mut overlay = Captured::default();

        composer.frame(&mut device, &mut overlay, &InputState::new(), 1.0 / 60.0).unwrap();

        let targets = composer.capture_targets();
        let front = device.render_target_surface(targets.front).unwrap();
        let back = device.render_target_surface(targets.back).unwrap();
        assert!(front.covered_pixels() > 0);
        assert!(back.covered_pixels() > 0);

        let params = composer.reflector().unwrap().effect().unwrap().parameters();
        assert_eq!(params.texture("Front"), Some(TextureRef::Target(targets.front)));
        assert_eq!(params.texture("Back"), Some(TextureRef::Target(targets.back)));
        let basis = params.matrix("ParaboloidBasis").unwrap();
        assert_relative_eq!(basis.translation_part(), Vec3::zeros(), epsilon = 1e-6);

        assert!(device.back_buffer().color().iter().any(|c| *c != colors::BLACK));
        assert_eq!(overlay.0, vec!["FPS: 0".to_string()]);
    }

    #[test]
    fn test_capture_skips_reflector_in_default_scene() {
        let config = ApplicationConfig::default();
        let mut device = RecordingDevice::new(64, 36);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();

        composer.draw(&mut device, &mut NullOverlay).unwrap();

        let targets = composer.capture_targets();
        let n = composer.drawables().len();
        assert_eq!(composer.last_capture().unwrap().draws, (n - 1, n - 1));
        assert_eq!(device.draws_to(Some(targets.front)).count(), n - 1);
        assert_eq!(device.draws_to(Some(targets.back)).count(), n - 1);
        assert_eq!(device.draws_to(None).count(), n);
    }

    #[test]
    fn test_reflector_moved_to_focal_point() {
        let mut config = ApplicationConfig::default();
        config.scene.drawables[0].position = [5.0, 0.0, 0.0];
        let mut device = RecordingDevice::new(8, 8);
        let composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();

        let reflector = composer.reflector().unwrap();
        assert!(reflector.is_reflector());
        assert_eq!(reflector.position(), Vec3::zeros());
        assert_eq!(composer.paraboloid_camera().position(), Vec3::zeros());
        assert_eq!(composer.drawables().iter().filter(|d| d.is_reflector()).count(), 1);
    }

    #[test]
    fn test_off_origin_focal_point_is_rejected() {
        let mut config = ApplicationConfig::default();
        config.paraboloid.focal_point = [1.0, 2.0, 3.0];
        config.paraboloid.target = [1.0, 2.0, 9.0];
        let mut device = RecordingDevice::new(8, 8);

        let result = SceneComposer::new(&config, &mut content(), &mut device);
        assert!(matches!(result, Err(SceneError::Config(_))));
        assert_eq!(device.render_target_count(), 0);
    }

    #[test]
    fn test_input_moves_camera_forward() {
        let config = ApplicationConfig::default();
        let mut device = RecordingDevice::new(8, 8);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();
        let start = composer.camera().position();

        let mut input = InputState::new();
        input.set_key(KeyCode::W, true);
        composer.update(&input, 0.5);

        let moved = composer.camera().position() - start;
        assert_relative_eq!(moved.norm(), config.camera.velocity * 0.5, epsilon = 1e-4);
        // Forward is toward the target.
        assert!(composer.camera().distance_to(&Vec3::zeros()) < (start - Vec3::zeros()).norm());
    }

    #[test]
    fn test_mouse_delta_yaws_by_scaled_elapsed() {
        let config = ApplicationConfig::default();
        let mut device = RecordingDevice::new(8, 8);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();
        composer.camera_mut().look_at_keep_up(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros());
        composer.camera_mut().build_view();
        let before = composer.camera().look();

        let mut input = InputState::new();
        input.set_mouse_delta(Vec2::new(1.0, 0.0));
        composer.update(&input, 0.1);

        let turned = before.dot(&composer.camera().look()).clamp(-1.0, 1.0).acos();
        let expected = 0.1 * config.camera.mouse_scale;
        assert_relative_eq!(utils::rad_to_deg(turned), utils::rad_to_deg(expected), epsilon = 1e-2);
        assert_eq!(composer.camera().position(), Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_escape_and_screenshot_requests() {
        let config = ApplicationConfig::default();
        let mut device = RecordingDevice::new(8, 8);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();

        let mut input = InputState::new();
        input.set_key(KeyCode::F12, true);
        composer.update(&input, 0.01);
        assert!(composer.take_screenshot_request());
        assert!(!composer.take_screenshot_request());
        assert!(!composer.exit_requested());

        input.set_key(KeyCode::Escape, true);
        composer.update(&input, 0.01);
        assert!(composer.exit_requested());
    }

    #[test]
    fn test_resize_updates_aspect_and_targets() {
        let config = ApplicationConfig::default();
        let mut device = RecordingDevice::new(64, 32);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();
        let before = composer.capture_targets();

        composer.resize(&mut device, 64, 32).unwrap();
        assert_eq!(composer.capture_targets(), before);

        composer.resize(&mut device, 32, 32).unwrap();
        assert_eq!(composer.capture_targets().size, (32, 32));
        assert_relative_eq!(composer.camera().aspect(), 1.0);
        assert_eq!(device.render_target_count(), 2);
    }

    #[test]
    fn test_frame_rate_reported_after_window() {
        let config = two_sphere_config(8);
        let mut device = RecordingDevice::new(8, 8);
        let mut composer = SceneComposer::new(&config, &mut content(), &mut device).unwrap();
        let mut overlay = Captured::default();
        let input = InputState::new();

        // The fourth update closes the window after three drawn frames.
        for _ in 0..4 {
            composer.frame(&mut device, &mut overlay, &input, 0.125).unwrap();
        }
        assert_eq!(overlay.0[2], "FPS: 0");
        assert_eq!(overlay.0[3], "FPS: 6");
    }
}
