//! # Paraboloid Capture
//!
//! Renders the scene around the focal point into two hemisphere maps. Each
//! frame:
//!
//! 1. The paraboloid camera's view is re-centered (`T(-t) * view`, zero
//!    translation) on a transient copy. The camera itself is not modified.
//! 2. The front target is bound and cleared to transparent; every drawable
//!    except the reflector draws with `BuildDP` and `Direction = +1`.
//! 3. Same for the back target with `Direction = -1`.
//! 4. The back buffer is rebound.
//!
//! Technique switches are per drawable and always undone, including when a
//! draw fails.

use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::device::{ClearFlags, GraphicsDevice, RenderTargetId};
use crate::render::effect::paraboloid;
use crate::render::primitives::Camera;
use crate::render::texture::colors;
use crate::render::RenderResult;
use crate::scene::drawable::Drawable;

/// The pair of hemisphere render targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTargets {
    /// `Direction = +1` hemisphere
    pub front: RenderTargetId,
    /// `Direction = -1` hemisphere
    pub back: RenderTargetId,
    /// Size both targets were created with
    pub size: (u32, u32),
}

impl CaptureTargets {
    /// Create both targets
    pub fn create(device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<Self> {
        let front = device.create_render_target(width, height)?;
        let back = match device.create_render_target(width, height) {
            Ok(back) => back,
            Err(e) => {
                device.release_render_target(front);
                return Err(e);
            }
        };
        log::debug!("Created {}x{} paraboloid targets", width, height);
        Ok(Self { front, back, size: (width, height) })
    }

    /// Release both targets
    pub fn release(self, device: &mut dyn GraphicsDevice) {
        device.release_render_target(self.front);
        device.release_render_target(self.back);
    }

    /// Keep the targets when the size matches, otherwise recreate them
    pub fn resized(self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<Self> {
        if self.size == (width, height) {
            return Ok(self);
        }
        self.release(device);
        Self::create(device, width, height)
    }
}

/// What a capture produced, for binding on the reflector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOutput {
    /// Front hemisphere map
    pub front: RenderTargetId,
    /// Back hemisphere map
    pub back: RenderTargetId,
    /// Re-centered paraboloid view, pushed as `ParaboloidBasis`
    pub paraboloid_view: Mat4,
    /// Drawables drawn into the front and back hemispheres
    pub draws: (usize, usize),
    /// Drawables whose capture failed and was logged
    pub failed_draws: usize,
}

/// The paraboloid camera's view with its translation removed
pub fn recentered_view(camera: &Camera) -> Mat4 {
    Mat4::new_translation(&-camera.view().translation_part()) * camera.view()
}

/// Capture both hemispheres
///
/// The drawable at `reflector` is left out. Per-drawable failures are logged
/// and the pass continues; only target binding errors are returned.
pub fn capture(
    device: &mut dyn GraphicsDevice,
    drawables: &mut [Drawable],
    reflector: Option<usize>,
    paraboloid_camera: &Camera,
    targets: &CaptureTargets,
) -> RenderResult<CaptureOutput> {
    let view = recentered_view(paraboloid_camera);
    let mut transient = paraboloid_camera.clone();
    transient.override_matrices(view, paraboloid_camera.projection() * view);

    let mut draws = [0; 2];
    let mut failed_draws = 0;
    for (pass, (target, direction)) in [(targets.front, 1.0), (targets.back, -1.0)].into_iter().enumerate() {
        device.set_render_target(Some(target))?;
        device.clear(ClearFlags::TARGET | ClearFlags::DEPTH, colors::TRANSPARENT);

        for (index, drawable) in drawables.iter_mut().enumerate() {
            if Some(index) == reflector {
                continue;
            }
            match drawable.draw_with_technique(device, &transient, paraboloid::TECHNIQUE, (paraboloid::DIRECTION, direction)) {
                Ok(true) => draws[pass] += 1,
                Ok(false) => {}
                Err(e) => {
                    failed_draws += 1;
                    log::warn!("Capture of '{}' failed: {}", drawable.name(), e);
                }
            }
        }
        log::trace!("Paraboloid pass {:+} drew {} drawables", direction, draws[pass]);
    }

    device.set_render_target(None)?;

    Ok(CaptureOutput {
        front: targets.front,
        back: targets.back,
        paraboloid_view: view,
        draws: (draws[0], draws[1]),
        failed_draws,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{procedural, ContentManager};
    use crate::foundation::math::Vec3;
    use crate::render::effect::library;
    use crate::render::recording::{DeviceCommand, RecordingDevice};
    use crate::scene::description::DrawableDesc;
    use crate::render::device::{DepthStencilState, RasterizerState};
    use crate::render::effect::Effect;
    use crate::render::primitives::{IndexBuffer, Vertex, VertexBuffer};
    use crate::render::texture::{Color, SamplerState};
    use crate::render::{RenderError, RenderResult};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    /// Records like [`RecordingDevice`] but refuses every pass
    struct RejectingPasses(RecordingDevice);

    impl GraphicsDevice for RejectingPasses {
        fn back_buffer_size(&self) -> (u32, u32) {
            self.0.back_buffer_size()
        }
        fn resize_back_buffer(&mut self, width: u32, height: u32) {
            self.0.resize_back_buffer(width, height);
        }
        fn create_render_target(&mut self, width: u32, height: u32) -> RenderResult<RenderTargetId> {
            self.0.create_render_target(width, height)
        }
        fn release_render_target(&mut self, target: RenderTargetId) {
            self.0.release_render_target(target);
        }
        fn set_render_target(&mut self, target: Option<RenderTargetId>) -> RenderResult<()> {
            self.0.set_render_target(target)
        }
        fn render_target(&self) -> Option<RenderTargetId> {
            self.0.render_target()
        }
        fn clear(&mut self, flags: ClearFlags, color: Color) {
            self.0.clear(flags, color);
        }
        fn set_rasterizer_state(&mut self, state: RasterizerState) {
            self.0.set_rasterizer_state(state);
        }
        fn rasterizer_state(&self) -> RasterizerState {
            self.0.rasterizer_state()
        }
        fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
            self.0.set_depth_stencil_state(state);
        }
        fn set_sampler_state(&mut self, state: SamplerState) {
            self.0.set_sampler_state(state);
        }
        fn sampler_state(&self) -> SamplerState {
            self.0.sampler_state()
        }
        fn set_geometry(&mut self, vertices: Arc<VertexBuffer>, indices: Arc<IndexBuffer>, vertex_offset: usize) {
            self.0.set_geometry(vertices, indices, vertex_offset);
        }
        fn apply_pass(&mut self, effect: &Effect, pass_index: usize) -> RenderResult<()> {
            Err(RenderError::UnknownPass {
                technique: effect.current_technique_name().to_string(),
                index: pass_index,
            })
        }
        fn draw_indexed_primitives(&mut self, start_index: usize, primitive_count: usize) -> RenderResult<()> {
            self.0.draw_indexed_primitives(start_index, primitive_count)
        }
        fn draw_user_indexed_primitives(&mut self, vertices: &[Vertex], indices: &[u16]) -> RenderResult<()> {
            self.0.draw_user_indexed_primitives(vertices, indices)
        }
    }

    fn paraboloid_camera(at: Vec3) -> Camera {
        let mut camera = Camera::new();
        camera.look_at_keep_up(at, at + Vec3::new(0.0, 0.0, 6.0));
        camera.set_projection(Mat4::identity());
        camera.build_view();
        camera
    }

    fn scene(count: usize) -> Vec<Drawable> {
        let mut content = ContentManager::new(std::env::temp_dir().join("reflect_engine_no_content"));
        let mut descs = vec![DrawableDesc {
            reflector: true,
            ..DrawableDesc::new("reflector", procedural::SPHERE_HIGH_POLY).with_effect(library::DPM_REFLECT)
        }];
        for i in 1..count {
            descs.push(
                DrawableDesc::new(format!("s{i}"), procedural::SPHERE_HIGH_POLY)
                    .with_effect(library::PHONG)
                    .at(Vec3::new(i as f32 * 3.0, 0.0, 5.0)),
            );
        }
        descs
            .iter()
            .enumerate()
            .map(|(i, desc)| {
                let mut drawable = Drawable::from_desc(i, desc, &[]);
                drawable.load_content(&mut content).unwrap();
                drawable
            })
            .collect()
    }

    #[test]
    fn test_reflector_is_excluded_from_both_passes() {
        let mut device = RecordingDevice::new(16, 16);
        let targets = CaptureTargets::create(&mut device, 16, 16).unwrap();
        let mut drawables = scene(5);

        let output = capture(&mut device, &mut drawables, Some(0), &paraboloid_camera(Vec3::zeros()), &targets).unwrap();

        assert_eq!(output.draws, (4, 4));
        assert_eq!(output.failed_draws, 0);
        assert_eq!(device.draws_to(Some(targets.front)).count(), 4);
        assert_eq!(device.draws_to(Some(targets.back)).count(), 4);
        assert_eq!(device.render_target(), None);
    }

    #[test]
    fn test_direction_per_pass_and_technique_restored() {
        let mut device = RecordingDevice::new(16, 16);
        let targets = CaptureTargets::create(&mut device, 16, 16).unwrap();
        let mut drawables = scene(3);

        capture(&mut device, &mut drawables, Some(0), &paraboloid_camera(Vec3::zeros()), &targets).unwrap();

        let directions: Vec<_> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::ApplyPass { technique, direction, .. } => {
                    assert_eq!(technique, paraboloid::TECHNIQUE);
                    *direction
                }
                _ => None,
            })
            .collect();
        assert_eq!(directions, vec![1.0, 1.0, -1.0, -1.0]);

        for drawable in &drawables[1..] {
            assert_eq!(drawable.effect().unwrap().current_technique_name(), "Phong");
        }
    }

    #[test]
    fn test_failed_draw_restores_technique_and_continues() {
        let mut device = RejectingPasses(RecordingDevice::new(16, 16));
        let targets = CaptureTargets::create(&mut device, 16, 16).unwrap();
        let mut drawables = scene(3);

        let output = capture(&mut device, &mut drawables, Some(0), &paraboloid_camera(Vec3::zeros()), &targets).unwrap();

        assert_eq!(output.draws, (0, 0));
        assert_eq!(output.failed_draws, 4);
        for drawable in &drawables[1..] {
            assert_eq!(drawable.effect().unwrap().current_technique_name(), "Phong");
        }
        assert_eq!(device.render_target(), None);
        assert_eq!(device.0.draws_to(Some(targets.front)).count(), 0);
    }

    #[test]
    fn test_targets_are_cleared_transparent() {
        let mut device = RecordingDevice::new(16, 16);
        let targets = CaptureTargets::create(&mut device, 16, 16).unwrap();
        capture(&mut device, &mut scene(1), Some(0), &paraboloid_camera(Vec3::zeros()), &targets).unwrap();

        let clears = device
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::Clear { color, .. } if *color == colors::TRANSPARENT))
            .count();
        assert_eq!(clears, 2);
    }

    #[test]
    fn test_recentering_is_transient() {
        let camera = paraboloid_camera(Vec3::new(2.0, 1.0, -3.0));
        let before = *camera.view();
        let view = recentered_view(&camera);

        assert_relative_eq!(view.translation_part(), Vec3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(
            view.fixed_view::<3, 3>(0, 0).into_owned(),
            before.fixed_view::<3, 3>(0, 0).into_owned()
        );
        assert_eq!(*camera.view(), before);
        assert_eq!(camera.position(), Vec3::new(2.0, 1.0, -3.0));
    }

    #[test]
    fn test_targets_recreated_only_on_size_change() {
        let mut device = RecordingDevice::new(16, 16);
        let targets = CaptureTargets::create(&mut device, 16, 16).unwrap();
        let same = targets.resized(&mut device, 16, 16).unwrap();
        assert_eq!(same, targets);

        let bigger = same.resized(&mut device, 32, 16).unwrap();
        assert_ne!(bigger.front, targets.front);
        assert_eq!(device.render_target_count(), 2);
    }
}
