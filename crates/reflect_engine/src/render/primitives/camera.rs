//! # Free-Look Camera
//!
//! A camera kept as a position plus an explicit basis {right, up, look}, with
//! view and projection matrices derived on demand by [`Camera::build_view`].
//!
//! ## Conventions
//! - Right-handed, Y-up world space.
//! - `look` points from the target back toward the eye, so view space looks
//!   down −Z and moving "forward" is `walk(-units)`.
//! - Matrices follow nalgebra's column-vector convention:
//!   `view_proj = projection * view`.
//! - Rebuilds are explicit. Mutators only touch the basis and position; nothing
//!   reaches the matrices until `build_view` runs.
//!
//! ## Transient overrides
//! The paraboloid capture draws with a re-centered copy of its camera. The
//! copy's matrices are replaced through [`Camera::override_matrices`], which
//! leaves the basis and position untouched.

use crate::foundation::math::{Mat4, Mat4Ext, Vec2, Vec3};

/// Camera with an explicit orthonormal basis and a perspective lens
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    right: Vec3,
    up: Vec3,
    look: Vec3,

    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,

    view: Mat4,
    projection: Mat4,
    view_proj: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Camera at the origin with the canonical basis and identity matrices
    pub fn new() -> Self {
        Self {
            position: Vec3::zeros(),
            right: Vec3::x(),
            up: Vec3::y(),
            look: Vec3::z(),
            fov: 0.0,
            aspect: 0.0,
            near: 0.0,
            far: 0.0,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_proj: Mat4::identity(),
        }
    }

    /// Place the camera at `position` facing `target`
    ///
    /// # Arguments
    /// * `position` - Eye position
    /// * `target` - Point to face
    /// * `world_up` - Reference up direction; its length does not matter
    ///
    /// The basis is left unnormalized except for `look`; [`Camera::build_view`]
    /// re-orthonormalizes it.
    pub fn look_at(&mut self, position: Vec3, target: Vec3, world_up: Vec3) {
        let look = (position - target).normalize();
        let right = world_up.cross(&look);
        let up = look.cross(&right);

        self.position = position;
        self.right = right;
        self.up = up;
        self.look = look;
    }

    /// Place the camera at `position` facing `target`, keeping the current roll
    ///
    /// When the current up vector is close to the new look direction the right
    /// vector is kept instead, so the basis never degenerates.
    pub fn look_at_keep_up(&mut self, position: Vec3, target: Vec3) {
        let look = (position - target).normalize();

        let (right, up) = if self.up.dot(&look).abs() < 0.5 {
            let right = self.up.cross(&look);
            (right, look.cross(&right))
        } else {
            let up = look.cross(&self.right);
            (up.cross(&look), up)
        };

        self.position = position;
        self.right = right;
        self.up = up;
        self.look = look;
    }

    /// Store lens parameters and build the perspective projection
    ///
    /// # Arguments
    /// * `fov` - Vertical field of view in radians
    /// * `aspect` - Width over height
    /// * `near`, `far` - Clip distances; depth maps to `[0, 1]`
    pub fn set_lens(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        self.fov = fov;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.projection = Mat4::perspective_rh(fov, aspect, near, far);
    }

    /// Update only the aspect ratio, rebuilding the projection from the stored lens
    pub fn set_aspect(&mut self, aspect: f32) {
        self.set_lens(self.fov, aspect, self.near, self.far);
    }

    /// Replace the projection matrix outright
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Move along the look vector
    pub fn walk(&mut self, units: f32) {
        self.position += self.look * units;
    }

    /// Move along the horizontal part of the right vector
    pub fn strafe(&mut self, units: f32) {
        self.position += Vec3::new(self.right.x, 0.0, self.right.z) * units;
    }

    /// Move along the up vector
    pub fn fly(&mut self, units: f32) {
        self.position += self.up * units;
    }

    /// Rotate right and look about the world Y axis
    pub fn yaw(&mut self, angle: f32) {
        let rotation = Mat4::axis_angle(&Vec3::y(), angle);
        self.right = rotation.transform_vector(&self.right);
        self.look = rotation.transform_vector(&self.look);
    }

    /// Rotate up and look about the camera's right axis
    pub fn pitch(&mut self, angle: f32) {
        let rotation = Mat4::axis_angle(&self.right, angle);
        self.up = rotation.transform_vector(&self.up);
        self.look = rotation.transform_vector(&self.look);
    }

    /// Mouse look: yaw by `delta.x * units`, pitch by `delta.y * units`
    pub fn update_mouse(&mut self, delta: Vec2, units: f32) {
        self.yaw(delta.x * units);
        self.pitch(delta.y * units);
    }

    /// Re-orthonormalize the basis and rebuild view and view-projection
    pub fn build_view(&mut self) {
        self.look = self.look.normalize();
        self.up = self.look.cross(&self.right).normalize();
        self.right = self.up.cross(&self.look).normalize();

        self.view = Mat4::from_basis(&self.right, &self.up, &self.look, &self.position);
        self.view_proj = self.projection * self.view;
    }

    /// Replace the derived matrices without touching the basis or position
    pub fn override_matrices(&mut self, view: Mat4, view_proj: Mat4) {
        self.view = view;
        self.view_proj = view_proj;
    }

    /// Distance from the eye to a point
    pub fn distance_to(&self, point: &Vec3) -> f32 {
        (self.position - point).norm()
    }

    /// Eye position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Right axis
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Up axis
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Look axis (points from the target toward the eye)
    pub fn look(&self) -> Vec3 {
        self.look
    }

    /// Vertical field of view in radians
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Aspect ratio
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Near clip distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// View matrix from the last rebuild or override
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// View-projection matrix from the last rebuild or override
    pub fn view_proj(&self) -> &Mat4 {
        &self.view_proj
    }
}
