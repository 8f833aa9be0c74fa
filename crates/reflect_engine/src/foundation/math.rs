//! Math utilities and types
//!
//! Provides the fundamental math types used by the camera, drawables and the
//! rasterizer. Everything follows nalgebra's column-vector convention: a point is
//! transformed as `M * p`, so a chain written "apply A, then B" reads `B * A`.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Rotation3,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi, one full turn
    pub const TAU: f32 = std::f32::consts::TAU;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Vectors shorter than this are treated as zero when used as rotation axes
    pub const AXIS_EPSILON: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec2};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Wrap an accumulated angle into `[0, 2π)`
    pub fn wrap_angle(angle: f32) -> f32 {
        let wrapped = angle.rem_euclid(constants::TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if wrapped >= constants::TAU { 0.0 } else { wrapped }
    }

    /// Unit vector on the XZ circle for a polar coordinate given in turns
    ///
    /// `p = 0.25` is a quarter turn. The returned vector's `x` maps to world X and
    /// `y` to world Z.
    pub fn vector2_from_polar(p: f32) -> Vec2 {
        let azimuth = p * constants::TAU;
        Vec2::new(azimuth.cos(), azimuth.sin())
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a right-handed perspective projection with depth mapped to `[0, 1]`
    fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Rotation about an arbitrary axis; a zero-length axis yields identity
    fn axis_angle(axis: &Vec3, angle: f32) -> Mat4;

    /// Build a view matrix whose rows are the given basis axes
    ///
    /// The translation column holds `-dot(axis, position)` for each axis.
    fn from_basis(right: &Vec3, up: &Vec3, look: &Vec3, position: &Vec3) -> Mat4;

    /// The translation part of an affine matrix
    fn translation_part(&self) -> Vec3;

    /// The inverse-transpose used to carry normals through non-uniform scale
    ///
    /// Falls back to identity for singular matrices.
    fn inverse_transpose(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect;
        let range = near - far;

        let mut result = Mat4::zeros();
        result[(0, 0)] = x_scale;
        result[(1, 1)] = y_scale;
        result[(2, 2)] = far / range;
        result[(2, 3)] = near * far / range;
        result[(3, 2)] = -1.0;
        result
    }

    fn axis_angle(axis: &Vec3, angle: f32) -> Mat4 {
        Unit::try_new(*axis, constants::AXIS_EPSILON).map_or_else(Mat4::identity, |axis| {
            Rotation3::from_axis_angle(&axis, angle).to_homogeneous()
        })
    }

    fn from_basis(right: &Vec3, up: &Vec3, look: &Vec3, position: &Vec3) -> Mat4 {
        Mat4::new(
            right.x, right.y, right.z, -right.dot(position),
            up.x, up.y, up.z, -up.dot(position),
            look.x, look.y, look.z, -look.dot(position),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn inverse_transpose(&self) -> Mat4 {
        self.try_inverse().map_or_else(Mat4::identity, |inverse| inverse.transpose())
    }
}
