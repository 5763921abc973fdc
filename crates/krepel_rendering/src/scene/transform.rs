//! 2D transforms and the matrices handed to the device.

use std::ops::Mul;

use bytemuck::{Pod, Zeroable};

/// Tolerance used by [`Transform2D::are_equal`] callers that have no better value.
pub const DEFAULT_EPSILON: f32 = 1.0e-5;

/// A 2D vector.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vec2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Position and rotation (radians) in the 2D plane.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Transform2D {
    /// Translation.
    pub position: Vec2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f32,
}

impl Transform2D {
    /// No translation, no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
    };

    /// Creates a transform.
    #[inline]
    #[must_use]
    pub const fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Bitwise-exact comparison of every component.
    #[must_use]
    pub fn are_identical(lhs: &Self, rhs: &Self) -> bool {
        bytemuck::bytes_of(lhs) == bytemuck::bytes_of(rhs)
    }

    /// Component-wise comparison within `epsilon`.
    #[must_use]
    pub fn are_equal(lhs: &Self, rhs: &Self, epsilon: f32) -> bool {
        (lhs.position.x - rhs.position.x).abs() <= epsilon
            && (lhs.position.y - rhs.position.y).abs() <= epsilon
            && (lhs.rotation - rhs.rotation).abs() <= epsilon
    }

    /// Model matrix: rotate, then translate.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::translation(self.position.x, self.position.y) * Mat4::rotation_z(self.rotation)
    }
}

/// Column-major 4x4 matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    /// Columns, each `[x, y, z, w]`.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Translation in the XY plane.
    #[must_use]
    pub fn translation(x: f32, y: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3][0] = x;
        m.cols[3][1] = y;
        m
    }

    /// Uniform XY scale.
    #[must_use]
    pub fn scale(factor: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = factor;
        m.cols[1][1] = factor;
        m
    }

    /// Rotation around the Z axis.
    #[must_use]
    pub fn rotation_z(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0][0] = cos;
        m.cols[0][1] = sin;
        m.cols[1][0] = -sin;
        m.cols[1][1] = cos;
        m
    }

    /// Orthographic projection mapping the box to clip space.
    #[must_use]
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = 2.0 / (right - left);
        m.cols[1][1] = 2.0 / (top - bottom);
        m.cols[2][2] = -2.0 / (far - near);
        m.cols[3][0] = -(right + left) / (right - left);
        m.cols[3][1] = -(top + bottom) / (top - bottom);
        m.cols[3][2] = -(far + near) / (far - near);
        m
    }

    /// Transforms a point (z = 0, w = 1) and drops z/w.
    #[must_use]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        let c = &self.cols;
        Vec2::new(
            c[0][0] * point.x + c[1][0] * point.y + c[3][0],
            c[0][1] * point.x + c[1][1] * point.y + c[3][1],
        )
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0_f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, value) in out_col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.cols[k][row] * rhs.cols[col][k]).sum();
            }
        }
        Self { cols: out }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
