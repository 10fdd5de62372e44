//! Local transforms for scene-graph nodes.
//!
//! A [`Transform`] is the position/rotation/scale triple every node carries.
//! Rotation is kept as a quaternion and renormalized after every mutation so
//! incremental per-frame rotations do not drift, and composition happens via
//! quaternion multiplication rather than Euler-angle addition.

use std::ops::Mul;

use cgmath::{InnerSpace, Matrix3, Matrix4, One, Quaternion, Rad, Rotation3, Vector3};

/// Position, rotation (unit quaternion) and component-wise scale.
///
/// Scale components are expected to be non-negative; a zero scale on any axis
/// is degenerate but accepted.
#[derive(Clone, Debug)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// The identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation.normalize();
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// The local-to-parent matrix: scale first, then rotate, then translate.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Decompose a translate * rotate * scale matrix back into a transform.
    ///
    /// Scale is recovered from the column norms, rotation from the scale-free
    /// basis. The rotation round-trips up to quaternion sign. Columns with a
    /// (near-)zero scale fall back to the unit basis so the quaternion stays
    /// well defined.
    pub fn from_matrix(m: &Matrix4<f32>) -> Self {
        let x = m.x.truncate();
        let y = m.y.truncate();
        let z = m.z.truncate();
        let scale = Vector3::new(x.magnitude(), y.magnitude(), z.magnitude());
        let axis = |column: Vector3<f32>, len: f32, unit: Vector3<f32>| {
            if len > f32::EPSILON { column / len } else { unit }
        };
        let rotation = Matrix3::from_cols(
            axis(x, scale.x, Vector3::unit_x()),
            axis(y, scale.y, Vector3::unit_y()),
            axis(z, scale.z, Vector3::unit_z()),
        );
        Self {
            position: m.w.truncate(),
            rotation: Quaternion::from(rotation).normalize(),
            scale,
        }
    }

    /// Replace the rotation, renormalizing to guard against caller drift.
    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation.normalize();
    }

    /// Rotate about a local axis by `angle`.
    ///
    /// Repeated incremental calls accumulate through quaternion
    /// multiplication, so N small steps about a fixed axis are equivalent to
    /// one large step.
    pub fn rotate_about(&mut self, axis: Vector3<f32>, angle: Rad<f32>) {
        let step = Quaternion::from_axis_angle(axis.normalize(), angle);
        self.rotation = (self.rotation * step).normalize();
    }

    pub fn rotate_x(&mut self, angle: Rad<f32>) {
        self.rotate_about(Vector3::unit_x(), angle);
    }

    pub fn rotate_y(&mut self, angle: Rad<f32>) {
        self.rotate_about(Vector3::unit_y(), angle);
    }

    pub fn rotate_z(&mut self, angle: Rad<f32>) {
        self.rotate_about(Vector3::unit_z(), angle);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    /// Parent-then-local composition, consistent with multiplying the two
    /// `to_matrix` results in the same order.
    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let rotation = (self.rotation * rhs.rotation).normalize();

        let scale = Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let position = self.position + (self.rotation * scaled_rhs_pos);

        Transform {
            position,
            rotation,
            scale,
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}
