//! Spatial math primitives: body-to-world frames and quaternion integration.
//!
//! A [`Frame`] is the combined rotation/translation transform of a rigid body.
//! Its columns are the body's base unit vectors expressed in the world frame;
//! the translation is the body position. This is the 4×4 homogeneous transform
//! of the classic formulation collapsed to its rotation block and translation
//! column, which is all any consumer ever reads.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid transform from body-fixed coordinates into world coordinates.
///
/// # Example
///
/// ```
/// use tumble_types::Frame;
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let frame = Frame::from_orientation_position(
///     &UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
///     &Vector3::new(1.0, 0.0, 0.0),
/// );
///
/// let world = frame.transform_point(&Vector3::new(1.0, 0.0, 0.0));
/// assert!((world - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// Rotation from body to world; columns are the body axes in world frame.
    pub rotation: Matrix3<f64>,
    /// Body position in world frame.
    pub translation: Vector3<f64>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// Create an identity frame (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Build the frame from an orientation versor and a position.
    ///
    /// The rotation block is the standard quaternion-to-matrix (Shoemake)
    /// construction, `L(q) · R(q*)` restricted to the spatial part.
    #[must_use]
    pub fn from_orientation_position(
        orientation: &UnitQuaternion<f64>,
        position: &Vector3<f64>,
    ) -> Self {
        Self {
            rotation: orientation.to_rotation_matrix().into_inner(),
            translation: *position,
        }
    }

    /// Get one of the body base unit vectors (a rotation column) in world frame.
    ///
    /// # Panics
    ///
    /// Panics if `index > 2`.
    #[must_use]
    pub fn axis(&self, index: usize) -> Vector3<f64> {
        self.rotation.column(index).into_owned()
    }

    /// Get the body position (the translation column).
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        self.translation
    }

    /// Transform a body-fixed point into world coordinates.
    #[must_use]
    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Transform a world point into body-fixed coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transpose() * (point - self.translation)
    }

    /// Rotate a body-fixed direction into world coordinates (no translation).
    #[must_use]
    pub fn rotate(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * direction
    }

    /// Rotate a world direction into body-fixed coordinates (no translation).
    #[must_use]
    pub fn inverse_rotate(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transpose() * direction
    }

    /// Transform a tensor from body to world frame: `R · X · Rᵀ`.
    ///
    /// Used to express the inverse inertia tensor in world coordinates.
    #[must_use]
    pub fn rotate_tensor(&self, tensor: &Matrix3<f64>) -> Matrix3<f64> {
        self.rotation * tensor * self.rotation.transpose()
    }

    /// Transform a tensor from world to body frame: `Rᵀ · X · R`.
    #[must_use]
    pub fn inverse_rotate_tensor(&self, tensor: &Matrix3<f64>) -> Matrix3<f64> {
        self.rotation.transpose() * tensor * self.rotation
    }

    /// Determinant of the rotation block (1 for a proper rigid transform).
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.rotation.determinant()
    }

    /// Inverse transform.
    ///
    /// A singular rotation block (determinant 0) yields the zero transform
    /// rather than a panic; upper layers treat that as "no rotation at all".
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self.rotation.try_inverse() {
            Some(inv) => Self {
                rotation: inv,
                translation: -(inv * self.translation),
            },
            None => Self {
                rotation: Matrix3::zeros(),
                translation: Vector3::zeros(),
            },
        }
    }
}

/// Invert a 3×3 tensor, returning the zero tensor when singular.
///
/// This is the guard used for inertia tensors: a degenerate inertia makes the
/// body rotationally immovable instead of producing non-finite state.
#[must_use]
pub fn invert_or_zero(tensor: &Matrix3<f64>) -> Matrix3<f64> {
    tensor.try_inverse().unwrap_or_else(Matrix3::zeros)
}

/// Orientation time derivative `Q̇ = ½ · Ω · Q` with the angular velocity
/// embedded as a pure imaginary quaternion.
#[must_use]
pub fn orientation_derivative(
    angular_velocity: &Vector3<f64>,
    orientation: &UnitQuaternion<f64>,
) -> Quaternion<f64> {
    Quaternion::from_imag(*angular_velocity) * orientation.quaternion() * 0.5
}

/// Normalize a raw quaternion to a versor.
///
/// The zero quaternion cannot be normalized and defaults to identity.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn normalize_or_identity(raw: Quaternion<f64>) -> UnitQuaternion<f64> {
    let norm = raw.norm();
    if norm == 0.0 {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::new_unchecked(raw / norm)
    }
}

/// Integrate an orientation by `Q ← normalize(Q + Q̇ · h)`.
#[must_use]
pub fn integrate_orientation(
    orientation: &UnitQuaternion<f64>,
    angular_velocity: &Vector3<f64>,
    h: f64,
) -> UnitQuaternion<f64> {
    let derivative = orientation_derivative(angular_velocity, orientation);
    normalize_or_identity(orientation.quaternion() + derivative * h)
}
