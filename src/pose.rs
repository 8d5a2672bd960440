//! Rigid-transform value type and pose-literal parsing.
//!
//! An SDF pose literal is six whitespace-separated numbers
//! `x y z roll pitch yaw`; empty or absent text means the identity pose.

use nalgebra::{Isometry3, Point3, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdfError};

/// A rigid transform: 3D translation plus 3D rotation.
///
/// Immutable value type attached to every relative-to edge. Rotation is
/// stored as a unit quaternion; literals supply it as roll-pitch-yaw Euler
/// angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Translation component.
    pub position: Point3<f64>,
    /// Rotation component.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from translation and roll-pitch-yaw Euler angles.
    #[must_use]
    pub fn from_translation_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            rotation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        }
    }

    /// Create a pose from translation only (identity rotation).
    #[must_use]
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }

    /// Transform a point from this pose's frame into the parent frame.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.rotation * local + self.position.coords
    }

    /// Compute the inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: `self * other`.
    ///
    /// If `self` is the pose of frame B in frame A and `other` the pose of
    /// frame C in frame B, the result is the pose of C in A.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Roll-pitch-yaw Euler angles of the rotation component.
    #[must_use]
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.rotation.euler_angles()
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Parse a pose literal.
///
/// Accepts six whitespace-separated numbers `x y z roll pitch yaw`. Empty
/// (or whitespace-only) input is the identity pose.
///
/// # Errors
///
/// Returns [`SdfError::InvalidPoseLiteral`] if the text has the wrong
/// number of components or a component does not parse as a number.
pub fn parse_pose(text: &str) -> Result<Pose> {
    if text.trim().is_empty() {
        return Ok(Pose::identity());
    }

    let mut values = [0.0f64; 6];
    let mut count = 0usize;
    for token in text.split_whitespace() {
        if count == 6 {
            count += 1;
            break;
        }
        values[count] = token
            .parse::<f64>()
            .map_err(|_| SdfError::invalid_pose_literal(text, format!("invalid number: {token}")))?;
        count += 1;
    }

    if count != 6 {
        return Err(SdfError::invalid_pose_literal(
            text,
            format!("expected 6 values, got {count}"),
        ));
    }

    Ok(Pose::from_translation_rpy(
        values[0], values[1], values[2], values[3], values[4], values[5],
    ))
}
