//! Math utilities and types
//!
//! Provides the transform algebra used by the scene hierarchy. Transforms are
//! plain TRS (translation, rotation, scale) values; shear introduced by
//! rotated non-uniform scale is intentionally not representable.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Compose a child transform under this (parent) transform
    ///
    /// Returns the child expressed in the parent's enclosing space, i.e. the
    /// child's world transform when `self` is the parent's world transform.
    pub fn combine(&self, child: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Get the inverse transform
    ///
    /// Satisfies `t.inverse().combine(&t) == identity` for transforms without
    /// rotated non-uniform scale.
    pub fn inverse(&self) -> Transform {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = -(inv_rotation * self.position).component_mul(&inv_scale);

        Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn combine_with_identity_is_neutral() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let combined = Transform::identity().combine(&t);
        assert_relative_eq!(combined.position, t.position, epsilon = 1e-6);
    }

    #[test]
    fn inverse_round_trips_a_point() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.7);
        let t = Transform {
            position: Vec3::new(4.0, -1.0, 2.5),
            rotation,
            scale: Vec3::new(2.0, 2.0, 2.0),
        };

        let round_trip = t.inverse().combine(&t);
        assert_relative_eq!(round_trip.position, Vec3::zeros(), epsilon = 1e-5);
        assert_relative_eq!(round_trip.scale, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(round_trip.rotation.angle(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn combine_applies_parent_scale_to_child_position() {
        let parent = Transform {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));

        let world = parent.combine(&child);
        assert_relative_eq!(world.position, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-6);
    }
}
