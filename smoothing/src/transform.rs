/*!
Transform values exchanged between the host and the smoother.

This module contains the math aliases and the small set of stepping helpers the
integrator needs:
- `move_towards`:   bounded straight-line step that never overshoots
- `rotate_towards`: bounded angular step (degrees) that never overshoots
- local offset helpers for the graphical object relative to its root
*/

use nalgebra as na;

use crate::{
    constants::{GOAL_POSITION_EPSILON, GOAL_ROTATION_EPSILON_DEG},
    settings::SmoothAxes,
};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// World-space position and rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformProperties {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for TransformProperties {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl TransformProperties {
    #[inline]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::identity())
    }

    /// Zeroes position and rotation.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Bit-exact comparison. Used to detect duplicate snapshots, not to test "closeness".
    #[inline]
    pub fn has_changed(&self, other: &Self) -> bool {
        self.position != other.position || self.rotation != other.rotation
    }

    /// Returns true if the enabled axes of `self` are within tolerance of `other`.
    /// Disabled axes always match.
    pub fn approx_eq(&self, other: &Self, axes: SmoothAxes) -> bool {
        let position_matches = !axes.position
            || (self.position - other.position).norm() <= GOAL_POSITION_EPSILON;
        let rotation_matches =
            !axes.rotation || angle_between_degrees(&self.rotation, &other.rotation)
                <= GOAL_ROTATION_EPSILON_DEG;
        position_matches && rotation_matches
    }

    /// Expresses `self` (world space) relative to `root`.
    pub fn local_to(&self, root: &Self) -> Self {
        let inverse = root.rotation.inverse();
        Self {
            position: inverse * (self.position - root.position),
            rotation: inverse * self.rotation,
        }
    }

    /// Inverse of [`Self::local_to`]: places a local offset under `root` in world space.
    pub fn under(&self, root: &Self) -> Self {
        Self {
            position: root.position + root.rotation * self.position,
            rotation: root.rotation * self.rotation,
        }
    }
}

/// Shortest angle between two rotations, in degrees.
#[inline]
pub fn angle_between_degrees(a: &Quat, b: &Quat) -> f32 {
    a.angle_to(b).to_degrees()
}

/// Moves `current` toward `target` by at most `max_delta` meters.
///
/// Returns `target` exactly once it is within reach, so repeated calls settle without
/// floating-point drift.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let dist = delta.norm();
    if dist <= max_delta || dist == 0.0 {
        return target;
    }
    current + delta / dist * max_delta
}

/// Rotates `current` toward `target` by at most `max_degrees`.
pub fn rotate_towards(current: Quat, target: Quat, max_degrees: f32) -> Quat {
    let angle = angle_between_degrees(&current, &target);
    if angle == 0.0 || max_degrees >= angle {
        return target;
    }
    if max_degrees <= 0.0 {
        return current;
    }

    let t = max_degrees / angle;
    // Half-turn rotations have no unique arc; take the goal rather than guess a path.
    current.try_slerp(&target, t, 1.0e-6).unwrap_or(target)
}
