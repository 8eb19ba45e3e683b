//! Viewer proximity: decides when a smoothed object counts as colliding with the local
//! client's object, which switches the smoother to its collision interpolation target.
//!
//! Both objects are approximated by Y-aligned capsules and tested with the parry distance
//! query bundled with rapier3d.

use rapier3d::{
    na,
    parry::{query, shape::Capsule},
};

use crate::transform::TransformProperties;

/// Y-aligned capsule.
///
/// half_height is the half-length of the cylinder section, so the total capsule height is
/// 2*half_height + 2*radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleSpec {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleSpec {
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius,
            half_height,
        }
    }

    #[inline]
    fn shape(&self) -> Capsule {
        Capsule::new_y(self.half_height, self.radius)
    }
}

/// Converts to the isometry type rapier's parry expects.
fn isometry(transform: &TransformProperties) -> na::Isometry3<f32> {
    let p = transform.position;
    let q = transform.rotation.quaternion().coords;
    na::Isometry3::from_parts(
        na::Translation3::new(p.x, p.y, p.z),
        na::UnitQuaternion::new_normalize(na::Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

/// Returns true if the two capsules are within `contact_margin` meters of each other
/// (overlapping counts as colliding).
pub fn is_colliding(
    a: &TransformProperties,
    a_shape: &CapsuleSpec,
    b: &TransformProperties,
    b_shape: &CapsuleSpec,
    contact_margin: f32,
) -> bool {
    let a_capsule = a_shape.shape();
    let b_capsule = b_shape.shape();
    match query::distance(&isometry(a), &a_capsule, &isometry(b), &b_capsule) {
        Ok(distance) => distance <= contact_margin,
        Err(_) => {
            log::warn!("Unsupported shape pair in proximity query");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Quat, Vec3};

    const ACTOR: CapsuleSpec = CapsuleSpec {
        radius: 0.5,
        half_height: 0.5,
    };

    fn at(x: f32, y: f32) -> TransformProperties {
        TransformProperties::from_position(Vec3::new(x, y, 0.0))
    }

    #[test]
    fn touching_capsules_collide() {
        assert!(is_colliding(&at(0.0, 0.0), &ACTOR, &at(1.0, 0.0), &ACTOR, 0.01));
        assert!(is_colliding(&at(0.0, 0.0), &ACTOR, &at(0.2, 0.0), &ACTOR, 0.0));
    }

    #[test]
    fn distant_capsules_do_not_collide() {
        assert!(!is_colliding(&at(0.0, 0.0), &ACTOR, &at(3.0, 0.0), &ACTOR, 0.5));
    }

    #[test]
    fn margin_is_measured_between_surfaces() {
        // Stacked: top of the lower capsule at y=1.0, bottom of the upper one at y=1.5.
        let above = at(0.0, 2.5);
        assert!(is_colliding(&at(0.0, 0.0), &ACTOR, &above, &ACTOR, 0.6));
        assert!(!is_colliding(&at(0.0, 0.0), &ACTOR, &above, &ACTOR, 0.4));
    }

    #[test]
    fn rotation_is_respected() {
        // Tipped onto its side, the second capsule reaches 1.0m along X instead of 0.5m
        // and overlaps the upright one.
        let lying = TransformProperties::new(
            Vec3::new(1.4, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        );
        assert!(is_colliding(&at(0.0, 0.0), &ACTOR, &lying, &ACTOR, 0.01));
        assert!(!is_colliding(&at(0.0, 0.0), &ACTOR, &at(1.4, 0.0), &ACTOR, 0.01));
    }
}
