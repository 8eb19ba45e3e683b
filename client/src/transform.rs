//! Conversions between Bevy transforms and the smoother's nalgebra transform values.

use bevy::prelude::*;
use nalgebra as na;
use smoothing::TransformProperties;

pub fn to_properties(transform: &Transform) -> TransformProperties {
    let t = transform.translation;
    let r = transform.rotation;
    TransformProperties::new(
        na::Vector3::new(t.x, t.y, t.z),
        na::UnitQuaternion::new_normalize(na::Quaternion::new(r.w, r.x, r.y, r.z)),
    )
}

/// Writes position and rotation, leaving scale alone.
pub fn apply_properties(properties: &TransformProperties, transform: &mut Transform) {
    let p = properties.position;
    // Stored as [i, j, k, w].
    let q = properties.rotation.quaternion().coords;
    transform.translation = Vec3::new(p.x, p.y, p.z);
    transform.rotation = Quat::from_xyzw(q.x, q.y, q.z, q.w);
}
