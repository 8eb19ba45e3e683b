use crate::smoother::SmoothedGraphical;
use bevy::{camera::Exposure, core_pipeline::tonemapping::Tonemapping, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(PostUpdate, track_remote_actor);
}

const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 14.0, -12.0);
/// How far the camera drifts toward the actor, as a fraction of the actor's offset from
/// the path centre.
const FOLLOW_FRACTION: f32 = 0.25;
const CAMERA_DECAY_RATE: f32 = 2.0;

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        Exposure::SUNLIGHT,
        Tonemapping::AcesFitted,
        Transform::from_translation(CAMERA_OFFSET).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Keeps the smoothed actor centred. Reads the graphical entity, so any jitter left in
/// the smoothed output shows up directly.
fn track_remote_actor(
    mut camera: Single<&mut Transform, With<Camera3d>>,
    followed: Single<&Transform, (With<SmoothedGraphical>, Without<Camera3d>)>,
    time: Res<Time>,
) {
    let target = followed.translation * FOLLOW_FRACTION + CAMERA_OFFSET;
    camera
        .translation
        .smooth_nudge(&target, CAMERA_DECAY_RATE, time.delta_secs());
    camera.look_at(followed.translation, Vec3::Y);
}
