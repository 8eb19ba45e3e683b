use std::f32::consts::PI;

use bevy::prelude::*;
use smoothing::{AdaptiveInterpolationSmoother, CapsuleSpec, SmoothingSettings, Tick};

use crate::{
    network::SimulatedNetwork,
    smoother::{Smoothed, SmoothedGraphical},
    transform::to_properties,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, (spawn_local_viewer, spawn_remote_actor));
    app.add_systems(FixedUpdate, simulate_remote_actor);
}

const ACTOR_CAPSULE: CapsuleSpec = CapsuleSpec {
    radius: 0.4,
    half_height: 0.5,
};

const PATH_RADIUS: f32 = 6.0;
const ANGULAR_SPEED_RAD_PER_TICK: f32 = 0.02;
/// Every this many ticks the remote actor jumps to the far side of its path.
const TELEPORT_INTERVAL_TICKS: Tick = 400;
const TELEPORT_THRESHOLD_M: f32 = 3.0;

/// Simulated root of the remote actor. Has no mesh; the mesh lives on a separate
/// [`SmoothedGraphical`] entity.
#[derive(Component, Debug, Default)]
pub struct RemoteRoot {
    /// Accumulated reconcile corrections, in meters from the nominal path radius.
    pub correction: f32,
}

/// The local client's own object. Static; the remote actor passes through it.
#[derive(Component, Debug)]
pub struct LocalViewer;

/// Collision capsule used for the viewer proximity test.
#[derive(Component, Clone, Copy, Debug)]
pub struct ActorShape(pub CapsuleSpec);

fn smoothing_settings() -> SmoothingSettings {
    SmoothingSettings {
        teleport_threshold: Some(TELEPORT_THRESHOLD_M),
        trim_excessive_goals: true,
        ..default()
    }
}

/// Pose of the remote root after simulating `tick`.
pub fn root_pose(tick: Tick, correction: f32) -> Transform {
    let laps_skipped = (tick / TELEPORT_INTERVAL_TICKS) as f32;
    let angle = tick as f32 * ANGULAR_SPEED_RAD_PER_TICK + laps_skipped * PI;
    let radius = PATH_RADIUS + correction;
    let height = ACTOR_CAPSULE.half_height + ACTOR_CAPSULE.radius;

    Transform::from_xyz(radius * angle.cos(), height, radius * angle.sin())
        // Face along the direction of travel.
        .with_rotation(Quat::from_rotation_y(-angle))
}

fn capsule_mesh(shape: &CapsuleSpec) -> Capsule3d {
    Capsule3d::new(shape.radius, shape.half_height * 2.0)
}

fn spawn_local_viewer(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Sits on the path at angle zero.
    let mut transform = root_pose(0, 0.0);
    transform.rotation = Quat::IDENTITY;

    commands.spawn((
        Name::new("Local Viewer"),
        LocalViewer,
        ActorShape(ACTOR_CAPSULE),
        transform,
        Mesh3d(meshes.add(capsule_mesh(&ACTOR_CAPSULE))),
        MeshMaterial3d(materials.add(Color::srgb_u8(80, 200, 120))),
    ));
}

fn spawn_remote_actor(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    network: Res<SimulatedNetwork>,
) {
    let root_transform = root_pose(network.tick, 0.0);

    let graphical = commands
        .spawn((
            Name::new("Remote Actor Graphical"),
            SmoothedGraphical,
            root_transform,
            Mesh3d(meshes.add(capsule_mesh(&ACTOR_CAPSULE))),
            MeshMaterial3d(materials.add(Color::srgb_u8(124, 144, 255))),
        ))
        .with_children(|parent| {
            // Nose, so rotation smoothing is visible.
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(0.15, 0.15, 0.3))),
                MeshMaterial3d(materials.add(Color::srgb_u8(255, 220, 80))),
                Transform::from_xyz(0.0, ACTOR_CAPSULE.half_height, -ACTOR_CAPSULE.radius),
            ));
        })
        .id();

    let smoother = match AdaptiveInterpolationSmoother::new(
        smoothing_settings(),
        to_properties(&root_transform),
        to_properties(&root_transform),
    ) {
        Ok(smoother) => smoother,
        Err(err) => {
            error!("Remote actor smoothing disabled: {err}");
            return;
        }
    };

    commands.spawn((
        Name::new("Remote Actor Root"),
        RemoteRoot::default(),
        ActorShape(ACTOR_CAPSULE),
        root_transform,
        Smoothed {
            smoother,
            graphical,
        },
    ));
}

fn simulate_remote_actor(
    network: Res<SimulatedNetwork>,
    mut roots: Query<(&mut Transform, &RemoteRoot)>,
) {
    for (mut transform, root) in &mut roots {
        *transform = root_pose(network.tick, root.correction);
    }
}
