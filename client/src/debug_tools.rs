//! Debug/performance tooling for native dev builds.
//!
//! This plugin is compiled/used only when the caller gates it behind `dev_native`
//! (recommended: `#[cfg(feature = "dev_native")] mod debug_tools;` in `main.rs`).
//!
//! Goal markers are vertical lines: green for queued goals, red for the goal currently
//! being moved toward. The simulated root is drawn as a white wireframe sphere.

use std::time::Duration;

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin,
    SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use bevy::time::common_conditions::on_timer;
use nalgebra as na;

use crate::smoother::Smoothed;

const GOAL_MARKER_OFFSET: Vec3 = Vec3::new(0.15, 1.5, 0.0);
const STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Add debug/perf tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        LogDiagnosticsPlugin {
            wait_duration: Duration::from_secs(5),
            ..default()
        },
    ));

    app.add_systems(Update, draw_goals);
    app.add_systems(Update, log_smoothing_stats.run_if(on_timer(STATS_INTERVAL)));
}

fn to_bevy(position: &na::Vector3<f32>) -> Vec3 {
    Vec3::new(position.x, position.y, position.z)
}

fn draw_goals(mut gizmos: Gizmos, roots: Query<(&Transform, &Smoothed)>) {
    for (transform, smoothed) in &roots {
        let smoother = &smoothed.smoother;

        for goal in smoother.pending_goals() {
            let p = to_bevy(&goal.transform.position);
            gizmos.line(
                p + GOAL_MARKER_OFFSET,
                p - GOAL_MARKER_OFFSET,
                Color::srgb(0.1, 0.9, 0.2),
            );
        }

        if let Some(goal) = smoother.current_goal() {
            let p = to_bevy(&goal.transform.position);
            gizmos.line(
                p + GOAL_MARKER_OFFSET,
                p - GOAL_MARKER_OFFSET,
                Color::srgb(0.95, 0.15, 0.1),
            );
        }

        gizmos.sphere(transform.translation, 0.2, Color::WHITE);
    }
}

fn log_smoothing_stats(roots: Query<&Smoothed>) {
    for smoothed in &roots {
        let smoother = &smoothed.smoother;
        let interpolation = smoother.interpolation();
        info!(
            "Smoothing: {} queued, interpolation {} (target {}, colliding {}), rtt {:?}ms",
            smoother.queue_len(),
            interpolation.current(),
            interpolation.target(),
            interpolation.target_collision(),
            interpolation.last_ping(),
        );
    }
}
