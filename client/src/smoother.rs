//! Drives [`AdaptiveInterpolationSmoother`] from Bevy's schedules.
//!
//! - `FixedPreUpdate`:  pre tick (RTT sampling, graphical snapshot)
//! - `FixedUpdate`:     the remote root is simulated (see `remote`)
//! - `FixedPostUpdate`: post tick, then any reconcile replay window
//! - `Update`:          per-frame integration and graphical write-back

use bevy::prelude::*;
use smoothing::{
    AdaptiveInterpolationSmoother, CapsuleSpec, SmoothingHost, Tick, TransformProperties,
    is_colliding,
};

use crate::{
    network::SimulatedNetwork,
    remote::{ActorShape, LocalViewer, RemoteRoot, root_pose},
    transform::{apply_properties, to_properties},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(FixedPreUpdate, pre_tick);
    app.add_systems(FixedPostUpdate, (post_tick, replay).chain());
    app.add_systems(Update, update_graphical);
}

/// Surfaces closer than this count as colliding with the local viewer.
const CONTACT_MARGIN_M: f32 = 0.25;

/// Smoother state for a simulated root. The visual lives on `graphical`.
#[derive(Component, Debug)]
pub struct Smoothed {
    pub smoother: AdaptiveInterpolationSmoother,
    pub graphical: Entity,
}

/// Marks the visual entity a [`Smoothed`] root writes to.
#[derive(Component, Debug)]
pub struct SmoothedGraphical;

/// What the smoother sees of a root entity for one hook call.
struct RootHost<'a> {
    root: TransformProperties,
    network: &'a SimulatedNetwork,
    colliding: bool,
}

impl SmoothingHost for RootHost<'_> {
    fn root_transform(&self) -> TransformProperties {
        self.root
    }

    fn replicate_tick(&self) -> Tick {
        self.network.tick
    }

    fn round_trip_time_ms(&self) -> u64 {
        self.network.rtt_ms
    }

    fn tick_delta(&self) -> f64 {
        self.network.tick_delta
    }

    // Every root driven here is a remote actor seen by a client.
    fn is_owner(&self) -> bool {
        false
    }

    fn is_server_only(&self) -> bool {
        false
    }

    fn colliding_with_local_client(&self) -> bool {
        self.colliding
    }
}

fn viewer_collides(
    root: &Transform,
    shape: &CapsuleSpec,
    viewer: Option<(&Transform, &ActorShape)>,
) -> bool {
    viewer.is_some_and(|(viewer_transform, viewer_shape)| {
        is_colliding(
            &to_properties(root),
            shape,
            &to_properties(viewer_transform),
            &viewer_shape.0,
            CONTACT_MARGIN_M,
        )
    })
}

fn pre_tick(
    network: Res<SimulatedNetwork>,
    viewer: Option<Single<(&Transform, &ActorShape), With<LocalViewer>>>,
    mut roots: Query<(&Transform, &ActorShape, &mut Smoothed), Without<LocalViewer>>,
) {
    let viewer = viewer.as_deref().map(|(t, s)| (*t, *s));
    for (transform, shape, mut smoothed) in &mut roots {
        let host = RootHost {
            root: to_properties(transform),
            network: &network,
            colliding: viewer_collides(transform, &shape.0, viewer),
        };
        smoothed.smoother.on_pre_tick(&host);
    }
}

fn post_tick(
    network: Res<SimulatedNetwork>,
    viewer: Option<Single<(&Transform, &ActorShape), With<LocalViewer>>>,
    mut roots: Query<(&Transform, &ActorShape, &mut Smoothed), Without<LocalViewer>>,
) {
    let viewer = viewer.as_deref().map(|(t, s)| (*t, *s));
    for (transform, shape, mut smoothed) in &mut roots {
        let host = RootHost {
            root: to_properties(transform),
            network: &network,
            colliding: viewer_collides(transform, &shape.0, viewer),
        };
        if let Some(outcome) = smoothed.smoother.on_post_tick(&host) {
            trace!("Post tick {}: {outcome:?}", network.tick);
        }
    }
}

/// Rolls the root back and re-simulates the reconcile window with the corrected path,
/// feeding every replayed step to the smoother.
fn replay(
    network: Res<SimulatedNetwork>,
    mut roots: Query<(&mut Transform, &mut RemoteRoot, &mut Smoothed)>,
) {
    let Some(window) = network.replay_window() else {
        return;
    };

    for (mut transform, mut root, mut smoothed) in &mut roots {
        root.correction += window.correction;
        for tick in window.from..=window.to {
            smoothed.smoother.on_pre_replay(tick);
            *transform = root_pose(tick, root.correction);
            let host = RootHost {
                root: to_properties(&transform),
                network: &network,
                colliding: false,
            };
            if let Some(outcome) = smoothed.smoother.on_post_replay(&host, tick) {
                debug!("Replayed tick {tick}: {outcome:?}");
            }
        }
    }
}

fn update_graphical(
    time: Res<Time>,
    network: Res<SimulatedNetwork>,
    mut roots: Query<(&Transform, &mut Smoothed), Without<SmoothedGraphical>>,
    mut graphicals: Query<&mut Transform, With<SmoothedGraphical>>,
) {
    for (transform, mut smoothed) in &mut roots {
        let host = RootHost {
            root: to_properties(transform),
            network: &network,
            colliding: false,
        };
        smoothed.smoother.update(&host, time.delta_secs());

        let Ok(mut graphical) = graphicals.get_mut(smoothed.graphical) else {
            continue;
        };
        apply_properties(smoothed.smoother.graphical(), &mut graphical);
    }
}
