//! Simulated network conditions for the remote actor.
//!
//! There is no transport here: the tick counter, a slowly oscillating round-trip time and a
//! periodic reconcile window stand in for what a prediction framework would report.

use std::f64::consts::TAU;

use bevy::prelude::*;
use smoothing::Tick;

pub const TICK_RATE_HZ: f64 = 50.0;

const BASE_RTT_MS: f64 = 120.0;
const RTT_SWING_MS: f64 = 90.0;
const RTT_PERIOD_SECS: f64 = 12.0;

/// A reconcile is simulated every this many ticks.
const RECONCILE_INTERVAL_TICKS: Tick = 75;
/// How many ticks each reconcile rolls back.
const RECONCILE_DEPTH_TICKS: Tick = 4;
/// Radial correction the server "disagrees" by, in meters. Alternates sign.
const RECONCILE_CORRECTION_M: f32 = 0.15;

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(Time::<Fixed>::from_hz(TICK_RATE_HZ));
    app.init_resource::<SimulatedNetwork>();
    app.add_systems(FixedFirst, advance_tick);
    app.add_systems(Update, update_round_trip_time);
}

#[derive(Resource, Debug)]
pub struct SimulatedNetwork {
    /// Tick of the current (or last completed) simulation step.
    pub tick: Tick,
    pub rtt_ms: u64,
    pub tick_delta: f64,
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self {
            tick: 0,
            rtt_ms: BASE_RTT_MS as u64,
            tick_delta: 1.0 / TICK_RATE_HZ,
        }
    }
}

/// Ticks to replay after the current step, and the correction the replay applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayWindow {
    pub from: Tick,
    pub to: Tick,
    pub correction: f32,
}

impl SimulatedNetwork {
    /// Reconcile due after the current tick, if any.
    pub fn replay_window(&self) -> Option<ReplayWindow> {
        if self.tick == 0 || self.tick % RECONCILE_INTERVAL_TICKS != 0 {
            return None;
        }

        let correction = if (self.tick / RECONCILE_INTERVAL_TICKS) % 2 == 0 {
            RECONCILE_CORRECTION_M
        } else {
            -RECONCILE_CORRECTION_M
        };
        Some(ReplayWindow {
            from: self.tick.saturating_sub(RECONCILE_DEPTH_TICKS).max(1),
            to: self.tick,
            correction,
        })
    }
}

fn advance_tick(mut network: ResMut<SimulatedNetwork>) {
    network.tick += 1;
}

fn update_round_trip_time(time: Res<Time>, mut network: ResMut<SimulatedNetwork>) {
    let phase = time.elapsed_secs_f64() / RTT_PERIOD_SECS * TAU;
    network.rtt_ms = (BASE_RTT_MS + RTT_SWING_MS * phase.sin()).max(0.0) as u64;
}
