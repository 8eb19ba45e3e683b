//! Movement rate calculation between two chronologically ordered goals.

use crate::{
    goal::GoalData,
    ticks::{SETTLED_TICK, Tick, ticks_to_time},
    transform::angle_between_degrees,
};

/// Speed toward a goal for a single axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rate {
    /// Snap straight to the goal.
    Instant,
    /// Units (meters or degrees) per second. Zero or negative means "don't move this axis".
    Speed(f32),
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Speed(0.0)
    }
}

impl Rate {
    /// Coerces an exact zero into [`Rate::Instant`].
    ///
    /// A zero here comes from float cancellation on a near-stationary object; snapping
    /// avoids a goal that would otherwise never be reached.
    #[inline]
    fn from_speed(speed: f32) -> Self {
        if speed == 0.0 {
            Rate::Instant
        } else {
            Rate::Speed(speed)
        }
    }
}

/// How fast to move to a goal's transform values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RateData {
    pub position: Rate,
    pub rotation: Rate,
    /// Number of ticks the rates were calculated over.
    pub tick_span: u32,
    /// Seconds left until the goal should be fully reached.
    pub time_remaining: f32,
}

impl RateData {
    /// Rates which reach the goal immediately.
    pub const INSTANT: Self = Self {
        position: Rate::Instant,
        rotation: Rate::Instant,
        tick_span: 1,
        time_remaining: 0.0,
    };

    /// Resets values for re-use.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Delivery channel a snapshot arrived on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Channel {
    /// Reliable/ordered. Duplicates of the last unreliable snapshot are expected here.
    Reliable,
    #[default]
    Unreliable,
}

/// Inputs for [`calculate_rates`] that don't live on the goals themselves.
#[derive(Clone, Copy, Debug)]
pub struct RateParams {
    pub channel: Channel,
    /// Length of one tick in seconds.
    pub tick_delta: f64,
    /// Distance (meters) at or beyond which movement snaps. `None` disables the check.
    pub teleport_threshold: Option<f32>,
}

/// Sets `next.move_rates` so the transform travels from `previous` to `next` in the
/// simulated time between them.
///
/// - Reliable + unchanged transform: rates are copied forward and `next` is marked
///   settled ([`SETTLED_TICK`]).
/// - A jump of `teleport_threshold` or more snaps both axes.
pub fn calculate_rates(previous: &GoalData, next: &mut GoalData, params: &RateParams) {
    if params.channel == Channel::Reliable && !previous.transform.has_changed(&next.transform) {
        log::trace!("Reliable snapshot for tick {} is unchanged", next.local_tick);
        next.move_rates = previous.move_rates;
        next.local_tick = SETTLED_TICK;
        return;
    }

    let last_tick: Tick = if previous.local_tick == SETTLED_TICK {
        next.local_tick.wrapping_sub(1)
    } else {
        previous.local_tick
    };

    let mut tick_span = next.local_tick.wrapping_sub(last_tick);
    if tick_span == 0 || tick_span > next.local_tick {
        log::warn!(
            "Unexpected tick span between {} and {}; assuming one tick",
            last_tick,
            next.local_tick
        );
        tick_span = 1;
    }

    let time_passed = ticks_to_time(tick_span, params.tick_delta) as f32;

    let distance = (next.transform.position - previous.transform.position).norm();
    if let Some(threshold) = params.teleport_threshold {
        if distance >= threshold {
            log::debug!(
                "Tick {} moved {:.3}m, snapping instead of interpolating",
                next.local_tick,
                distance
            );
            next.move_rates = RateData::INSTANT;
            return;
        }
    }

    let angle = angle_between_degrees(&previous.transform.rotation, &next.transform.rotation);

    next.move_rates = RateData {
        position: Rate::from_speed(distance / time_passed),
        rotation: Rate::from_speed(angle / time_passed),
        tick_span,
        time_remaining: time_passed,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Quat, TransformProperties, Vec3};

    const TICK_DELTA: f64 = 0.02;

    fn params(channel: Channel, teleport_threshold: Option<f32>) -> RateParams {
        RateParams {
            channel,
            tick_delta: TICK_DELTA,
            teleport_threshold,
        }
    }

    fn goal(tick: Tick, x: f32, yaw_degrees: f32) -> GoalData {
        GoalData {
            is_valid: true,
            local_tick: tick,
            transform: TransformProperties::new(
                Vec3::new(x, 0.0, 0.0),
                Quat::from_axis_angle(&Vec3::y_axis(), yaw_degrees.to_radians()),
            ),
            move_rates: RateData::default(),
        }
    }

    #[test]
    fn rates_cover_distance_over_elapsed_ticks() {
        let previous = goal(10, 0.0, 0.0);
        let mut next = goal(12, 1.0, 9.0);

        calculate_rates(&previous, &mut next, &params(Channel::Unreliable, None));

        let rd = next.move_rates;
        assert_eq!(rd.tick_span, 2);
        assert!((rd.time_remaining - 0.04).abs() < 1.0e-6);
        match (rd.position, rd.rotation) {
            (Rate::Speed(p), Rate::Speed(r)) => {
                assert!((p - 25.0).abs() < 1.0e-3);
                assert!((r - 225.0).abs() < 1.0e-1);
            }
            other => panic!("expected speeds, got {other:?}"),
        }
    }

    #[test]
    fn reliable_duplicate_is_settled_and_keeps_rates() {
        let mut previous = goal(7, 3.0, 10.0);
        previous.move_rates = RateData {
            position: Rate::Speed(4.0),
            rotation: Rate::Speed(2.0),
            tick_span: 1,
            time_remaining: 0.02,
        };
        let mut next = goal(8, 3.0, 10.0);

        calculate_rates(&previous, &mut next, &params(Channel::Reliable, None));

        assert_eq!(next.local_tick, SETTLED_TICK);
        assert_eq!(next.move_rates, previous.move_rates);
    }

    #[test]
    fn unreliable_duplicate_is_not_settled() {
        let previous = goal(7, 3.0, 10.0);
        let mut next = goal(8, 3.0, 10.0);

        calculate_rates(&previous, &mut next, &params(Channel::Unreliable, None));

        assert_eq!(next.local_tick, 8);
        // Zero movement is coerced into a snap.
        assert_eq!(next.move_rates.position, Rate::Instant);
        assert_eq!(next.move_rates.rotation, Rate::Instant);
    }

    #[test]
    fn teleport_snaps_both_axes_with_single_tick_span() {
        let previous = goal(20, 0.0, 0.0);
        let mut next = goal(21, 50.0, 1.0);

        calculate_rates(&previous, &mut next, &params(Channel::Unreliable, Some(10.0)));

        assert_eq!(next.move_rates.position, Rate::Instant);
        assert_eq!(next.move_rates.rotation, Rate::Instant);
        assert_eq!(next.move_rates.tick_span, 1);
        assert_eq!(next.move_rates.time_remaining, 0.0);
    }

    #[test]
    fn exactly_at_threshold_teleports() {
        let previous = goal(20, 0.0, 0.0);
        let mut next = goal(21, 10.0, 0.0);

        calculate_rates(&previous, &mut next, &params(Channel::Unreliable, Some(10.0)));

        assert_eq!(next.move_rates, RateData::INSTANT);
    }

    #[test]
    fn settled_previous_falls_back_to_one_tick() {
        let previous = goal(SETTLED_TICK, 0.0, 0.0);
        let mut next = goal(40, 0.5, 0.0);

        calculate_rates(&previous, &mut next, &params(Channel::Unreliable, None));

        assert_eq!(next.move_rates.tick_span, 1);
        assert!((next.move_rates.time_remaining - 0.02).abs() < 1.0e-6);
    }

    #[test]
    fn zero_tick_span_falls_back_to_one_tick() {
        let previous = goal(5, 0.0, 0.0);
        let mut next = goal(5, 1.0, 0.0);

        calculate_rates(&previous, &mut next, &params(Channel::Unreliable, None));

        assert_eq!(next.move_rates.tick_span, 1);
        assert_eq!(next.move_rates.position, Rate::Speed(1.0 / 0.02));
    }
}
