//! Adaptive interpolation delay, in ticks.
//!
//! Two targets are derived from the measured round-trip time: a larger one used while the
//! object moves freely, and a smaller one used while it collides with the local client.
//! The current value walks toward the applicable target by a configured step every
//! simulation step and is always clamped between them.

use crate::{
    constants::PING_CHANGE_THRESHOLD_MS,
    settings::SmoothingSettings,
    ticks::{TickRounding, time_to_ticks},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterpolationController {
    current: u32,
    target: u32,
    target_collision: u32,
    last_ping: Option<u64>,
}

impl InterpolationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffering delay in ticks.
    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Target delay while not colliding.
    #[inline]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Target delay while colliding with the local client.
    #[inline]
    pub fn target_collision(&self) -> u32 {
        self.target_collision
    }

    #[inline]
    pub fn last_ping(&self) -> Option<u64> {
        self.last_ping
    }

    /// Recomputes the targets if the round-trip time moved by more than
    /// [`PING_CHANGE_THRESHOLD_MS`] since the last call. Returns true if it did.
    pub fn update_ping(
        &mut self,
        rtt_ms: u64,
        tick_delta: f64,
        settings: &SmoothingSettings,
    ) -> bool {
        let changed = match self.last_ping {
            Some(last) => rtt_ms.abs_diff(last) > PING_CHANGE_THRESHOLD_MS,
            None => true,
        };
        self.last_ping = Some(rtt_ms);

        if changed {
            self.set_targets(rtt_ms, tick_delta, settings, None);
        }
        changed
    }

    /// Recomputes both targets from `rtt_ms`.
    ///
    /// With `immediately = Some(colliding)` the current value jumps to the applicable target
    /// instead of walking there over the following steps.
    pub fn set_targets(
        &mut self,
        rtt_ms: u64,
        tick_delta: f64,
        settings: &SmoothingSettings,
        immediately: Option<bool>,
    ) {
        let rtt_secs = rtt_ms as f64 / 1000.0;
        self.target = time_to_ticks(
            rtt_secs * settings.interpolation_percent as f64,
            tick_delta,
            TickRounding::Up,
        );
        self.target_collision = time_to_ticks(
            rtt_secs * settings.collision_interpolation_percent as f64,
            tick_delta,
            TickRounding::Up,
        );
        log::debug!(
            "Interpolation targets for {rtt_ms}ms: {} ticks, {} ticks colliding",
            self.target,
            self.target_collision
        );

        if let Some(colliding) = immediately {
            self.current = if colliding {
                self.target_collision
            } else {
                self.target
            };
        }
        self.current = self.clamp(self.current as i64);
    }

    /// Walks the current value one step toward the applicable target.
    pub fn advance(&mut self, colliding: bool, settings: &SmoothingSettings) {
        let current = self.current as i64;
        let next = if colliding {
            current - settings.interpolation_decrease_step as i64
        } else {
            current + settings.interpolation_increase_step as i64
        };
        self.current = self.clamp(next);
    }

    /// Clamps into `[target_collision, target]`, checking the lower bound first so a
    /// misordered pair never panics.
    fn clamp(&self, value: i64) -> u32 {
        if value < self.target_collision as i64 {
            self.target_collision
        } else if value > self.target as i64 {
            self.target
        } else {
            value as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK_DELTA: f64 = 0.02;

    fn settings(percent: f32, collision_percent: f32) -> SmoothingSettings {
        SmoothingSettings {
            interpolation_percent: percent,
            collision_interpolation_percent: collision_percent,
            ..Default::default()
        }
    }

    #[test]
    fn targets_round_up_to_cover_rtt() {
        let mut controller = InterpolationController::new();
        controller.set_targets(100, TICK_DELTA, &settings(1.0, 0.25), None);

        // ceil(0.1 / 0.02) and ceil(0.025 / 0.02).
        assert_eq!(controller.target(), 5);
        assert_eq!(controller.target_collision(), 2);
    }

    #[test]
    fn first_ping_always_retargets() {
        let mut controller = InterpolationController::new();
        assert!(controller.update_ping(100, TICK_DELTA, &settings(1.0, 0.25)));
        assert_eq!(controller.last_ping(), Some(100));
        assert_eq!(controller.target(), 5);
    }

    #[test]
    fn small_ping_changes_are_ignored() {
        let s = settings(1.0, 0.25);
        let mut controller = InterpolationController::new();
        controller.update_ping(100, TICK_DELTA, &s);

        // Exactly at the threshold is not "more than".
        assert!(!controller.update_ping(125, TICK_DELTA, &s));
        assert_eq!(controller.target(), 5);

        // Compared against the previous sample, not the last retarget.
        assert!(!controller.update_ping(150, TICK_DELTA, &s));
        assert_eq!(controller.target(), 5);

        assert!(controller.update_ping(200, TICK_DELTA, &s));
        assert_eq!(controller.target(), 10);
    }

    #[test]
    fn advance_walks_toward_applicable_target() {
        let s = settings(1.0, 0.25);
        let mut controller = InterpolationController::new();
        controller.set_targets(100, TICK_DELTA, &s, None);
        assert_eq!(controller.current(), 2);

        for expected in 3..=5 {
            controller.advance(false, &s);
            assert_eq!(controller.current(), expected);
        }
        controller.advance(false, &s);
        assert_eq!(controller.current(), 5);

        for _ in 0..10 {
            controller.advance(true, &s);
        }
        assert_eq!(controller.current(), 2);
    }

    #[test]
    fn set_immediately_jumps_to_target() {
        let s = settings(1.0, 0.25);
        let mut controller = InterpolationController::new();

        controller.set_targets(200, TICK_DELTA, &s, Some(false));
        assert_eq!(controller.current(), 10);

        controller.set_targets(200, TICK_DELTA, &s, Some(true));
        assert_eq!(controller.current(), 3);
    }

    #[test]
    fn current_stays_within_targets_as_ping_moves() {
        let s = SmoothingSettings {
            interpolation_increase_step: 3,
            interpolation_decrease_step: 2,
            ..settings(1.0, 0.3)
        };
        let mut controller = InterpolationController::new();

        let pings = [40u64, 300, 80, 500, 20, 20, 260, 0, 120];
        for (i, &ping) in pings.iter().cycle().take(200).enumerate() {
            controller.update_ping(ping, TICK_DELTA, &s);
            assert!(controller.target_collision() <= controller.current());
            assert!(controller.current() <= controller.target());

            controller.advance(i % 3 == 0, &s);
            assert!(controller.target_collision() <= controller.current());
            assert!(controller.current() <= controller.target());
        }
    }
}
