/*!
Adaptive interpolation smoother for a remotely simulated object.

The host drives a smoother through five hooks:
- `on_pre_tick` / `on_post_tick`: bracket every fixed simulation step
- `on_pre_replay` / `on_post_replay`: bracket every replayed step during reconciliation
- `update`: once per rendered frame

After each step the root transform is turned into a goal and queued. Frames then walk the
graphical transform through the queue, staying roughly `current_interpolation` ticks
behind the simulation. Replays rebuild the tail of the queue from the corrected steps.

The graphical transform is owned by the smoother; hosts copy it onto their visual object
after `update` and push external changes back with `set_graphical`.
*/

use crate::{
    goal::GoalData,
    interpolation::InterpolationController,
    motion::{MoveToTargetParams, move_to_target},
    queue::{GoalAppend, GoalQueue},
    rates::{Channel, RateParams},
    settings::SmoothingSettings,
    ticks::Tick,
    transform::TransformProperties,
};

/// What the smoother needs from the object it is attached to and the tick system
/// driving it.
pub trait SmoothingHost {
    /// World transform of the simulated root.
    fn root_transform(&self) -> TransformProperties;
    /// Tick the last simulation step was run for.
    fn replicate_tick(&self) -> Tick;
    /// Current round-trip time in milliseconds.
    fn round_trip_time_ms(&self) -> u64;
    /// Length of one tick in seconds.
    fn tick_delta(&self) -> f64;
    fn is_owner(&self) -> bool;
    fn is_server_only(&self) -> bool;
    /// True while the object touches the local client's own object.
    fn colliding_with_local_client(&self) -> bool;
    /// Channel the latest snapshot arrived on.
    fn snapshot_channel(&self) -> Channel {
        Channel::Unreliable
    }
}

/// Where in the tick cycle the smoother currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TickPhase {
    #[default]
    Idle,
    /// Between `on_pre_tick` and `on_post_tick`.
    Ticking,
    /// Between `on_pre_replay` and `on_post_replay`.
    Replaying,
}

#[derive(Debug)]
pub struct AdaptiveInterpolationSmoother {
    settings: SmoothingSettings,
    interpolation: InterpolationController,
    queue: GoalQueue,
    /// Visual transform written every frame.
    graphical: TransformProperties,
    /// Graphical transform relative to the root when the graphical object was assigned.
    graphical_initialized_offsets: TransformProperties,
    /// Graphical transform captured before the current simulation step.
    graphical_pretick: TransformProperties,
    /// Root transform after the most recent simulated or replayed step.
    root_post_simulate: TransformProperties,
    post_simulate_tick: Tick,
    phase: TickPhase,
    /// Set by a post tick, cleared by the first replay after it.
    did_post_tick: bool,
}

impl AdaptiveInterpolationSmoother {
    /// Creates a smoother for a graphical object currently at `graphical`, attached to a
    /// root currently at `root`.
    pub fn new(
        settings: SmoothingSettings,
        graphical: TransformProperties,
        root: TransformProperties,
    ) -> Result<Self, &'static str> {
        settings.validate()?;

        let mut smoother = Self {
            settings,
            interpolation: InterpolationController::new(),
            queue: GoalQueue::new(),
            graphical,
            graphical_initialized_offsets: TransformProperties::default(),
            graphical_pretick: graphical,
            root_post_simulate: root,
            post_simulate_tick: 0,
            phase: TickPhase::Idle,
            did_post_tick: false,
        };
        smoother.set_graphical_object(graphical, root);
        Ok(smoother)
    }

    /// Smoothing only runs for objects observed from a non-authoritative viewer.
    #[inline]
    pub fn can_smooth(host: &impl SmoothingHost) -> bool {
        !host.is_owner() && !host.is_server_only()
    }

    /// Called once per frame.
    pub fn update(&mut self, host: &impl SmoothingHost, delta: f32) {
        if !Self::can_smooth(host) {
            return;
        }

        move_to_target(
            &mut self.graphical,
            &mut self.queue,
            MoveToTargetParams {
                current_interpolation: self.interpolation.current(),
                axes: self.settings.axes(),
                delta,
            },
        );
    }

    /// Called before each simulation step.
    pub fn on_pre_tick(&mut self, host: &impl SmoothingHost) {
        self.phase = TickPhase::Ticking;
        if !Self::can_smooth(host) {
            return;
        }

        self.interpolation
            .update_ping(host.round_trip_time_ms(), host.tick_delta(), &self.settings);
        self.graphical_pretick = self.graphical;
    }

    /// Called after each simulation step. Returns how the new goal was queued, or `None`
    /// if the object is not smoothed.
    pub fn on_post_tick(&mut self, host: &impl SmoothingHost) -> Option<GoalAppend> {
        self.phase = TickPhase::Idle;
        if !Self::can_smooth(host) {
            return None;
        }

        self.interpolation
            .advance(host.colliding_with_local_client(), &self.settings);
        // Undo anything that moved the graphical object during the step.
        self.graphical = self.graphical_pretick;

        let tick = host.replicate_tick();
        log::trace!(
            "Post tick {tick}: {} pending goals, interpolation {}",
            self.queue.len(),
            self.interpolation.current()
        );
        let outcome = self.append_post_simulate_goal(host, tick, true);
        self.update_root_post_simulate(host, tick);
        self.did_post_tick = true;
        Some(outcome)
    }

    /// Called before a reconcile replays `tick`.
    pub fn on_pre_replay(&mut self, tick: Tick) {
        self.phase = TickPhase::Replaying;
        if self.did_post_tick {
            self.did_post_tick = false;
            log::debug!("Replaying from tick {tick}");
        }
    }

    /// Called after a reconcile replayed `tick`.
    ///
    /// Every replayed step produces a goal again: if the replay corrected a desync the
    /// queued goals would otherwise be wrong.
    pub fn on_post_replay(&mut self, host: &impl SmoothingHost, tick: Tick) -> Option<GoalAppend> {
        self.phase = TickPhase::Idle;
        if !Self::can_smooth(host) {
            return None;
        }

        let outcome = self.append_post_simulate_goal(host, tick, false);
        self.update_root_post_simulate(host, tick);
        Some(outcome)
    }

    /// Recomputes the interpolation targets from the host's round-trip time.
    ///
    /// With `set_immediately` the current interpolation jumps to the applicable target.
    pub fn set_target_smoothing(&mut self, host: &impl SmoothingHost, set_immediately: bool) {
        let colliding = set_immediately.then(|| host.colliding_with_local_client());
        self.interpolation.set_targets(
            host.round_trip_time_ms(),
            host.tick_delta(),
            &self.settings,
            colliding,
        );
    }

    /// Assigns a new graphical object and records its offset from the root.
    pub fn set_graphical_object(
        &mut self,
        graphical: TransformProperties,
        root: TransformProperties,
    ) {
        self.graphical = graphical;
        self.graphical_pretick = graphical;
        self.graphical_initialized_offsets = graphical.local_to(&root);
    }

    /// Snaps the graphical object back to its initialized offset under `root` and drops
    /// every goal.
    pub fn reset_graphical_to_root(&mut self, root: TransformProperties) {
        self.queue.clear(true);
        self.graphical = self.graphical_initialized_offsets.under(&root);
        self.graphical_pretick = self.graphical;
        self.root_post_simulate = root;
    }

    #[inline]
    pub fn graphical(&self) -> &TransformProperties {
        &self.graphical
    }

    /// Overrides the graphical transform, e.g. after the host moved the visual object.
    #[inline]
    pub fn set_graphical(&mut self, graphical: TransformProperties) {
        self.graphical = graphical;
    }

    #[inline]
    pub fn settings(&self) -> &SmoothingSettings {
        &self.settings
    }

    #[inline]
    pub fn interpolation(&self) -> &InterpolationController {
        &self.interpolation
    }

    #[inline]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_goals(&self) -> impl Iterator<Item = &GoalData> {
        self.queue.pending()
    }

    /// Goal currently being moved toward, if any.
    pub fn current_goal(&self) -> Option<&GoalData> {
        let current = self.queue.current();
        current.is_valid.then_some(current)
    }

    #[inline]
    pub fn post_simulate_tick(&self) -> Tick {
        self.post_simulate_tick
    }

    #[inline]
    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    fn update_root_post_simulate(&mut self, host: &impl SmoothingHost, tick: Tick) {
        self.root_post_simulate = host.root_transform();
        self.post_simulate_tick = tick;
    }

    /// Root transform placed at the graphical object's offset, with axes that are not
    /// smoothed pinned to the pre-tick graphical values.
    fn goal_transform(&self, root: &TransformProperties) -> TransformProperties {
        let mut transform = self.graphical_initialized_offsets.under(root);
        if !self.settings.smooth_position {
            transform.position = self.graphical_pretick.position;
        }
        if !self.settings.smooth_rotation {
            transform.rotation = self.graphical_pretick.rotation;
        }
        transform
    }

    fn append_post_simulate_goal(
        &mut self,
        host: &impl SmoothingHost,
        tick: Tick,
        fresh: bool,
    ) -> GoalAppend {
        self.queue.check_excessive(
            self.interpolation.current(),
            self.settings.trim_excessive_goals,
        );

        let previous = self.goal_transform(&self.root_post_simulate);
        let next = self.goal_transform(&host.root_transform());
        let params = RateParams {
            channel: host.snapshot_channel(),
            tick_delta: host.tick_delta(),
            teleport_threshold: self.settings.teleport_threshold,
        };
        self.queue
            .append_goal_for_tick(tick, fresh, previous, next, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rates::Rate,
        transform::{Quat, Vec3},
    };

    struct TestHost {
        root: TransformProperties,
        tick: Tick,
        rtt_ms: u64,
        owner: bool,
        server_only: bool,
        colliding: bool,
    }

    impl Default for TestHost {
        fn default() -> Self {
            Self {
                root: TransformProperties::default(),
                tick: 0,
                rtt_ms: 100,
                owner: false,
                server_only: false,
                colliding: false,
            }
        }
    }

    impl SmoothingHost for TestHost {
        fn root_transform(&self) -> TransformProperties {
            self.root
        }
        fn replicate_tick(&self) -> Tick {
            self.tick
        }
        fn round_trip_time_ms(&self) -> u64 {
            self.rtt_ms
        }
        fn tick_delta(&self) -> f64 {
            0.02
        }
        fn is_owner(&self) -> bool {
            self.owner
        }
        fn is_server_only(&self) -> bool {
            self.server_only
        }
        fn colliding_with_local_client(&self) -> bool {
            self.colliding
        }
    }

    fn smoother(settings: SmoothingSettings) -> AdaptiveInterpolationSmoother {
        AdaptiveInterpolationSmoother::new(
            settings,
            TransformProperties::default(),
            TransformProperties::default(),
        )
        .unwrap()
    }

    /// Simulates `tick` with the root moved to `x`.
    fn step(smoother: &mut AdaptiveInterpolationSmoother, host: &mut TestHost, tick: Tick, x: f32) {
        host.tick = tick;
        smoother.on_pre_tick(host);
        host.root.position.x = x;
        smoother.on_post_tick(host);
    }

    fn pending_ticks(smoother: &AdaptiveInterpolationSmoother) -> Vec<Tick> {
        smoother.pending_goals().map(|goal| goal.local_tick).collect()
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = SmoothingSettings {
            interpolation_percent: -1.0,
            ..Default::default()
        };
        let result = AdaptiveInterpolationSmoother::new(
            settings,
            TransformProperties::default(),
            TransformProperties::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn owned_and_server_only_objects_are_not_smoothed() {
        for mut host in [
            TestHost {
                owner: true,
                ..Default::default()
            },
            TestHost {
                server_only: true,
                ..Default::default()
            },
        ] {
            let mut smoother = smoother(SmoothingSettings::default());
            host.tick = 1;
            smoother.on_pre_tick(&host);
            host.root.position.x = 5.0;

            assert_eq!(smoother.on_post_tick(&host), None);
            smoother.update(&host, 0.1);

            assert_eq!(smoother.queue_len(), 0);
            assert_eq!(smoother.graphical().position.x, 0.0);
        }
    }

    #[test]
    fn post_ticks_queue_goals_and_frames_consume_them() {
        let mut smoother = smoother(SmoothingSettings::default());
        let mut host = TestHost::default();

        for tick in 1..=3 {
            step(&mut smoother, &mut host, tick, tick as f32);
        }

        assert_eq!(pending_ticks(&smoother), vec![1, 2, 3]);
        assert_eq!(smoother.post_simulate_tick(), 3);
        // 100ms at 20ms ticks, starting from the collision target of 1.
        assert_eq!(smoother.interpolation().target(), 5);
        assert_eq!(smoother.interpolation().current(), 4);

        smoother.update(&host, 0.02);

        assert_eq!(smoother.current_goal().map(|g| g.local_tick), Some(1));
        assert_eq!(smoother.queue_len(), 2);
        let x = smoother.graphical().position.x;
        assert!(x > 0.0 && x < 1.0, "x = {x}");
    }

    #[test]
    fn replay_rebuilds_queue_from_corrected_steps() {
        let mut smoother = smoother(SmoothingSettings::default());
        let mut host = TestHost::default();
        for tick in 1..=5 {
            step(&mut smoother, &mut host, tick, tick as f32);
        }
        smoother.update(&host, 0.001);
        assert_eq!(smoother.current_goal().map(|g| g.local_tick), Some(1));

        // Reconcile back to tick 1, then replay 2..=5 with a corrected path.
        smoother.on_pre_replay(1);
        assert_eq!(smoother.phase(), TickPhase::Replaying);
        host.root.position.x = 1.0;
        assert_eq!(smoother.on_post_replay(&host, 1), Some(GoalAppend::Cleared));
        assert_eq!(smoother.queue_len(), 0);

        for tick in 2..=5 {
            smoother.on_pre_replay(tick);
            host.root.position.x = tick as f32 + 0.5;
            assert_eq!(
                smoother.on_post_replay(&host, tick),
                Some(GoalAppend::Appended)
            );
        }

        assert_eq!(pending_ticks(&smoother), vec![2, 3, 4, 5]);
        let last = smoother.pending_goals().last().map(|g| g.transform.position.x);
        assert_eq!(last, Some(5.5));
        assert_eq!(smoother.phase(), TickPhase::Idle);
        assert_eq!(smoother.post_simulate_tick(), 5);
    }

    #[test]
    fn replay_inside_queue_keeps_steady_speed() {
        let mut smoother = smoother(SmoothingSettings::default());
        let mut host = TestHost::default();
        // 0.1m per 20ms tick.
        for tick in 1..=8 {
            step(&mut smoother, &mut host, tick, tick as f32 * 0.1);
        }

        smoother.on_pre_replay(5);
        host.root.position.x = 0.5;
        assert_eq!(
            smoother.on_post_replay(&host, 5),
            Some(GoalAppend::Replaced)
        );

        assert_eq!(pending_ticks(&smoother), vec![1, 2, 3, 4, 5]);
        let replayed = smoother.pending_goals().last().copied().unwrap();
        match replayed.move_rates.position {
            Rate::Speed(speed) => assert!((speed - 5.0).abs() < 1e-3, "speed = {speed}"),
            Rate::Instant => panic!("replayed goal snapped"),
        }
    }

    #[test]
    fn graphical_moved_after_queue_drains_is_brought_back() {
        let mut smoother = smoother(SmoothingSettings::default());
        let mut host = TestHost::default();
        step(&mut smoother, &mut host, 1, 1.0);

        smoother.update(&host, 1.0);
        assert_eq!(smoother.graphical().position.x, 1.0);
        assert!(smoother.current_goal().is_none());

        smoother.set_graphical(TransformProperties::from_position(Vec3::new(-5.0, 0.0, 0.0)));
        smoother.update(&host, 0.02);

        assert_eq!(smoother.current_goal().map(|g| g.local_tick), Some(1));
        let x = smoother.graphical().position.x;
        assert!(x > -5.0 && x < 1.0, "x = {x}");
    }

    #[test]
    fn stale_fresh_tick_is_not_queued() {
        let mut smoother = smoother(SmoothingSettings::default());
        let mut host = TestHost::default();
        step(&mut smoother, &mut host, 1, 1.0);
        step(&mut smoother, &mut host, 2, 2.0);

        host.tick = 2;
        smoother.on_pre_tick(&host);
        assert_eq!(smoother.on_post_tick(&host), Some(GoalAppend::Stale));
        assert_eq!(pending_ticks(&smoother), vec![1, 2]);
    }

    #[test]
    fn unsmoothed_rotation_keeps_pretick_graphical_rotation() {
        let mut smoother = smoother(SmoothingSettings {
            smooth_rotation: false,
            ..Default::default()
        });
        let mut host = TestHost::default();

        host.tick = 1;
        smoother.on_pre_tick(&host);
        host.root.rotation = Quat::from_axis_angle(&Vec3::y_axis(), 1.0);
        host.root.position.x = 1.0;
        smoother.on_post_tick(&host);

        let goal = smoother.pending_goals().next().copied().unwrap();
        assert_eq!(goal.transform.rotation, Quat::identity());
        assert_eq!(goal.transform.position.x, 1.0);
    }

    #[test]
    fn goals_keep_the_graphical_offset_from_root() {
        let offset = Vec3::new(0.0, 1.5, 0.0);
        let mut smoother = AdaptiveInterpolationSmoother::new(
            SmoothingSettings::default(),
            TransformProperties::from_position(offset),
            TransformProperties::default(),
        )
        .unwrap();
        let mut host = TestHost::default();

        step(&mut smoother, &mut host, 1, 2.0);

        let goal = smoother.pending_goals().next().copied().unwrap();
        assert_eq!(goal.transform.position, Vec3::new(2.0, 1.5, 0.0));

        host.root.position.x = 10.0;
        smoother.reset_graphical_to_root(host.root);
        assert_eq!(smoother.graphical().position, Vec3::new(10.0, 1.5, 0.0));
        assert_eq!(smoother.queue_len(), 0);
        assert!(smoother.current_goal().is_none());
    }

    #[test]
    fn set_target_smoothing_immediately_uses_collision_target() {
        let mut smoother = smoother(SmoothingSettings {
            collision_interpolation_percent: 0.25,
            ..Default::default()
        });
        let host = TestHost {
            rtt_ms: 200,
            colliding: true,
            ..Default::default()
        };

        smoother.set_target_smoothing(&host, true);
        // ceil(0.2 * 0.25 / 0.02)
        assert_eq!(smoother.interpolation().current(), 3);

        let host = TestHost {
            colliding: false,
            ..host
        };
        smoother.set_target_smoothing(&host, true);
        assert_eq!(smoother.interpolation().current(), 10);
    }
}
