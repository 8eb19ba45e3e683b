//! Goal queue: the current goal plus the FIFO of pending goals, oldest first.
//!
//! # Invariants
//! - The current goal is stored by value and is never part of `pending`.
//! - Pending `local_tick` values strictly increase and all exceed the current goal's tick.
//!
//! Appends that would break ordering are either dropped (fresh simulation steps) or rebuild
//! the tail of the queue (replays), see [`GoalQueue::append_goal_for_tick`].

use std::collections::VecDeque;

use crate::{
    constants::{EXCESSIVE_GOAL_COUNT, TRIM_BUFFER_MULTIPLIER},
    goal::{GoalData, GoalHandle, GoalPool},
    rates::{RateParams, calculate_rates},
    ticks::{SETTLED_TICK, Tick},
    transform::TransformProperties,
};

/// Outcome of [`GoalQueue::append_goal_for_tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalAppend {
    /// A new goal was queued.
    Appended,
    /// Pending goals at or after the tick were discarded, then the new goal was queued.
    Replaced,
    /// The tick matched the current goal: every pending goal was discarded.
    Cleared,
    /// The transform did not change on a reliable snapshot; nothing was queued.
    Settled,
    /// The tick was not newer than the queue; nothing changed.
    Stale,
}

#[derive(Debug, Default)]
pub struct GoalQueue {
    pool: GoalPool,
    pending: VecDeque<GoalHandle>,
    current: GoalData,
}

impl GoalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> &GoalData {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut GoalData {
        &mut self.current
    }

    /// Number of pending goals (the current goal is not counted).
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending goals, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &GoalData> {
        self.pending.iter().map(|&handle| self.pool.get(handle))
    }

    /// Tick of the newest pending goal.
    pub fn newest_tick(&self) -> Option<Tick> {
        self.newest_goal().map(|goal| goal.local_tick)
    }

    fn newest_goal(&self) -> Option<&GoalData> {
        self.pending.back().map(|&handle| self.pool.get(handle))
    }

    /// Goal a replayed tick moves away from: the newest surviving pending goal, else the
    /// current goal once one has been consumed.
    fn replay_reference(&self) -> Option<GoalData> {
        self.newest_goal()
            .copied()
            .or_else(|| (self.current.local_tick != SETTLED_TICK).then_some(self.current))
    }

    #[inline]
    pub fn pool(&self) -> &GoalPool {
        &self.pool
    }

    /// Moves the oldest pending goal into the current slot.
    ///
    /// Returns false and invalidates the current goal when nothing is pending; the caller
    /// should hold position.
    pub fn advance_to_next_goal(&mut self) -> bool {
        let Some(handle) = self.pending.pop_front() else {
            self.current.is_valid = false;
            return false;
        };

        self.current = *self.pool.get(handle);
        self.current.is_valid = true;
        self.pool.store(handle);
        true
    }

    /// Returns every pending goal to the pool, and the current goal too if `clear_current`.
    pub fn clear(&mut self, clear_current: bool) {
        if clear_current {
            self.current.reset();
        }
        for handle in self.pending.drain(..) {
            self.pool.store(handle);
        }
    }

    /// Discards pending goals whose tick is at or after `tick`. Returns how many were removed.
    fn truncate_from(&mut self, tick: Tick) -> usize {
        let keep = self
            .pending
            .iter()
            .position(|&handle| self.pool.get(handle).local_tick >= tick)
            .unwrap_or(self.pending.len());

        let removed = self.pending.len() - keep;
        for handle in self.pending.drain(keep..) {
            self.pool.store(handle);
        }
        removed
    }

    /// Reports a runaway queue and, if `trim` is set, drops the oldest goals beyond
    /// `max(current_interpolation, 1) * TRIM_BUFFER_MULTIPLIER`.
    ///
    /// Returns how many goals were dropped.
    pub fn check_excessive(&mut self, current_interpolation: u32, trim: bool) -> usize {
        let count = self.pending.len();
        if count > EXCESSIVE_GOAL_COUNT {
            log::warn!("Goal queue is getting large: {count} pending goals");
        }
        if !trim {
            return 0;
        }

        let allowance = (current_interpolation.max(1) as usize) * TRIM_BUFFER_MULTIPLIER;
        let excess = count.saturating_sub(allowance);
        for handle in self.pending.drain(..excess) {
            self.pool.store(handle);
        }
        if excess > 0 {
            log::debug!("Trimmed {excess} goals down to {allowance}");
        }
        excess
    }

    /// Turns a simulated transform for `tick` into a queued goal.
    ///
    /// - `previous`: root transform after the prior simulation step (reference for rates).
    ///   When a replay rebuilds the tail, the goal queued just before `tick` is used instead.
    /// - `next`: root transform sampled now.
    /// - `fresh`: true for a new simulation step, false for a replayed one.
    ///
    /// Stale ticks on a fresh step indicate a host sequencing bug and are reported. On a
    /// replay, a tick equal to the current goal's tick clears the pending queue so it can be
    /// rebuilt from the replayed steps.
    pub fn append_goal_for_tick(
        &mut self,
        tick: Tick,
        fresh: bool,
        previous: TransformProperties,
        next: TransformProperties,
        params: &RateParams,
    ) -> GoalAppend {
        let current_tick = self.current.local_tick;
        if tick <= current_tick {
            if fresh {
                log::error!(
                    "Tick {tick} is an old goal on post tick. Current goal tick {current_tick}"
                );
            } else if tick == current_tick {
                log::debug!(
                    "Replay of tick {tick} clears {} pending goals",
                    self.pending.len()
                );
                self.clear(false);
                return GoalAppend::Cleared;
            }
            return GoalAppend::Stale;
        }

        let mut outcome = GoalAppend::Appended;
        let mut previous = GoalData {
            is_valid: true,
            local_tick: tick.saturating_sub(1),
            transform: previous,
            ..Default::default()
        };
        if let Some(newest) = self.newest_tick() {
            if tick <= newest {
                if fresh {
                    log::error!("Tick {tick} is not newer than queued tick {newest} on post tick");
                    return GoalAppend::Stale;
                }
                let removed = self.truncate_from(tick);
                log::debug!("Replay of tick {tick} replaces {removed} pending goals");
                // `previous` was sampled after the newest discarded tick. The goal just
                // before `tick` is the real starting point.
                if let Some(reference) = self.replay_reference() {
                    previous = reference;
                }
                outcome = GoalAppend::Replaced;
            }
        }

        let mut next = GoalData {
            is_valid: true,
            local_tick: tick,
            transform: next,
            ..Default::default()
        };
        calculate_rates(&previous, &mut next, params);

        if next.local_tick == SETTLED_TICK {
            return GoalAppend::Settled;
        }

        let handle = self.pool.retrieve();
        *self.pool.get_mut(handle) = next;
        self.pending.push_back(handle);
        outcome
    }
}
