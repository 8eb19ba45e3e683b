//! Goal records and the arena they are recycled through.
//!
//! # Model
//! - A [`GoalData`] is one simulation step's worth of remote motion: the transform to reach
//!   and the [`RateData`] to reach it with.
//! - Goals live in a [`GoalPool`] arena and are referenced by [`GoalHandle`]. Handles are
//!   plain indices; a stored handle must not be used again until it is retrieved anew.
//! - Returning a goal resets every field, so a recycled slot never leaks stale data.

use crate::{rates::RateData, ticks::Tick, transform::TransformProperties};

/// Data on a goal to move towards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GoalData {
    /// True while this record represents live work.
    pub is_valid: bool,
    /// Local tick this goal is for.
    pub local_tick: Tick,
    /// Transform values to move towards.
    pub transform: TransformProperties,
    /// How fast to move to the transform values.
    pub move_rates: RateData,
}

impl GoalData {
    /// Resets values for re-use.
    pub fn reset(&mut self) {
        self.is_valid = false;
        self.local_tick = 0;
        self.transform.reset();
        self.move_rates.reset();
    }
}

/// Index of a slot in a [`GoalPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GoalHandle(usize);

/// Arena of reusable [`GoalData`] slots with a free list.
#[derive(Debug, Default)]
pub struct GoalPool {
    slots: Vec<GoalData>,
    free: Vec<GoalHandle>,
}

impl GoalPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a reset slot, growing the arena if none are free.
    pub fn retrieve(&mut self) -> GoalHandle {
        if let Some(handle) = self.free.pop() {
            return handle;
        }
        self.slots.push(GoalData::default());
        GoalHandle(self.slots.len() - 1)
    }

    /// Resets the slot and returns it to the free list.
    pub fn store(&mut self, handle: GoalHandle) {
        debug_assert!(
            !self.free.contains(&handle),
            "goal slot {} stored twice",
            handle.0
        );
        self.slots[handle.0].reset();
        self.free.push(handle);
    }

    #[inline]
    pub fn get(&self, handle: GoalHandle) -> &GoalData {
        &self.slots[handle.0]
    }

    #[inline]
    pub fn get_mut(&mut self, handle: GoalHandle) -> &mut GoalData {
        &mut self.slots[handle.0]
    }

    /// Number of slots currently handed out.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
