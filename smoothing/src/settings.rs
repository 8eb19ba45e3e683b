/*!
Smoother configuration.

Every smoothed object is initialized with a [`SmoothingSettings`]. Defaults come from
`constants.rs`; hosts usually keep one settings value per object archetype and override
from game data.

Notes
- Percentages are fractions of the measured round-trip time (1.0 = one full RTT).
- Steps are in ticks per simulation step.
- Distances are in meters.
*/

use crate::constants::{
    DEFAULT_COLLISION_INTERPOLATION_PERCENT, DEFAULT_INTERPOLATION_DECREASE_STEP,
    DEFAULT_INTERPOLATION_INCREASE_STEP, DEFAULT_INTERPOLATION_PERCENT,
};

/// Which transform axes are smoothed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmoothAxes {
    pub position: bool,
    pub rotation: bool,
}

impl SmoothAxes {
    pub const ALL: Self = Self {
        position: true,
        rotation: true,
    };
}

impl Default for SmoothAxes {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingSettings {
    /// Smooth the graphical position.
    pub smooth_position: bool,
    /// Smooth the graphical rotation.
    pub smooth_rotation: bool,
    /// Fraction of the round-trip time to buffer while not colliding with the local client.
    pub interpolation_percent: f32,
    /// Fraction of the round-trip time to buffer while colliding with the local client.
    /// Must not exceed `interpolation_percent`.
    pub collision_interpolation_percent: f32,
    /// Ticks added to the current interpolation each step while not colliding.
    pub interpolation_increase_step: u32,
    /// Ticks removed from the current interpolation each step while colliding.
    pub interpolation_decrease_step: u32,
    /// Distance at or beyond which a goal snaps instead of interpolating. `None` disables
    /// teleport detection.
    pub teleport_threshold: Option<f32>,
    /// Drop the oldest goals when the queue grows far beyond the current interpolation.
    ///
    /// Off by default: trimming bounds memory during stalls but shows up as a teleport.
    pub trim_excessive_goals: bool,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            smooth_position: true,
            smooth_rotation: true,
            interpolation_percent: DEFAULT_INTERPOLATION_PERCENT,
            collision_interpolation_percent: DEFAULT_COLLISION_INTERPOLATION_PERCENT,
            interpolation_increase_step: DEFAULT_INTERPOLATION_INCREASE_STEP,
            interpolation_decrease_step: DEFAULT_INTERPOLATION_DECREASE_STEP,
            teleport_threshold: None,
            trim_excessive_goals: false,
        }
    }
}

impl SmoothingSettings {
    #[inline]
    pub fn axes(&self) -> SmoothAxes {
        SmoothAxes {
            position: self.smooth_position,
            rotation: self.smooth_rotation,
        }
    }

    /// Validates the settings before a smoother is built from them.
    ///
    /// Checks:
    /// - percentages are finite and non-negative
    /// - the collision percentage does not exceed the regular one (the collision target is
    ///   the lower clamp bound)
    /// - a teleport threshold, when set, is finite and positive
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.interpolation_percent.is_finite() || self.interpolation_percent < 0.0 {
            return Err("Interpolation percent must be finite and non-negative");
        }
        if !self.collision_interpolation_percent.is_finite()
            || self.collision_interpolation_percent < 0.0
        {
            return Err("Collision interpolation percent must be finite and non-negative");
        }
        if self.collision_interpolation_percent > self.interpolation_percent {
            return Err("Collision interpolation percent exceeds interpolation percent");
        }
        if let Some(threshold) = self.teleport_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err("Teleport threshold must be finite and positive");
            }
        }
        Ok(())
    }
}
