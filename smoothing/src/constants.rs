/// Round-trip time change, in milliseconds, required before the interpolation targets are
/// recomputed.
///
/// Smaller changes are treated as jitter so a single lag spike doesn't resize the buffer.
pub const PING_CHANGE_THRESHOLD_MS: u64 = 25;

/// Speed bonus applied while more goals are queued than the current interpolation.
///
/// Convention: the effective multiplier is `1.0 + OVERFLOW_MULTIPLIER`.
pub const OVERFLOW_MULTIPLIER: f32 = 0.1;

/// Speed reduction per missing goal while fewer goals are queued than the current
/// interpolation.
pub const UNDERFLOW_MULTIPLIER: f32 = 0.02;

/// Upper bound of the underflow reduction, so the multiplier never drops below `0.1`.
pub const MAX_UNDERFLOW_REDUCTION: f32 = 0.9;

/// Pending goal count at which the queue is considered to be blowing up (network stall).
pub const EXCESSIVE_GOAL_COUNT: usize = 100;

/// When trimming is enabled, goals beyond `current_interpolation * TRIM_BUFFER_MULTIPLIER`
/// are dropped from the front of the queue.
pub const TRIM_BUFFER_MULTIPLIER: usize = 8;

/// Position tolerance (meters) used when checking whether the graphical transform already
/// sits on its goal.
pub const GOAL_POSITION_EPSILON: f32 = 1.0e-4;

/// Rotation tolerance (degrees) used when checking whether the graphical transform already
/// sits on its goal.
pub const GOAL_ROTATION_EPSILON_DEG: f32 = 1.0e-2;

/// Default fraction of the round-trip time buffered while moving freely.
pub const DEFAULT_INTERPOLATION_PERCENT: f32 = 1.0;

/// Default fraction of the round-trip time buffered while colliding with the local client.
pub const DEFAULT_COLLISION_INTERPOLATION_PERCENT: f32 = 0.1;

/// Default ticks added to the current interpolation per simulation step when not colliding.
pub const DEFAULT_INTERPOLATION_INCREASE_STEP: u32 = 1;

/// Default ticks removed from the current interpolation per simulation step when colliding.
pub const DEFAULT_INTERPOLATION_DECREASE_STEP: u32 = 1;
