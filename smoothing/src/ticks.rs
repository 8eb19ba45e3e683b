//! Tick/time conversion helpers.
//!
//! Ticks are the discrete steps of the fixed-rate simulation clock. Durations are in
//! seconds and `tick_delta` is the length of one tick in seconds (e.g. `1.0 / 50.0`).

/// Local simulation tick.
pub type Tick = u32;

/// Tick value marking a goal whose transform did not change from its predecessor.
pub const SETTLED_TICK: Tick = 0;

/// How a fractional tick count is rounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickRounding {
    Nearest,
    Down,
    /// Never under-covers the requested time window.
    Up,
}

/// Converts a duration in seconds into ticks.
///
/// Negative, NaN or zero-length inputs (including a non-positive `tick_delta`) yield 0.
pub fn time_to_ticks(seconds: f64, tick_delta: f64, rounding: TickRounding) -> u32 {
    if seconds.is_nan() || seconds <= 0.0 || tick_delta.is_nan() || tick_delta <= 0.0 {
        return 0;
    }

    let ticks = seconds / tick_delta;
    let rounded = match rounding {
        TickRounding::Nearest => ticks.round(),
        TickRounding::Down => ticks.floor(),
        TickRounding::Up => ticks.ceil(),
    };

    rounded.min(u32::MAX as f64) as u32
}

/// Converts a tick count into seconds.
#[inline]
pub fn ticks_to_time(ticks: u32, tick_delta: f64) -> f64 {
    ticks as f64 * tick_delta
}
