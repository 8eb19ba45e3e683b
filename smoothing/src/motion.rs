use crate::{
    constants::{MAX_UNDERFLOW_REDUCTION, OVERFLOW_MULTIPLIER, UNDERFLOW_MULTIPLIER},
    queue::GoalQueue,
    rates::Rate,
    settings::SmoothAxes,
    ticks::SETTLED_TICK,
    transform::{TransformProperties, move_towards, rotate_towards},
};

/// Speed multiplier from how far the queue length deviates from the current interpolation.
///
/// - More goals than the interpolation → speed up by [`OVERFLOW_MULTIPLIER`].
/// - Fewer → slow down by [`UNDERFLOW_MULTIPLIER`] per missing goal, capped at
///   [`MAX_UNDERFLOW_REDUCTION`].
/// - Equal → 1.0.
#[inline]
pub fn speed_multiplier(queue_len: usize, current_interpolation: u32) -> f32 {
    let count_over_interpolation = queue_len as i64 - current_interpolation as i64;
    if count_over_interpolation > 0 {
        1.0 + OVERFLOW_MULTIPLIER
    } else if count_over_interpolation < 0 {
        let reduction = (UNDERFLOW_MULTIPLIER * count_over_interpolation.unsigned_abs() as f32)
            .min(MAX_UNDERFLOW_REDUCTION);
        1.0 - reduction
    } else {
        1.0
    }
}

/// Input for a single integration pass, see [`move_to_target`].
#[derive(Clone, Copy, Debug)]
pub struct MoveToTargetParams {
    /// Current interpolation in ticks.
    pub current_interpolation: u32,
    /// Axes the integrator is allowed to write.
    pub axes: SmoothAxes,
    /// Frame delta in seconds.
    pub delta: f32,
}

/// Advances `graphical` toward the current goal for one frame.
///
/// - No valid current goal → dequeue one, or hold if the queue is empty.
/// - Each enabled axis snaps on [`Rate::Instant`] or steps at its speed without overshoot.
///   Position steps are scaled by the queue multiplier; rotation uses the raw rate.
/// - When the goal's time runs out, the next goal is dequeued and integration continues
///   with the leftover time so no frame time is lost. If nothing is queued, the goal stays
///   active until the graphical transform actually matches it.
pub fn move_to_target(
    graphical: &mut TransformProperties,
    queue: &mut GoalQueue,
    params: MoveToTargetParams,
) {
    let MoveToTargetParams {
        current_interpolation,
        axes,
        mut delta,
    } = params;

    loop {
        if !queue.current().is_valid
            && !queue.advance_to_next_goal()
            && !reactivate_if_displaced(graphical, queue, axes)
        {
            return;
        }

        let multiplier = speed_multiplier(queue.len(), current_interpolation);
        let goal = queue.current_mut();
        let target = goal.transform;
        let rates = &mut goal.move_rates;

        if axes.position {
            match rates.position {
                Rate::Instant => graphical.position = target.position,
                Rate::Speed(rate) if rate > 0.0 => {
                    graphical.position =
                        move_towards(graphical.position, target.position, rate * delta * multiplier);
                }
                Rate::Speed(_) => {}
            }
        }

        if axes.rotation {
            match rates.rotation {
                Rate::Instant => graphical.rotation = target.rotation,
                Rate::Speed(rate) if rate > 0.0 => {
                    graphical.rotation =
                        rotate_towards(graphical.rotation, target.rotation, rate * delta);
                }
                Rate::Speed(_) => {}
            }
        }

        if rates.time_remaining > 0.0 {
            rates.time_remaining -= delta * multiplier;
        }
        if rates.time_remaining > 0.0 {
            return;
        }

        let leftover = rates.time_remaining.abs();
        if queue.advance_to_next_goal() {
            if leftover > 0.0 {
                delta = leftover;
                continue;
            }
            return;
        }

        // Nothing else queued.
        reactivate_if_displaced(graphical, queue, axes);
        return;
    }
}

/// Re-arms the last consumed goal when the graphical transform no longer matches it, for
/// example after the host moved the graphical object. Returns whether the goal is active.
fn reactivate_if_displaced(
    graphical: &TransformProperties,
    queue: &mut GoalQueue,
    axes: SmoothAxes,
) -> bool {
    let goal = queue.current_mut();
    if goal.local_tick == SETTLED_TICK || graphical.approx_eq(&goal.transform, axes) {
        return false;
    }
    goal.is_valid = true;
    true
}
