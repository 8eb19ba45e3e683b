pub mod constants;
pub mod goal;
pub mod interpolation;
pub mod motion;
pub mod proximity;
pub mod queue;
pub mod rates;
pub mod settings;
pub mod smoother;
pub mod ticks;
pub mod transform;

pub use goal::{GoalData, GoalHandle, GoalPool};
pub use interpolation::InterpolationController;
pub use motion::{MoveToTargetParams, move_to_target, speed_multiplier};
pub use proximity::{CapsuleSpec, is_colliding};
pub use queue::{GoalAppend, GoalQueue};
pub use rates::{Channel, Rate, RateData, RateParams, calculate_rates};
pub use settings::{SmoothAxes, SmoothingSettings};
pub use smoother::{AdaptiveInterpolationSmoother, SmoothingHost, TickPhase};
pub use ticks::{SETTLED_TICK, Tick, TickRounding, ticks_to_time, time_to_ticks};
pub use transform::{Quat, TransformProperties, Vec3};
