//! Scheduling primitives.
//!
//! - [`Throttle`]: minimum-spacing gate with explicit back-off
//! - [`ScheduledRefresher`]: periodic, single-flight driver for a [`RefreshAction`]

mod refresher;
mod throttle;

pub use refresher::{RefreshAction, RefresherState, ScheduledRefresher, DEFAULT_REFRESH_PERIOD};
pub use throttle::{Throttle, ThrottleConfig, DEFAULT_BACKOFF_INTERVAL, DEFAULT_MIN_INTERVAL};
