//! Clock windows and buckets for the daily checkpoints.
//!
//! These times are fixed: each bucket maps to a dedicated flag column in
//! the day state, so making them configurable would desynchronize clock
//! and schema. Comparisons are second-precise against the local wall
//! clock.

use chrono::{NaiveTime, Timelike};

use crate::model::Milestone;

/// One departure checkpoint: opens at a clock time and stays open for the
/// rest of the day, firing at most once.
#[derive(Debug, Clone, Copy)]
pub struct DepartureGate {
    pub milestone: Milestone,
    pub opens_at: NaiveTime,
    /// Whether the worker must be near the check-out point. The last gate
    /// fires regardless of location.
    pub requires_proximity: bool,
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Early-arrival reminder window, 06:00 through 08:00 inclusive.
pub fn early_window_contains(time: NaiveTime) -> bool {
    time >= at(6, 0) && time <= at(8, 0)
}

/// Arrival monitoring period: 08:00 through the close of the 12:20 band.
pub fn arrival_window_contains(time: NaiveTime) -> bool {
    time >= at(8, 0) && time <= at(12, 21)
}

/// The arrival confirmation bucket the clock currently falls in, if any:
/// the 09:00 hour, the 11:00 hour, or the narrow 12:20 band.
pub fn arrival_bucket(time: NaiveTime) -> Option<Milestone> {
    if time.hour() == 9 {
        Some(Milestone::Arrival0900)
    } else if time.hour() == 11 {
        Some(Milestone::Arrival1100)
    } else if time >= at(12, 20) && time <= at(12, 21) {
        Some(Milestone::Arrival1220)
    } else {
        None
    }
}

/// The three evening checkpoints, in firing order.
pub fn departure_gates() -> [DepartureGate; 3] {
    [
        DepartureGate {
            milestone: Milestone::Departure1650,
            opens_at: at(16, 50),
            requires_proximity: true,
        },
        DepartureGate {
            milestone: Milestone::Departure1715,
            opens_at: at(17, 15),
            requires_proximity: true,
        },
        DepartureGate {
            milestone: Milestone::Departure1740,
            opens_at: at(17, 40),
            requires_proximity: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    #[test]
    fn early_window_bounds_are_inclusive() {
        assert!(!early_window_contains(t(5, 59, 59)));
        assert!(early_window_contains(t(6, 0, 0)));
        assert!(early_window_contains(t(7, 30, 0)));
        assert!(early_window_contains(t(8, 0, 0)));
        assert!(!early_window_contains(t(8, 0, 30)));
    }

    #[test]
    fn arrival_window_spans_through_the_last_band() {
        assert!(!arrival_window_contains(t(7, 59, 59)));
        assert!(arrival_window_contains(t(8, 0, 0)));
        assert!(arrival_window_contains(t(12, 21, 0)));
        assert!(!arrival_window_contains(t(12, 21, 1)));
    }

    #[test]
    fn buckets_cover_their_hours() {
        assert_eq!(arrival_bucket(t(9, 0, 0)), Some(Milestone::Arrival0900));
        assert_eq!(arrival_bucket(t(9, 59, 59)), Some(Milestone::Arrival0900));
        assert_eq!(arrival_bucket(t(10, 15, 0)), None);
        assert_eq!(arrival_bucket(t(11, 30, 0)), Some(Milestone::Arrival1100));
        assert_eq!(arrival_bucket(t(12, 19, 59)), None);
        assert_eq!(arrival_bucket(t(12, 20, 0)), Some(Milestone::Arrival1220));
        assert_eq!(arrival_bucket(t(12, 21, 0)), Some(Milestone::Arrival1220));
        assert_eq!(arrival_bucket(t(12, 21, 1)), None);
    }

    #[test]
    fn departure_gates_open_in_order() {
        let gates = departure_gates();
        assert_eq!(gates[0].opens_at, t(16, 50, 0));
        assert_eq!(gates[1].opens_at, t(17, 15, 0));
        assert_eq!(gates[2].opens_at, t(17, 40, 0));
        assert!(gates[0].requires_proximity);
        assert!(gates[1].requires_proximity);
        assert!(!gates[2].requires_proximity);
    }
}
