// libs/booking-cell/src/services/slots.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{AvailabilityRule, RuleWindow, TimeSlot};

/// Candidate slots start on a fixed half-hour grid from the window start.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Generate every candidate slot of `duration_minutes` inside `rule`'s
/// window on `date`.
///
/// Candidates start at `window.start + k * SLOT_STEP_MINUTES` and must end
/// at or before the window end. The last possible full-duration slot
/// (starting at `window.end - duration`) is offered even when the step
/// sequence cannot reach it, so short trailing windows are never wasted.
/// Slots already over at `now` are discarded.
pub fn generate_slots(
    rule: &AvailabilityRule,
    date: NaiveDate,
    duration_minutes: i32,
    now: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let (window_start, window_end) = match rule.window {
        RuleWindow::Open { start, end } => (
            date.and_time(start).and_utc(),
            date.and_time(end).and_utc(),
        ),
        RuleWindow::Blocked => return Vec::new(),
    };

    let duration = Duration::minutes(duration_minutes as i64);
    if duration <= Duration::zero() || window_start + duration > window_end {
        return Vec::new();
    }

    let step = Duration::minutes(SLOT_STEP_MINUTES);
    let mut slots = Vec::new();

    let mut slot_start = window_start;
    while slot_start + duration <= window_end {
        push_if_future(&mut slots, rule, slot_start, duration, now);
        slot_start += step;
    }

    // The final full-duration slot sits off the grid whenever the window
    // length minus the duration is not a step multiple; the loop above
    // stopped short of it, so it is attempted once here.
    let last_start = window_end - duration;
    if (last_start - window_start).num_minutes() % SLOT_STEP_MINUTES != 0 {
        push_if_future(&mut slots, rule, last_start, duration, now);
    }

    slots
}

fn push_if_future(
    slots: &mut Vec<TimeSlot>,
    rule: &AvailabilityRule,
    slot_start: DateTime<Utc>,
    duration: Duration,
    now: DateTime<Utc>,
) {
    let slot_end = slot_start + duration;
    if slot_end > now {
        slots.push(TimeSlot::new(rule.preparer_id, None, slot_start, slot_end));
    }
}
