// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// PREPARER MODELS (read-only view of the preparer directory)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preparer {
    pub id: Uuid,
    pub display_name: String,
    pub booking_enabled: bool,
    pub allow_phone_bookings: bool,
    pub allow_video_bookings: bool,
    pub allow_in_person_bookings: bool,
    pub requires_approval: bool,
}

// ==============================================================================
// AVAILABILITY RULE MODELS
// ==============================================================================

/// The bookable window a rule describes for the dates it governs.
///
/// The rule store encodes "whole day blocked" as the time pair
/// (00:00, 00:00); that sentinel is decoded into `Blocked` at the store
/// boundary so the engine never has to compare raw times against midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleWindow {
    Open { start: NaiveTime, end: NaiveTime },
    Blocked,
}

impl RuleWindow {
    /// Decode the stored time pair, treating midnight-to-midnight as a
    /// full-day blackout.
    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        if start == midnight && end == midnight {
            RuleWindow::Blocked
        } else {
            RuleWindow::Open { start, end }
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, RuleWindow::Blocked)
    }
}

/// Which dates a rule governs: a recurring weekday or an explicit
/// date range (vacation, special hours).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    /// 0 = Sunday through 6 = Saturday.
    Weekly { weekday: u8 },
    /// Closed range, both endpoints inclusive.
    DateRange { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub preparer_id: Uuid,
    pub scope: RuleScope,
    pub window: RuleWindow,
    /// `None` means the rule serves every service.
    pub service_ids: Option<Vec<Uuid>>,
    pub active: bool,
}

impl AvailabilityRule {
    pub fn is_override(&self) -> bool {
        matches!(self.scope, RuleScope::DateRange { .. })
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        match &self.scope {
            RuleScope::Weekly { weekday } => *weekday == weekday_index(date),
            RuleScope::DateRange { from, to } => *from <= date && date <= *to,
        }
    }

    pub fn allows_service(&self, service_id: Option<Uuid>) -> bool {
        match (&self.service_ids, service_id) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(ids), Some(id)) => ids.contains(&id),
        }
    }
}

/// Weekday index with Sunday as 0, matching the rule store's encoding.
pub fn weekday_index(date: NaiveDate) -> u8 {
    use chrono::{Datelike, Weekday};
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    PendingApproval,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Active appointments are the only ones that block the calendar.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
                | AppointmentStatus::PendingApproval
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::PendingApproval => write!(f, "pending_approval"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub preparer_id: Uuid,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    /// Stores may omit the end instant; see `effective_end`.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// End instant, derived from start + duration when the store did not
    /// record one explicitly.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_time
            .unwrap_or(self.start_time + chrono::Duration::minutes(self.duration_minutes as i64))
    }
}

// ==============================================================================
// SERVICE CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingService {
    pub id: Uuid,
    pub name: String,
    /// Minutes the preparer stays blocked after an appointment of this
    /// service ends.
    pub buffer_after_minutes: i32,
    /// `None` means the service can be booked under any rule.
    #[serde(default)]
    pub allowed_rule_ids: Option<Vec<Uuid>>,
}

impl BookingService {
    pub fn allows_rule(&self, rule_id: Uuid) -> bool {
        match &self.allowed_rule_ids {
            None => true,
            Some(ids) => ids.contains(&rule_id),
        }
    }
}

// ==============================================================================
// SLOT AND RESPONSE MODELS (ephemeral, never persisted)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub preparer_id: Uuid,
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_label: String,
    pub end_label: String,
    pub is_available: bool,
}

impl TimeSlot {
    pub fn new(
        preparer_id: Uuid,
        service_id: Option<Uuid>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            preparer_id,
            service_id,
            start_time,
            end_time,
            start_label: format_slot_label(start_time),
            end_label: format_slot_label(end_time),
            is_available: true,
        }
    }
}

fn format_slot_label(instant: DateTime<Utc>) -> String {
    instant.format("%-I:%M %p").to_string()
}

/// Structured validation outcome: rejections are data, not errors, so the
/// booking UI can render the specific reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SlotValidation {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(reason: &BookingError) -> Self {
        Self {
            valid: false,
            error: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparerSchedule {
    pub preparer_id: Uuid,
    pub preparer_name: String,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateSlotRequest {
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub service_id: Option<Uuid>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Rejection taxonomy for booking decisions. Every variant except `Store`
/// is a user-renderable reason; `Store` is the one hard failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("preparer not found")]
    PreparerNotFound,

    #[error("this preparer is not accepting bookings")]
    BookingDisabled,

    #[error("cannot book a time in the past")]
    PastTime,

    #[error("this slot is no longer available")]
    SlotConflict,

    #[error("the preparer is not available at this time")]
    OutsideAvailability,

    #[error("this service is not available at this time")]
    ServiceRestricted,

    #[error("store error: {0}")]
    Store(String),
}

impl BookingError {
    /// True for outcomes a caller should see as a rejected booking rather
    /// than a failed request.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, BookingError::Store(_))
    }
}
