// libs/booking-cell/src/services/engine.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    BookingError, BookingService, PreparerSchedule, RuleWindow, SlotValidation, TimeSlot,
};
use crate::services::conflict::{buffer_for, find_conflict, ConflictChecker};
use crate::services::rules::RuleResolver;
use crate::services::slots::generate_slots;
use crate::stores::{
    AppointmentStore, AvailabilityRuleStore, PreparerDirectory, ServiceCatalog,
    SupabaseBookingStore,
};

/// Forward-scan bound for next-available searches. A month of empty
/// calendar means "none found", not an unbounded walk.
pub const MAX_SEARCH_DAYS: i64 = 30;

/// The availability calculation engine. Stateless: every call is a pure
/// computation over rule/appointment snapshots read from the collaborator
/// stores at call time.
///
/// Validation here does not persist anything. Two concurrent requests for
/// the same interval can both pass; whoever writes the appointment must
/// re-check the conflict condition atomically at write time.
pub struct BookingEngine {
    preparers: Arc<dyn PreparerDirectory>,
    appointments: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn ServiceCatalog>,
    resolver: RuleResolver,
    conflicts: ConflictChecker,
}

impl BookingEngine {
    pub fn new(
        preparers: Arc<dyn PreparerDirectory>,
        rules: Arc<dyn AvailabilityRuleStore>,
        appointments: Arc<dyn AppointmentStore>,
        catalog: Arc<dyn ServiceCatalog>,
    ) -> Self {
        Self {
            preparers,
            appointments: Arc::clone(&appointments),
            catalog: Arc::clone(&catalog),
            resolver: RuleResolver::new(rules),
            conflicts: ConflictChecker::new(appointments, catalog),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(SupabaseBookingStore::new(config));
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    /// All open slots of `duration_minutes` for one preparer-date,
    /// chronologically ordered. Degrades to an empty list for unknown or
    /// non-bookable preparers; only store failures surface as errors.
    pub async fn calculate_available_slots(
        &self,
        preparer_id: Uuid,
        date: NaiveDate,
        duration_minutes: i32,
        service_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let preparer = match self.preparers.get_preparer(preparer_id).await? {
            Some(p) if p.booking_enabled => p,
            _ => return Ok(Vec::new()),
        };

        let service = self.lookup_service(service_id).await?;
        let rules = self
            .resolver
            .resolve(&preparer, date, service_id, service.as_ref())
            .await?;

        if rules.is_empty() {
            debug!("No applicable rules for preparer {} on {}", preparer_id, date);
            return Ok(Vec::new());
        }

        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let appointments = self
            .appointments
            .list_active_appointments(preparer_id, day_start, day_start + Duration::days(1))
            .await?;
        let buffer_minutes = buffer_for(service.as_ref());

        let mut slots: Vec<TimeSlot> = Vec::new();
        for rule in &rules {
            for mut slot in generate_slots(rule, date, duration_minutes, now) {
                if find_conflict(
                    &appointments,
                    slot.start_time,
                    slot.end_time,
                    buffer_minutes,
                    None,
                )
                .is_none()
                {
                    slot.service_id = service_id;
                    slots.push(slot);
                }
            }
        }

        slots.sort_by_key(|slot| slot.start_time);
        slots.dedup_by_key(|slot| slot.start_time);

        debug!("Found {} open slots for preparer {} on {}", slots.len(), preparer_id, date);
        Ok(slots)
    }

    /// Whether `[start, end)` collides with a buffered active appointment.
    /// The default buffer applies; callers with a service in hand should
    /// use `validate_booking_slot` instead.
    pub async fn check_conflicts(
        &self,
        preparer_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, BookingError> {
        self.conflicts
            .has_conflict(preparer_id, start, end, None, exclude_appointment_id)
            .await
    }

    /// Decide one specific booking request, returning the first failed
    /// check as a user-renderable reason. Store failures remain hard
    /// errors.
    pub async fn validate_booking_slot(
        &self,
        preparer_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        service_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<SlotValidation, BookingError> {
        match self
            .run_booking_checks(preparer_id, start, duration_minutes, service_id, now)
            .await
        {
            Ok(()) => Ok(SlotValidation::accepted()),
            Err(reason) if reason.is_rejection() => {
                info!("Booking rejected for preparer {}: {}", preparer_id, reason);
                Ok(SlotValidation::rejected(&reason))
            }
            Err(hard) => Err(hard),
        }
    }

    async fn run_booking_checks(
        &self,
        preparer_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        service_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let preparer = self
            .preparers
            .get_preparer(preparer_id)
            .await?
            .ok_or(BookingError::PreparerNotFound)?;

        if !preparer.booking_enabled {
            return Err(BookingError::BookingDisabled);
        }

        if start < now {
            return Err(BookingError::PastTime);
        }

        let end = start + Duration::minutes(duration_minutes as i64);

        if self
            .conflicts
            .has_conflict(preparer_id, start, end, service_id, None)
            .await?
        {
            return Err(BookingError::SlotConflict);
        }

        // Resolution without a service filter: the interval must first land
        // inside some governing window, then the matched rule's own service
        // restriction applies.
        let rules = self
            .resolver
            .resolve(&preparer, start.date_naive(), None, None)
            .await?;

        let containing: Vec<_> = rules
            .iter()
            .filter(|rule| window_contains(&rule.window, start.date_naive(), start, end))
            .collect();

        if containing.is_empty() {
            return Err(BookingError::OutsideAvailability);
        }

        if !containing.iter().any(|rule| rule.allows_service(service_id)) {
            return Err(BookingError::ServiceRestricted);
        }

        Ok(())
    }

    /// First open slot within the next `MAX_SEARCH_DAYS` days, scanning
    /// day by day from `start_from` (default: now).
    pub async fn get_next_available_slot(
        &self,
        preparer_id: Uuid,
        duration_minutes: i32,
        service_id: Option<Uuid>,
        start_from: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<TimeSlot>, BookingError> {
        let from = start_from.unwrap_or(now);

        for day in 0..MAX_SEARCH_DAYS {
            let date = (from + Duration::days(day)).date_naive();
            let slots = self
                .calculate_available_slots(preparer_id, date, duration_minutes, service_id, now)
                .await?;

            if let Some(slot) = slots.into_iter().find(|slot| slot.start_time >= from) {
                return Ok(Some(slot));
            }
        }

        debug!(
            "No open slot for preparer {} within {} days of {}",
            preparer_id, MAX_SEARCH_DAYS, from
        );
        Ok(None)
    }

    /// Read-through schedule summary for a date range; no slot computation.
    pub async fn get_preparer_schedule(
        &self,
        preparer_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PreparerSchedule, BookingError> {
        let preparer = self
            .preparers
            .get_preparer(preparer_id)
            .await?
            .ok_or(BookingError::PreparerNotFound)?;

        let from = start_date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let to = (end_date + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        let appointments = self
            .appointments
            .list_active_appointments(preparer_id, from, to)
            .await?;

        Ok(PreparerSchedule {
            preparer_id,
            preparer_name: preparer.display_name,
            appointments,
        })
    }

    async fn lookup_service(
        &self,
        service_id: Option<Uuid>,
    ) -> Result<Option<BookingService>, BookingError> {
        match service_id {
            Some(id) => Ok(self.catalog.get_service(id).await?),
            None => Ok(None),
        }
    }
}

fn window_contains(
    window: &RuleWindow,
    date: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    match window {
        RuleWindow::Open {
            start: w_start,
            end: w_end,
        } => {
            let window_start = date.and_time(*w_start).and_utc();
            let window_end = date.and_time(*w_end).and_utc();
            start >= window_start && end <= window_end
        }
        RuleWindow::Blocked => false,
    }
}
