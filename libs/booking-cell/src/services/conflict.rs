// libs/booking-cell/src/services/conflict.rs
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, BookingError, BookingService};
use crate::stores::{AppointmentStore, ServiceCatalog};

/// Buffer applied when no service was requested or the catalog has no entry
/// for it. Fifteen minutes matches the shortest buffer any service carries,
/// so an unknown service can never under-block the calendar.
pub const DEFAULT_BUFFER_AFTER_MINUTES: i32 = 15;

pub fn buffer_for(service: Option<&BookingService>) -> i32 {
    service
        .map(|svc| svc.buffer_after_minutes)
        .unwrap_or(DEFAULT_BUFFER_AFTER_MINUTES)
}

/// Whether `appointment` blocks the candidate interval `[start, end)`.
///
/// The blocking window is `[appointment.start, appointment.end + buffer)`.
/// Touching intervals (one ending exactly when the other begins) do not
/// conflict, so both comparisons are strict. Inactive appointments never
/// block.
pub fn blocks(
    appointment: &Appointment,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    buffer_minutes: i32,
) -> bool {
    if !appointment.status.is_active() {
        return false;
    }

    let block_start = appointment.start_time;
    let block_end = appointment.effective_end() + Duration::minutes(buffer_minutes as i64);

    start < block_end && end > block_start
}

/// First appointment blocking `[start, end)`, skipping `exclude` (used by
/// reschedule flows to ignore the appointment being moved).
pub fn find_conflict<'a>(
    appointments: &'a [Appointment],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    buffer_minutes: i32,
    exclude: Option<Uuid>,
) -> Option<&'a Appointment> {
    appointments
        .iter()
        .filter(|appt| Some(appt.id) != exclude)
        .find(|appt| blocks(appt, start, end, buffer_minutes))
}

/// Conflict detection against the appointment store, with per-service
/// buffer lookup.
pub struct ConflictChecker {
    appointments: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn ServiceCatalog>,
}

impl ConflictChecker {
    pub fn new(appointments: Arc<dyn AppointmentStore>, catalog: Arc<dyn ServiceCatalog>) -> Self {
        Self {
            appointments,
            catalog,
        }
    }

    pub async fn resolve_buffer(&self, service_id: Option<Uuid>) -> Result<i32, BookingError> {
        let service = match service_id {
            Some(id) => self.catalog.get_service(id).await?,
            None => None,
        };
        Ok(buffer_for(service.as_ref()))
    }

    /// Check `[start, end)` against the preparer's active appointments on
    /// the same date.
    pub async fn has_conflict(
        &self,
        preparer_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        service_id: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> Result<bool, BookingError> {
        let buffer_minutes = self.resolve_buffer(service_id).await?;

        let day_start = start
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let day_end = day_start + Duration::days(1);

        let appointments = self
            .appointments
            .list_active_appointments(preparer_id, day_start, day_end)
            .await?;

        let conflict = find_conflict(&appointments, start, end, buffer_minutes, exclude);
        if let Some(appt) = conflict {
            debug!(
                "Candidate {}..{} blocked by appointment {} for preparer {}",
                start, end, appt.id, preparer_id
            );
        }

        Ok(conflict.is_some())
    }
}
