// libs/booking-cell/src/stores.rs
//
// Collaborator interfaces the engine reads from, plus their Supabase-backed
// implementations. The engine itself owns no state: rules, appointments,
// preparers and services all live behind these traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    weekday_index, Appointment, AvailabilityRule, BookingError, BookingService, Preparer,
    RuleScope, RuleWindow,
};

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError(err.to_string())
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        BookingError::Store(err.0)
    }
}

// ==============================================================================
// COLLABORATOR TRAITS
// ==============================================================================

#[async_trait]
pub trait PreparerDirectory: Send + Sync {
    async fn get_preparer(&self, preparer_id: Uuid) -> Result<Option<Preparer>, StoreError>;
}

#[async_trait]
pub trait AvailabilityRuleStore: Send + Sync {
    /// Active rules applicable to `date`: regular rules for its weekday
    /// plus override rules whose range covers it.
    async fn list_rules(
        &self,
        preparer_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityRule>, StoreError>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Active-status appointments starting in `[from, to)`.
    async fn list_active_appointments(
        &self,
        preparer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;
}

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn get_service(&self, service_id: Uuid) -> Result<Option<BookingService>, StoreError>;
}

// ==============================================================================
// SUPABASE IMPLEMENTATION
// ==============================================================================

/// One client serving all four collaborator traits against the shared
/// Supabase project.
pub struct SupabaseBookingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBookingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

/// Raw availability rule row as stored. The blackout sentinel
/// (start = end = 00:00) and the regular/override split are decoded here,
/// before any engine code sees the rule.
#[derive(Debug, Deserialize)]
struct RuleRow {
    id: Uuid,
    preparer_id: Uuid,
    kind: String,
    #[serde(default)]
    weekday: Option<u8>,
    #[serde(default)]
    date_from: Option<NaiveDate>,
    #[serde(default)]
    date_to: Option<NaiveDate>,
    start_time: NaiveTime,
    end_time: NaiveTime,
    #[serde(default)]
    service_ids: Option<Vec<Uuid>>,
    active: bool,
}

impl RuleRow {
    fn into_rule(self) -> Option<AvailabilityRule> {
        let scope = match self.kind.as_str() {
            "regular" => RuleScope::Weekly {
                weekday: self.weekday?,
            },
            "override" => RuleScope::DateRange {
                from: self.date_from?,
                to: self.date_to?,
            },
            other => {
                warn!("Skipping availability rule {} with unknown kind {}", self.id, other);
                return None;
            }
        };

        Some(AvailabilityRule {
            id: self.id,
            preparer_id: self.preparer_id,
            scope,
            window: RuleWindow::from_times(self.start_time, self.end_time),
            service_ids: self.service_ids,
            active: self.active,
        })
    }
}

#[async_trait]
impl PreparerDirectory for SupabaseBookingStore {
    async fn get_preparer(&self, preparer_id: Uuid) -> Result<Option<Preparer>, StoreError> {
        let rows: Vec<Preparer> = self
            .supabase
            .select("preparers", &format!("id=eq.{}", preparer_id))
            .await?;

        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl AvailabilityRuleStore for SupabaseBookingStore {
    async fn list_rules(
        &self,
        preparer_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let weekday = weekday_index(date);
        let query = format!(
            "preparer_id=eq.{}&active=eq.true&or=(and(kind.eq.regular,weekday.eq.{}),and(kind.eq.override,date_from.lte.{},date_to.gte.{}))&order=start_time.asc",
            preparer_id, weekday, date, date
        );

        let rows: Vec<RuleRow> = self.supabase.select("availability_rules", &query).await?;
        debug!("Fetched {} rule rows for preparer {} on {}", rows.len(), preparer_id, date);

        Ok(rows.into_iter().filter_map(RuleRow::into_rule).collect())
    }
}

#[async_trait]
impl AppointmentStore for SupabaseBookingStore {
    async fn list_active_appointments(
        &self,
        preparer_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let query = format!(
            "preparer_id=eq.{}&status=in.(scheduled,confirmed,pending_approval)&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            preparer_id,
            from.to_rfc3339(),
            to.to_rfc3339()
        );

        let appointments: Vec<Appointment> =
            self.supabase.select("appointments", &query).await?;

        Ok(appointments)
    }
}

#[async_trait]
impl ServiceCatalog for SupabaseBookingStore {
    async fn get_service(&self, service_id: Uuid) -> Result<Option<BookingService>, StoreError> {
        let rows: Vec<BookingService> = self
            .supabase
            .select("booking_services", &format!("id=eq.{}", service_id))
            .await?;

        Ok(rows.into_iter().next())
    }
}
