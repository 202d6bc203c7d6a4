// libs/booking-cell/src/services/rules.rs
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AvailabilityRule, BookingError, BookingService, Preparer};
use crate::stores::AvailabilityRuleStore;

/// Outcome of rule precedence for one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub enum DayAvailability {
    /// A blackout override absorbs the whole date.
    Unavailable,
    /// The rule set that governs the date, overrides having fully
    /// replaced regular weekday rules when any exist.
    Open(Vec<AvailabilityRule>),
}

impl DayAvailability {
    pub fn into_rules(self) -> Vec<AvailabilityRule> {
        match self {
            DayAvailability::Unavailable => Vec::new(),
            DayAvailability::Open(rules) => rules,
        }
    }
}

/// Two-stage precedence: blackout first, then override-replaces-regular.
///
/// Pure over an already-fetched rule set so the precedence policy can be
/// tested without any store.
pub fn choose_rules(rules: Vec<AvailabilityRule>, date: NaiveDate) -> DayAvailability {
    let applicable: Vec<AvailabilityRule> =
        rules.into_iter().filter(|r| r.applies_on(date)).collect();

    // A blocked override wins over everything else for its dates.
    if applicable
        .iter()
        .any(|r| r.is_override() && r.window.is_blocked())
    {
        return DayAvailability::Unavailable;
    }

    let overrides: Vec<AvailabilityRule> = applicable
        .iter()
        .filter(|r| r.is_override())
        .cloned()
        .collect();

    if !overrides.is_empty() {
        return DayAvailability::Open(overrides);
    }

    DayAvailability::Open(
        applicable
            .into_iter()
            .filter(|r| !r.is_override())
            .collect(),
    )
}

/// Restrict a chosen rule set to those serving `service_id`. A rule with no
/// service list serves everything; a service with a rule restriction is only
/// offered under the rules it names.
pub fn filter_for_service(
    rules: Vec<AvailabilityRule>,
    service_id: Option<Uuid>,
    service: Option<&BookingService>,
) -> Vec<AvailabilityRule> {
    match service_id {
        None => rules,
        Some(id) => rules
            .into_iter()
            .filter(|rule| {
                rule.allows_service(Some(id))
                    && service.map_or(true, |svc| svc.allows_rule(rule.id))
            })
            .collect(),
    }
}

/// Resolves the rule set governing one preparer-date, honoring blackout and
/// override precedence.
pub struct RuleResolver {
    rules: Arc<dyn AvailabilityRuleStore>,
}

impl RuleResolver {
    pub fn new(rules: Arc<dyn AvailabilityRuleStore>) -> Self {
        Self { rules }
    }

    /// Applicable rules for `date`, or an error when the preparer cannot be
    /// booked at all. An empty result means no availability is configured
    /// (or a blackout covers the date) - callers surface that as an empty
    /// slot list, not an error.
    pub async fn resolve(
        &self,
        preparer: &Preparer,
        date: NaiveDate,
        service_id: Option<Uuid>,
        service: Option<&BookingService>,
    ) -> Result<Vec<AvailabilityRule>, BookingError> {
        if !preparer.booking_enabled {
            return Err(BookingError::BookingDisabled);
        }

        let fetched = self.rules.list_rules(preparer.id, date).await?;

        let chosen = match choose_rules(fetched, date) {
            DayAvailability::Unavailable => {
                debug!("Preparer {} is blacked out on {}", preparer.id, date);
                return Ok(Vec::new());
            }
            DayAvailability::Open(rules) => rules,
        };

        Ok(filter_for_service(chosen, service_id, service))
    }
}
