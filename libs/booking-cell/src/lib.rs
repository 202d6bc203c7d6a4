pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod stores;

// Re-export the engine surface for external use
pub use models::{
    Appointment, AppointmentStatus, AvailabilityRule, BookingError, BookingService, Preparer,
    PreparerSchedule, RuleScope, RuleWindow, SlotValidation, TimeSlot,
};
pub use services::engine::BookingEngine;
