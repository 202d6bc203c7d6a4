use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{BookingError, ValidateSlotRequest};
use crate::services::engine::BookingEngine;

// Query parameters for the booking endpoints
#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct NextAvailableQuery {
    pub duration_minutes: i32,
    pub service_id: Option<Uuid>,
    pub start_from: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn map_booking_error(err: BookingError) -> AppError {
    match err {
        BookingError::PreparerNotFound => AppError::NotFound("Preparer not found".to_string()),
        BookingError::Store(msg) => AppError::ExternalService(msg),
        other => AppError::Internal(other.to_string()),
    }
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(preparer_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let engine = BookingEngine::from_config(&state);

    let slots = engine
        .calculate_available_slots(
            preparer_id,
            query.date,
            query.duration_minutes,
            query.service_id,
            Utc::now(),
        )
        .await
        .map_err(map_booking_error)?;

    let total_slots = slots.len();
    Ok(Json(json!({
        "preparer_id": preparer_id,
        "date": query.date,
        "available_slots": slots,
        "total_slots": total_slots
    })))
}

#[axum::debug_handler]
pub async fn check_conflicts(
    State(state): State<Arc<AppConfig>>,
    Path(preparer_id): Path<Uuid>,
    Query(query): Query<ConflictQuery>,
) -> Result<Json<Value>, AppError> {
    let engine = BookingEngine::from_config(&state);

    let has_conflict = engine
        .check_conflicts(
            preparer_id,
            query.start,
            query.end,
            query.exclude_appointment_id,
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "preparer_id": preparer_id,
        "has_conflict": has_conflict
    })))
}

#[axum::debug_handler]
pub async fn validate_booking_slot(
    State(state): State<Arc<AppConfig>>,
    Path(preparer_id): Path<Uuid>,
    Json(request): Json<ValidateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = BookingEngine::from_config(&state);

    let validation = engine
        .validate_booking_slot(
            preparer_id,
            request.start_time,
            request.duration_minutes,
            request.service_id,
            Utc::now(),
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(validation)))
}

#[axum::debug_handler]
pub async fn get_next_available_slot(
    State(state): State<Arc<AppConfig>>,
    Path(preparer_id): Path<Uuid>,
    Query(query): Query<NextAvailableQuery>,
) -> Result<Json<Value>, AppError> {
    let engine = BookingEngine::from_config(&state);

    let slot = engine
        .get_next_available_slot(
            preparer_id,
            query.duration_minutes,
            query.service_id,
            query.start_from,
            Utc::now(),
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "preparer_id": preparer_id,
        "next_available_slot": slot
    })))
}

#[axum::debug_handler]
pub async fn get_preparer_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(preparer_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    if query.end_date < query.start_date {
        return Err(AppError::BadRequest(
            "end_date must not be before start_date".to_string(),
        ));
    }

    let engine = BookingEngine::from_config(&state);

    let schedule = engine
        .get_preparer_schedule(preparer_id, query.start_date, query.end_date)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(schedule)))
}
