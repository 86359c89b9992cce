//! Payment handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiResult;
use crate::domain::{Payment, PaymentId, PaymentInput, RegistrationId, TripId};
use crate::infra::sqlite::{Payments, Registrations, Trips};
use crate::server::AppState;

/// GET /admin/api/v1/registrations/:registration_id/payments
pub async fn list_registration_payments(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
) -> ApiResult<Json<Vec<Payment>>> {
    let registration_id = RegistrationId(registration_id);
    let mut conn = state.db.acquire().await?;
    Registrations::new(&mut conn).get(registration_id).await?;
    Ok(Json(
        Payments::new(&mut conn)
            .list_for_registration(registration_id)
            .await?,
    ))
}

/// GET /admin/api/v1/trips/:trip_id/payments
pub async fn list_trip_payments(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> ApiResult<Json<Vec<Payment>>> {
    let trip_id = TripId(trip_id);
    let mut conn = state.db.acquire().await?;
    Trips::new(&mut conn).get(trip_id).await?;
    Ok(Json(Payments::new(&mut conn).list_for_trip(trip_id).await?))
}

/// POST /admin/api/v1/registrations/:registration_id/payments - Records a
/// payment or refund and emails the participant.
pub async fn create_payment(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
    payload: Result<Json<PaymentInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let Json(input) = payload?;
    let payment = state
        .registrations
        .record_payment(RegistrationId(registration_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// DELETE /admin/api/v1/payments/:payment_id
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Payments::new(&mut conn).delete(PaymentId(payment_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
