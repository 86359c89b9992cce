//! Trip handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiResult;
use crate::api::types::TripDetail;
use crate::auth::AuthContextExt;
use crate::domain::{Registration, Trip, TripId, TripInput};
use crate::infra::sqlite::{Registrations, Trips, Watches};
use crate::infra::RequestMeta;
use crate::server::AppState;
use crate::services::Accessor;

/// GET /admin/api/v1/trips - All trips by start date.
pub async fn list_trips(State(state): State<AppState>) -> ApiResult<Json<Vec<Trip>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(Trips::new(&mut conn).list().await?))
}

/// POST /admin/api/v1/trips
pub async fn create_trip(
    State(state): State<AppState>,
    payload: Result<Json<TripInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Trip>)> {
    let Json(input) = payload?;
    let input = input.validate()?;

    let mut conn = state.db.acquire().await?;
    let trip = Trips::new(&mut conn).insert(&input).await?;
    tracing::info!(trip_id = %trip.id, name = %trip.name, "trip created");
    Ok((StatusCode::CREATED, Json(trip)))
}

/// GET /admin/api/v1/trips/:trip_id - Trip with its watches.
pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> ApiResult<Json<TripDetail>> {
    let trip_id = TripId(trip_id);
    let mut conn = state.db.acquire().await?;

    let trip = Trips::new(&mut conn).get(trip_id).await?;
    let watches = Watches::new(&mut conn).list_for_trip(trip_id).await?;
    let registration_count = Registrations::new(&mut conn)
        .list_for_trip(trip_id)
        .await?
        .len();

    Ok(Json(TripDetail {
        trip,
        watches,
        registration_count,
    }))
}

/// PUT /admin/api/v1/trips/:trip_id
pub async fn update_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
    payload: Result<Json<TripInput>, JsonRejection>,
) -> ApiResult<Json<Trip>> {
    let Json(input) = payload?;
    let input = input.validate()?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Trips::new(&mut conn).update(TripId(trip_id), &input).await?))
}

/// DELETE /admin/api/v1/trips/:trip_id - Removes watches, registrations
/// and everything hanging off them.
pub async fn delete_trip(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(trip_id): Path<i64>,
    meta: RequestMeta,
) -> ApiResult<StatusCode> {
    let purged = state
        .sensitive_data
        .delete_trip(TripId(trip_id), Accessor::staff(&auth.username, &meta))
        .await?;
    tracing::info!(trip_id, purged, staff = %auth.username, "trip deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/api/v1/trips/:trip_id/available-members - Registrations
/// without a watch.
pub async fn available_members(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> ApiResult<Json<Vec<Registration>>> {
    Ok(Json(state.roster.available(TripId(trip_id)).await?))
}
