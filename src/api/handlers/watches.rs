//! Watch (wachta) handlers, including roster membership.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiResult;
use crate::api::types::{AddMemberRequest, SetMembersRequest, WatchDetail};
use crate::domain::{Registration, RegistrationId, TripId, Watch, WatchId, WatchInput};
use crate::infra::sqlite::{Trips, Watches};
use crate::server::AppState;
use crate::services::RosterChange;

/// GET /admin/api/v1/trips/:trip_id/watches
pub async fn list_watches(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> ApiResult<Json<Vec<Watch>>> {
    let trip_id = TripId(trip_id);
    let mut conn = state.db.acquire().await?;
    Trips::new(&mut conn).get(trip_id).await?;
    Ok(Json(Watches::new(&mut conn).list_for_trip(trip_id).await?))
}

/// POST /admin/api/v1/trips/:trip_id/watches
pub async fn create_watch(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
    payload: Result<Json<WatchInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Watch>)> {
    let Json(input) = payload?;
    let input = input.validate()?;
    let trip_id = TripId(trip_id);

    let mut conn = state.db.acquire().await?;
    Trips::new(&mut conn).get(trip_id).await?;
    let watch = Watches::new(&mut conn).insert(trip_id, &input).await?;
    Ok((StatusCode::CREATED, Json(watch)))
}

/// GET /admin/api/v1/watches/:watch_id - Watch with its members.
pub async fn get_watch(
    State(state): State<AppState>,
    Path(watch_id): Path<i64>,
) -> ApiResult<Json<WatchDetail>> {
    let watch_id = WatchId(watch_id);
    let (watch, trip) = {
        let mut conn = state.db.acquire().await?;
        let watch = Watches::new(&mut conn).get(watch_id).await?;
        let trip = Trips::new(&mut conn).get(watch.trip_id).await?;
        (watch, trip)
    };
    let members = state.roster.members(watch_id).await?;

    Ok(Json(WatchDetail {
        label: watch.label(&trip),
        watch,
        members,
    }))
}

/// PUT /admin/api/v1/watches/:watch_id - Rename.
pub async fn update_watch(
    State(state): State<AppState>,
    Path(watch_id): Path<i64>,
    payload: Result<Json<WatchInput>, JsonRejection>,
) -> ApiResult<Json<Watch>> {
    let Json(input) = payload?;
    let input = input.validate()?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(Watches::new(&mut conn).rename(WatchId(watch_id), &input).await?))
}

/// DELETE /admin/api/v1/watches/:watch_id - Members become unassigned.
pub async fn delete_watch(
    State(state): State<AppState>,
    Path(watch_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Watches::new(&mut conn).delete(WatchId(watch_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /admin/api/v1/watches/:watch_id/members - Replace the member set.
pub async fn set_watch_members(
    State(state): State<AppState>,
    Path(watch_id): Path<i64>,
    payload: Result<Json<SetMembersRequest>, JsonRejection>,
) -> ApiResult<Json<RosterChange>> {
    let Json(request) = payload?;
    let change = state
        .roster
        .reconcile(WatchId(watch_id), &request.registration_ids)
        .await?;
    Ok(Json(change))
}

/// POST /admin/api/v1/watches/:watch_id/members - Assign one registration
/// and notify the participant.
pub async fn add_watch_member(
    State(state): State<AppState>,
    Path(watch_id): Path<i64>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> ApiResult<Json<Registration>> {
    let Json(request) = payload?;
    let registration = state
        .roster
        .assign(WatchId(watch_id), request.registration_id)
        .await?;
    Ok(Json(registration))
}

/// DELETE /admin/api/v1/watches/:watch_id/members/:registration_id
pub async fn remove_watch_member(
    State(state): State<AppState>,
    Path((watch_id, registration_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Registration>> {
    let registration = state
        .roster
        .remove(WatchId(watch_id), RegistrationId(registration_id))
        .await?;
    Ok(Json(registration))
}
