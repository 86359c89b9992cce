//! Announcement handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiResult;
use crate::api::types::AnnouncementCreated;
use crate::domain::{Announcement, AnnouncementId, AnnouncementInput, TripId};
use crate::infra::sqlite::{Announcements, Trips};
use crate::server::AppState;

/// GET /admin/api/v1/trips/:trip_id/announcements - Newest first.
pub async fn list_announcements(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> ApiResult<Json<Vec<Announcement>>> {
    let trip_id = TripId(trip_id);
    let mut conn = state.db.acquire().await?;
    Trips::new(&mut conn).get(trip_id).await?;
    Ok(Json(Announcements::new(&mut conn).list_for_trip(trip_id).await?))
}

/// POST /admin/api/v1/trips/:trip_id/announcements
///
/// The announcement is stored even when some emails fail; failures are
/// listed in `delivery.failed`.
pub async fn create_announcement(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
    payload: Result<Json<AnnouncementInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AnnouncementCreated>)> {
    let Json(input) = payload?;
    let (announcement, delivery) = state
        .registrations
        .post_announcement(TripId(trip_id), input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AnnouncementCreated {
            announcement,
            delivery,
        }),
    ))
}

/// DELETE /admin/api/v1/announcements/:announcement_id
pub async fn delete_announcement(
    State(state): State<AppState>,
    Path(announcement_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut conn = state.db.acquire().await?;
    Announcements::new(&mut conn)
        .delete(AnnouncementId(announcement_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
