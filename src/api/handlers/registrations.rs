//! Registration handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiResult;
use crate::api::types::{RegistrationDetail, RegistrationQuery};
use crate::auth::AuthContextExt;
use crate::domain::{Balance, Registration, RegistrationId, RegistrationUpdate};
use crate::infra::sqlite::{Payments, Registrations, Trips};
use crate::infra::RequestMeta;
use crate::server::AppState;
use crate::services::Accessor;

async fn detail(state: &AppState, registration: Registration) -> ApiResult<RegistrationDetail> {
    let (trip, payments) = {
        let mut conn = state.db.acquire().await?;
        let trip = Trips::new(&mut conn).get(registration.trip_id).await?;
        let payments = Payments::new(&mut conn)
            .list_for_registration(registration.id)
            .await?;
        (trip, payments)
    };
    let has_sensitive_data = state.sensitive_data.exists(registration.id).await?;

    Ok(RegistrationDetail {
        balance: Balance::compute(&trip, &payments),
        registration,
        payments,
        has_sensitive_data,
    })
}

/// GET /admin/api/v1/registrations?trip_id=&status=
pub async fn list_registrations(
    State(state): State<AppState>,
    query: Result<Query<RegistrationQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Registration>>> {
    let Query(query) = query?;
    let mut conn = state.db.acquire().await?;

    let registrations = match query.trip_id {
        Some(trip_id) => {
            Trips::new(&mut conn).get(trip_id).await?;
            Registrations::new(&mut conn).list_for_trip(trip_id).await?
        }
        None => Registrations::new(&mut conn).list().await?,
    };

    Ok(Json(
        registrations
            .into_iter()
            .filter(|r| query.status.map_or(true, |status| r.status == status))
            .collect(),
    ))
}

/// GET /admin/api/v1/registrations/:registration_id - With balance and payments.
pub async fn get_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
) -> ApiResult<Json<RegistrationDetail>> {
    let registration = {
        let mut conn = state.db.acquire().await?;
        Registrations::new(&mut conn)
            .get(RegistrationId(registration_id))
            .await?
    };
    Ok(Json(detail(&state, registration).await?))
}

/// PATCH /admin/api/v1/registrations/:registration_id - Status and/or watch.
pub async fn update_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
    payload: Result<Json<RegistrationUpdate>, JsonRejection>,
) -> ApiResult<Json<RegistrationDetail>> {
    let Json(update) = payload?;
    let registration = state
        .registrations
        .update(RegistrationId(registration_id), update)
        .await?;
    Ok(Json(detail(&state, registration).await?))
}

/// DELETE /admin/api/v1/registrations/:registration_id
///
/// Supplementary data goes first so its removal is audited.
pub async fn delete_registration(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(registration_id): Path<i64>,
    meta: RequestMeta,
) -> ApiResult<StatusCode> {
    let registration_id = RegistrationId(registration_id);

    state
        .sensitive_data
        .delete(registration_id, Accessor::staff(&auth.username, &meta))
        .await?;

    let mut conn = state.db.acquire().await?;
    Registrations::new(&mut conn).delete(registration_id).await?;
    tracing::info!(%registration_id, staff = %auth.username, "registration deleted");
    Ok(StatusCode::NO_CONTENT)
}
