//! Supplementary (sensitive) data handlers. Every access is audited with
//! the staff username and request metadata.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiResult;
use crate::api::types::SensitiveDataExportRow;
use crate::auth::AuthContextExt;
use crate::domain::{Choice, NewSensitiveData, RegistrationId, SensitiveData, TripId};
use crate::forms::SensitiveDataForm;
use crate::infra::{RejsError, RequestMeta};
use crate::server::AppState;
use crate::services::Accessor;

/// GET /admin/api/v1/registrations/:registration_id/sensitive-data
pub async fn get_sensitive_data(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(registration_id): Path<i64>,
    meta: RequestMeta,
) -> ApiResult<Json<SensitiveData>> {
    let registration_id = RegistrationId(registration_id);
    let data = state
        .sensitive_data
        .read(registration_id, Accessor::staff(&auth.username, &meta))
        .await?
        .ok_or_else(|| RejsError::not_found("sensitive data", registration_id))?;
    Ok(Json(data))
}

/// PUT /admin/api/v1/registrations/:registration_id/sensitive-data
///
/// Runs the same validation as the participant form.
pub async fn put_sensitive_data(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(registration_id): Path<i64>,
    meta: RequestMeta,
    payload: Result<Json<NewSensitiveData>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SensitiveData>)> {
    let Json(input) = payload?;
    let form = SensitiveDataForm {
        pesel: input.pesel,
        document_type: input.document_type.code().to_string(),
        document_number: input.document_number,
        consent: input.consent.then(|| "on".to_string()),
    };
    let data = form.clean()?;

    let saved = state
        .sensitive_data
        .save(
            RegistrationId(registration_id),
            data,
            Accessor::staff(&auth.username, &meta),
        )
        .await?;

    let status = if saved.replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(saved.data)))
}

/// DELETE /admin/api/v1/registrations/:registration_id/sensitive-data
pub async fn delete_sensitive_data(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(registration_id): Path<i64>,
    meta: RequestMeta,
) -> ApiResult<StatusCode> {
    let registration_id = RegistrationId(registration_id);
    let deleted = state
        .sensitive_data
        .delete(registration_id, Accessor::staff(&auth.username, &meta))
        .await?;
    if !deleted {
        return Err(RejsError::not_found("sensitive data", registration_id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/api/v1/trips/:trip_id/sensitive-data - Export for embarkation.
pub async fn export_sensitive_data(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(trip_id): Path<i64>,
    meta: RequestMeta,
) -> ApiResult<Json<Vec<SensitiveDataExportRow>>> {
    let rows = state
        .sensitive_data
        .export_trip(TripId(trip_id), Accessor::staff(&auth.username, &meta))
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(|(registration, sensitive_data)| SensitiveDataExportRow {
                registration,
                sensitive_data,
            })
            .collect(),
    ))
}
