//! Audit log query handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use super::ApiResult;
use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{AuditLogPage, AuditLogQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::infra::{AuditAction, AuditLog, AuditQueryFilters};
use crate::server::AppState;

/// GET /admin/api/v1/audit-log?actor=&action=&model_name=&object_id=&limit=&offset=
pub async fn query_audit_log(
    State(state): State<AppState>,
    query: Result<Query<AuditLogQuery>, QueryRejection>,
) -> ApiResult<Json<AuditLogPage>> {
    let Query(query) = query?;

    let action = match query.action.as_deref().filter(|a| !a.is_empty()) {
        Some(raw) => Some(AuditAction::parse(raw).ok_or_else(|| {
            ApiError::new(
                ErrorCode::InvalidRequestBody,
                format!("Unknown audit action: {raw}"),
            )
        })?),
        None => None,
    };
    let filters = AuditQueryFilters {
        actor: query.actor,
        action,
        model_name: query.model_name,
        object_id: query.object_id,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.acquire().await?;
    let total = AuditLog::new(&mut conn).count(&filters).await?;
    let entries = AuditLog::new(&mut conn).query(&filters, limit, offset).await?;

    Ok(Json(AuditLogPage {
        entries,
        total,
        limit,
        offset,
    }))
}
