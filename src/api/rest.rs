//! Staff JSON API, mounted under `/admin/api/v1` behind the auth middleware.

use axum::routing::{delete, get, put};
use axum::Router;

use super::error::api_not_found;
use super::handlers::*;
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Trips
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/:trip_id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/trips/:trip_id/watches", get(list_watches).post(create_watch))
        .route("/trips/:trip_id/available-members", get(available_members))
        .route("/trips/:trip_id/payments", get(list_trip_payments))
        .route(
            "/trips/:trip_id/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/trips/:trip_id/sensitive-data", get(export_sensitive_data))
        // Watches
        .route(
            "/watches/:watch_id",
            get(get_watch).put(update_watch).delete(delete_watch),
        )
        .route(
            "/watches/:watch_id/members",
            put(set_watch_members).post(add_watch_member),
        )
        .route(
            "/watches/:watch_id/members/:registration_id",
            delete(remove_watch_member),
        )
        // Registrations
        .route("/registrations", get(list_registrations))
        .route(
            "/registrations/:registration_id",
            get(get_registration)
                .patch(update_registration)
                .delete(delete_registration),
        )
        .route(
            "/registrations/:registration_id/sensitive-data",
            get(get_sensitive_data)
                .put(put_sensitive_data)
                .delete(delete_sensitive_data),
        )
        .route(
            "/registrations/:registration_id/payments",
            get(list_registration_payments).post(create_payment),
        )
        // Payments and announcements
        .route("/payments/:payment_id", delete(delete_payment))
        .route(
            "/announcements/:announcement_id",
            delete(delete_announcement),
        )
        // RODO
        .route("/audit-log", get(query_audit_log))
        .fallback(api_not_found)
}
