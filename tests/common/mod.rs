//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::ServiceExt;

use rejs::auth::{ApiKeyValidator, AuthMiddlewareState, Authenticator, StaffKeyRecord};
use rejs::domain::{
    NewRegistration, PriorParticipation, Registration, Trip, TripInput, VisionStatus, Watch,
    WatchInput,
};
use rejs::infra::sqlite::{Registrations, Trips, Watches};
use rejs::infra::{Database, FieldEncryption, MemoryMailTransport};
use rejs::server::{build_router, AppState};
use rejs::templates::{Templates, DEFAULT_TEMPLATE_DIR};

pub const STAFF_USERNAME: &str = "kapitan";
pub const SITE_URL: &str = "http://rejsy.test";
pub const FROM_EMAIL: &str = "noreply@zobaczyc.morze";

/// Valid PESEL used throughout the tests.
pub const PESEL: &str = "90021401384";

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Application wired against an in-memory database and mail outbox.
pub struct TestApp {
    pub db: Database,
    pub state: AppState,
    pub router: Router,
    pub mail: Arc<MemoryMailTransport>,
    pub staff_key: String,
}

pub async fn spawn_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let templates = Arc::new(Templates::load(DEFAULT_TEMPLATE_DIR).unwrap());
    let mail = Arc::new(MemoryMailTransport::new());
    let state = AppState::new(
        db.clone(),
        FieldEncryption::ephemeral(),
        templates,
        mail.clone(),
        FROM_EMAIL,
        SITE_URL,
    );

    let validator = Arc::new(ApiKeyValidator::new());
    let (staff_key, hash) = ApiKeyValidator::generate_key();
    validator.register_key(StaffKeyRecord::new(hash, STAFF_USERNAME));
    let auth_state = AuthMiddlewareState {
        authenticator: Arc::new(Authenticator::new(validator)),
        require_auth: true,
    };

    let router = build_router(state.clone(), auth_state);
    TestApp {
        db,
        state,
        router,
        mail,
        staff_key,
    }
}

/// Response status, headers and body.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Authenticated staff API call; `uri` is relative to `/admin/api/v1`.
    pub async fn api(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/admin/api/v1{uri}"))
            .header(header::AUTHORIZATION, format!("ApiKey {}", self.staff_key));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn create_trip(&self, name: &str, starts_in_days: i64) -> Trip {
        let mut conn = self.db.acquire().await.unwrap();
        Trips::new(&mut conn)
            .insert(&trip_input(name, starts_in_days))
            .await
            .unwrap()
    }

    pub async fn create_watch(&self, trip: &Trip, name: &str) -> Watch {
        let mut conn = self.db.acquire().await.unwrap();
        Watches::new(&mut conn)
            .insert(
                trip.id,
                &WatchInput {
                    name: name.to_string(),
                },
            )
            .await
            .unwrap()
    }

    /// Insert a registration directly, without sending any email.
    pub async fn create_registration(&self, trip: &Trip, first_name: &str) -> Registration {
        let mut conn = self.db.acquire().await.unwrap();
        Registrations::new(&mut conn)
            .insert(&new_registration(trip, first_name))
            .await
            .unwrap()
    }
}

pub fn trip_input(name: &str, starts_in_days: i64) -> TripInput {
    let start = today() + Duration::days(starts_in_days);
    TripInput {
        name: name.to_string(),
        start_date: start,
        end_date: start + Duration::days(7),
        departure_port: "Gdynia".to_string(),
        arrival_port: "Kołobrzeg".to_string(),
        price: Decimal::new(150000, 2),
        deposit: Decimal::new(50000, 2),
        description: "Rejs szkoleniowy po Bałtyku".to_string(),
        recruitment_open: true,
    }
}

pub fn new_registration(trip: &Trip, first_name: &str) -> NewRegistration {
    NewRegistration {
        trip_id: trip.id,
        first_name: first_name.to_string(),
        last_name: "Kowalski".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        phone: "+48501234567".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 2, 14).unwrap(),
        address: "ul. Morska 1".to_string(),
        postal_code: "81-001".to_string(),
        city: "Gdynia".to_string(),
        vision: VisionStatus::Blind,
        prior_participation: PriorParticipation::No,
        gdpr_consent: true,
    }
}

/// Urlencoded registration form for `first_name`, all fields valid.
pub fn registration_form_body(first_name: &str) -> String {
    format!(
        "first_name={first_name}&last_name=Kowalski&email={}%40example.com\
         &phone=501+234+567&birth_date=1990-02-14&address=ul.+Morska+1\
         &postal_code=81001&city=Gdynia&vision=NIEWIDOMY&prior_participation=nie\
         &gdpr_consent=on",
        first_name.to_lowercase()
    )
}
