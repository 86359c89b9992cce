//! Public HTML pages: trip list, registration, registration details and
//! the supplementary-data form.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::{NaiveDate, Utc};
use tera::Context;
use uuid::Uuid;

use super::error::PageError;
use crate::domain::{Choice, Registration, Trip, TripId};
use crate::forms::{FormView, RegistrationForm, SensitiveDataForm};
use crate::infra::sqlite::Trips;
use crate::infra::{RejsError, RequestMeta};
use crate::server::AppState;
use crate::services::Accessor;
use crate::validation::FieldErrors;

type PageResult = Result<Response, PageError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route(
            "/rejs/:trip_id/zgloszenie",
            get(registration_form).post(submit_registration),
        )
        .route("/zgloszenie/:token", get(registration_details))
        .route(
            "/zgloszenie/:token/dane-dodatkowe",
            get(sensitive_data_form).post(submit_sensitive_data),
        )
        .route("/rodo", get(rodo_info))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn render(state: &AppState, template: &str, ctx: &Context) -> PageResult {
    let body = state.templates.render(template, ctx)?;
    Ok(Html(body).into_response())
}

fn details_path(registration: &Registration) -> String {
    format!("/zgloszenie/{}", registration.token)
}

/// Unknown or malformed ids are both "not found".
fn parse_trip_id(raw: &str) -> Result<TripId, PageError> {
    raw.parse::<i64>().map(TripId).map_err(|_| PageError::NotFound)
}

fn parse_token(raw: &str) -> Result<Uuid, PageError> {
    Uuid::parse_str(raw).map_err(|_| PageError::NotFound)
}

async fn load_trip(state: &AppState, trip_id: TripId) -> Result<Trip, PageError> {
    let mut conn = state.db.acquire().await?;
    Trips::new(&mut conn)
        .find(trip_id)
        .await?
        .ok_or(PageError::NotFound)
}

/// GET / - trips open for registration.
async fn index(State(state): State<AppState>) -> PageResult {
    let trips = {
        let mut conn = state.db.acquire().await?;
        Trips::new(&mut conn).list_open(today()).await?
    };

    let mut ctx = Context::new();
    ctx.insert("trips", &trips);
    render(&state, "pages/index.html", &ctx)
}

fn registration_page(state: &AppState, trip: &Trip, form: FormView) -> PageResult {
    let mut ctx = Context::new();
    ctx.insert("trip", trip);
    ctx.insert("form", &form);
    render(state, "pages/registration_form.html", &ctx)
}

/// GET /rejs/:trip_id/zgloszenie
async fn registration_form(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> PageResult {
    let trip = load_trip(&state, parse_trip_id(&trip_id)?).await?;
    if !trip.accepts_registrations(today()) {
        return Ok(Redirect::to("/").into_response());
    }

    let form = RegistrationForm::default().view(&FieldErrors::new());
    registration_page(&state, &trip, form)
}

/// POST /rejs/:trip_id/zgloszenie
async fn submit_registration(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Form(form): Form<RegistrationForm>,
) -> PageResult {
    let trip = load_trip(&state, parse_trip_id(&trip_id)?).await?;
    if !trip.accepts_registrations(today()) {
        return Ok(Redirect::to("/").into_response());
    }

    let new = match form.clean(trip.id) {
        Ok(new) => new,
        Err(errors) => return registration_page(&state, &trip, form.view(&errors)),
    };

    match state.registrations.register(new, today()).await {
        Ok(registration) => Ok(Redirect::to(&details_path(&registration)).into_response()),
        Err(RejsError::Validation(errors)) => {
            registration_page(&state, &trip, form.view(&errors))
        }
        Err(RejsError::Conflict(_)) => Ok(Redirect::to("/").into_response()),
        Err(e) => Err(e.into()),
    }
}

/// GET /zgloszenie/:token
async fn registration_details(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> PageResult {
    let (registration, trip, has_sensitive_data) = state
        .registrations
        .find_by_token(parse_token(&token)?)
        .await?
        .ok_or(PageError::NotFound)?;

    if registration.requires_sensitive_data(has_sensitive_data) {
        let target = format!("{}/dane-dodatkowe", details_path(&registration));
        return Ok(Redirect::to(&target).into_response());
    }

    let mut ctx = Context::new();
    ctx.insert("trip", &trip);
    ctx.insert("registration", &registration);
    ctx.insert("full_name", &registration.full_name());
    ctx.insert("status_label", registration.status.label());
    ctx.insert("vision_label", registration.vision.label());
    ctx.insert("has_sensitive_data", &has_sensitive_data);
    render(&state, "pages/registration_details.html", &ctx)
}

fn sensitive_data_page(
    state: &AppState,
    registration: &Registration,
    trip: &Trip,
    form: FormView,
) -> PageResult {
    let mut ctx = Context::new();
    ctx.insert("trip", trip);
    ctx.insert("registration", registration);
    ctx.insert("full_name", &registration.full_name());
    ctx.insert("form", &form);
    render(state, "pages/sensitive_data_form.html", &ctx)
}

/// GET /zgloszenie/:token/dane-dodatkowe
async fn sensitive_data_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> PageResult {
    let (registration, trip, _) = state
        .registrations
        .find_by_token(parse_token(&token)?)
        .await?
        .ok_or(PageError::NotFound)?;

    let form = SensitiveDataForm::default().view(&FieldErrors::new());
    sensitive_data_page(&state, &registration, &trip, form)
}

/// POST /zgloszenie/:token/dane-dodatkowe
async fn submit_sensitive_data(
    State(state): State<AppState>,
    Path(token): Path<String>,
    meta: RequestMeta,
    Form(form): Form<SensitiveDataForm>,
) -> PageResult {
    let (registration, trip, _) = state
        .registrations
        .find_by_token(parse_token(&token)?)
        .await?
        .ok_or(PageError::NotFound)?;

    let data = match form.clean() {
        Ok(data) => data,
        Err(errors) => {
            return sensitive_data_page(&state, &registration, &trip, form.view(&errors))
        }
    };

    state
        .sensitive_data
        .save(registration.id, data, Accessor::participant(&meta))
        .await?;
    Ok(Redirect::to(&details_path(&registration)).into_response())
}

/// GET /rodo
async fn rodo_info(State(state): State<AppState>) -> PageResult {
    render(&state, "pages/rodo_info.html", &Context::new())
}
