//! Staff JSON API under `/admin/api/v1`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;

use rejs::domain::{RegistrationId, RegistrationStatus};
use rejs::infra::sqlite::Registrations;

use common::*;

fn trip_json(name: &str) -> serde_json::Value {
    let start = today() + Duration::days(30);
    json!({
        "name": name,
        "start_date": start.to_string(),
        "end_date": (start + Duration::days(7)).to_string(),
        "departure_port": "Gdynia",
        "arrival_port": "Kołobrzeg",
        "price": "1500.00",
        "deposit": "500.00",
        "description": "Rejs szkoleniowy",
    })
}

fn decimal(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn requests_without_valid_key_are_rejected() {
    let app = spawn_app().await;

    let missing = app
        .send(
            Request::get("/admin/api/v1/trips")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json()["code"], "missing_auth");

    let wrong = app
        .send(
            Request::get("/admin/api/v1/trips")
                .header(header::AUTHORIZATION, "ApiKey rz_nieprawidlowy")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let bare = app
        .send(
            Request::get("/admin/api/v1/trips")
                .header(header::AUTHORIZATION, app.staff_key.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(bare.status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_endpoint_is_json_not_found() {
    let app = spawn_app().await;
    let response = app.api(Method::GET, "/nie-istnieje", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["code"], "RESOURCE_NOT_FOUND");
}

// ============================================================================
// Trips
// ============================================================================

#[tokio::test]
async fn trip_crud() {
    let app = spawn_app().await;

    let created = app
        .api(Method::POST, "/trips", Some(trip_json("  Rejs wakacyjny ")))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let trip = created.json();
    assert_eq!(trip["name"], "Rejs wakacyjny");
    assert_eq!(trip["recruitment_open"], true);
    let id = trip["id"].as_i64().unwrap();

    let mut update = trip_json("Rejs jesienny");
    update["recruitment_open"] = json!(false);
    let updated = app
        .api(Method::PUT, &format!("/trips/{id}"), Some(update))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["name"], "Rejs jesienny");
    assert_eq!(updated.json()["recruitment_open"], false);

    let detail = app.api(Method::GET, &format!("/trips/{id}"), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.json()["registration_count"], 0);
    assert_eq!(detail.json()["watches"], json!([]));

    let list = app.api(Method::GET, "/trips", None).await;
    assert_eq!(list.json().as_array().unwrap().len(), 1);

    let deleted = app.api(Method::DELETE, &format!("/trips/{id}"), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.api(Method::GET, &format!("/trips/{id}"), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json()["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn trip_validation_errors_are_reported_per_field() {
    let app = spawn_app().await;

    let mut body = trip_json("Rejs");
    body["end_date"] = json!((today() + Duration::days(1)).to_string());
    body["name"] = json!("   ");
    let response = app.api(Method::POST, "/trips", Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers.get("x-error-code").unwrap(),
        "VALIDATION_FAILED"
    );
    let json = response.json();
    assert_eq!(json["code"], "VALIDATION_FAILED");
    assert!(json["fields"]["start_date"].is_array());
    assert!(json["fields"]["name"].is_array());

    let malformed = app
        .api(Method::POST, "/trips", Some(json!({ "name": 5 })))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json()["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn deleting_a_trip_removes_its_registrations() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;
    app.create_registration(&trip, "Anna").await;

    let saved = app
        .api(
            Method::PUT,
            &format!("/registrations/{}/sensitive-data", registration.id),
            Some(json!({
                "pesel": PESEL,
                "document_type": "paszport",
                "document_number": "EA1234567",
                "consent": true,
            })),
        )
        .await;
    assert_eq!(saved.status, StatusCode::CREATED);

    let response = app
        .api(Method::DELETE, &format!("/trips/{}", trip.id), None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .api(
            Method::GET,
            &format!("/registrations/{}", registration.id),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // Only the registration that had supplementary data gets a delete entry.
    let audit = app
        .api(Method::GET, "/audit-log?action=delete", None)
        .await
        .json();
    assert_eq!(audit["total"], 1);
    let entry = &audit["entries"][0];
    assert_eq!(entry["actor"], STAFF_USERNAME);
    assert_eq!(entry["model_name"], "SensitiveData");
    assert_eq!(entry["object_id"], registration.id.0);
    assert_eq!(entry["details"], "Usunięcie rejsu Rejs");

    let all = app.api(Method::GET, "/audit-log", None).await.json();
    assert_eq!(all["total"], 2);

    let missing = app
        .api(Method::DELETE, &format!("/trips/{}", trip.id), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Registrations
// ============================================================================

#[tokio::test]
async fn status_changes_send_the_matching_email() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs wakacyjny", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;
    let uri = format!("/registrations/{}", registration.id);

    let qualified = app
        .api(Method::PATCH, &uri, Some(json!({ "status": "zakwalifikowany" })))
        .await;
    assert_eq!(qualified.status, StatusCode::OK);
    assert_eq!(qualified.json()["status"], "zakwalifikowany");
    let sent = app.mail.messages_to("jan@example.com");
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].subject,
        "Potwierdzenie zakwalifikowania - zakwalifikowanie na rejs Rejs wakacyjny"
    );

    // Same status again: nothing new is sent.
    app.api(Method::PATCH, &uri, Some(json!({ "status": "zakwalifikowany" })))
        .await;
    assert_eq!(app.mail.messages().len(), 1);

    app.api(Method::PATCH, &uri, Some(json!({ "status": "niezakwalifikowany" })))
        .await;
    assert_eq!(app.mail.messages().len(), 1);

    app.api(Method::PATCH, &uri, Some(json!({ "status": "odrzucone" })))
        .await;
    let sent = app.mail.messages();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].subject, "Odrzucone zgłoszenie na rejs Rejs wakacyjny");
}

#[tokio::test]
async fn status_change_is_rolled_back_when_mail_fails() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;
    app.mail.fail_for("jan@example.com");

    let response = app
        .api(
            Method::PATCH,
            &format!("/registrations/{}", registration.id),
            Some(json!({ "status": "zakwalifikowany" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "MAIL_DELIVERY_FAILED");

    let mut conn = app.db.acquire().await.unwrap();
    let stored = Registrations::new(&mut conn)
        .get(registration.id)
        .await
        .unwrap();
    assert_eq!(stored.status, RegistrationStatus::Unqualified);
}

#[tokio::test]
async fn list_registrations_filters_by_trip_and_status() {
    let app = spawn_app().await;
    let first = app.create_trip("Pierwszy", 30).await;
    let second = app.create_trip("Drugi", 60).await;
    let jan = app.create_registration(&first, "Jan").await;
    app.create_registration(&first, "Anna").await;
    app.create_registration(&second, "Piotr").await;
    app.api(
        Method::PATCH,
        &format!("/registrations/{}", jan.id),
        Some(json!({ "status": "zakwalifikowany" })),
    )
    .await;

    let all = app.api(Method::GET, "/registrations", None).await;
    assert_eq!(all.json().as_array().unwrap().len(), 3);

    let by_trip = app
        .api(
            Method::GET,
            &format!("/registrations?trip_id={}", first.id),
            None,
        )
        .await;
    assert_eq!(by_trip.json().as_array().unwrap().len(), 2);

    let qualified = app
        .api(
            Method::GET,
            &format!("/registrations?trip_id={}&status=zakwalifikowany", first.id),
            None,
        )
        .await;
    let qualified = qualified.json();
    assert_eq!(qualified.as_array().unwrap().len(), 1);
    assert_eq!(qualified[0]["first_name"], "Jan");
}

#[tokio::test]
async fn watch_from_another_trip_is_rejected() {
    let app = spawn_app().await;
    let first = app.create_trip("Pierwszy", 30).await;
    let second = app.create_trip("Drugi", 60).await;
    let foreign_watch = app.create_watch(&second, "A").await;
    let registration = app.create_registration(&first, "Jan").await;

    let response = app
        .api(
            Method::PATCH,
            &format!("/registrations/{}", registration.id),
            Some(json!({ "watch_id": foreign_watch.id })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["fields"]["watch_id"].is_array());
    assert!(app.mail.messages().is_empty());
}

#[tokio::test]
async fn patch_watch_assigns_and_clears() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let watch = app.create_watch(&trip, "Dziobowa").await;
    let registration = app.create_registration(&trip, "Jan").await;
    let uri = format!("/registrations/{}", registration.id);

    let assigned = app
        .api(Method::PATCH, &uri, Some(json!({ "watch_id": watch.id })))
        .await;
    assert_eq!(assigned.status, StatusCode::OK);
    assert_eq!(assigned.json()["watch_id"], watch.id.0);
    let sent = app.mail.messages_to("jan@example.com");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Przydział do wachty Dziobowa");

    // Absent field leaves the watch alone.
    let untouched = app.api(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(untouched.json()["watch_id"], watch.id.0);

    let cleared = app
        .api(Method::PATCH, &uri, Some(json!({ "watch_id": null })))
        .await;
    assert_eq!(cleared.json()["watch_id"], serde_json::Value::Null);
    assert_eq!(app.mail.messages().len(), 1);
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn payments_update_balance_and_notify() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;
    let uri = format!("/registrations/{}/payments", registration.id);

    let payment = app
        .api(Method::POST, &uri, Some(json!({ "amount": "500" })))
        .await;
    assert_eq!(payment.status, StatusCode::CREATED);
    assert_eq!(payment.json()["kind"], "wplata");

    let refund = app
        .api(
            Method::POST,
            &uri,
            Some(json!({ "amount": "100.00", "kind": "zwrot" })),
        )
        .await;
    assert_eq!(refund.status, StatusCode::CREATED);

    let subjects: Vec<String> = app
        .mail
        .messages_to("jan@example.com")
        .into_iter()
        .map(|m| m.subject)
        .collect();
    assert_eq!(
        subjects,
        vec![
            "Potwierdzenie otrzymania wpłaty - dziękujemy za wpłatę".to_string(),
            "Zwrot wpłaty".to_string(),
        ]
    );
    let payment_mail = &app.mail.messages()[0];
    assert!(payment_mail.text_body.contains("500.00 zł"));

    let detail = app
        .api(
            Method::GET,
            &format!("/registrations/{}", registration.id),
            None,
        )
        .await
        .json();
    assert_eq!(decimal(&detail["payments_total"]), Decimal::new(400, 0));
    assert_eq!(decimal(&detail["amount_due"]), Decimal::new(1100, 0));
    assert_eq!(detail["payments"].as_array().unwrap().len(), 2);
    assert_eq!(detail["has_sensitive_data"], false);

    let trip_payments = app
        .api(Method::GET, &format!("/trips/{}/payments", trip.id), None)
        .await;
    assert_eq!(trip_payments.json().as_array().unwrap().len(), 2);

    let payment_id = payment.json()["id"].as_i64().unwrap();
    let deleted = app
        .api(Method::DELETE, &format!("/payments/{payment_id}"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let listed = app.api(Method::GET, &uri, None).await;
    assert_eq!(listed.json().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_positive_payment_is_rejected() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;

    let response = app
        .api(
            Method::POST,
            &format!("/registrations/{}/payments", registration.id),
            Some(json!({ "amount": "0" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["fields"]["amount"].is_array());
    assert!(app.mail.messages().is_empty());
}

// ============================================================================
// Announcements
// ============================================================================

#[tokio::test]
async fn announcement_for_a_trip_without_registrants_sends_nothing() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs wakacyjny", 30).await;

    let response = app
        .api(
            Method::POST,
            &format!("/trips/{}/announcements", trip.id),
            Some(json!({ "title": "Zbiórka", "body": "Zbiórka o 10:00 w porcie." })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let json = response.json();
    assert_eq!(json["delivery"]["sent"], 0);
    assert_eq!(json["delivery"]["failed"], json!([]));
    assert!(app.mail.messages().is_empty());

    let listed = app
        .api(
            Method::GET,
            &format!("/trips/{}/announcements", trip.id),
            None,
        )
        .await
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn announcement_is_broadcast_to_every_registrant() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs wakacyjny", 30).await;
    let other = app.create_trip("Inny rejs", 60).await;
    app.create_registration(&trip, "Jan").await;
    app.create_registration(&trip, "Anna").await;
    app.create_registration(&trip, "Piotr").await;
    app.create_registration(&other, "Ewa").await;
    app.mail.fail_for("anna@example.com");

    let response = app
        .api(
            Method::POST,
            &format!("/trips/{}/announcements", trip.id),
            Some(json!({ "title": "Zbiórka", "body": "Zbiórka o 10:00 w porcie." })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let json = response.json();
    assert_eq!(json["announcement"]["title"], "Zbiórka");
    assert_eq!(json["delivery"]["sent"], 2);
    assert_eq!(json["delivery"]["failed"][0][0][0], "anna@example.com");

    let sent = app.mail.messages();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.subject == "Rejs wakacyjny: Zbiórka"));
    assert!(app.mail.messages_to("ewa@example.com").is_empty());

    let listed = app
        .api(
            Method::GET,
            &format!("/trips/{}/announcements", trip.id),
            None,
        )
        .await;
    let listed = listed.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let id = listed[0]["id"].as_i64().unwrap();
    let deleted = app
        .api(Method::DELETE, &format!("/announcements/{id}"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn announcement_defaults_fill_missing_fields() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;

    let response = app
        .api(
            Method::POST,
            &format!("/trips/{}/announcements", trip.id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["announcement"]["title"], "nowe ogłoszenie");
    assert_eq!(response.json()["delivery"]["sent"], 0);
}

// ============================================================================
// Sensitive data
// ============================================================================

#[tokio::test]
async fn sensitive_data_lifecycle_through_the_api() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;
    let uri = format!("/registrations/{}/sensitive-data", registration.id);
    let body = json!({
        "pesel": "900-214-01384",
        "document_type": "paszport",
        "document_number": "EA1234567",
        "consent": true,
    });

    let created = app.api(Method::PUT, &uri, Some(body.clone())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["pesel"], PESEL);

    let replaced = app.api(Method::PUT, &uri, Some(body)).await;
    assert_eq!(replaced.status, StatusCode::OK);

    let read = app.api(Method::GET, &uri, None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.json()["document_type"], "paszport");

    let export = app
        .api(
            Method::GET,
            &format!("/trips/{}/sensitive-data", trip.id),
            None,
        )
        .await;
    assert_eq!(export.status, StatusCode::OK);
    let rows = export.json();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["registration"]["first_name"], "Jan");
    assert_eq!(rows[0]["sensitive_data"]["document_number"], "EA1234567");

    let deleted = app.api(Method::DELETE, &uri, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let missing = app.api(Method::GET, &uri, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    let deleted_again = app.api(Method::DELETE, &uri, None).await;
    assert_eq!(deleted_again.status, StatusCode::NOT_FOUND);

    let audit = app.api(Method::GET, "/audit-log", None).await.json();
    assert_eq!(audit["total"], 5);
    let actions: Vec<&str> = audit["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["delete", "export", "read", "update", "create"]);
    assert!(audit["entries"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["actor"] == STAFF_USERNAME));
}

#[tokio::test]
async fn sensitive_data_put_runs_form_validation() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;

    let response = app
        .api(
            Method::PUT,
            &format!("/registrations/{}/sensitive-data", registration.id),
            Some(json!({
                "pesel": "90021401385",
                "document_type": "paszport",
                "document_number": "",
                "consent": false,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields = &response.json()["fields"];
    assert!(fields["pesel"].is_array());
    assert!(fields["document_number"].is_array());
    assert!(fields["consent"].is_array());
}

#[tokio::test]
async fn deleting_registration_audits_removal_of_its_data() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let registration = app.create_registration(&trip, "Jan").await;
    app.api(
        Method::PUT,
        &format!("/registrations/{}/sensitive-data", registration.id),
        Some(json!({
            "pesel": PESEL,
            "document_type": "dowod-osobisty",
            "document_number": "ABC123456",
            "consent": true,
        })),
    )
    .await;

    let response = app
        .api(
            Method::DELETE,
            &format!("/registrations/{}", registration.id),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let audit = app
        .api(Method::GET, "/audit-log?action=delete", None)
        .await
        .json();
    assert_eq!(audit["total"], 1);
    assert_eq!(audit["entries"][0]["object_id"], registration.id.0);
}

#[tokio::test]
async fn audit_log_filters_and_paging() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs", 30).await;
    let jan = app.create_registration(&trip, "Jan").await;
    let anna = app.create_registration(&trip, "Anna").await;
    for registration in [&jan, &anna] {
        app.api(
            Method::PUT,
            &format!("/registrations/{}/sensitive-data", registration.id),
            Some(json!({
                "pesel": PESEL,
                "document_type": "paszport",
                "document_number": "EA1234567",
                "consent": true,
            })),
        )
        .await;
    }

    let by_object = app
        .api(
            Method::GET,
            &format!("/audit-log?object_id={}", anna.id),
            None,
        )
        .await
        .json();
    assert_eq!(by_object["total"], 1);

    let paged = app
        .api(Method::GET, "/audit-log?limit=1&offset=1", None)
        .await
        .json();
    assert_eq!(paged["total"], 2);
    assert_eq!(paged["limit"], 1);
    assert_eq!(paged["entries"].as_array().unwrap().len(), 1);
    assert_eq!(paged["entries"][0]["object_id"], jan.id.0);

    let unknown = app
        .api(Method::GET, "/audit-log?action=steal", None)
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json()["code"], "INVALID_REQUEST_BODY");
}

// ============================================================================
// Watches
// ============================================================================

#[tokio::test]
async fn watch_membership_endpoints() {
    let app = spawn_app().await;
    let trip = app.create_trip("Rejs wakacyjny", 30).await;
    let jan = app.create_registration(&trip, "Jan").await;
    let anna = app.create_registration(&trip, "Anna").await;

    let created = app
        .api(
            Method::POST,
            &format!("/trips/{}/watches", trip.id),
            Some(json!({ "name": "Rufowa" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let watch_id = created.json()["id"].as_i64().unwrap();

    let added = app
        .api(
            Method::POST,
            &format!("/watches/{watch_id}/members"),
            Some(json!({ "registration_id": jan.id })),
        )
        .await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(app.mail.messages_to("jan@example.com").len(), 1);

    let available = app
        .api(
            Method::GET,
            &format!("/trips/{}/available-members", trip.id),
            None,
        )
        .await
        .json();
    assert_eq!(available.as_array().unwrap().len(), 1);
    assert_eq!(available[0]["first_name"], "Anna");

    let set = app
        .api(
            Method::PUT,
            &format!("/watches/{watch_id}/members"),
            Some(json!({ "registration_ids": [anna.id] })),
        )
        .await;
    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(set.json()["added"], json!([anna.id.0]));
    assert_eq!(set.json()["removed"], json!([jan.id.0]));

    let detail = app
        .api(Method::GET, &format!("/watches/{watch_id}"), None)
        .await
        .json();
    assert_eq!(detail["label"], "Wachta Rufowa - Rejs wakacyjny");
    assert_eq!(detail["members"].as_array().unwrap().len(), 1);
    assert_eq!(detail["members"][0]["first_name"], "Anna");

    let removed = app
        .api(
            Method::DELETE,
            &format!("/watches/{watch_id}/members/{}", anna.id),
            None,
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);

    let renamed = app
        .api(
            Method::PUT,
            &format!("/watches/{watch_id}"),
            Some(json!({ "name": "Dziobowa" })),
        )
        .await;
    assert_eq!(renamed.json()["name"], "Dziobowa");

    let deleted = app
        .api(Method::DELETE, &format!("/watches/{watch_id}"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn reconcile_with_foreign_registration_changes_nothing() {
    let app = spawn_app().await;
    let trip = app.create_trip("Pierwszy", 30).await;
    let other = app.create_trip("Drugi", 60).await;
    let watch = app.create_watch(&trip, "A").await;
    let jan = app.create_registration(&trip, "Jan").await;
    let ewa = app.create_registration(&other, "Ewa").await;

    let response = app
        .api(
            Method::PUT,
            &format!("/watches/{}/members", watch.id),
            Some(json!({ "registration_ids": [jan.id, ewa.id] })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["fields"]["members"].is_array());

    let mut conn = app.db.acquire().await.unwrap();
    let members = Registrations::new(&mut conn)
        .list_for_watch(watch.id)
        .await
        .unwrap();
    assert!(members.is_empty());

    let missing = RegistrationId(9999);
    drop(conn);
    let response = app
        .api(
            Method::PUT,
            &format!("/watches/{}/members", watch.id),
            Some(json!({ "registration_ids": [missing] })),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
