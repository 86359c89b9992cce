//! Registrations (zgłoszenia) and their sensitive supplementary data.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{
    DocumentType, Payment, PaymentKind, PriorParticipation, RegistrationId, RegistrationStatus,
    Trip, TripId, VisionStatus, WatchId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub trip_id: TripId,
    pub watch_id: Option<WatchId>,
    /// Unguessable key of the participant-facing detail URL.
    pub token: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub vision: VisionStatus,
    pub prior_participation: PriorParticipation,
    pub gdpr_consent: bool,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Qualified participants must hand in their document data.
    pub fn requires_sensitive_data(&self, has_sensitive_data: bool) -> bool {
        self.status == RegistrationStatus::Qualified && !has_sensitive_data
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Validated registration ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub trip_id: TripId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub vision: VisionStatus,
    pub prior_participation: PriorParticipation,
    pub gdpr_consent: bool,
}

/// Partial update applied by staff.
///
/// `watch_id: null` clears the assignment, an absent field leaves it as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationUpdate {
    #[serde(default)]
    pub status: Option<RegistrationStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub watch_id: Option<Option<WatchId>>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Money owed on a registration, derived from its trip and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub trip_price: Decimal,
    /// Payments minus refunds.
    pub payments_total: Decimal,
    pub amount_due: Decimal,
}

impl Balance {
    pub fn compute(trip: &Trip, payments: &[Payment]) -> Self {
        let payments_total = payments
            .iter()
            .map(|p| match p.kind {
                PaymentKind::Payment => p.amount,
                PaymentKind::Refund => -p.amount,
            })
            .sum::<Decimal>();
        Self {
            trip_price: trip.price,
            payments_total,
            amount_due: trip.price - payments_total,
        }
    }
}

/// Decrypted supplementary data of a qualified participant.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SensitiveData {
    pub registration_id: RegistrationId,
    pub pesel: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub consent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SensitiveData {
    /// Audit representation; never includes the protected values.
    pub fn audit_repr(&self, registration: &Registration) -> String {
        format!("Dane dodatkowe: {registration}")
    }
}

impl fmt::Debug for SensitiveData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensitiveData")
            .field("registration_id", &self.registration_id)
            .field("pesel", &"***")
            .field("document_type", &self.document_type)
            .field("document_number", &"***")
            .field("consent", &self.consent)
            .finish()
    }
}

/// Validated supplementary data ready to be encrypted and stored.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct NewSensitiveData {
    pub pesel: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub consent: bool,
}

impl fmt::Debug for NewSensitiveData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewSensitiveData")
            .field("document_type", &self.document_type)
            .field("consent", &self.consent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentId;

    fn trip(price: i64) -> Trip {
        Trip {
            id: TripId(1),
            name: "Rejs".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 7, 8).unwrap(),
            departure_port: "Gdynia".to_string(),
            arrival_port: "Gdynia".to_string(),
            price: Decimal::new(price, 0),
            deposit: Decimal::new(500, 0),
            description: String::new(),
            recruitment_open: true,
        }
    }

    fn payment(amount: i64, kind: PaymentKind) -> Payment {
        Payment {
            id: PaymentId(1),
            registration_id: RegistrationId(1),
            amount: Decimal::new(amount, 0),
            kind,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balance_subtracts_refunds() {
        let payments = [
            payment(500, PaymentKind::Payment),
            payment(700, PaymentKind::Payment),
            payment(200, PaymentKind::Refund),
        ];
        let balance = Balance::compute(&trip(1500), &payments);
        assert_eq!(balance.payments_total, Decimal::new(1000, 0));
        assert_eq!(balance.amount_due, Decimal::new(500, 0));
        assert_eq!(balance.trip_price, Decimal::new(1500, 0));
    }

    #[test]
    fn balance_without_payments_is_full_price() {
        let balance = Balance::compute(&trip(1500), &[]);
        assert_eq!(balance.payments_total, Decimal::ZERO);
        assert_eq!(balance.amount_due, Decimal::new(1500, 0));
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let absent: RegistrationUpdate = serde_json::from_str(r#"{"status":"odrzucone"}"#).unwrap();
        assert_eq!(absent.watch_id, None);
        assert_eq!(absent.status, Some(RegistrationStatus::Rejected));

        let cleared: RegistrationUpdate = serde_json::from_str(r#"{"watch_id":null}"#).unwrap();
        assert_eq!(cleared.watch_id, Some(None));

        let set: RegistrationUpdate = serde_json::from_str(r#"{"watch_id":4}"#).unwrap();
        assert_eq!(set.watch_id, Some(Some(WatchId(4))));
    }

    #[test]
    fn sensitive_debug_is_redacted() {
        let data = SensitiveData {
            registration_id: RegistrationId(1),
            pesel: "90021401384".to_string(),
            document_type: DocumentType::IdCard,
            document_number: "ABC123456".to_string(),
            consent: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let debug = format!("{data:?}");
        assert!(!debug.contains("90021401384"));
        assert!(!debug.contains("ABC123456"));
    }
}
