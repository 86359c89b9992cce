//! Trips and their watches.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TripId, WatchId};
use crate::validation::{required_text, FieldErrors};

pub const NAME_MAX_CHARS: usize = 200;

pub fn default_price() -> Decimal {
    Decimal::new(150000, 2)
}

pub fn default_deposit() -> Decimal {
    Decimal::new(50000, 2)
}

fn default_description() -> String {
    "tutaj opis rejsu".to_string()
}

fn default_true() -> bool {
    true
}

/// A sailing trip (rejs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub departure_port: String,
    pub arrival_port: String,
    pub price: Decimal,
    pub deposit: Decimal,
    pub description: String,
    pub recruitment_open: bool,
}

impl Trip {
    /// Amount left to pay once the deposit is in.
    pub fn balance_after_deposit(&self) -> Decimal {
        self.price - self.deposit
    }

    /// Recruitment is open and the trip has not started yet.
    pub fn accepts_registrations(&self, today: NaiveDate) -> bool {
        self.recruitment_open && self.start_date >= today
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Trip fields as created or replaced through the staff API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub departure_port: String,
    pub arrival_port: String,
    #[serde(default = "default_price")]
    pub price: Decimal,
    #[serde(default = "default_deposit")]
    pub deposit: Decimal,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_true")]
    pub recruitment_open: bool,
}

impl TripInput {
    /// Normalize text fields and enforce `start_date <= end_date`.
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = errors.check("name", required_text(&self.name, NAME_MAX_CHARS));
        let departure_port = errors.check(
            "departure_port",
            required_text(&self.departure_port, NAME_MAX_CHARS),
        );
        let arrival_port =
            errors.check("arrival_port", required_text(&self.arrival_port, NAME_MAX_CHARS));
        let description = errors.check("description", required_text(&self.description, usize::MAX));

        if self.start_date > self.end_date {
            errors.add(
                "start_date",
                "Data rozpoczęcia nie może być późniejsza niż data zakończenia.",
            );
        }
        if self.price.is_sign_negative() {
            errors.add("price", "Cena nie może być ujemna.");
        }
        if self.deposit.is_sign_negative() {
            errors.add("deposit", "Zaliczka nie może być ujemna.");
        }

        match (name, departure_port, arrival_port, description) {
            (Some(name), Some(departure_port), Some(arrival_port), Some(description))
                if errors.is_empty() =>
            {
                Ok(Self {
                    name,
                    departure_port,
                    arrival_port,
                    description,
                    ..self
                })
            }
            _ => Err(errors),
        }
    }
}

/// A watch (wachta): a shift group within one trip's crew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watch {
    pub id: WatchId,
    pub trip_id: TripId,
    pub name: String,
}

impl Watch {
    /// `Wachta <name> - <trip>`
    pub fn label(&self, trip: &Trip) -> String {
        format!("Wachta {} - {}", self.name, trip)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchInput {
    pub name: String,
}

impl WatchInput {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        match errors.check("name", required_text(&self.name, NAME_MAX_CHARS)) {
            Some(name) => Ok(Self { name }),
            None => Err(errors),
        }
    }
}
