use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Choice, PaymentId, PaymentKind, RegistrationId};
use crate::validation::FieldErrors;

/// A payment or refund recorded against one registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub registration_id: RegistrationId,
    pub amount: Decimal,
    pub kind: PaymentKind,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2} zł", self.kind.label(), self.amount)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    #[serde(default = "default_kind")]
    pub kind: PaymentKind,
}

fn default_kind() -> PaymentKind {
    PaymentKind::Payment
}

impl PaymentInput {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        if self.amount <= Decimal::ZERO {
            return Err(FieldErrors::single("amount", "Kwota musi być większa od zera."));
        }
        Ok(Self {
            amount: self.amount.round_dp(2),
            ..self
        })
    }
}
