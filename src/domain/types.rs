//! Identifier newtypes and enumerated field values.
//!
//! Enumerations are stored and sent over the wire using their Polish codes
//! (the values posted by the public forms), see [`Choice::code`].

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Trip (rejs) identifier
    TripId
);
id_type!(
    /// Watch (wachta) identifier
    WatchId
);
id_type!(
    /// Registration (zgłoszenie) identifier
    RegistrationId
);
id_type!(PaymentId);
id_type!(AnnouncementId);

/// Enumerated field with a stable storage code and a display label.
pub trait Choice: Sized + Copy + 'static {
    /// All variants in form order.
    const ALL: &'static [Self];

    fn code(&self) -> &'static str;

    fn label(&self) -> &'static str;

    fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

/// Participant's sight category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisionStatus {
    #[serde(rename = "NIEWIDOMY")]
    Blind,
    #[serde(rename = "SLABO-WIDZACY")]
    VisuallyImpaired,
    #[serde(rename = "WIDZI")]
    Sighted,
}

impl Choice for VisionStatus {
    const ALL: &'static [Self] = &[Self::Blind, Self::VisuallyImpaired, Self::Sighted];

    fn code(&self) -> &'static str {
        match self {
            Self::Blind => "NIEWIDOMY",
            Self::VisuallyImpaired => "SLABO-WIDZACY",
            Self::Sighted => "WIDZI",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Blind => "Osoba niewidoma",
            Self::VisuallyImpaired => "Osoba słabowidząca",
            Self::Sighted => "Osoba widząca",
        }
    }
}

/// Whether the participant sailed with the organization before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorParticipation {
    #[serde(rename = "tak")]
    Yes,
    #[serde(rename = "nie")]
    No,
}

impl Choice for PriorParticipation {
    const ALL: &'static [Self] = &[Self::Yes, Self::No];

    fn code(&self) -> &'static str {
        match self {
            Self::Yes => "tak",
            Self::No => "nie",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Yes => "Tak",
            Self::No => "Nie",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[serde(rename = "zakwalifikowany")]
    Qualified,
    #[default]
    #[serde(rename = "niezakwalifikowany")]
    Unqualified,
    #[serde(rename = "odrzucone")]
    Rejected,
}

impl Choice for RegistrationStatus {
    const ALL: &'static [Self] = &[Self::Unqualified, Self::Qualified, Self::Rejected];

    fn code(&self) -> &'static str {
        match self {
            Self::Qualified => "zakwalifikowany",
            Self::Unqualified => "niezakwalifikowany",
            Self::Rejected => "odrzucone",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Qualified => "Zakwalifikowany",
            Self::Unqualified => "Niezakwalifikowany",
            Self::Rejected => "Odrzucone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    #[serde(rename = "wplata")]
    Payment,
    #[serde(rename = "zwrot")]
    Refund,
}

impl Choice for PaymentKind {
    const ALL: &'static [Self] = &[Self::Payment, Self::Refund];

    fn code(&self) -> &'static str {
        match self {
            Self::Payment => "wplata",
            Self::Refund => "zwrot",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Payment => "Wpłata",
            Self::Refund => "Zwrot",
        }
    }
}

/// Identity document handed over at embarkation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "paszport")]
    Passport,
    #[serde(rename = "dowod-osobisty")]
    IdCard,
}

impl Choice for DocumentType {
    const ALL: &'static [Self] = &[Self::Passport, Self::IdCard];

    fn code(&self) -> &'static str {
        match self {
            Self::Passport => "paszport",
            Self::IdCard => "dowod-osobisty",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Passport => "Paszport",
            Self::IdCard => "Dowód osobisty",
        }
    }
}
