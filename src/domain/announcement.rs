use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AnnouncementId, TripId};
use crate::validation::{required_text, FieldErrors};

pub const TITLE_MAX_CHARS: usize = 100;

/// A message broadcast by email to everyone registered for a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub trip_id: TripId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementInput {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_body")]
    pub body: String,
}

fn default_title() -> String {
    "nowe ogłoszenie".to_string()
}

fn default_body() -> String {
    "krótka informacja o rejsie".to_string()
}

impl AnnouncementInput {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = errors.check("title", required_text(&self.title, TITLE_MAX_CHARS));
        let body = errors.check("body", required_text(&self.body, usize::MAX));
        match (title, body) {
            (Some(title), Some(body)) => Ok(Self { title, body }),
            _ => Err(errors),
        }
    }
}
