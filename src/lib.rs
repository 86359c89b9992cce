//! Rejs: trip registration for sailing voyages with blind and
//! visually-impaired crews.
//!
//! ## Modules
//!
//! - [`domain`] - Trips, watches, registrations, payments, announcements
//! - [`validation`] - PESEL, phone and postal code checks, field errors
//! - [`forms`] - Accessible public forms (registration, supplementary data)
//! - [`infra`] - SQLite storage, field encryption, audit log, mail transports
//! - [`services`] - Registration rules, roster, notifications, retention
//! - [`auth`] - Staff API keys
//! - [`crypto`] - AES-256-GCM field encryption primitives
//! - [`api`] - Public pages and the staff JSON API
//! - [`templates`] - Tera page and email templates

pub mod api;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod forms;
pub mod infra;
pub mod migrations;
pub mod server;
pub mod services;
pub mod templates;
pub mod validation;

// Re-export commonly used types
pub use domain::{
    Announcement, AnnouncementId, Payment, PaymentId, Registration, RegistrationId,
    SensitiveData, Trip, TripId, Watch, WatchId,
};

pub use infra::{Database, FieldEncryption, RejsError, Result};
