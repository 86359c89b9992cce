//! Application services: the rules that sit between HTTP handlers and
//! storage, and the lifecycle emails they trigger.

pub mod mailer;
pub mod notifications;
pub mod registrations;
pub mod roster;
pub mod sample_data;
pub mod sensitive_data;

pub use mailer::{BatchReport, Mailer, SendOutcome};
pub use notifications::{LifecycleEvent, Notifier};
pub use registrations::RegistrationService;
pub use roster::{Roster, RosterChange};
pub use sample_data::{load_sample_data, SampleDataSummary};
pub use sensitive_data::{Accessor, PurgeReport, SensitiveDataService, DEFAULT_RETENTION_DAYS};
