//! Request and response bodies of the staff API.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Announcement, Balance, Payment, Registration, RegistrationId, RegistrationStatus,
    SensitiveData, Trip, TripId, Watch,
};
use crate::infra::AuditLogEntry;
use crate::services::BatchReport;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub watches: Vec<Watch>,
    pub registration_count: usize,
}

#[derive(Debug, Serialize)]
pub struct WatchDetail {
    #[serde(flatten)]
    pub watch: Watch,
    pub label: String,
    pub members: Vec<Registration>,
}

/// Registration with its computed balance.
#[derive(Debug, Serialize)]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: Registration,
    #[serde(flatten)]
    pub balance: Balance,
    pub payments: Vec<Payment>,
    pub has_sensitive_data: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationQuery {
    pub trip_id: Option<TripId>,
    pub status: Option<RegistrationStatus>,
}

/// `PUT /watches/:id/members`
#[derive(Debug, Deserialize)]
pub struct SetMembersRequest {
    pub registration_ids: Vec<RegistrationId>,
}

/// `POST /watches/:id/members`
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub registration_id: RegistrationId,
}

#[derive(Debug, Serialize)]
pub struct SensitiveDataExportRow {
    pub registration: Registration,
    pub sensitive_data: SensitiveData,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementCreated {
    pub announcement: Announcement,
    pub delivery: BatchReport,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub actor: Option<String>,
    pub action: Option<String>,
    pub model_name: Option<String>,
    pub object_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLogEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
