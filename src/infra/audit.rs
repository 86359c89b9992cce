//! Audit logging for access to personal data (RODO)
//!
//! Every read, write, delete and export of sensitive participant data
//! appends one row to `audit_log` and emits a matching tracing event.
//! Rows are never updated or deleted by the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::infra::{RejsError, Result};

pub const OBJECT_REPR_MAX_CHARS: usize = 200;
pub const USER_AGENT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Read,
    Create,
    Update,
    Delete,
    Export,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Read => "read",
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Export => "export",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(AuditAction::Read),
            "create" => Some(AuditAction::Create),
            "update" => Some(AuditAction::Update),
            "delete" => Some(AuditAction::Delete),
            "export" => Some(AuditAction::Export),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who asked, from where. Absent for CLI and other system actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// Staff username; `None` for system actions and anonymous participants.
    pub actor: Option<String>,
    pub action: AuditAction,
    pub model_name: String,
    pub object_id: Option<i64>,
    pub object_repr: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub details: String,
}

/// Builder for audit entries; applies the length caps on `build`.
pub struct AuditLogBuilder {
    action: AuditAction,
    model_name: String,
    actor: Option<String>,
    object_id: Option<i64>,
    object_repr: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: String,
}

impl AuditLogBuilder {
    pub fn new(action: AuditAction, model_name: impl Into<String>) -> Self {
        Self {
            action,
            model_name: model_name.into(),
            actor: None,
            object_id: None,
            object_repr: None,
            ip_address: None,
            user_agent: None,
            details: String::new(),
        }
    }

    pub fn actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }

    pub fn object(mut self, id: i64, repr: impl Into<String>) -> Self {
        self.object_id = Some(id);
        self.object_repr = Some(repr.into());
        self
    }

    pub fn request(mut self, meta: Option<&RequestMeta>) -> Self {
        if let Some(meta) = meta {
            self.ip_address = meta.ip_address.clone();
            self.user_agent = meta.user_agent.clone();
        }
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn build(self) -> AuditLogEntry {
        AuditLogEntry {
            id: 0,
            timestamp: Utc::now(),
            actor: self.actor,
            action: self.action,
            model_name: self.model_name,
            object_id: self.object_id,
            object_repr: truncate_chars(self.object_repr.as_deref().unwrap_or(""), OBJECT_REPR_MAX_CHARS),
            ip_address: self.ip_address,
            user_agent: truncate_chars(self.user_agent.as_deref().unwrap_or(""), USER_AGENT_MAX_CHARS),
            details: self.details,
        }
    }
}

/// First `max` characters (not bytes) of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Query filters for audit logs
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditQueryFilters {
    pub actor: Option<String>,
    pub action: Option<AuditAction>,
    pub model_name: Option<String>,
    pub object_id: Option<i64>,
}

/// Append-only access to `audit_log` over one connection or transaction.
pub struct AuditLog<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> AuditLog<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Store an entry and return it with its assigned id.
    pub async fn record(&mut self, entry: AuditLogEntry) -> Result<AuditLogEntry> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (
                timestamp, actor, action, model_name, object_id,
                object_repr, ip_address, user_agent, details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.timestamp)
        .bind(&entry.actor)
        .bind(entry.action.as_str())
        .bind(&entry.model_name)
        .bind(entry.object_id)
        .bind(&entry.object_repr)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.details)
        .execute(&mut *self.conn)
        .await?;

        tracing::info!(
            action = %entry.action,
            actor = entry.actor.as_deref().unwrap_or("system"),
            model = %entry.model_name,
            object_id = ?entry.object_id,
            ip = ?entry.ip_address,
            "Audit log entry"
        );

        Ok(AuditLogEntry {
            id: result.last_insert_rowid(),
            ..entry
        })
    }

    /// Newest first.
    pub async fn query(
        &mut self,
        filters: &AuditQueryFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, timestamp, actor, action, model_name, object_id,
                   object_repr, ip_address, user_agent, details
            FROM audit_log
            WHERE (?1 IS NULL OR actor = ?1)
              AND (?2 IS NULL OR action = ?2)
              AND (?3 IS NULL OR model_name = ?3)
              AND (?4 IS NULL OR object_id = ?4)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?5 OFFSET ?6
            "#,
        )
        .bind(&filters.actor)
        .bind(filters.action.map(|a| a.as_str()))
        .bind(&filters.model_name)
        .bind(filters.object_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }

    pub async fn count(&mut self, filters: &AuditQueryFilters) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM audit_log
            WHERE (?1 IS NULL OR actor = ?1)
              AND (?2 IS NULL OR action = ?2)
              AND (?3 IS NULL OR model_name = ?3)
              AND (?4 IS NULL OR object_id = ?4)
            "#,
        )
        .bind(&filters.actor)
        .bind(filters.action.map(|a| a.as_str()))
        .bind(&filters.model_name)
        .bind(filters.object_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: i64,
    timestamp: DateTime<Utc>,
    actor: Option<String>,
    action: String,
    model_name: String,
    object_id: Option<i64>,
    object_repr: String,
    ip_address: Option<String>,
    user_agent: String,
    details: String,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = RejsError;

    fn try_from(row: AuditLogRow) -> Result<Self> {
        let action = AuditAction::parse(&row.action)
            .ok_or_else(|| RejsError::corrupt("audit_log", format!("action {:?}", row.action)))?;

        Ok(Self {
            id: row.id,
            timestamp: row.timestamp,
            actor: row.actor,
            action,
            model_name: row.model_name,
            object_id: row.object_id,
            object_repr: row.object_repr,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            details: row.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_codes() {
        assert_eq!(AuditAction::Export.to_string(), "export");
        assert_eq!(AuditAction::parse("read"), Some(AuditAction::Read));
        assert_eq!(AuditAction::parse("odczyt"), None);
    }

    #[test]
    fn builder_without_request_has_no_ip_and_empty_agent() {
        let entry = AuditLogBuilder::new(AuditAction::Delete, "SensitiveData")
            .details("Automatyczne usunięcie po 30 dniach")
            .build();
        assert_eq!(entry.actor, None);
        assert_eq!(entry.ip_address, None);
        assert_eq!(entry.user_agent, "");
        assert_eq!(entry.object_id, None);
        assert_eq!(entry.object_repr, "");
    }

    #[test]
    fn builder_caps_lengths() {
        let meta = RequestMeta {
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: Some("ą".repeat(600)),
        };
        let entry = AuditLogBuilder::new(AuditAction::Read, "SensitiveData")
            .actor(Some("kapitan"))
            .object(9, "ż".repeat(250))
            .request(Some(&meta))
            .build();

        assert_eq!(entry.user_agent.chars().count(), USER_AGENT_MAX_CHARS);
        assert_eq!(entry.object_repr.chars().count(), OBJECT_REPR_MAX_CHARS);
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.actor.as_deref(), Some("kapitan"));
    }

    #[test]
    fn truncate_short_strings_untouched() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
