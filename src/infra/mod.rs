//! Infrastructure layer
//!
//! - SQLite storage (repositories over one connection or transaction)
//! - Field encryption at rest for sensitive participant data
//! - RODO audit log
//! - Mail transports (SMTP, console, in-memory)

pub mod audit;
mod error;
mod field_encryption;
pub mod mail;
pub mod sqlite;

pub use audit::{AuditAction, AuditLog, AuditLogBuilder, AuditLogEntry, AuditQueryFilters, RequestMeta};
pub use error::*;
pub use field_encryption::{parse_32_byte_key, parse_keyring_list, FieldEncryption};
pub use mail::{
    ConsoleMailTransport, EmailMessage, MailError, MailTransport, MemoryMailTransport,
    SmtpConfig, SmtpMailTransport,
};
pub use sqlite::Database;
