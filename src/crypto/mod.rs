//! Cryptographic utilities
//!
//! AES-256-GCM field encryption for sensitive participant data, with AAD
//! bound to the owning row and column.

mod encrypt;

pub use encrypt::*;
