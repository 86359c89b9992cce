//! Staff API handlers organized by resource.

pub mod announcements;
pub mod audit;
pub mod payments;
pub mod registrations;
pub mod sensitive_data;
pub mod trips;
pub mod watches;

pub use announcements::*;
pub use audit::*;
pub use payments::*;
pub use registrations::*;
pub use sensitive_data::*;
pub use trips::*;
pub use watches::*;

use super::error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;
