//! Domain models for the trip registration service.
//!
//! Plain data types plus the invariants that can be checked without
//! touching storage (date ordering, balances, display forms).

mod announcement;
mod payment;
mod registration;
mod trip;
mod types;

pub use announcement::*;
pub use payment::*;
pub use registration::*;
pub use trip::*;
pub use types::*;
