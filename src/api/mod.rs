//! HTTP layer: public HTML pages and the staff JSON API.

mod error;
mod extract;
pub mod handlers;
mod pages;
mod rest;
pub mod types;

pub use error::{
    api_not_found, page_not_found, render_error_page, ApiError, ErrorCode, PageError,
};
pub use extract::client_ip;
pub use pages::router as pages_router;
pub use rest::router;
