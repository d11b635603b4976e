//! HTTP service and command-line front-end for [`design_fetch`].

pub mod api;
pub mod cli;

pub use api::{router, ApiError, AppState};
