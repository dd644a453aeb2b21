//! Web service for crop/trait guide RNA design
//!
//! Routes:
//! - `POST /api/analyze`: registry lookup, sequence resolution, guide scan, explanation
//! - `POST /api/scan`: guide scan of a caller-supplied sequence
//! - `GET /api/crops_and_traits`: the registry mapping
//! - `GET /api/health`: liveness

pub mod config;
pub mod handlers;
pub mod server;
pub mod types;
pub mod validation;

pub use config::ServiceConfig;
pub use server::{build_analyzer, create_app, create_app_with_analyzer, AppState};
pub use types::*;
