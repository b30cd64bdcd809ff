pub mod error;
pub mod health;
pub mod logger;
pub mod routes;
pub mod service;


pub use crate::error::{Result, ServerError};
pub use crate::routes::build_router;
pub use crate::service::TelemetryService;
