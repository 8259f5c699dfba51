//! HTTP API handlers for brewlog-api

pub mod frontend;
pub mod health;
pub mod input;
pub mod records;

pub use frontend::frontend_routes;
pub use health::health_routes;
pub use records::record_routes;
