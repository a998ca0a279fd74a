//! HTTP API handlers for clarity-grader

pub mod analyze;
pub mod health;
pub mod scrape;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use scrape::scrape_routes;
