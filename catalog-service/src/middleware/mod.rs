// Middleware for the catalog service
pub mod legacy_status;

pub use legacy_status::legacy_status_middleware;
