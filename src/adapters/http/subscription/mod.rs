//! HTTP adapter for subscriptions and the template catalog.

pub mod dto;
mod handlers;
mod routes;

pub use handlers::StaffUser;
pub use routes::{subscription_routes, template_routes};
