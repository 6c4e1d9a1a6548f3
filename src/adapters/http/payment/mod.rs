//! HTTP adapter for payments.

pub mod dto;
mod handlers;
mod routes;

pub use handlers::SIGNATURE_HEADER;
pub use routes::payment_routes;
