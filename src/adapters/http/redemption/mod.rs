//! HTTP adapter for redemption at the door.

pub mod dto;
mod handlers;
mod routes;

pub use routes::redemption_routes;
