//! Payment gateway adapters.
//!
//! - `HttpPaymentGateway` - Production client for the provider's JSON API
//! - `MockPaymentGateway` - Programmable test double
//! - `SessionTokenCache` - Shared bearer token with single-flight refresh
//! - `CallbackVerifier` - HMAC check for provider callbacks

mod callback;
mod http_gateway;
mod mock_gateway;
mod session;
mod wire_types;

pub use callback::{hex_encode, signature_for, CallbackError, CallbackVerifier};
pub use http_gateway::{HttpGatewayConfig, HttpPaymentGateway};
pub use mock_gateway::{MethodCall, MockPaymentGateway};
pub use session::{SessionToken, SessionTokenCache};
