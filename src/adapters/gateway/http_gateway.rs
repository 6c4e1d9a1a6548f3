//! HTTP payment gateway adapter.
//!
//! Implements `PaymentGateway` against the provider's JSON API.
//!
//! # Auth
//!
//! Every call carries `Authorization: Bearer <token>` from the shared
//! `SessionTokenCache`. A 401 invalidates the token and the call is retried
//! exactly once after a fresh sign-in.
//!
//! # Error classification
//!
//! | Outcome | Result |
//! |---------|--------|
//! | Network failure / timeout | `Transient` |
//! | 5xx without structured body | `Transient` |
//! | 4xx/5xx with `{code, message}` body | `Rejected` |
//! | Other 4xx | `Rejected` with `HTTP_<status>` code |
//! | 2xx with unreadable body | `Protocol` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::ports::{
    CreateGatewayPayment, GatewayError, GatewayPayment, GatewayPaymentStatus, GatewayRefund,
    GatewayStatusReport, PaymentGateway,
};

use super::session::{SessionToken, SessionTokenCache};
use super::wire_types::{
    refund_status_from_provider, AuthRequest, AuthResponse, CallbackUrlsBody, CreatePaymentBody,
    CreatePaymentResponse, ErrorBody, RefundBody, RefundResponse, StatusResponse,
};

/// Gateway connection settings.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    /// Provider API root, without trailing slash.
    base_url: String,
    service_user: String,
    service_password: SecretString,
    terminal_id: String,
    timeout: Duration,
}

impl HttpGatewayConfig {
    pub fn new(
        base_url: impl Into<String>,
        service_user: impl Into<String>,
        service_password: SecretString,
        terminal_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_user: service_user.into(),
            service_password,
            terminal_id: terminal_id.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl std::fmt::Debug for HttpGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGatewayConfig")
            .field("base_url", &self.base_url)
            .field("service_user", &self.service_user)
            .field("service_password", &"[REDACTED]")
            .field("terminal_id", &self.terminal_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Payment gateway over HTTP.
pub struct HttpPaymentGateway {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
    session: Arc<SessionTokenCache>,
}

impl HttpPaymentGateway {
    /// Creates the adapter. The session cache is owned by the caller so it can
    /// be shared or inspected.
    pub fn new(
        config: HttpGatewayConfig,
        session: Arc<SessionTokenCache>,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            http_client,
            session,
        })
    }

    async fn sign_in(&self) -> Result<SessionToken, GatewayError> {
        let body = AuthRequest {
            service_user: &self.config.service_user,
            service_password: self.config.service_password.expose_secret(),
            terminal_id: &self.config.terminal_id,
        };

        let response = self
            .http_client
            .post(self.config.url("/auth"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let (auth, _) = read_json::<AuthResponse>(response).await?;
        Ok(SessionToken::new(
            auth.bearer_token,
            auth.expires_in.map(Duration::from_secs),
        ))
    }

    /// Sends an authorised request, re-signing in once on 401.
    async fn send_authorized<F>(&self, build: F) -> Result<Response, GatewayError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self
            .session
            .get_or_refresh_token(|| self.sign_in())
            .await?;

        let response = build(&self.http_client)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("Gateway rejected session token, signing in again");
        self.session.invalidate(&token).await;
        let token = self
            .session
            .get_or_refresh_token(|| self.sign_in())
            .await?;

        build(&self.http_client)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(transport_error)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(
        &self,
        request: CreateGatewayPayment,
    ) -> Result<GatewayPayment, GatewayError> {
        let body = CreatePaymentBody {
            invoice_id: &request.invoice_id,
            amount: request.amount.amount(),
            currency: request.amount.currency().as_str(),
            payer_account_id: &request.payer_ref,
            description: &request.description,
            callback_urls: CallbackUrlsBody {
                success_url: request.callback_urls.success.as_deref(),
                failure_url: request.callback_urls.failure.as_deref(),
                notify_url: request.callback_urls.notify.as_deref(),
            },
            auto_charge_mode: request.options.auto_charge,
        };
        let url = self.config.url("/payments");

        tracing::debug!(invoice_id = %request.invoice_id, "Creating gateway payment");
        let response = self
            .send_authorized(|client| client.post(&url).json(&body))
            .await?;
        let (created, _) = read_json::<CreatePaymentResponse>(response).await?;

        Ok(GatewayPayment {
            external_id: created.external_payment_id,
            redirect_url: created.redirect_url,
        })
    }

    async fn get_status(&self, external_id: &str) -> Result<GatewayStatusReport, GatewayError> {
        let url = self.config.url(&format!("/payments/{}", external_id));

        let response = self.send_authorized(|client| client.get(&url)).await?;
        let (status, raw) = read_json::<StatusResponse>(response).await?;

        tracing::debug!(external_id, provider_status = %status.status, "Gateway status");
        Ok(GatewayStatusReport {
            status: GatewayPaymentStatus::from_provider(&status.status),
            error_code: status.error_code,
            raw,
        })
    }

    async fn refund(
        &self,
        external_id: &str,
        amount: Option<i64>,
        reason: Option<String>,
    ) -> Result<GatewayRefund, GatewayError> {
        let url = self.config.url(&format!("/payments/{}/return", external_id));
        let body = RefundBody {
            amount,
            reason: reason.as_deref(),
        };

        let response = self
            .send_authorized(|client| client.delete(&url).json(&body))
            .await?;
        let (refund, _) = read_json::<RefundResponse>(response).await?;

        Ok(GatewayRefund {
            refund_id: refund.refund_id,
            status: refund_status_from_provider(&refund.status),
        })
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        tracing::warn!(error = %err, "Gateway request timed out");
    } else {
        tracing::warn!(error = %err, "Gateway request failed");
    }
    GatewayError::transient(err.to_string())
}

/// Reads a JSON body on success, or classifies the failure.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<(T, String), GatewayError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;

    if status.is_success() {
        let parsed = serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::warn!(error = %e, "Unreadable gateway response");
            GatewayError::protocol(format!("invalid response body: {}", e))
        })?;
        return Ok((parsed, text));
    }

    Err(classify_failure(status, &text))
}

fn classify_failure(status: StatusCode, body: &str) -> GatewayError {
    if let Ok(error) = serde_json::from_str::<ErrorBody>(body) {
        tracing::warn!(
            http_status = status.as_u16(),
            provider_code = %error.code,
            "Gateway rejected request"
        );
        return GatewayError::rejected(error.code, error.message);
    }

    if status.is_server_error() {
        return GatewayError::transient(format!("gateway returned {}", status));
    }

    tracing::warn!(http_status = status.as_u16(), "Gateway rejected request without error body");
    GatewayError::rejected(format!("HTTP_{}", status.as_u16()), body.chars().take(200).collect::<String>())
}
