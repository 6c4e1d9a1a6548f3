//! HTTP DTOs for subscription and template endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Currency, Money, Timestamp, ValidationError};
use crate::domain::subscription::{Subscription, SubscriptionStatus, SubscriptionTemplate, Tariff};

// ════════════════════════════════════════════════════════════════════════════════
// Shared value DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Amount in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyDto {
    pub amount: i64,
    pub currency: String,
}

impl TryFrom<MoneyDto> for Money {
    type Error = ValidationError;

    fn try_from(dto: MoneyDto) -> Result<Self, Self::Error> {
        Money::new(dto.amount, Currency::new(&dto.currency)?)
    }
}

impl From<&Money> for MoneyDto {
    fn from(money: &Money) -> Self {
        Self {
            amount: money.amount(),
            currency: money.currency().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffKind {
    Lessons,
    Unlimited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffDto {
    pub kind: TariffKind,
    /// Required for `lessons`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl TryFrom<TariffDto> for Tariff {
    type Error = ValidationError;

    fn try_from(dto: TariffDto) -> Result<Self, Self::Error> {
        match dto.kind {
            TariffKind::Unlimited => Ok(Tariff::Unlimited),
            TariffKind::Lessons => {
                let count = dto.count.ok_or_else(|| ValidationError::empty_field("count"))?;
                Tariff::lessons(count)
            }
        }
    }
}

impl From<&Tariff> for TariffDto {
    fn from(tariff: &Tariff) -> Self {
        match tariff {
            Tariff::Lessons { count } => Self {
                kind: TariffKind::Lessons,
                count: Some(*count),
            },
            Tariff::Unlimited => Self {
                kind: TariffKind::Unlimited,
                count: None,
            },
        }
    }
}

pub(crate) fn iso(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseSubscriptionRequest {
    pub payer_id: String,
    pub template_id: String,
    #[serde(default)]
    pub dependent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub tariff: TariffDto,
    pub price: MoneyDto,
}

/// Partial update; omitted fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tariff: Option<TariffDto>,
    #[serde(default)]
    pub price: Option<MoneyDto>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub payer_id: String,
    pub dependent_id: Option<String>,
    pub template_id: String,
    pub template_name: String,
    pub tariff: TariffDto,
    pub price: MoneyDto,
    pub total_credits: Option<u32>,
    pub remaining_credits: Option<u32>,
    /// Code shown to the payer and scanned at the door.
    pub token: String,
    pub status: SubscriptionStatus,
    pub created_at: String,
    pub activated_at: Option<String>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id.to_string(),
            payer_id: sub.payer_id.to_string(),
            dependent_id: sub.dependent_id.map(|id| id.to_string()),
            template_id: sub.template_id.to_string(),
            template_name: sub.template_name.clone(),
            tariff: TariffDto::from(&sub.tariff),
            price: MoneyDto::from(&sub.price),
            total_credits: sub.total_credits,
            remaining_credits: sub.remaining_credits,
            token: sub.token.as_str().to_string(),
            status: sub.status,
            created_at: iso(&sub.created_at),
            activated_at: sub.activated_at.as_ref().map(iso),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub subscription: SubscriptionResponse,
    pub payment_id: String,
    pub payment_redirect_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateResponse {
    pub id: String,
    pub name: String,
    pub tariff: TariffDto,
    pub price: MoneyDto,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&SubscriptionTemplate> for TemplateResponse {
    fn from(template: &SubscriptionTemplate) -> Self {
        Self {
            id: template.id.to_string(),
            name: template.name.clone(),
            tariff: TariffDto::from(&template.tariff),
            price: MoneyDto::from(&template.price),
            active: template.active,
            created_at: iso(&template.created_at),
            updated_at: iso(&template.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateResponse>,
}
