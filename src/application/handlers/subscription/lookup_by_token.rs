//! LookupByTokenHandler - Resolves a scanned token to its subscription.
//!
//! Only active subscriptions resolve. Expired and cancelled rows are kept
//! for audit but look the same as an unknown token to the caller.

use std::sync::Arc;

use crate::domain::subscription::{RedemptionToken, Subscription, SubscriptionError};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct LookupByTokenQuery {
    pub token: String,
}

pub struct LookupByTokenHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl LookupByTokenHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, query: LookupByTokenQuery) -> Result<Subscription, SubscriptionError> {
        let token =
            RedemptionToken::parse(&query.token).map_err(|_| SubscriptionError::invalid_token())?;

        self.subscriptions
            .find_active_by_token(&token)
            .await?
            .ok_or_else(SubscriptionError::invalid_token)
    }
}
