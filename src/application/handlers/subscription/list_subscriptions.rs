//! ListSubscriptionsHandler - Query handler for a payer's subscriptions.

use std::sync::Arc;

use crate::domain::foundation::PayerId;
use crate::domain::subscription::{Subscription, SubscriptionError};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct ListSubscriptionsQuery {
    pub payer_id: PayerId,
}

pub struct ListSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl ListSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    /// All subscriptions of the payer in any status, newest first.
    pub async fn handle(
        &self,
        query: ListSubscriptionsQuery,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        Ok(self.subscriptions.list_by_payer(&query.payer_id).await?)
    }
}
