use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::billing::{self, EventError};
use crate::database::models::{OwnerKey, Subscription, SubscriptionUpsert};
use crate::database::TenantStore;
use crate::types::{OwnerType, SubscriptionStatus};

use super::authorization::Caller;
use super::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub owner_type: Option<OwnerType>,
    pub owner_id: Option<Uuid>,
}

impl CancelRequest {
    pub fn validate(&self) -> Result<OwnerKey, ServiceError> {
        match (self.owner_type, self.owner_id) {
            (Some(owner_type), Some(owner_id)) => Ok(OwnerKey::new(owner_type, owner_id)),
            _ => Err(ServiceError::validation("Missing owner")),
        }
    }
}

/// Outcome of a webhook delivery
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Applied(Subscription),
    /// Acknowledged without changes so the provider does not retry
    Ignored(EventError),
}

/// Local mirror of the Paddle subscription state
pub struct SubscriptionService {
    store: Arc<dyn TenantStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Mark the caller's own subscription canceled
    pub async fn cancel(&self, caller: &Caller, key: OwnerKey) -> Result<Subscription, ServiceError> {
        caller.require_billing_owner(key)?;

        let row = self
            .store
            .upsert_subscription(&SubscriptionUpsert::status_only(key, SubscriptionStatus::Canceled))
            .await?;

        tracing::info!("Subscription of {} {} canceled by {}", key.owner_type, key.owner_id, caller.identity.id);
        tracing::warn!(
            "Paddle cancellation not requested for {} {}; local status only",
            key.owner_type,
            key.owner_id
        );
        Ok(row)
    }

    pub async fn show(&self, caller: &Caller, key: OwnerKey) -> Result<Subscription, ServiceError> {
        caller.require_billing_owner(key)?;
        self.store
            .get_subscription(key)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subscription not found"))
    }

    /// Apply a billing webhook payload. Idempotent per owner key.
    pub async fn apply_event(&self, event: &Value) -> Result<EventOutcome, ServiceError> {
        let upsert = match billing::parse_event(event) {
            Ok(upsert) => upsert,
            Err(reason) => {
                tracing::warn!("Ignoring Paddle event: {}", reason);
                return Ok(EventOutcome::Ignored(reason));
            }
        };

        let row = self.store.upsert_subscription(&upsert).await.map_err(|err| {
            tracing::error!("Paddle webhook upsert failed for {} {}: {}", upsert.key.owner_type, upsert.key.owner_id, err);
            err
        })?;

        tracing::info!(
            "Subscription of {} {} is now {}",
            row.owner_type,
            row.owner_id,
            row.status
        );
        Ok(EventOutcome::Applied(row))
    }
}
