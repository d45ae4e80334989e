use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{OwnerType, SubscriptionStatus};

pub const DEFAULT_PLAN: &str = "usage_only";

/// Key of a subscription row: one subscription per agency or clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerKey {
    pub owner_type: OwnerType,
    pub owner_id: Uuid,
}

impl OwnerKey {
    pub fn new(owner_type: OwnerType, owner_id: Uuid) -> Self {
        Self { owner_type, owner_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub owner_type: OwnerType,
    pub owner_id: Uuid,
    pub paddle_subscription_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SubscriptionStatus,
    pub plan: Option<String>,
    pub billing_email: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn key(&self) -> OwnerKey {
        OwnerKey::new(self.owner_type, self.owner_id)
    }
}

/// Upsert keyed by owner. Fields left `None` keep their stored value; a new
/// row falls back to status `active` and plan `usage_only`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpsert {
    pub key: OwnerKey,
    pub status: Option<SubscriptionStatus>,
    pub plan: Option<String>,
    pub paddle_subscription_id: Option<String>,
    pub billing_email: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl SubscriptionUpsert {
    pub fn status_only(key: OwnerKey, status: SubscriptionStatus) -> Self {
        Self {
            key,
            status: Some(status),
            plan: None,
            paddle_subscription_id: None,
            billing_email: None,
            current_period_end: None,
        }
    }

    pub fn into_new_row(self) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            owner_type: self.key.owner_type,
            owner_id: self.key.owner_id,
            paddle_subscription_id: self.paddle_subscription_id,
            status: self.status.unwrap_or(SubscriptionStatus::Active),
            plan: Some(self.plan.unwrap_or_else(|| DEFAULT_PLAN.to_string())),
            billing_email: self.billing_email,
            current_period_end: self.current_period_end,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(self, row: &mut Subscription) {
        if let Some(status) = self.status {
            row.status = status;
        }
        if self.plan.is_some() {
            row.plan = self.plan;
        }
        if self.paddle_subscription_id.is_some() {
            row.paddle_subscription_id = self.paddle_subscription_id;
        }
        if self.billing_email.is_some() {
            row.billing_email = self.billing_email;
        }
        if self.current_period_end.is_some() {
            row.current_period_end = self.current_period_end;
        }
        row.updated_at = Utc::now();
    }
}
