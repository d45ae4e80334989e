//! Billing webhooks.
//!
//! Paddle posts subscription events carrying the owner in custom metadata.
//! Classic and current Paddle payloads put fields in different places, so
//! every field is looked up along a short list of paths.

pub mod paddle;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{OwnerKey, SubscriptionUpsert};
use crate::types::{OwnerType, SubscriptionStatus};

pub use paddle::{verify_signature, SignatureError, SIGNATURE_HEADER};

/// Why an event was acknowledged without being applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("Missing owner metadata")]
    MissingOwner,
    #[error("Invalid owner metadata: {0}")]
    InvalidOwner(String),
}

/// Turn a webhook payload into the subscription upsert it implies
pub fn parse_event(event: &Value) -> Result<SubscriptionUpsert, EventError> {
    let key = owner_key(event)?;
    let data = &event["data"];

    let status = data["status"]
        .as_str()
        .and_then(status_from_paddle)
        .or_else(|| event["event_type"].as_str().and_then(status_from_event_type));

    let plan = first_str(&[&data["plan"], &data["items"][0]["price"]["name"]]);
    let paddle_subscription_id = first_str(&[&data["id"], &data["subscription_id"]]);
    let billing_email = first_str(&[&data["customer"]["email"]]);
    let current_period_end = first_str(&[&data["next_billed_at"], &data["current_billing_period"]["ends_at"]])
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(SubscriptionUpsert {
        key,
        status,
        plan,
        paddle_subscription_id,
        billing_email,
        current_period_end,
    })
}

fn owner_key(event: &Value) -> Result<OwnerKey, EventError> {
    let metadata = [&event["data"]["metadata"], &event["metadata"], &event["data"]["custom_data"]]
        .into_iter()
        .find(|m| m.get("owner_type").is_some() || m.get("owner_id").is_some())
        .ok_or(EventError::MissingOwner)?;

    let (Some(owner_type), Some(owner_id)) = (metadata["owner_type"].as_str(), metadata["owner_id"].as_str()) else {
        return Err(EventError::MissingOwner);
    };

    let owner_type: OwnerType = owner_type
        .parse()
        .map_err(|e: crate::types::UnknownVariant| EventError::InvalidOwner(e.to_string()))?;
    let owner_id = Uuid::parse_str(owner_id).map_err(|_| EventError::InvalidOwner(format!("owner_id '{}'", owner_id)))?;

    Ok(OwnerKey::new(owner_type, owner_id))
}

fn first_str(candidates: &[&Value]) -> Option<String> {
    candidates
        .iter()
        .find_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn status_from_paddle(status: &str) -> Option<SubscriptionStatus> {
    match status {
        "active" => Some(SubscriptionStatus::Active),
        "trialing" => Some(SubscriptionStatus::Trialing),
        "past_due" => Some(SubscriptionStatus::PastDue),
        "canceled" | "cancelled" => Some(SubscriptionStatus::Canceled),
        other => {
            tracing::warn!("Ignoring unmapped Paddle subscription status '{}'", other);
            None
        }
    }
}

fn status_from_event_type(event_type: &str) -> Option<SubscriptionStatus> {
    let action = event_type.rsplit('.').next().unwrap_or(event_type);
    match action {
        "created" | "activated" | "resumed" => Some(SubscriptionStatus::Active),
        "trialing" => Some(SubscriptionStatus::Trialing),
        "past_due" => Some(SubscriptionStatus::PastDue),
        "canceled" | "cancelled" => Some(SubscriptionStatus::Canceled),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_current_paddle_shape() {
        let owner = Uuid::new_v4();
        let event = json!({
            "event_type": "subscription.updated",
            "data": {
                "id": "sub_01h8",
                "status": "past_due",
                "custom_data": { "owner_type": "clinic", "owner_id": owner.to_string() },
                "items": [{ "price": { "name": "usage_only" } }],
                "customer": { "email": "billing@brightsmile.com" },
                "current_billing_period": { "ends_at": "2025-02-01T00:00:00Z" }
            }
        });

        let upsert = parse_event(&event).unwrap();
        assert_eq!(upsert.key, OwnerKey::new(OwnerType::Clinic, owner));
        assert_eq!(upsert.status, Some(SubscriptionStatus::PastDue));
        assert_eq!(upsert.plan.as_deref(), Some("usage_only"));
        assert_eq!(upsert.paddle_subscription_id.as_deref(), Some("sub_01h8"));
        assert_eq!(upsert.billing_email.as_deref(), Some("billing@brightsmile.com"));
        assert!(upsert.current_period_end.is_some());
    }

    #[test]
    fn status_falls_back_to_event_type() {
        let event = json!({
            "event_type": "subscription.canceled",
            "metadata": { "owner_type": "agency", "owner_id": Uuid::new_v4().to_string() },
            "data": { "subscription_id": "sub_02", "next_billed_at": "2025-03-01T12:00:00Z" }
        });

        let upsert = parse_event(&event).unwrap();
        assert_eq!(upsert.status, Some(SubscriptionStatus::Canceled));
        assert_eq!(upsert.paddle_subscription_id.as_deref(), Some("sub_02"));
        assert_eq!(upsert.plan, None);
    }

    #[test]
    fn data_metadata_wins_over_top_level() {
        let first = Uuid::new_v4();
        let event = json!({
            "metadata": { "owner_type": "agency", "owner_id": Uuid::new_v4().to_string() },
            "data": { "metadata": { "owner_type": "clinic", "owner_id": first.to_string() } }
        });
        assert_eq!(parse_event(&event).unwrap().key.owner_id, first);
    }

    #[test]
    fn missing_or_bad_owner_is_reported() {
        assert_eq!(parse_event(&json!({ "data": {} })), Err(EventError::MissingOwner));
        assert_eq!(parse_event(&json!("not an object")), Err(EventError::MissingOwner));

        let bad = json!({ "metadata": { "owner_type": "reseller", "owner_id": Uuid::new_v4().to_string() } });
        assert!(matches!(parse_event(&bad), Err(EventError::InvalidOwner(_))));

        let bad = json!({ "metadata": { "owner_type": "clinic", "owner_id": "42" } });
        assert!(matches!(parse_event(&bad), Err(EventError::InvalidOwner(_))));
    }
}
