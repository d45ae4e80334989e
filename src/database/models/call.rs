use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::CallStatus;

/// A call handled by the receptionist. Rows are written by the voice
/// platform; this service only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Call {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub caller: String,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: CallStatus,
    pub summary: Option<String>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub sentiment_score: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
