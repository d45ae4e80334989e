use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::SystemStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Agency {
    pub id: Uuid,
    pub name: String,
    pub owner_user_id: Uuid,
    pub logo_url: Option<String>,
    pub brand_color: Option<String>,
    #[sqlx(try_from = "String")]
    pub system_status: SystemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agency {
    pub fn new(name: impl Into<String>, owner_user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_user_id,
            logo_url: None,
            brand_color: None,
            system_status: SystemStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of agency settings; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyChanges {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub brand_color: Option<String>,
    pub system_status: Option<SystemStatus>,
}

impl AgencyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.logo_url.is_none() && self.brand_color.is_none() && self.system_status.is_none()
    }

    pub fn apply(&self, agency: &mut Agency) {
        if let Some(name) = &self.name {
            agency.name = name.clone();
        }
        if let Some(logo_url) = &self.logo_url {
            agency.logo_url = Some(logo_url.clone());
        }
        if let Some(brand_color) = &self.brand_color {
            agency.brand_color = Some(brand_color.clone());
        }
        if let Some(status) = self.system_status {
            agency.system_status = status;
        }
        agency.updated_at = Utc::now();
    }
}
