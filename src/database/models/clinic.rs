use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::SystemStatus;

/// A clinic tenant. `agency_id` set means agency-managed; `None` means the
/// clinic signed up on its own and owns its billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub agency_id: Option<Uuid>,
    pub ghl_location_id: Option<String>,
    pub phone_number: Option<String>,
    #[sqlx(try_from = "String")]
    pub system_status: SystemStatus,
    pub forwarding_number: Option<String>,
    pub voice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Clinic {
    pub fn is_managed(&self) -> bool {
        self.agency_id.is_some()
    }

    pub fn belongs_to(&self, agency_id: Uuid) -> bool {
        self.agency_id == Some(agency_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewClinic {
    pub id: Uuid,
    pub name: String,
    pub agency_id: Option<Uuid>,
    pub ghl_location_id: Option<String>,
    pub phone_number: Option<String>,
}

impl NewClinic {
    pub fn independent(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            agency_id: None,
            ghl_location_id: None,
            phone_number: None,
        }
    }

    pub fn managed(name: impl Into<String>, agency_id: Uuid) -> Self {
        Self { agency_id: Some(agency_id), ..Self::independent(name) }
    }

    pub fn with_phone_number(mut self, phone_number: Option<String>) -> Self {
        self.phone_number = phone_number;
        self
    }

    pub fn with_ghl_location(mut self, ghl_location_id: Option<String>) -> Self {
        self.ghl_location_id = ghl_location_id;
        self
    }

    pub fn into_clinic(self) -> Clinic {
        let now = Utc::now();
        Clinic {
            id: self.id,
            name: self.name,
            agency_id: self.agency_id,
            ghl_location_id: self.ghl_location_id,
            phone_number: self.phone_number,
            system_status: SystemStatus::Active,
            forwarding_number: None,
            voice: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Receptionist settings a clinic (or its agency) may change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicChanges {
    pub system_status: Option<SystemStatus>,
    pub forwarding_number: Option<String>,
    pub voice: Option<String>,
    pub phone_number: Option<String>,
}

impl ClinicChanges {
    pub fn is_empty(&self) -> bool {
        self.system_status.is_none()
            && self.forwarding_number.is_none()
            && self.voice.is_none()
            && self.phone_number.is_none()
    }

    pub fn apply(&self, clinic: &mut Clinic) {
        if let Some(status) = self.system_status {
            clinic.system_status = status;
        }
        if let Some(number) = &self.forwarding_number {
            clinic.forwarding_number = Some(number.clone());
        }
        if let Some(voice) = &self.voice {
            clinic.voice = Some(voice.clone());
        }
        if let Some(number) = &self.phone_number {
            clinic.phone_number = Some(number.clone());
        }
        clinic.updated_at = Utc::now();
    }
}
