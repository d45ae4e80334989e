use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

/// Authorization record binding an identity to a role and its tenant ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub agency_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileShapeError {
    #[error("{role} profile requires {field}")]
    MissingTenant { role: Role, field: &'static str },
    #[error("{role} profile must not carry {field}")]
    UnexpectedTenant { role: Role, field: &'static str },
}

impl Profile {
    fn build(id: Uuid, role: Role, agency_id: Option<Uuid>, clinic_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self { id, role, agency_id, clinic_id, created_at: now, updated_at: now }
    }

    pub fn agency_admin(id: Uuid, agency_id: Uuid) -> Self {
        Self::build(id, Role::AgencyAdmin, Some(agency_id), None)
    }

    pub fn managed_clinic(id: Uuid, clinic_id: Uuid, agency_id: Uuid) -> Self {
        Self::build(id, Role::ManagedClinic, Some(agency_id), Some(clinic_id))
    }

    pub fn independent_clinic(id: Uuid, clinic_id: Uuid) -> Self {
        Self::build(id, Role::IndependentClinic, None, Some(clinic_id))
    }

    /// Check that the role's tenant ids are populated and no others are
    pub fn validate(&self) -> Result<(), ProfileShapeError> {
        let (needs_agency, needs_clinic) = match self.role {
            Role::AgencyAdmin => (true, false),
            Role::ManagedClinic => (true, true),
            Role::IndependentClinic => (false, true),
        };

        check_field(self.role, "agency_id", needs_agency, self.agency_id.is_some())?;
        check_field(self.role, "clinic_id", needs_clinic, self.clinic_id.is_some())
    }
}

fn check_field(role: Role, field: &'static str, required: bool, present: bool) -> Result<(), ProfileShapeError> {
    match (required, present) {
        (true, false) => Err(ProfileShapeError::MissingTenant { role, field }),
        (false, true) => Err(ProfileShapeError::UnexpectedTenant { role, field }),
        _ => Ok(()),
    }
}
