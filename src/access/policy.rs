//! Capability table shared by the route guard and the server-side checks.
//!
//! Both sides ask `allows(role, capability)`; neither compares role strings
//! directly, so adding a role or moving a permission happens here only.

use serde::Serialize;

use crate::types::{OwnerType, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Agency dashboard, settings and clinic management pages
    AgencyWorkspace,
    /// Clinic dashboard, call log and receptionist settings
    ClinicWorkspace,
    /// Agency license billing
    AgencyBilling,
    /// Usage-based billing of a self-serve clinic
    ClinicBilling,
    /// Create clinics and managed clinic logins
    ProvisionClinics,
}

const AGENCY_ADMIN: &[Capability] = &[
    Capability::AgencyWorkspace,
    Capability::AgencyBilling,
    Capability::ProvisionClinics,
];

// Managed clinics are billed through their agency and never see billing.
const MANAGED_CLINIC: &[Capability] = &[Capability::ClinicWorkspace];

const INDEPENDENT_CLINIC: &[Capability] = &[Capability::ClinicWorkspace, Capability::ClinicBilling];

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::AgencyAdmin => AGENCY_ADMIN,
            Role::ManagedClinic => MANAGED_CLINIC,
            Role::IndependentClinic => INDEPENDENT_CLINIC,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Check an optional role (anonymous callers have none) against a capability
pub fn allows(role: Option<Role>, capability: Capability) -> bool {
    role.map_or(false, |r| r.can(capability))
}

impl OwnerType {
    /// Capability a caller needs to read or cancel this owner's subscription
    pub fn billing_capability(self) -> Capability {
        match self {
            OwnerType::Agency => Capability::AgencyBilling,
            OwnerType::Clinic => Capability::ClinicBilling,
        }
    }
}
