//! Role & route guard.
//!
//! `guard` decides whether a role may see a dashboard path and where to send
//! it otherwise. It is pure: the front end calls it before the first render
//! and on every navigation, and `GET /api/guard` exposes the same table.

pub mod policy;

use serde::Serialize;

use crate::types::Role;
pub use policy::{allows, Capability};

pub const AGENCY_LOGIN: &str = "/auth/agency-login";
pub const CLINIC_LOGIN: &str = "/auth/clinic-login";

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl GuardDecision {
    pub const fn allow() -> Self {
        Self { allowed: true, redirect: None }
    }

    pub const fn redirect(to: &'static str) -> Self {
        Self { allowed: false, redirect: Some(to) }
    }
}

struct RouteRule {
    prefix: &'static str,
    requires: Capability,
    redirect: &'static str,
}

// Order matters: the billing rule must run before the general clinic rule.
const ROUTE_RULES: &[RouteRule] = &[
    RouteRule { prefix: "/clinic/billing", requires: Capability::ClinicBilling, redirect: "/clinic" },
    RouteRule { prefix: "/clinic", requires: Capability::ClinicWorkspace, redirect: "/" },
    RouteRule { prefix: "/agency", requires: Capability::AgencyWorkspace, redirect: AGENCY_LOGIN },
];

/// Decide whether `role` may render `path`
pub fn guard(path: &str, role: Option<Role>) -> GuardDecision {
    let path = normalize(path);

    let Some(role) = role else {
        return GuardDecision::redirect(login_page_for(path));
    };

    ROUTE_RULES
        .iter()
        .find(|rule| is_under(path, rule.prefix))
        .filter(|rule| !role.can(rule.requires))
        .map(|rule| GuardDecision::redirect(rule.redirect))
        .unwrap_or(GuardDecision::allow())
}

/// Login page matching the area a path belongs to
pub fn login_page_for(path: &str) -> &'static str {
    if is_under(normalize(path), "/agency") {
        AGENCY_LOGIN
    } else {
        CLINIC_LOGIN
    }
}

pub fn can_access_clinic_billing(role: Option<Role>) -> bool {
    allows(role, Capability::ClinicBilling)
}

pub fn can_access_agency(path: &str, role: Option<Role>) -> bool {
    match role {
        None => false,
        Some(role) if is_under(normalize(path), "/agency") => role.can(Capability::AgencyWorkspace),
        Some(_) => true,
    }
}

fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_clinic_billing_for_managed_clinics() {
        let result = guard("/clinic/billing", Some(Role::ManagedClinic));
        assert!(!result.allowed);
        assert_eq!(result.redirect, Some("/clinic"));
    }

    #[test]
    fn allows_independent_clinics_to_billing() {
        assert_eq!(guard("/clinic/billing", Some(Role::IndependentClinic)), GuardDecision::allow());
    }

    #[test]
    fn blocks_agency_users_from_clinic_space() {
        let result = guard("/clinic", Some(Role::AgencyAdmin));
        assert_eq!(result, GuardDecision::redirect("/"));
        // the billing rule runs before the general clinic rule
        assert_eq!(guard("/clinic/billing", Some(Role::AgencyAdmin)), GuardDecision::redirect("/clinic"));
    }

    #[test]
    fn protects_agency_routes() {
        assert_eq!(guard("/agency", None), GuardDecision::redirect(AGENCY_LOGIN));
        assert_eq!(guard("/agency/settings", Some(Role::IndependentClinic)), GuardDecision::redirect(AGENCY_LOGIN));
        assert_eq!(guard("/agency/billing", Some(Role::ManagedClinic)), GuardDecision::redirect(AGENCY_LOGIN));
        assert!(guard("/agency/billing", Some(Role::AgencyAdmin)).allowed);
    }

    #[test]
    fn anonymous_goes_to_clinic_login_outside_agency() {
        assert_eq!(guard("/clinic/billing", None), GuardDecision::redirect(CLINIC_LOGIN));
        assert_eq!(guard("/settings", None), GuardDecision::redirect(CLINIC_LOGIN));
    }

    #[test]
    fn unguarded_paths_are_allowed_for_any_role() {
        for role in Role::ALL {
            assert!(guard("/", Some(role)).allowed);
            assert!(guard("/settings", Some(role)).allowed);
        }
    }

    #[test]
    fn prefixes_match_whole_segments_and_ignore_query() {
        assert!(guard("/clinics-directory", Some(Role::AgencyAdmin)).allowed);
        assert_eq!(guard("/clinic/billing?tab=usage", Some(Role::ManagedClinic)).redirect, Some("/clinic"));
        assert_eq!(guard("/clinic#calls", Some(Role::AgencyAdmin)).redirect, Some("/"));
    }

    #[test]
    fn billing_lookalike_path_falls_under_clinic_rule() {
        // "/clinic/billing-history" is not under "/clinic/billing"
        assert_eq!(guard("/clinic/billing-history", Some(Role::ManagedClinic)), GuardDecision::allow());
        assert_eq!(guard("/clinic/billing-history", Some(Role::AgencyAdmin)), GuardDecision::redirect("/"));
        assert_eq!(guard("/clinic/billing/history", Some(Role::ManagedClinic)), GuardDecision::redirect("/clinic"));
    }

    #[test]
    fn guard_is_deterministic() {
        for role in [None, Some(Role::AgencyAdmin), Some(Role::ManagedClinic), Some(Role::IndependentClinic)] {
            for path in ["/", "/clinic", "/clinic/billing", "/agency", "/agency/clinics"] {
                assert_eq!(guard(path, role), guard(path, role));
            }
        }
    }

    #[test]
    fn convenience_helpers() {
        assert!(can_access_clinic_billing(Some(Role::IndependentClinic)));
        assert!(!can_access_clinic_billing(Some(Role::ManagedClinic)));
        assert!(!can_access_clinic_billing(None));
        assert!(can_access_agency("/agency", Some(Role::AgencyAdmin)));
        assert!(!can_access_agency("/agency", Some(Role::ManagedClinic)));
        assert!(can_access_agency("/clinic", Some(Role::ManagedClinic)));
        assert!(!can_access_agency("/", None));
    }
}
