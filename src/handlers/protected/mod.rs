// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler validates its request body first, then resolves the bearer
// token to a `Caller` (401 when missing or invalid), then lets the service
// apply the ownership checks (403).

pub mod agency;
pub mod clinic;
pub mod profile;
pub mod provision;
pub mod subscription;

pub use agency::{agency_clinic_delete, agency_clinics_get, agency_clinics_post, agency_get, agency_patch};
pub use clinic::{clinic_calls_get, clinic_get, clinic_patch};
pub use profile::{guard, me};
pub use provision::provision_managed_clinic;
pub use subscription::{cancel_subscription, show_subscription};
