//! Business operations behind the HTTP handlers and the CLI.
//!
//! Services receive the datastore and identity provider as trait objects so
//! the same code runs against Postgres and Supabase in production and the
//! in-memory adapters in tests.

pub mod authorization;
pub mod error;
pub mod profile_service;
pub mod provisioning_service;
pub mod subscription_service;
pub mod tenant_service;

pub use authorization::Caller;
pub use error::ServiceError;
pub use profile_service::{LoginRequest, LoginResult, ProfileService, ProfileStatus};
pub use provisioning_service::{
    Credentials, IndependentSignup, ManagedClinic, ManagedClinicRequest, ManagedLogin, ManagedLoginRequest,
    ProvisioningService, RegisteredAgency, SignedUpClinic,
};
pub use subscription_service::{CancelRequest, EventOutcome, SubscriptionService};
pub use tenant_service::TenantService;
