pub mod agency;
pub mod call;
pub mod clinic;
pub mod profile;
pub mod subscription;

pub use agency::{Agency, AgencyChanges};
pub use call::Call;
pub use clinic::{Clinic, ClinicChanges, NewClinic};
pub use profile::{Profile, ProfileShapeError};
pub use subscription::{OwnerKey, Subscription, SubscriptionUpsert, DEFAULT_PLAN};
