// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service info, health, password login, self-serve signup and the billing
// webhook. The webhook authenticates by signature instead of a bearer token.

pub mod health;
pub mod login;
pub mod root;
pub mod signup;
pub mod webhook;

pub use health::health;
pub use login::login;
pub use root::root;
pub use signup::signup_independent_clinic;
pub use webhook::paddle_webhook;
