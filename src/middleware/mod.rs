pub mod auth;
pub mod response;

pub use auth::{extract_bearer_token, BearerToken};
pub use response::{ApiResponse, ApiResult};
