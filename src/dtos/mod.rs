pub mod auth;
pub mod user;

use serde::Serialize;
use utoipa::ToSchema;

/// JSON error envelope returned for every failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Please authenticate")]
    pub error: String,
}
