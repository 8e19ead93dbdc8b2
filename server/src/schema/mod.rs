use serde::Serialize;
use utoipa::ToSchema;

pub mod asset;
pub use asset::*;

/// Body of every 400 and 500 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    /// `FILE_MISSING`, `INVALID_TYPE`, `LIMIT_FILE_SIZE`, `LIMIT_UNEXPECTED_FILE`,
    /// `EMPTY_NAME`, `INVALID_BODY`, `INVALID_MULTIPART` or `Internal Server Error`
    pub error: String,
}
