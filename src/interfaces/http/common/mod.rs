//! Shared HTTP building blocks: response envelope, error mapping, extractors

mod error;
mod response;
mod validated_json;

pub use error::{domain_error, parse_connector, status_for, ApiError, ApiResult, CreatedResult};
pub use response::ApiResponse;
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
