//! Structured error handling for API responses

pub mod codes;
pub mod failure;
pub mod filter;
pub mod response;
pub mod validation;

pub use codes::ErrorCode;
pub use failure::{Failure, FailureSlot};
pub use filter::{ErrorSink, ExceptionFilter, TracingSink};
pub use response::ApiError;
pub use validation::ValidationErrors;
