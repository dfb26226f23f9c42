pub mod exception_filter;
pub mod logging;

pub use exception_filter::{exception_filter, panic_to_failure};
pub use logging::logging_middleware;
