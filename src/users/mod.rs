//! Registration and password sign-in

pub mod password;
pub mod service;

pub use service::UserService;
