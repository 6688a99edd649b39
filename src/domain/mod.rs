pub mod error;
pub mod repository;
pub mod session;
pub mod user;
pub mod validation;
