pub mod appwrite;
pub mod memory;
pub mod user_repository;
