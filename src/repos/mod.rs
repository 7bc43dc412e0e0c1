pub mod container_repo;
pub mod error;
