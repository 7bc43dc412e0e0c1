pub mod access;
pub mod health;
