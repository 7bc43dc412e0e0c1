pub mod access;

pub use access::{AccessCheckRequest, AccessContextResponse};
