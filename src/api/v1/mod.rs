/*
 * Responsibility
 * - v1 の公開ポイント (routes() の re-export, DTO)
 */
pub mod dto;
mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
