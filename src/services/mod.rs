/*
 * Responsibility
 * - domain service 群 (HTTP/DB を知らない core)
 */
pub mod acl;
