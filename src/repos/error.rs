/*
 * Responsibility
 * - What repo failures mean to callers (db failure vs. rows we cannot decode)
 */
use thiserror::Error;

use crate::services::acl::types::IdError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("corrupt row in {table}: {source}")]
    Corrupt {
        table: &'static str,
        #[source]
        source: IdError,
    },
    #[error("corrupt row in {table}: basic_acl {value} out of range")]
    AclOutOfRange { table: &'static str, value: i64 },
}
