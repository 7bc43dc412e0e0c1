/*
 * Responsibility
 * - containers テーブル向け SQLx 操作 (read-only)
 * - ContainerSource の PostgreSQL 実装
 *
 * Schema
 *   CREATE TABLE containers (
 *       container_id BYTEA PRIMARY KEY,
 *       owner_id     BYTEA  NOT NULL,
 *       basic_acl    BIGINT NOT NULL
 *   );
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;
use crate::services::acl::{
    BasicAcl, ContainerError, ContainerId, ContainerInfo, ContainerSource, UserId,
};

const TABLE: &str = "containers";

#[derive(Debug, FromRow)]
pub struct ContainerRow {
    pub container_id: Vec<u8>,
    pub owner_id: Vec<u8>,
    pub basic_acl: i64,
}

impl ContainerRow {
    pub fn into_info(self) -> Result<ContainerInfo, RepoError> {
        let owner = UserId::from_slice(&self.owner_id).map_err(|source| RepoError::Corrupt {
            table: TABLE,
            source,
        })?;
        let bits = u32::try_from(self.basic_acl).map_err(|_| RepoError::AclOutOfRange {
            table: TABLE,
            value: self.basic_acl,
        })?;

        Ok(ContainerInfo {
            owner,
            basic_acl: BasicAcl::from_bits(bits),
        })
    }
}

pub async fn get(db: &PgPool, id: &ContainerId) -> Result<Option<ContainerRow>, RepoError> {
    let row = sqlx::query_as::<_, ContainerRow>(
        r#"
        SELECT container_id, owner_id, basic_acl
        FROM containers
        WHERE container_id = $1
        "#,
    )
    .bind(id.as_bytes())
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// PostgreSQL-backed container metadata.
#[derive(Clone, Debug)]
pub struct PgContainerRepo {
    db: PgPool,
}

impl PgContainerRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContainerSource for PgContainerRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let row = get(&self.db, id)
            .await
            .map_err(|e| ContainerError::Backend(e.into()))?
            .ok_or(ContainerError::NotFound(*id))?;

        row.into_info()
            .map_err(|e| ContainerError::Backend(e.into()))
    }
}
