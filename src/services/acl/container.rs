//! Container metadata consumed by the pipeline.
use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{BasicAcl, ContainerId, UserId};

/// The parts of a container the access layer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerInfo {
    pub owner: UserId,
    pub basic_acl: BasicAcl,
}

/// Container lookup failures.
///
/// Kept apart from `AclError`: a missing container is not an identity
/// problem, and callers answer it differently.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(ContainerId),
    #[error("container backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Source of container metadata (registry, cache, database).
///
/// Implementations must be cheap to share (`Arc<dyn ContainerSource>`).
#[async_trait]
pub trait ContainerSource: Send + Sync + 'static {
    // Backend name for logs.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;
}

/// Fixed in-process container table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContainers {
    containers: HashMap<ContainerId, ContainerInfo>,
}

impl InMemoryContainers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: ContainerId, info: ContainerInfo) -> Self {
        self.containers.insert(id, info);
        self
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[async_trait]
impl ContainerSource for InMemoryContainers {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        self.containers
            .get(id)
            .copied()
            .ok_or(ContainerError::NotFound(*id))
    }
}
