/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - containers: ContainerSource, classifier: RoleClassifier, epochs: EpochSource
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::acl::{ContainerSource, EpochSource, RoleClassifier};

#[derive(Clone)]
pub struct AppState {
    pub containers: Arc<dyn ContainerSource>,
    pub classifier: Arc<RoleClassifier>,
    pub epochs: Arc<dyn EpochSource>,
}

impl AppState {
    pub fn new(
        containers: Arc<dyn ContainerSource>,
        classifier: Arc<RoleClassifier>,
        epochs: Arc<dyn EpochSource>,
    ) -> Self {
        Self {
            containers,
            classifier,
            epochs,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("containers", &self.containers.backend_name())
            .field("system_keys", &self.classifier.system_len())
            .finish_non_exhaustive()
    }
}
