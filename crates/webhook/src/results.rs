//! In-memory store for completed heal sessions (§4.16, §6.2).

use std::collections::HashMap;
use std::sync::Arc;

use heal::HealResultSchema;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<HashMap<Uuid, HealResultSchema>>>,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: Uuid, result: HealResultSchema) {
        self.inner.write().await.insert(id, result);
    }

    pub async fn get(&self, id: Uuid) -> Option<HealResultSchema> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn all(&self) -> Vec<HealResultSchema> {
        self.inner.read().await.values().cloned().collect()
    }
}
