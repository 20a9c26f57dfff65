//! Persistence interface (`spec.md` §6 "Persistence interface (abstract,
//! injected)"). The core only ever calls through `PersistenceBackend`;
//! object storage, local files, and the actual save-blob format are
//! explicitly out of scope (`spec.md` §1 "Explicitly OUT of scope").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMeta {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveBlob {
    pub meta: SaveMeta,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResult {
    pub save_id: String,
    pub size: usize,
}

/// Abstract persistence boundary. Implementations back onto object
/// storage or local files; none is shipped here beyond the in-memory
/// stub used by this crate's own tests.
pub trait PersistenceBackend: Send + Sync {
    fn list_saves(&self) -> Vec<SaveMeta>;
    fn get_save(&self, id: &str) -> Option<SaveBlob>;
    fn save_game(&self, data: Vec<u8>) -> SaveResult;
    fn delete_save(&self, id: &str) -> bool;
}

/// In-memory backend for tests and local experimentation; not a product
/// surface (`spec.md` §1 persistence is "external").
#[derive(Default)]
pub struct InMemoryPersistence {
    saves: std::sync::Mutex<HashMap<String, SaveBlob>>,
    next_id: std::sync::atomic::AtomicU64,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceBackend for InMemoryPersistence {
    fn list_saves(&self) -> Vec<SaveMeta> {
        self.saves.lock().expect("persistence lock poisoned").values().map(|b| b.meta.clone()).collect()
    }

    fn get_save(&self, id: &str) -> Option<SaveBlob> {
        self.saves.lock().expect("persistence lock poisoned").get(id).cloned()
    }

    fn save_game(&self, data: Vec<u8>) -> SaveResult {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let save_id = format!("save-{id}");
        let size = data.len();
        let meta = SaveMeta { id: save_id.clone(), created_at: chrono::Utc::now(), size_bytes: size };
        self.saves.lock().expect("persistence lock poisoned").insert(save_id.clone(), SaveBlob { meta, data });
        SaveResult { save_id, size }
    }

    fn delete_save(&self, id: &str) -> bool {
        self.saves.lock().expect("persistence lock poisoned").remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_list_then_delete_round_trips() {
        let backend = InMemoryPersistence::new();
        let result = backend.save_game(vec![1, 2, 3]);
        assert_eq!(result.size, 3);
        assert_eq!(backend.list_saves().len(), 1);
        assert!(backend.get_save(&result.save_id).is_some());
        assert!(backend.delete_save(&result.save_id));
        assert!(backend.list_saves().is_empty());
    }

    #[test]
    fn deleting_unknown_save_returns_false() {
        let backend = InMemoryPersistence::new();
        assert!(!backend.delete_save("nonexistent"));
    }
}
