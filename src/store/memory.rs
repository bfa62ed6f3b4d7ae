use super::{Persistence, StoreResult, StoreState, TableStore};

/// Keeps committed state in process memory only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Volatile;

impl Persistence for Volatile {
    fn persist(&self, _state: &StoreState) -> StoreResult<()> {
        Ok(())
    }
}

pub type MemoryStore = TableStore<Volatile>;

impl MemoryStore {
    pub fn new() -> Self {
        TableStore::with_state(StoreState::default(), Volatile)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
