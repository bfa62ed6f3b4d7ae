use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{Persistence, StoreResult, StoreState, TableStore};
use crate::utils::{ensure_dir, write_atomic};

/// Writes the whole table set to one JSON document after every commit.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFile {
    fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}

pub type JsonStore = TableStore<JsonFile>;

impl JsonStore {
    /// Opens the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let state = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            StoreState::default()
        };
        info!(path = %path.display(), owners = state.owners.len(), "opened record store");
        Ok(TableStore::with_state(state, JsonFile { path }))
    }

    pub fn path(&self) -> &Path {
        self.persistence().path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::CreditObligation;
    use crate::store::{RecordStore, StoreOp};
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn committed_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let owner = Uuid::new_v4();
        let card = CreditObligation::new("Banco BHD", "Visa");
        {
            let store = JsonStore::open(&path).unwrap();
            store.insert_obligation(owner, &card).unwrap();
        }
        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.list_obligations(owner).unwrap(), vec![card]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn failed_write_does_not_touch_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let owner = Uuid::new_v4();
        let store = JsonStore::open(&path).unwrap();
        store.arm_failure(StoreOp::InsertObligation, 1);
        assert!(store
            .insert_obligation(owner, &CreditObligation::new("BHD", "Gold"))
            .is_err());
        assert!(!path.exists());
    }
}
