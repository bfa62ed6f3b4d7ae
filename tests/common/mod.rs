#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fincommand_core::{
    auth::LocalAuth,
    config::{Config, ConfigManager},
    core::{services::WorkspaceService, AppContext, Workspace},
    store::MemoryStore,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Context backed by a JSON store under a unique directory.
pub fn setup_test_env() -> (AppContext, ConfigManager) {
    let manager = ConfigManager::with_base_dir(temp_base()).expect("create config manager");
    let ctx = AppContext::open(&manager).expect("open app context");
    (ctx, manager)
}

/// In-memory context whose store handle stays available for arming failures.
pub fn memory_env(config: Config) -> (AppContext, Arc<MemoryStore>, Workspace) {
    let store = Arc::new(MemoryStore::new());
    let ctx = AppContext::new(
        config,
        store.clone(),
        Arc::new(LocalAuth::signed_in_as(Uuid::new_v4(), "tester@fincommand")),
    );
    let ws = WorkspaceService::load(&ctx).expect("load workspace");
    (ctx, store, ws)
}
