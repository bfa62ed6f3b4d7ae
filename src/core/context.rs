use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthProvider, LocalAuth};
use crate::config::{Config, ConfigManager, ThemePreference};
use crate::store::{JsonStore, MemoryStore, RecordStore};

use super::services::{ServiceError, ServiceResult};

/// Account used by the command-line front end, which has no sign-in step.
pub const LOCAL_OWNER_EMAIL: &str = "local@fincommand";

/// Everything a service call needs besides the workspace: configuration, the
/// record store, the auth provider, and the theme preference.
///
/// Built once at startup and passed by reference.
pub struct AppContext {
    config: Config,
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
    theme: ThemePreference,
}

impl AppContext {
    pub fn new(config: Config, store: Arc<dyn RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        let theme = config.theme;
        Self {
            config,
            store,
            auth,
            theme,
        }
    }

    /// Volatile store and a signed-in local owner.
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(LocalAuth::signed_in_as(Uuid::nil(), LOCAL_OWNER_EMAIL)),
        )
    }

    /// Opens the JSON store named by the configuration under the manager's base directory.
    pub fn open(manager: &ConfigManager) -> ServiceResult<Self> {
        let config = manager.load()?;
        let store_path: PathBuf = config.resolved_store_path(manager.base_dir());
        let store = JsonStore::open(&store_path)?;
        info!(store = %store_path.display(), "application context ready");
        Ok(Self::new(
            config,
            Arc::new(store),
            Arc::new(LocalAuth::signed_in_as(Uuid::nil(), LOCAL_OWNER_EMAIL)),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    pub fn set_theme(&mut self, theme: ThemePreference) {
        self.theme = theme;
        self.config.theme = theme;
    }

    pub fn exchange_rate(&self) -> f64 {
        self.config.default_exchange_rate
    }

    pub fn delete_batch_size(&self) -> usize {
        self.config.delete_batch_size.max(1)
    }

    /// Owner of the active session.
    pub fn owner(&self) -> ServiceResult<Uuid> {
        self.auth
            .session()
            .map(|session| session.user_id)
            .ok_or(ServiceError::NotSignedIn)
    }
}
