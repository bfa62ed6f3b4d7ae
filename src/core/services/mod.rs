pub mod cash_service;
pub mod client_service;
pub mod company_service;
pub mod obligation_service;
pub mod subscription_service;
pub mod summary_service;
pub mod transaction_service;
pub mod workspace_service;

pub use cash_service::CashService;
pub use client_service::ClientService;
pub use company_service::CompanyService;
pub use obligation_service::ObligationService;
pub use subscription_service::SubscriptionService;
pub use summary_service::SummaryService;
pub use transaction_service::{BatchDeleteReport, TransactionService};
pub use workspace_service::WorkspaceService;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::errors::LedgerError;
use crate::store::StoreError;
use crate::tabular::ImportError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures surfaced to the user; `Display` is the notice text.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Invalid(String),
    #[error("no se pudo guardar el cambio: {0}")]
    Remote(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("inicia sesión para continuar")]
    NotSignedIn,
}

impl ServiceError {
    pub(crate) fn not_found(what: &str) -> Self {
        ServiceError::Invalid(format!("{what} not found"))
    }
}
