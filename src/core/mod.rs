//! Application context, owner workspace, and the command services that keep
//! the workspace and the record store in step.

pub mod context;
pub mod services;
pub mod workspace;

pub use context::AppContext;
pub use workspace::Workspace;
