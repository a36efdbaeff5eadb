mod error;
mod manager;
mod resolve;

pub use error::WorkspaceError;
pub use manager::{CreateOutcome, WorkspaceManager};
