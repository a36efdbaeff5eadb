mod docker;
mod engine;
mod error;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod types;

pub use docker::{DEFAULT_REQUEST_TIMEOUT, DockerEngine};
pub use engine::ContainerEngine;
pub use error::EngineError;
pub use types::*;
