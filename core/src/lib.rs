mod protocol;
mod tools;

pub use protocol::*;
pub use tools::*;
