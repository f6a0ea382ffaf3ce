// Context Module - what the host supplies to connectors at call time
pub mod clients;
pub mod execution;
pub mod schema;

pub use clients::ClientRegistry;
pub use execution::{Credentials, ExecutionContext, Setup, StaticContext};
pub use schema::*;
