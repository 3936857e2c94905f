pub mod commands;
pub mod error;
pub mod handle;
pub mod record;

pub use commands::{Command, RecordedCommand};
pub use error::ProtocolError;
pub use record::{CommandRecord, MemRange, Observation};
