pub mod mirror;
pub mod snapshot;

pub use mirror::{MirrorError, MirrorState};
pub use snapshot::Snapshot;
