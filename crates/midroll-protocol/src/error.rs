use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
}
