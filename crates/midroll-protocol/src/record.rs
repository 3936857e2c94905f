use serde::{Deserialize, Serialize};

use crate::commands::Command;

/// A half-open byte range `[base, base + size)` in the scratch address space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
         Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct MemRange {
    pub base: u64,
    pub size: u64,
}

impl MemRange {
    pub fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    pub fn end(self) -> u64 {
        self.base + self.size
    }
}

/// A memory observation attached to a command: a scratch range the replay
/// must make visible before the call (read) or expect the call to produce
/// (write), together with its bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Observation {
    pub range: MemRange,
    pub bytes: Vec<u8>,
}

/// One entry of the rebuild stream: a typed command plus the read and write
/// observations it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct CommandRecord {
    /// Thread the command is attributed to on replay.
    pub thread: u64,
    pub command: Command,
    pub reads: Vec<Observation>,
    pub writes: Vec<Observation>,
}
