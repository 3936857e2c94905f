use std::collections::BTreeMap;

use rkyv::api::high::HighSerializer;
use rkyv::rancor::Error as EncodeError;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;

use midroll_protocol::MemRange;

/// Values that can be encoded into scratch bytes.
pub trait ScratchEncode:
    for<'a> rkyv::Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, EncodeError>>
{
}

impl<T> ScratchEncode for T where
    T: for<'a> rkyv::Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, EncodeError>>
{
}

/// Encode a value into scratch bytes.
///
/// Panics on serialization failure: a value that cannot be encoded is a
/// programming error, and the stream cannot be produced without it.
pub fn encode<T: ScratchEncode>(value: &T) -> Vec<u8> {
    rkyv::to_bytes::<EncodeError>(value)
        .unwrap_or_else(|e| panic!("scratch encoding failed: {e}"))
        .to_vec()
}

/// A block handed out by the scratch allocator: the address of the block,
/// its range, and the encoded bytes placed there.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocResult {
    pub ptr: u64,
    pub range: MemRange,
    pub bytes: Vec<u8>,
}

impl AllocResult {
    pub fn ptr(&self) -> u64 {
        self.ptr
    }
}

const SCRATCH_ALIGN: u64 = 8;

/// First-fit byte allocator over a scratch address space.
///
/// The base is seeded from the snapshot so scratch blocks never alias the
/// captured address ranges. Freed blocks return to a free list and are
/// reused, which keeps the footprint of the observation space bounded by
/// the largest set of simultaneously pending allocations.
#[derive(Debug, Clone)]
pub struct ScratchAllocator {
    next: u64,
    // base -> size
    free: BTreeMap<u64, u64>,
}

impl ScratchAllocator {
    pub fn new(base: u64) -> Self {
        Self {
            next: align_up(base.max(SCRATCH_ALIGN), SCRATCH_ALIGN),
            free: BTreeMap::new(),
        }
    }

    /// Allocate `len` bytes, 8-byte aligned.
    pub fn alloc(&mut self, len: u64) -> MemRange {
        let want = align_up(len.max(1), SCRATCH_ALIGN);
        let found = self
            .free
            .iter()
            .find(|(_, &size)| size >= want)
            .map(|(&base, &size)| (base, size));
        if let Some((base, size)) = found {
            self.free.remove(&base);
            if size > want {
                self.free.insert(base + want, size - want);
            }
            return MemRange::new(base, len);
        }
        let base = self.next;
        self.next += want;
        MemRange::new(base, len)
    }

    /// Encode `value` and allocate a block holding it.
    pub fn alloc_data<T: ScratchEncode>(&mut self, value: &T) -> AllocResult {
        let bytes = encode(value);
        self.alloc_bytes(bytes)
    }

    /// Allocate a block holding the given bytes verbatim.
    pub fn alloc_bytes(&mut self, bytes: Vec<u8>) -> AllocResult {
        let range = self.alloc(bytes.len() as u64);
        AllocResult {
            ptr: range.base,
            range,
            bytes,
        }
    }

    /// Return a block to the free list.
    pub fn free(&mut self, range: MemRange) {
        let size = align_up(range.size.max(1), SCRATCH_ALIGN);
        self.free.insert(range.base, size);
    }
}

fn align_up(v: u64, to: u64) -> u64 {
    (v + to - 1) & !(to - 1)
}
