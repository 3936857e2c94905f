//! The stream writer: scratch observation staging, command emission, and
//! the shared oracles every builder leans on.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use ash::vk;
use tracing::{debug, warn};

use midroll_core::scratch::{AllocResult, ScratchAllocator, ScratchEncode};
use midroll_core::RangeList;
use midroll_protocol::commands::*;
use midroll_protocol::handle::*;
use midroll_protocol::{Command, CommandRecord, Observation};
use midroll_state::mirror::MirrorState;
use midroll_state::snapshot::{QueueRecord, Snapshot};

use crate::{RebuildOptions, RebuildOutput};

pub struct StreamBuilder<'a> {
    snapshot: &'a Snapshot,
    options: RebuildOptions,
    alloc: ScratchAllocator,
    pending_reads: Vec<AllocResult>,
    pending_writes: Vec<AllocResult>,
    cmds: Vec<CommandRecord>,
    memory_intervals: RangeList,
    mirror: MirrorState,
    next_synthetic_id: u64,
}

impl<'a> StreamBuilder<'a> {
    pub fn new(snapshot: &'a Snapshot, options: RebuildOptions) -> Self {
        let next_synthetic_id = options.synthetic_id_base;
        Self {
            snapshot,
            options,
            alloc: ScratchAllocator::new(snapshot.scratch_base),
            pending_reads: Vec::new(),
            pending_writes: Vec::new(),
            cmds: Vec::new(),
            memory_intervals: RangeList::new(),
            mirror: MirrorState::new(),
            next_synthetic_id,
        }
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// Read-only view of what the stream has recreated so far.
    pub fn mirror(&self) -> &MirrorState {
        &self.mirror
    }

    pub fn finish(self) -> RebuildOutput {
        RebuildOutput {
            commands: self.cmds,
            memory_intervals: self.memory_intervals,
        }
    }

    // ── Observation staging ─────────────────────────────────

    /// Serialize `value` into scratch and stage it as a read observation
    /// of the next emitted command. Returns the block's address.
    pub fn alloc_read<T: ScratchEncode>(&mut self, value: &T) -> u64 {
        let block = self.alloc.alloc_data(value);
        self.stage_read(block)
    }

    /// Serialize `value` into scratch and stage it as a write observation
    /// of the next emitted command. Returns the block's address.
    pub fn alloc_write<T: ScratchEncode>(&mut self, value: &T) -> u64 {
        let block = self.alloc.alloc_data(value);
        self.stage_write(block)
    }

    /// Stage one block as both a read and a write observation. Used for
    /// in/out parameter cells such as the pointer slot of `vkMapMemory`.
    pub fn alloc_read_write<T: ScratchEncode>(&mut self, value: &T) -> u64 {
        let block = self.alloc.alloc_data(value);
        let ptr = block.ptr;
        self.memory_intervals.merge(block.range);
        self.pending_reads.push(block.clone());
        self.pending_writes.push(block);
        ptr
    }

    /// Stage the values of an ordered map as one dense read block, in key
    /// order. The form Vulkan's key-indexed array parameters take.
    pub fn unpack_read_map<K, V>(&mut self, map: &BTreeMap<K, V>) -> u64
    where
        V: Clone + ScratchEncode,
        Vec<V>: ScratchEncode,
    {
        let values: Vec<V> = map.values().cloned().collect();
        self.alloc_read(&values)
    }

    /// As `unpack_read_map`, staged as a write observation.
    pub fn unpack_write_map<K, V>(&mut self, map: &BTreeMap<K, V>) -> u64
    where
        V: Clone + ScratchEncode,
        Vec<V>: ScratchEncode,
    {
        let values: Vec<V> = map.values().cloned().collect();
        self.alloc_write(&values)
    }

    /// Allocate a block without staging it. The caller either stages it
    /// later with `stage_read` or frees it itself.
    pub fn alloc_raw<T: ScratchEncode>(&mut self, value: &T) -> AllocResult {
        self.alloc.alloc_data(value)
    }

    pub fn alloc_raw_bytes(&mut self, bytes: Vec<u8>) -> AllocResult {
        self.alloc.alloc_bytes(bytes)
    }

    pub fn stage_read(&mut self, block: AllocResult) -> u64 {
        let ptr = block.ptr;
        self.memory_intervals.merge(block.range);
        self.pending_reads.push(block);
        ptr
    }

    pub fn stage_write(&mut self, block: AllocResult) -> u64 {
        let ptr = block.ptr;
        self.memory_intervals.merge(block.range);
        self.pending_writes.push(block);
        ptr
    }

    /// Append `cmd` to the stream, attaching every observation staged
    /// since the previous emit. The command is applied to the mirror state
    /// (non-fatal on failure), then the staged scratch blocks are freed.
    pub fn emit(&mut self, cmd: Command) {
        let reads: Vec<Observation> = self
            .pending_reads
            .iter()
            .map(|a| Observation {
                range: a.range,
                bytes: a.bytes.clone(),
            })
            .collect();
        let writes: Vec<Observation> = self
            .pending_writes
            .iter()
            .map(|a| Observation {
                range: a.range,
                bytes: a.bytes.clone(),
            })
            .collect();

        match self.mirror.apply(&cmd) {
            Ok(()) => debug!("initial cmd {}: {}", self.cmds.len(), cmd.name()),
            Err(e) => warn!("initial cmd {}: {}: {}", self.cmds.len(), cmd.name(), e),
        }

        self.cmds.push(CommandRecord {
            thread: self.options.thread,
            command: cmd,
            reads,
            writes,
        });

        let mut freed = BTreeSet::new();
        for block in self
            .pending_reads
            .drain(..)
            .chain(self.pending_writes.drain(..))
        {
            if freed.insert(block.range.base) {
                self.alloc.free(block.range);
            }
        }
    }

    // ── Unused-identifier oracle ────────────────────────────

    /// Return an identifier for which `in_use` is false. The cursor is
    /// monotone, so an id is never handed out twice within one rebuild.
    pub fn unused_id(&mut self, in_use: impl Fn(u64) -> bool) -> u64 {
        loop {
            let id = self.next_synthetic_id;
            self.next_synthetic_id += 1;
            if !in_use(id) && !self.snapshot.contains_raw_handle(id) {
                return id;
            }
        }
    }

    // ── Queue oracles ───────────────────────────────────────

    /// Prefer the last-bound queue; then any queue on `device` whose
    /// family appears in `family_hint`; then the first queue on `device`.
    pub fn queue_for(
        &self,
        last_bound: Option<QueueHandle>,
        device: DeviceHandle,
        family_hint: &[u32],
    ) -> Option<&'a QueueRecord> {
        if let Some(q) = last_bound.and_then(|h| self.snapshot.queues.get(&h)) {
            return Some(q);
        }
        if !family_hint.is_empty() {
            for q in self.snapshot.queues.values() {
                if q.device == device && family_hint.contains(&q.family) {
                    return Some(q);
                }
            }
        }
        self.snapshot.queues.values().find(|q| q.device == device)
    }

    /// As `queue_for`, but constrained to queues whose family advertises
    /// sparse binding. Falls back to the last-bound queue when no
    /// sparse-capable queue exists.
    pub fn sparse_queue_for(
        &self,
        last_bound: Option<QueueHandle>,
        device: DeviceHandle,
        family_hint: &[u32],
    ) -> Option<&'a QueueRecord> {
        let last = last_bound.and_then(|h| self.snapshot.queues.get(&h));
        if let Some(q) = last {
            if self.family_advertises_sparse(q.device, q.family) {
                return Some(q);
            }
        }
        if !family_hint.is_empty() {
            for q in self.snapshot.queues.values() {
                if q.device == device
                    && self.family_advertises_sparse(device, q.family)
                    && family_hint.contains(&q.family)
                {
                    return Some(q);
                }
            }
        }
        last
    }

    fn family_advertises_sparse(&self, device: DeviceHandle, family: u32) -> bool {
        let Some(dev) = self.snapshot.devices.get(&device) else {
            return false;
        };
        let Some(pd) = self.snapshot.physical_devices.get(&dev.physical_device) else {
            return false;
        };
        pd.queue_family_properties
            .get(&family)
            .map(|f| f.queue_flags & vk::QueueFlags::SPARSE_BINDING.as_raw() != 0)
            .unwrap_or(false)
    }

    // ── Scratch command buffers ─────────────────────────────

    /// Create a transient command pool and primary command buffer on
    /// `queue`'s device and begin recording.
    pub fn begin_scratch_commands(
        &mut self,
        queue: &QueueRecord,
    ) -> (CommandBufferHandle, CommandPoolHandle) {
        let snap = self.snapshot;
        let pool = CommandPoolHandle(
            self.unused_id(|x| snap.command_pools.contains_key(&CommandPoolHandle(x))),
        );
        let command_buffer = CommandBufferHandle(
            self.unused_id(|x| snap.command_buffers.contains_key(&CommandBufferHandle(x))),
        );

        self.alloc_read(&(queue.family, 0u32));
        self.alloc_write(&pool);
        self.emit(Command::CreateCommandPool {
            device: queue.device,
            flags: 0,
            queue_family_index: queue.family,
            pool,
        });

        self.alloc_read(&(pool, 1u32));
        self.alloc_write(&command_buffer);
        self.emit(Command::AllocateCommandBuffers {
            device: queue.device,
            pool,
            level: CommandBufferLevel::Primary,
            command_buffers: vec![command_buffer],
        });

        self.alloc_read(&0u32);
        self.emit(Command::BeginCommandBuffer {
            command_buffer,
            flags: 0,
            inheritance: None,
        });

        (command_buffer, pool)
    }

    /// End the transient command buffer, submit it, wait for the queue to
    /// drain, then destroy the pool.
    pub fn end_submit_and_destroy(
        &mut self,
        queue: &QueueRecord,
        command_buffer: CommandBufferHandle,
        pool: CommandPoolHandle,
    ) {
        self.emit(Command::EndCommandBuffer { command_buffer });

        let submit = SubmitInfo {
            wait_semaphores: vec![],
            wait_dst_stage_masks: vec![],
            command_buffers: vec![command_buffer],
            signal_semaphores: vec![],
        };
        self.alloc_read(&command_buffer);
        self.alloc_read(&submit);
        self.emit(Command::QueueSubmit {
            queue: queue.handle,
            submits: vec![submit],
            fence: FenceHandle::NULL,
        });

        self.emit(Command::QueueWaitIdle {
            queue: queue.handle,
        });
        self.emit(Command::DestroyCommandPool {
            device: queue.device,
            pool,
        });
    }
}
