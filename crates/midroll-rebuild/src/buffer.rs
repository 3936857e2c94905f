//! Buffer recreation: dense and sparse binding plus content priming
//! through a staging buffer.

use std::collections::BTreeMap;
use std::collections::HashSet;

use ash::vk;

use midroll_core::format::next_multiple_of_8;
use midroll_protocol::commands::*;
use midroll_protocol::handle::FenceHandle;
use midroll_protocol::Command;
use midroll_state::snapshot::{BufferRecord, BufferViewRecord};

use crate::writer::StreamBuilder;

/// True iff `[offset, offset + size)` is covered by the union of the
/// bindings, keyed by resource offset.
pub fn is_fully_bound(
    offset: u64,
    size: u64,
    bindings: &BTreeMap<u64, SparseMemoryBind>,
) -> bool {
    let mut end = offset + size;

    // Walk bindings that start inside the range, highest first. Each one
    // must reach the current end, then the end moves back to its start.
    for (&res_offset, bind) in bindings.range(..=end).rev() {
        if end <= offset {
            return true;
        }
        if res_offset + bind.size < end {
            return false;
        }
        end = res_offset;
    }
    end <= offset
}

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_buffer(&mut self, buffer: &BufferRecord) {
        let dense_bound = buffer.memory.is_some();
        let sparse_bound = !buffer.sparse_bindings.is_empty();
        let sparse_binding =
            buffer.info.flags & vk::BufferCreateFlags::SPARSE_BINDING.as_raw() != 0;
        let sparse_residency = sparse_binding
            && buffer.info.flags & vk::BufferCreateFlags::SPARSE_RESIDENCY.as_raw() != 0;

        // TRANSFER_DST is OR'd in so the priming copy below is legal.
        let mut info = buffer.info.clone();
        info.usage |= vk::BufferUsageFlags::TRANSFER_DST.as_raw();

        if buffer.info.dedicated_allocation_nv.is_some() {
            self.alloc_read(&buffer.info.dedicated_allocation_nv);
        }
        self.alloc_read(&info.queue_family_indices);
        self.alloc_read(&info);
        self.alloc_write(&buffer.handle);
        self.emit(Command::CreateBuffer {
            device: buffer.device,
            info,
            buffer: buffer.handle,
        });

        self.alloc_write(&buffer.memory_requirements);
        self.emit(Command::GetBufferMemoryRequirements {
            device: buffer.device,
            buffer: buffer.handle,
            requirements: buffer.memory_requirements.clone(),
        });

        // A dedicated allocation must not be sparse-bound. The info is
        // checked on both the memory and the buffer side because captures
        // exist that miss one of them.
        let memory_record = buffer
            .memory
            .and_then(|m| self.snapshot().device_memories.get(&m));
        let dedicated_memory_nv = memory_record.map_or(false, |m| {
            buffer.info.dedicated_allocation_nv.is_some()
                || m.dedicated_allocation_nv.is_some()
        });
        if dedicated_memory_nv {
            if buffer.info.dedicated_allocation_nv.is_none() {
                self.expect_nv_dedicated("VkBuffer", buffer.handle.raw());
            }
            if let Some(m) = memory_record {
                if m.dedicated_allocation_nv.is_none() {
                    self.expect_nv_dedicated("VkDeviceMemory", m.handle.raw());
                }
                self.create_device_memory(m, true);
            }
        }

        if !dense_bound && !sparse_bound {
            return;
        }

        let mut contents: Vec<u8> = Vec::new();
        let mut copies: Vec<BufferCopy> = Vec::new();
        let mut offset = 0u64;

        let queue = self.queue_for(
            buffer.last_bound_queue,
            buffer.device,
            &buffer.info.queue_family_indices,
        );

        let mut old_family_index: Option<u32> = None;

        if sparse_bound {
            if queue.is_none() {
                return;
            }
            let sparse_queue = self.sparse_queue_for(
                buffer.last_bound_queue,
                buffer.device,
                &buffer.info.queue_family_indices,
            );
            let Some(sparse_queue) = sparse_queue else {
                return;
            };
            old_family_index = Some(sparse_queue.family);

            if buffer.info.dedicated_allocation_nv.is_some() {
                let mut seen = HashSet::new();
                for bind in buffer.sparse_bindings.values() {
                    if seen.insert(bind.memory) {
                        if let Some(m) = self.snapshot().device_memories.get(&bind.memory) {
                            self.create_device_memory(m, true);
                        }
                    }
                }
            }

            let bind_info = BindSparseInfo {
                wait_semaphores: vec![],
                buffer_binds: vec![SparseBufferMemoryBindInfo {
                    buffer: buffer.handle,
                    binds: buffer.sparse_bindings.values().cloned().collect(),
                }],
                image_opaque_binds: vec![],
                image_binds: vec![],
                signal_semaphores: vec![],
            };
            self.unpack_read_map(&buffer.sparse_bindings);
            self.alloc_read(&bind_info);
            self.emit(Command::QueueBindSparse {
                queue: sparse_queue.handle,
                bind_info,
                fence: FenceHandle::NULL,
            });

            if sparse_residency
                || is_fully_bound(0, buffer.info.size, &buffer.sparse_bindings)
            {
                for bind in buffer.sparse_bindings.values() {
                    let Some(m) = self.snapshot().device_memories.get(&bind.memory) else {
                        continue;
                    };
                    let data = m.bytes(bind.memory_offset, bind.size);
                    contents.extend_from_slice(&data);
                    copies.push(BufferCopy {
                        src_offset: offset,
                        dst_offset: bind.resource_offset,
                        size: bind.size,
                    });
                    offset += bind.size;
                    offset = next_multiple_of_8(offset);
                }
            }
        } else {
            let Some(memory) = memory_record else {
                return;
            };

            self.emit(Command::BindBufferMemory {
                device: buffer.device,
                buffer: buffer.handle,
                memory: memory.handle,
                memory_offset: buffer.memory_offset,
            });

            let size = buffer.info.size;
            let data = memory.bytes(buffer.memory_offset, size);
            contents.extend_from_slice(&data);
            copies.push(BufferCopy {
                src_offset: offset,
                dst_offset: 0,
                size,
            });
        }

        let Some(queue) = queue else {
            return;
        };
        let Some(device) = self.snapshot().devices.get(&buffer.device) else {
            return;
        };

        let (scratch_buffer, scratch_memory) = self.alloc_and_fill_scratch_buffer(
            device,
            &contents,
            vk::BufferUsageFlags::TRANSFER_SRC.as_raw(),
        );

        let (command_buffer, command_pool) = self.begin_scratch_commands(queue);

        let (old_family, new_family) = match old_family_index {
            Some(old) => (old, queue.family),
            None => (0, 0),
        };

        let all_access = full_access_mask();

        self.alloc_read(&BufferMemoryBarrier {
            src_access_mask: all_access,
            dst_access_mask: all_access,
            src_queue_family_index: old_family,
            dst_queue_family_index: new_family,
            buffer: scratch_buffer,
            offset: 0,
            size: contents.len() as u64,
        });
        self.emit(Command::CmdPipelineBarrier {
            command_buffer,
            src_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dst_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dependency_flags: 0,
            memory_barriers: vec![],
            buffer_memory_barriers: vec![BufferMemoryBarrier {
                src_access_mask: all_access,
                dst_access_mask: all_access,
                src_queue_family_index: old_family,
                dst_queue_family_index: new_family,
                buffer: scratch_buffer,
                offset: 0,
                size: contents.len() as u64,
            }],
            image_memory_barriers: vec![],
        });

        self.alloc_read(&copies);
        self.emit(Command::CmdCopyBuffer {
            command_buffer,
            src: scratch_buffer,
            dst: buffer.handle,
            regions: copies,
        });

        self.alloc_read(&BufferMemoryBarrier {
            src_access_mask: all_access,
            dst_access_mask: all_access,
            src_queue_family_index: 0,
            dst_queue_family_index: 0,
            buffer: buffer.handle,
            offset: 0,
            size: contents.len() as u64,
        });
        self.emit(Command::CmdPipelineBarrier {
            command_buffer,
            src_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dst_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dependency_flags: 0,
            memory_barriers: vec![],
            buffer_memory_barriers: vec![BufferMemoryBarrier {
                src_access_mask: all_access,
                dst_access_mask: all_access,
                src_queue_family_index: 0,
                dst_queue_family_index: 0,
                buffer: buffer.handle,
                offset: 0,
                size: contents.len() as u64,
            }],
            image_memory_barriers: vec![],
        });

        self.end_submit_and_destroy(queue, command_buffer, command_pool);
        self.free_scratch_buffer(device, scratch_buffer, scratch_memory);
    }

    /// Skipped when the backing buffer was never recreated.
    pub(crate) fn create_buffer_view(&mut self, view: &BufferViewRecord) {
        if !self.mirror().contains_buffer(view.buffer) {
            return;
        }

        let info = BufferViewCreateInfo {
            buffer: view.buffer,
            format: view.format,
            offset: view.offset,
            range: view.range,
        };
        self.alloc_read(&info);
        self.alloc_write(&view.handle);
        self.emit(Command::CreateBufferView {
            device: view.device,
            info,
            view: view.handle,
        });
    }
}

/// Every access bit at or below MEMORY_WRITE.
pub(crate) fn full_access_mask() -> u32 {
    let top = vk::AccessFlags::MEMORY_WRITE.as_raw();
    (top - 1) | top
}
