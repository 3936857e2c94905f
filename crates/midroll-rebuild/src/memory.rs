//! Device-memory recreation and the host-visible staging helpers used by
//! content priming.

use ash::vk;
use tracing::{error, warn};

use midroll_protocol::commands::*;
use midroll_protocol::handle::*;
use midroll_protocol::Command;
use midroll_state::snapshot::{DeviceMemoryRecord, DeviceRecord, PhysicalDeviceMemoryProperties};

use crate::writer::StreamBuilder;

/// Find the index of the memory type that satisfies the required property
/// flags, restricted to `type_bits`.
pub(crate) fn memory_type_index_for(
    type_bits: u32,
    props: &PhysicalDeviceMemoryProperties,
    flags: u32,
) -> Option<u32> {
    for (i, t) in props.memory_types.iter().enumerate() {
        if type_bits & (1u32 << i) == 0 {
            continue;
        }
        if t.property_flags & flags == flags {
            return Some(i as u32);
        }
    }
    None
}

impl<'a> StreamBuilder<'a> {
    /// Recreate a device memory. Dedicated NV allocations are skipped
    /// unless `allow_dedicated_nv` is set; those are emitted alongside
    /// the buffer or image that owns them.
    pub(crate) fn create_device_memory(
        &mut self,
        memory: &DeviceMemoryRecord,
        allow_dedicated_nv: bool,
    ) {
        if !allow_dedicated_nv && memory.dedicated_allocation_nv.is_some() {
            return;
        }

        if let Some(dedicated) = &memory.dedicated_allocation_nv {
            self.alloc_read(dedicated);
        }
        self.alloc_read(&(memory.allocation_size, memory.memory_type_index));
        self.alloc_write(&memory.handle);
        self.emit(Command::AllocateMemory {
            device: memory.device,
            allocation_size: memory.allocation_size,
            memory_type_index: memory.memory_type_index,
            dedicated: memory.dedicated_allocation_nv.clone(),
            memory: memory.handle,
        });

        if memory.mapped_location != 0 {
            self.alloc_write(&memory.mapped_location);
            self.emit(Command::MapMemory {
                device: memory.device,
                memory: memory.handle,
                offset: memory.mapped_offset,
                size: memory.mapped_size,
                flags: 0,
                mapped_location: memory.mapped_location,
            });
        }
    }

    /// Diagnostic for a dedicated pair where one side is missing its NV
    /// dedicated-allocation info. The stream proceeds regardless.
    pub(crate) fn expect_nv_dedicated(&self, kind: &str, handle: u64) {
        warn!(
            "expected dedicated allocation info on {} {:#x}, continuing without it",
            kind, handle
        );
    }

    /// Memory type index for host-visible staging allocations on `device`.
    pub(crate) fn scratch_buffer_memory_index(&self, device: &DeviceRecord) -> u32 {
        let Some(pd) = self
            .snapshot()
            .physical_devices
            .get(&device.physical_device)
        else {
            error!(
                "device {:#x} has no physical device, falling back to memory type 0",
                device.handle.raw()
            );
            return 0;
        };

        let type_count = pd.memory_properties.memory_types.len() as u64;
        let mut type_bits = ((1u64 << type_count) - 1) as u32;
        if let Some(req) = self
            .snapshot()
            .transfer_buffer_memory_requirements
            .get(&device.handle)
        {
            type_bits = req.memory_type_bits;
        }
        match memory_type_index_for(
            type_bits,
            &pd.memory_properties,
            vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw(),
        ) {
            Some(i) => i,
            None => {
                error!(
                    "cannot get the memory type index for host visible memory to create \
                     scratch buffer, fallback to use index 0"
                );
                0
            }
        }
    }

    /// Create a host-visible staging buffer filled with `data`:
    /// create + allocate + bind, then map / flush / unmap carrying the
    /// payload as observations.
    pub(crate) fn alloc_and_fill_scratch_buffer(
        &mut self,
        device: &DeviceRecord,
        data: &[u8],
        extra_usages: u32,
    ) -> (BufferHandle, DeviceMemoryHandle) {
        let snap = self.snapshot();
        let buffer =
            BufferHandle(self.unused_id(|x| snap.buffers.contains_key(&BufferHandle(x))));
        let memory = DeviceMemoryHandle(
            self.unused_id(|x| snap.device_memories.contains_key(&DeviceMemoryHandle(x))),
        );

        let size = data.len() as u64;
        let info = BufferCreateInfo {
            flags: 0,
            size,
            usage: vk::BufferUsageFlags::TRANSFER_SRC.as_raw() | extra_usages,
            sharing_mode: vk::SharingMode::EXCLUSIVE.as_raw() as u32,
            queue_family_indices: vec![],
            dedicated_allocation_nv: None,
        };
        self.alloc_read(&info);
        self.alloc_write(&buffer);
        self.emit(Command::CreateBuffer {
            device: device.handle,
            info,
            buffer,
        });

        let memory_type_index = self.scratch_buffer_memory_index(device);

        // The driver may ask for more than the payload; overallocate by a
        // factor of two and align to 0x100 to keep validation layers happy.
        let alloc_size = (size * 2 + 255) & !255u64;

        self.alloc_read(&(alloc_size, memory_type_index));
        self.alloc_write(&memory);
        self.emit(Command::AllocateMemory {
            device: device.handle,
            allocation_size: alloc_size,
            memory_type_index,
            dedicated: None,
            memory,
        });

        self.emit(Command::BindBufferMemory {
            device: device.handle,
            buffer,
            memory,
            memory_offset: 0,
        });

        let payload = self.alloc_raw_bytes(data.to_vec());
        let mapped_location = payload.ptr;

        self.alloc_read_write(&mapped_location);
        self.emit(Command::MapMemory {
            device: device.handle,
            memory,
            offset: 0,
            size,
            flags: 0,
            mapped_location,
        });

        let range = MappedMemoryRange {
            memory,
            offset: 0,
            size,
        };
        self.alloc_read(&range);
        self.stage_read(payload);
        self.emit(Command::FlushMappedMemoryRanges {
            device: device.handle,
            ranges: vec![range],
        });

        self.emit(Command::UnmapMemory {
            device: device.handle,
            memory,
        });

        (buffer, memory)
    }

    pub(crate) fn free_scratch_buffer(
        &mut self,
        device: &DeviceRecord,
        buffer: BufferHandle,
        memory: DeviceMemoryHandle,
    ) {
        self.emit(Command::DestroyBuffer {
            device: device.handle,
            buffer,
        });
        self.emit(Command::FreeMemory {
            device: device.handle,
            memory,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midroll_protocol::commands::MemoryType;

    fn props(flags: &[u32]) -> PhysicalDeviceMemoryProperties {
        PhysicalDeviceMemoryProperties {
            memory_types: flags
                .iter()
                .map(|&property_flags| MemoryType {
                    property_flags,
                    heap_index: 0,
                })
                .collect(),
            memory_heaps: vec![],
        }
    }

    #[test]
    fn picks_first_matching_type() {
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw();
        let device_local = vk::MemoryPropertyFlags::DEVICE_LOCAL.as_raw();
        let p = props(&[device_local, host | device_local, host]);
        assert_eq!(memory_type_index_for(0b111, &p, host), Some(1));
    }

    #[test]
    fn respects_type_bits() {
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw();
        let p = props(&[host, host]);
        assert_eq!(memory_type_index_for(0b10, &p, host), Some(1));
    }

    #[test]
    fn no_match_is_none() {
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw();
        let p = props(&[vk::MemoryPropertyFlags::DEVICE_LOCAL.as_raw()]);
        assert_eq!(memory_type_index_for(0b1, &p, host), None);
    }
}
