//! Integration test: buffer and image content priming.
//!
//! Checks the staging-buffer upload sequences, the copy regions, and the
//! payload observations carried by the flush.
//!
//! Run with: cargo test --test priming_test -- --nocapture

use ash::vk;

use midroll_protocol::commands::*;
use midroll_protocol::handle::*;
use midroll_protocol::Command;
use midroll_rebuild::{rebuild, RebuildOptions, RebuildOutput};
use midroll_state::snapshot::*;

const INSTANCE: InstanceHandle = InstanceHandle(1);
const PHYSICAL_DEVICE: PhysicalDeviceHandle = PhysicalDeviceHandle(2);
const DEVICE: DeviceHandle = DeviceHandle(3);
const QUEUE: QueueHandle = QueueHandle(4);
const MEMORY: DeviceMemoryHandle = DeviceMemoryHandle(5);

fn base_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.instances.insert(
        INSTANCE,
        InstanceRecord {
            handle: INSTANCE,
            ..Default::default()
        },
    );
    let mut pd = PhysicalDeviceRecord {
        handle: PHYSICAL_DEVICE,
        instance: INSTANCE,
        ..Default::default()
    };
    pd.memory_properties.memory_types.push(MemoryType {
        property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw()
            | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
        heap_index: 0,
    });
    pd.memory_properties.memory_heaps.push(MemoryHeap {
        size: 1 << 30,
        flags: 0,
    });
    pd.queue_family_properties.insert(
        0,
        QueueFamilyProperties {
            queue_flags: vk::QueueFlags::GRAPHICS.as_raw()
                | vk::QueueFlags::TRANSFER.as_raw()
                | vk::QueueFlags::SPARSE_BINDING.as_raw(),
            queue_count: 1,
            timestamp_valid_bits: 64,
            min_image_transfer_granularity: [1, 1, 1],
        },
    );
    snapshot.physical_devices.insert(PHYSICAL_DEVICE, pd);
    snapshot.devices.insert(
        DEVICE,
        DeviceRecord {
            handle: DEVICE,
            physical_device: PHYSICAL_DEVICE,
            ..Default::default()
        },
    );
    snapshot.queues.insert(
        QUEUE,
        QueueRecord {
            handle: QUEUE,
            device: DEVICE,
            family: 0,
            index: 0,
            priority: 1.0,
        },
    );
    snapshot
}

fn run(snapshot: &Snapshot) -> RebuildOutput {
    rebuild(snapshot, &RebuildOptions::default())
}

fn names(output: &RebuildOutput) -> Vec<&'static str> {
    output.commands.iter().map(|r| r.command.name()).collect()
}

fn with_memory(snapshot: &mut Snapshot, data: Vec<u8>) {
    snapshot.device_memories.insert(
        MEMORY,
        DeviceMemoryRecord {
            handle: MEMORY,
            device: DEVICE,
            allocation_size: data.len() as u64,
            memory_type_index: 0,
            data,
            ..Default::default()
        },
    );
}

#[test]
fn test_dense_buffer_priming_sequence() {
    let mut snapshot = base_snapshot();
    let pattern: Vec<u8> = (0u8..0x40).collect();
    with_memory(&mut snapshot, pattern.clone());

    let buffer = BufferHandle(6);
    snapshot.buffers.insert(
        buffer,
        BufferRecord {
            handle: buffer,
            device: DEVICE,
            info: BufferCreateInfo {
                size: 64,
                usage: vk::BufferUsageFlags::TRANSFER_DST.as_raw(),
                ..Default::default()
            },
            memory: Some(MEMORY),
            memory_offset: 0,
            last_bound_queue: Some(QUEUE),
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let all = names(&output);
    let start = all.iter().position(|&n| n == "CreateBuffer").unwrap();
    assert_eq!(
        &all[start..],
        &[
            "CreateBuffer",
            "GetBufferMemoryRequirements",
            "BindBufferMemory",
            "CreateBuffer",
            "AllocateMemory",
            "BindBufferMemory",
            "MapMemory",
            "FlushMappedMemoryRanges",
            "UnmapMemory",
            "CreateCommandPool",
            "AllocateCommandBuffers",
            "BeginCommandBuffer",
            "CmdPipelineBarrier",
            "CmdCopyBuffer",
            "CmdPipelineBarrier",
            "EndCommandBuffer",
            "QueueSubmit",
            "QueueWaitIdle",
            "DestroyCommandPool",
            "DestroyBuffer",
            "FreeMemory",
        ]
    );

    // The target buffer usage gains TRANSFER_DST (already set here) and
    // the copy restores the full 64 bytes at offset zero.
    let copy = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CmdCopyBuffer { dst, regions, .. } => Some((*dst, regions.clone())),
            _ => None,
        })
        .expect("no CmdCopyBuffer in stream");
    assert_eq!(copy.0, buffer);
    assert_eq!(
        copy.1,
        vec![BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: 64,
        }]
    );

    // The flush carries the payload bytes as a read observation.
    let flush = output
        .commands
        .iter()
        .find(|r| matches!(r.command, Command::FlushMappedMemoryRanges { .. }))
        .expect("no FlushMappedMemoryRanges in stream");
    assert!(
        flush.reads.iter().any(|obs| obs.bytes == pattern),
        "flush does not carry the buffer payload"
    );

    // The map's pointer cell is both read and written.
    let map = output
        .commands
        .iter()
        .find(|r| matches!(r.command, Command::MapMemory { .. }))
        .expect("no MapMemory in stream");
    assert_eq!(map.reads.len(), 1);
    assert_eq!(map.writes.len(), 1);
    assert_eq!(map.reads[0].range, map.writes[0].range);
}

#[test]
fn test_unbound_buffer_is_created_but_not_primed() {
    let mut snapshot = base_snapshot();
    let buffer = BufferHandle(6);
    snapshot.buffers.insert(
        buffer,
        BufferRecord {
            handle: buffer,
            device: DEVICE,
            info: BufferCreateInfo {
                size: 64,
                usage: vk::BufferUsageFlags::TRANSFER_SRC.as_raw(),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let all = names(&output);
    assert!(all.contains(&"CreateBuffer"));
    assert!(all.contains(&"GetBufferMemoryRequirements"));
    assert!(!all.contains(&"BindBufferMemory"));
    assert!(!all.contains(&"CmdCopyBuffer"));
}

#[test]
fn test_sparse_buffer_binds_and_primes_when_fully_bound() {
    let mut snapshot = base_snapshot();
    with_memory(&mut snapshot, vec![0x11; 128]);

    let buffer = BufferHandle(6);
    let mut sparse_bindings = std::collections::BTreeMap::new();
    sparse_bindings.insert(
        0,
        SparseMemoryBind {
            resource_offset: 0,
            size: 64,
            memory: MEMORY,
            memory_offset: 0,
            flags: 0,
        },
    );
    sparse_bindings.insert(
        64,
        SparseMemoryBind {
            resource_offset: 64,
            size: 64,
            memory: MEMORY,
            memory_offset: 64,
            flags: 0,
        },
    );
    snapshot.buffers.insert(
        buffer,
        BufferRecord {
            handle: buffer,
            device: DEVICE,
            info: BufferCreateInfo {
                flags: vk::BufferCreateFlags::SPARSE_BINDING.as_raw(),
                size: 128,
                usage: vk::BufferUsageFlags::TRANSFER_DST.as_raw(),
                ..Default::default()
            },
            sparse_bindings,
            last_bound_queue: Some(QUEUE),
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let all = names(&output);
    assert!(all.contains(&"QueueBindSparse"));

    let regions = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CmdCopyBuffer { regions, .. } => Some(regions.clone()),
            _ => None,
        })
        .expect("no CmdCopyBuffer in stream");
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].dst_offset, 0);
    assert_eq!(regions[1].dst_offset, 64);
}

#[test]
fn test_sparse_buffer_with_gap_binds_without_priming() {
    let mut snapshot = base_snapshot();
    with_memory(&mut snapshot, vec![0x11; 128]);

    let buffer = BufferHandle(6);
    let mut sparse_bindings = std::collections::BTreeMap::new();
    sparse_bindings.insert(
        0,
        SparseMemoryBind {
            resource_offset: 0,
            size: 64,
            memory: MEMORY,
            memory_offset: 0,
            flags: 0,
        },
    );
    snapshot.buffers.insert(
        buffer,
        BufferRecord {
            handle: buffer,
            device: DEVICE,
            info: BufferCreateInfo {
                flags: vk::BufferCreateFlags::SPARSE_BINDING.as_raw(),
                size: 128,
                usage: vk::BufferUsageFlags::TRANSFER_DST.as_raw(),
                ..Default::default()
            },
            sparse_bindings,
            last_bound_queue: Some(QUEUE),
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    assert!(names(&output).contains(&"QueueBindSparse"));

    // Not resident and not fully bound: the copy still runs, with no
    // regions to transfer.
    let regions = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CmdCopyBuffer { regions, .. } => Some(regions.clone()),
            _ => None,
        })
        .expect("no CmdCopyBuffer in stream");
    assert!(regions.is_empty());
}

fn image_record(usage: u32, layout: i32) -> ImageRecord {
    let mut level_data = std::collections::BTreeMap::new();
    let mut layers = std::collections::BTreeMap::new();
    let mut levels = std::collections::BTreeMap::new();
    levels.insert(0u32, vec![0x5Au8; 16 * 16 * 4]);
    layers.insert(0u32, levels);
    level_data.insert(vk::ImageAspectFlags::COLOR.as_raw(), layers);

    ImageRecord {
        handle: ImageHandle(7),
        device: DEVICE,
        info: ImageCreateInfo {
            image_type: vk::ImageType::TYPE_2D.as_raw(),
            format: vk::Format::R8G8B8A8_UNORM.as_raw(),
            extent: [16, 16, 1],
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1.as_raw(),
            usage,
            initial_layout: vk::ImageLayout::UNDEFINED.as_raw(),
            ..Default::default()
        },
        layout,
        aspect: vk::ImageAspectFlags::COLOR.as_raw(),
        bound_memory: Some(MEMORY),
        bound_memory_offset: 0,
        last_bound_queue: Some(QUEUE),
        level_data,
        ..Default::default()
    }
}

#[test]
fn test_transfer_dst_image_is_primed_by_buffer_copy() {
    let mut snapshot = base_snapshot();
    with_memory(&mut snapshot, vec![0u8; 4096]);
    let img = image_record(
        vk::ImageUsageFlags::TRANSFER_DST.as_raw() | vk::ImageUsageFlags::SAMPLED.as_raw(),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL.as_raw(),
    );
    snapshot.images.insert(img.handle, img);

    let output = run(&snapshot);
    let all = names(&output);
    assert!(all.contains(&"CreateImage"));
    assert!(all.contains(&"BindImageMemory"));
    assert!(all.contains(&"CmdCopyBufferToImage"));

    let copy = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CmdCopyBufferToImage {
                dst_image, regions, ..
            } => Some((*dst_image, regions.clone())),
            _ => None,
        })
        .expect("no CmdCopyBufferToImage in stream");
    assert_eq!(copy.0, ImageHandle(7));
    assert_eq!(copy.1.len(), 1);
    assert_eq!(copy.1[0].image_extent, [16, 16, 1]);

    // The last barrier moves the image to its captured layout.
    let final_barrier = output
        .commands
        .iter()
        .rev()
        .find_map(|r| match &r.command {
            Command::CmdPipelineBarrier {
                image_memory_barriers,
                ..
            } if !image_memory_barriers.is_empty() => Some(image_memory_barriers[0].clone()),
            _ => None,
        })
        .expect("no image barrier in stream");
    assert_eq!(
        final_barrier.old_layout,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL.as_raw()
    );
    assert_eq!(
        final_barrier.new_layout,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL.as_raw()
    );
}

#[test]
fn test_undefined_layout_image_is_not_primed() {
    let mut snapshot = base_snapshot();
    with_memory(&mut snapshot, vec![0u8; 4096]);
    let img = image_record(
        vk::ImageUsageFlags::TRANSFER_DST.as_raw(),
        vk::ImageLayout::UNDEFINED.as_raw(),
    );
    snapshot.images.insert(img.handle, img);

    let output = run(&snapshot);
    let all = names(&output);
    assert!(all.contains(&"CreateImage"));
    assert!(all.contains(&"BindImageMemory"));
    assert!(!all.contains(&"CmdCopyBufferToImage"));
    assert!(!all.contains(&"CmdPipelineBarrier"));
}

#[test]
fn test_multisample_image_transitions_without_priming() {
    let mut snapshot = base_snapshot();
    with_memory(&mut snapshot, vec![0u8; 4096]);
    let mut img = image_record(
        vk::ImageUsageFlags::TRANSFER_DST.as_raw(),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL.as_raw(),
    );
    img.info.samples = vk::SampleCountFlags::TYPE_4.as_raw();
    snapshot.images.insert(img.handle, img);

    let output = run(&snapshot);
    let all = names(&output);
    assert!(!all.contains(&"CmdCopyBufferToImage"));
    assert!(all.contains(&"CmdPipelineBarrier"));

    let barrier = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CmdPipelineBarrier {
                image_memory_barriers,
                ..
            } if !image_memory_barriers.is_empty() => Some(image_memory_barriers[0].clone()),
            _ => None,
        })
        .expect("no image barrier in stream");
    assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED.as_raw());
    assert_eq!(
        barrier.new_layout,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL.as_raw()
    );
}

#[test]
fn test_swapchain_images_are_not_recreated_directly() {
    let mut snapshot = base_snapshot();
    with_memory(&mut snapshot, vec![0u8; 4096]);
    let mut img = image_record(
        vk::ImageUsageFlags::COLOR_ATTACHMENT.as_raw(),
        vk::ImageLayout::PRESENT_SRC_KHR.as_raw(),
    );
    img.is_swapchain_image = true;
    snapshot.images.insert(img.handle, img);

    let output = run(&snapshot);
    assert!(!names(&output).contains(&"CreateImage"));
}

#[test]
fn test_scratch_handles_avoid_snapshot_handles() {
    let mut snapshot = base_snapshot();
    let pattern: Vec<u8> = (0u8..0x40).collect();
    with_memory(&mut snapshot, pattern);

    let buffer = BufferHandle(6);
    snapshot.buffers.insert(
        buffer,
        BufferRecord {
            handle: buffer,
            device: DEVICE,
            info: BufferCreateInfo {
                size: 64,
                usage: vk::BufferUsageFlags::TRANSFER_DST.as_raw(),
                ..Default::default()
            },
            memory: Some(MEMORY),
            memory_offset: 0,
            last_bound_queue: Some(QUEUE),
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let mut scratch_buffers = Vec::new();
    for record in &output.commands {
        if let Command::CreateBuffer { buffer: b, .. } = &record.command {
            if *b != buffer {
                scratch_buffers.push(*b);
            }
        }
    }
    assert_eq!(scratch_buffers.len(), 1);
    assert!(!snapshot.buffers.contains_key(&scratch_buffers[0]));
    assert!(scratch_buffers[0].raw() >= RebuildOptions::default().synthetic_id_base);
}
