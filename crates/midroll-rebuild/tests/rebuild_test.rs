//! Integration test: whole-snapshot rebuilds.
//!
//! Builds snapshots in memory, runs the rebuilder, and checks the emitted
//! command stream against the expected call sequences.
//!
//! Run with: cargo test --test rebuild_test -- --nocapture

use ash::vk;

use midroll_core::RangeList;
use midroll_protocol::commands::*;
use midroll_protocol::handle::*;
use midroll_protocol::Command;
use midroll_rebuild::{rebuild, RebuildOptions, RebuildOutput};
use midroll_state::snapshot::*;

const INSTANCE: InstanceHandle = InstanceHandle(1);
const PHYSICAL_DEVICE: PhysicalDeviceHandle = PhysicalDeviceHandle(2);
const DEVICE: DeviceHandle = DeviceHandle(3);
const QUEUE: QueueHandle = QueueHandle(4);

/// One instance, one physical device with a single graphics+sparse queue
/// family and host-visible memory, one device, one queue.
fn base_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::new();

    snapshot.instances.insert(
        INSTANCE,
        InstanceRecord {
            handle: INSTANCE,
            enabled_layers: vec![],
            enabled_extensions: vec![],
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
            enabled_layers: vec![],
            enabled_extensions: vec![],
            enabled_features: None,
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

const BASE_SEQUENCE: &[&str] = &[
    "CreateInstance",
    "EnumeratePhysicalDevices",
    "EnumeratePhysicalDevices",
    "GetPhysicalDeviceProperties",
    "GetPhysicalDeviceMemoryProperties",
    "GetPhysicalDeviceQueueFamilyProperties",
    "GetPhysicalDeviceQueueFamilyProperties",
    "CreateDevice",
    "GetDeviceQueue",
];

#[test]
fn test_empty_snapshot() {
    let output = run(&Snapshot::new());
    assert!(output.commands.is_empty());
    assert!(output.memory_intervals.is_empty());
}

#[test]
fn test_instance_device_queue_sequence() {
    let output = run(&base_snapshot());
    assert_eq!(names(&output), BASE_SEQUENCE);

    let create_device = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CreateDevice {
                queue_create_infos, ..
            } => Some(queue_create_infos.clone()),
            _ => None,
        })
        .expect("no CreateDevice in stream");
    assert_eq!(
        create_device,
        vec![DeviceQueueCreateInfo {
            queue_family_index: 0,
            queue_count: 1,
            queue_priorities: vec![1.0],
        }]
    );

    match output.commands.last().map(|r| &r.command) {
        Some(Command::GetDeviceQueue {
            queue_family_index: 0,
            queue_index: 0,
            queue,
            ..
        }) => assert_eq!(*queue, QUEUE),
        other => panic!("expected GetDeviceQueue, got {:?}", other),
    }
}

#[test]
fn test_device_queue_priorities_sized_to_max_index() {
    let mut snapshot = base_snapshot();
    // A second queue at index 2 of the same family; the priority array
    // must grow to index+1 with gaps left at zero.
    snapshot.queues.insert(
        QueueHandle(5),
        QueueRecord {
            handle: QueueHandle(5),
            device: DEVICE,
            family: 0,
            index: 2,
            priority: 0.5,
        },
    );

    let output = run(&snapshot);
    let infos = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::CreateDevice {
                queue_create_infos, ..
            } => Some(queue_create_infos.clone()),
            _ => None,
        })
        .expect("no CreateDevice in stream");
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].queue_count, 2);
    assert_eq!(infos[0].queue_priorities, vec![1.0, 0.0, 0.5]);
}

#[test]
fn test_signalled_semaphore_submits() {
    let mut snapshot = base_snapshot();
    let sem = SemaphoreHandle(10);
    snapshot.semaphores.insert(
        sem,
        SemaphoreRecord {
            handle: sem,
            device: DEVICE,
            signaled: true,
            last_queue: QueueHandle::NULL,
        },
    );

    let output = run(&snapshot);
    let tail: Vec<_> = names(&output)[BASE_SEQUENCE.len()..].to_vec();
    assert_eq!(tail, vec!["CreateSemaphore", "QueueSubmit"]);

    match &output.commands.last().unwrap().command {
        Command::QueueSubmit { queue, submits, .. } => {
            assert_eq!(*queue, QUEUE);
            assert_eq!(submits.len(), 1);
            assert_eq!(submits[0].signal_semaphores, vec![sem]);
            assert!(submits[0].command_buffers.is_empty());
        }
        other => panic!("expected QueueSubmit, got {:?}", other),
    }
}

#[test]
fn test_unsignalled_semaphore_does_not_submit() {
    let mut snapshot = base_snapshot();
    let sem = SemaphoreHandle(10);
    snapshot.semaphores.insert(
        sem,
        SemaphoreRecord {
            handle: sem,
            device: DEVICE,
            signaled: false,
            last_queue: QueueHandle::NULL,
        },
    );

    let output = run(&snapshot);
    assert_eq!(names(&output).last(), Some(&"CreateSemaphore"));
}

#[test]
fn test_signalled_event_is_set() {
    let mut snapshot = base_snapshot();
    let event = EventHandle(11);
    snapshot.events.insert(
        event,
        EventRecord {
            handle: event,
            device: DEVICE,
            signaled: true,
        },
    );

    let output = run(&snapshot);
    let tail: Vec<_> = names(&output)[BASE_SEQUENCE.len()..].to_vec();
    assert_eq!(tail, vec!["CreateEvent", "SetEvent"]);
}

#[test]
fn test_fence_preserves_signaled_flag() {
    let mut snapshot = base_snapshot();
    snapshot.fences.insert(
        FenceHandle(12),
        FenceRecord {
            handle: FenceHandle(12),
            device: DEVICE,
            signaled: true,
        },
    );

    let output = run(&snapshot);
    match &output.commands.last().unwrap().command {
        Command::CreateFence { signaled, .. } => assert!(*signaled),
        other => panic!("expected CreateFence, got {:?}", other),
    }
}

fn shader_module(handle: u64) -> ShaderModuleRecord {
    ShaderModuleRecord {
        handle: ShaderModuleHandle(handle),
        device: DEVICE,
        words: vec![0x0723_0203, 0, 0, 0],
    }
}

fn pipeline_layout(handle: u64) -> PipelineLayoutRecord {
    PipelineLayoutRecord {
        handle: PipelineLayoutHandle(handle),
        device: DEVICE,
        set_layouts: vec![],
        push_constant_ranges: Default::default(),
    }
}

fn compute_pipeline(handle: u64, module: ShaderModuleRecord, layout: PipelineLayoutRecord) -> ComputePipelineRecord {
    ComputePipelineRecord {
        handle: PipelineHandle(handle),
        device: DEVICE,
        cache: None,
        flags: 0,
        stage: ShaderStageRecord {
            stage: vk::ShaderStageFlags::COMPUTE.as_raw(),
            module,
            entry_point: "main".to_string(),
            specialization: None,
        },
        layout,
        base_pipeline: PipelineHandle::NULL,
    }
}

#[test]
fn test_destroyed_shader_module_is_recreated_temporarily() {
    let mut snapshot = base_snapshot();
    let layout = pipeline_layout(20);
    snapshot
        .pipeline_layouts
        .insert(layout.handle, layout.clone());
    // The module is referenced by the pipeline but absent from the
    // snapshot's shader modules: it was destroyed before capture.
    let pipeline = compute_pipeline(21, shader_module(22), layout);
    snapshot.compute_pipelines.insert(pipeline.handle, pipeline);

    let output = run(&snapshot);
    let tail: Vec<_> = names(&output)[BASE_SEQUENCE.len()..].to_vec();
    assert_eq!(
        tail,
        vec![
            "CreatePipelineLayout",
            "CreateShaderModule",
            "CreateComputePipelines",
            "DestroyShaderModule",
        ]
    );
}

#[test]
fn test_present_shader_module_is_not_destroyed() {
    let mut snapshot = base_snapshot();
    let module = shader_module(22);
    snapshot.shader_modules.insert(module.handle, module.clone());
    let layout = pipeline_layout(20);
    snapshot
        .pipeline_layouts
        .insert(layout.handle, layout.clone());
    let pipeline = compute_pipeline(21, module, layout);
    snapshot.compute_pipelines.insert(pipeline.handle, pipeline);

    let output = run(&snapshot);
    let all = names(&output);
    assert!(!all.contains(&"DestroyShaderModule"));
    assert!(!all.contains(&"DestroyPipelineLayout"));
}

fn graphics_pipeline(
    handle: u64,
    base: u64,
    module: ShaderModuleRecord,
    layout: PipelineLayoutRecord,
    render_pass: RenderPassRecord,
) -> GraphicsPipelineRecord {
    let mut stages = std::collections::BTreeMap::new();
    stages.insert(
        0,
        ShaderStageRecord {
            stage: vk::ShaderStageFlags::VERTEX.as_raw(),
            module,
            entry_point: "main".to_string(),
            specialization: None,
        },
    );
    GraphicsPipelineRecord {
        handle: PipelineHandle(handle),
        device: DEVICE,
        base_pipeline: PipelineHandle(base),
        stages,
        layout,
        render_pass,
        ..Default::default()
    }
}

#[test]
fn test_pipeline_base_cycle_falls_back_to_unparented() {
    let mut snapshot = base_snapshot();
    let module = shader_module(22);
    snapshot.shader_modules.insert(module.handle, module.clone());
    let layout = pipeline_layout(20);
    snapshot
        .pipeline_layouts
        .insert(layout.handle, layout.clone());
    let render_pass = RenderPassRecord {
        handle: RenderPassHandle(23),
        device: DEVICE,
        ..Default::default()
    };
    snapshot
        .render_passes
        .insert(render_pass.handle, render_pass.clone());

    let a = graphics_pipeline(30, 31, module.clone(), layout.clone(), render_pass.clone());
    let b = graphics_pipeline(31, 30, module, layout, render_pass);
    snapshot.graphics_pipelines.insert(a.handle, a);
    snapshot.graphics_pipelines.insert(b.handle, b);

    let output = run(&snapshot);
    let pipelines: Vec<_> = output
        .commands
        .iter()
        .filter_map(|r| match &r.command {
            Command::CreateGraphicsPipelines {
                create_info,
                pipeline,
                ..
            } => Some((*pipeline, create_info.base_pipeline)),
            _ => None,
        })
        .collect();
    assert_eq!(pipelines.len(), 2);
    for (_, base) in &pipelines {
        assert_eq!(*base, PipelineHandle::NULL);
    }
    let emitted: std::collections::BTreeSet<u64> =
        pipelines.iter().map(|(p, _)| p.raw()).collect();
    assert_eq!(emitted, [30u64, 31].into_iter().collect());
}

#[test]
fn test_derivative_pipeline_keeps_base() {
    let mut snapshot = base_snapshot();
    let module = shader_module(22);
    snapshot.shader_modules.insert(module.handle, module.clone());
    let layout = pipeline_layout(20);
    snapshot
        .pipeline_layouts
        .insert(layout.handle, layout.clone());
    let render_pass = RenderPassRecord {
        handle: RenderPassHandle(23),
        device: DEVICE,
        ..Default::default()
    };
    snapshot
        .render_passes
        .insert(render_pass.handle, render_pass.clone());

    // Key order puts the derivative (30) before its base (31); the
    // schedule must still emit the base first.
    let derivative = graphics_pipeline(30, 31, module.clone(), layout.clone(), render_pass.clone());
    let base = graphics_pipeline(31, 0, module, layout, render_pass);
    snapshot.graphics_pipelines.insert(derivative.handle, derivative);
    snapshot.graphics_pipelines.insert(base.handle, base);

    let output = run(&snapshot);
    let pipelines: Vec<_> = output
        .commands
        .iter()
        .filter_map(|r| match &r.command {
            Command::CreateGraphicsPipelines {
                create_info,
                pipeline,
                ..
            } => Some((pipeline.raw(), create_info.base_pipeline.raw())),
            _ => None,
        })
        .collect();
    assert_eq!(pipelines, vec![(31, 0), (30, 31)]);
}

#[test]
fn test_descriptor_set_skips_missing_references() {
    let mut snapshot = base_snapshot();

    let buffer = BufferHandle(40);
    snapshot.buffers.insert(
        buffer,
        BufferRecord {
            handle: buffer,
            device: DEVICE,
            info: BufferCreateInfo {
                size: 16,
                usage: vk::BufferUsageFlags::UNIFORM_BUFFER.as_raw(),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    let layout = DescriptorSetLayoutHandle(41);
    snapshot.descriptor_set_layouts.insert(
        layout,
        DescriptorSetLayoutRecord {
            handle: layout,
            device: DEVICE,
            bindings: Default::default(),
        },
    );
    let pool = DescriptorPoolHandle(42);
    snapshot.descriptor_pools.insert(
        pool,
        DescriptorPoolRecord {
            handle: pool,
            device: DEVICE,
            flags: 0,
            max_sets: 1,
            sizes: Default::default(),
        },
    );

    let mut bindings = std::collections::BTreeMap::new();
    bindings.insert(
        0,
        DescriptorBindingRecord {
            descriptor_type: DescriptorType::UniformBuffer,
            image_bindings: vec![],
            buffer_bindings: vec![
                DescriptorBufferInfo {
                    buffer,
                    offset: 0,
                    range: 16,
                },
                // Not in the snapshot; the slot must stay empty.
                DescriptorBufferInfo {
                    buffer: BufferHandle(99),
                    offset: 0,
                    range: 16,
                },
            ],
            buffer_view_bindings: vec![],
        },
    );
    snapshot.descriptor_sets.insert(
        DescriptorSetHandle(43),
        DescriptorSetRecord {
            handle: DescriptorSetHandle(43),
            device: DEVICE,
            pool,
            layout,
            bindings,
        },
    );

    let output = run(&snapshot);
    let writes = output
        .commands
        .iter()
        .find_map(|r| match &r.command {
            Command::UpdateDescriptorSets { writes, .. } => Some(writes.clone()),
            _ => None,
        })
        .expect("no UpdateDescriptorSets in stream");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].dst_array_element, 0);
    assert_eq!(writes[0].buffer_infos[0].buffer, buffer);
}

#[test]
fn test_command_buffer_truncated_on_bad_reference() {
    let mut snapshot = base_snapshot();
    let pool = CommandPoolHandle(50);
    snapshot.command_pools.insert(
        pool,
        CommandPoolRecord {
            handle: pool,
            device: DEVICE,
            flags: 0,
            queue_family_index: 0,
        },
    );
    snapshot.command_buffers.insert(
        CommandBufferHandle(51),
        CommandBufferRecord {
            handle: CommandBufferHandle(51),
            device: DEVICE,
            pool,
            level: CommandBufferLevel::Primary,
            recording: RecordingState::Completed,
            begin_info: Default::default(),
            commands: vec![
                RecordedCommand::Dispatch {
                    group_count_x: 1,
                    group_count_y: 1,
                    group_count_z: 1,
                },
                // References a pipeline that never existed: replay for
                // this buffer stops here and End is not emitted.
                RecordedCommand::BindPipeline {
                    pipeline_bind_point: 1,
                    pipeline: PipelineHandle(99),
                },
                RecordedCommand::Dispatch {
                    group_count_x: 2,
                    group_count_y: 2,
                    group_count_z: 2,
                },
            ],
        },
    );

    let output = run(&snapshot);
    let tail: Vec<_> = names(&output)[BASE_SEQUENCE.len()..].to_vec();
    assert_eq!(
        tail,
        vec![
            "CreateCommandPool",
            "AllocateCommandBuffers",
            "BeginCommandBuffer",
            "CmdDispatch",
        ]
    );
}

#[test]
fn test_completed_command_buffer_is_ended() {
    let mut snapshot = base_snapshot();
    let pool = CommandPoolHandle(50);
    snapshot.command_pools.insert(
        pool,
        CommandPoolRecord {
            handle: pool,
            device: DEVICE,
            flags: 0,
            queue_family_index: 0,
        },
    );
    snapshot.command_buffers.insert(
        CommandBufferHandle(51),
        CommandBufferRecord {
            handle: CommandBufferHandle(51),
            device: DEVICE,
            pool,
            level: CommandBufferLevel::Primary,
            recording: RecordingState::Completed,
            begin_info: Default::default(),
            commands: vec![RecordedCommand::Dispatch {
                group_count_x: 1,
                group_count_y: 1,
                group_count_z: 1,
            }],
        },
    );

    let output = run(&snapshot);
    let tail: Vec<_> = names(&output)[BASE_SEQUENCE.len()..].to_vec();
    assert_eq!(
        tail,
        vec![
            "CreateCommandPool",
            "AllocateCommandBuffers",
            "BeginCommandBuffer",
            "CmdDispatch",
            "EndCommandBuffer",
        ]
    );
}

#[test]
fn test_secondary_buffers_precede_primaries() {
    let mut snapshot = base_snapshot();
    let pool = CommandPoolHandle(50);
    snapshot.command_pools.insert(
        pool,
        CommandPoolRecord {
            handle: pool,
            device: DEVICE,
            flags: 0,
            queue_family_index: 0,
        },
    );
    // Key order puts the primary first; emission order must not.
    let secondary = CommandBufferHandle(52);
    snapshot.command_buffers.insert(
        CommandBufferHandle(51),
        CommandBufferRecord {
            handle: CommandBufferHandle(51),
            device: DEVICE,
            pool,
            level: CommandBufferLevel::Primary,
            recording: RecordingState::Completed,
            begin_info: Default::default(),
            commands: vec![RecordedCommand::ExecuteCommands {
                command_buffers: vec![secondary],
            }],
        },
    );
    snapshot.command_buffers.insert(
        secondary,
        CommandBufferRecord {
            handle: secondary,
            device: DEVICE,
            pool,
            level: CommandBufferLevel::Secondary,
            recording: RecordingState::Completed,
            begin_info: Default::default(),
            commands: vec![],
        },
    );

    let output = run(&snapshot);
    let allocs: Vec<_> = output
        .commands
        .iter()
        .filter_map(|r| match &r.command {
            Command::AllocateCommandBuffers {
                level,
                command_buffers,
                ..
            } => Some((*level, command_buffers[0])),
            _ => None,
        })
        .collect();
    assert_eq!(
        allocs,
        vec![
            (CommandBufferLevel::Secondary, secondary),
            (CommandBufferLevel::Primary, CommandBufferHandle(51)),
        ]
    );
    // The ExecuteCommands reference resolves because the secondary was
    // already recreated.
    assert!(names(&output).contains(&"CmdExecuteCommands"));
}

#[test]
fn test_rebuild_is_deterministic() {
    let mut snapshot = base_snapshot();
    snapshot.semaphores.insert(
        SemaphoreHandle(10),
        SemaphoreRecord {
            handle: SemaphoreHandle(10),
            device: DEVICE,
            signaled: true,
            last_queue: QUEUE,
        },
    );
    snapshot.device_memories.insert(
        DeviceMemoryHandle(13),
        DeviceMemoryRecord {
            handle: DeviceMemoryHandle(13),
            device: DEVICE,
            allocation_size: 64,
            memory_type_index: 0,
            data: vec![0xAB; 64],
            ..Default::default()
        },
    );

    let a = run(&snapshot);
    let b = run(&snapshot);
    assert_eq!(a.commands, b.commands);
    assert_eq!(a.memory_intervals, b.memory_intervals);
}

#[test]
fn test_memory_intervals_equal_union_of_observations() {
    let mut snapshot = base_snapshot();
    snapshot.device_memories.insert(
        DeviceMemoryHandle(13),
        DeviceMemoryRecord {
            handle: DeviceMemoryHandle(13),
            device: DEVICE,
            allocation_size: 64,
            memory_type_index: 0,
            data: vec![0u8; 64],
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let mut union = RangeList::new();
    for record in &output.commands {
        for obs in record.reads.iter().chain(record.writes.iter()) {
            union.merge(obs.range);
        }
    }
    assert_eq!(union, output.memory_intervals);
}

#[test]
fn test_mapped_memory_is_remapped() {
    let mut snapshot = base_snapshot();
    snapshot.device_memories.insert(
        DeviceMemoryHandle(13),
        DeviceMemoryRecord {
            handle: DeviceMemoryHandle(13),
            device: DEVICE,
            allocation_size: 64,
            memory_type_index: 0,
            mapped_location: 0x7f00_0000_1000,
            mapped_offset: 0,
            mapped_size: 64,
            data: vec![0u8; 64],
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let tail: Vec<_> = names(&output)[BASE_SEQUENCE.len()..].to_vec();
    assert_eq!(tail, vec!["AllocateMemory", "MapMemory"]);
    match &output.commands.last().unwrap().command {
        Command::MapMemory {
            mapped_location, ..
        } => assert_eq!(*mapped_location, 0x7f00_0000_1000),
        other => panic!("expected MapMemory, got {:?}", other),
    }
}

#[test]
fn test_query_pool_replays_active_slots() {
    let mut snapshot = base_snapshot();
    snapshot.query_pools.insert(
        QueryPoolHandle(60),
        QueryPoolRecord {
            handle: QueryPoolHandle(60),
            device: DEVICE,
            query_type: 0,
            query_count: 3,
            pipeline_statistics: 0,
            status: vec![
                QueryStatus::Inactive,
                QueryStatus::Active,
                QueryStatus::Complete,
            ],
        },
    );

    let output = run(&snapshot);
    let queries: Vec<_> = output
        .commands
        .iter()
        .filter_map(|r| match &r.command {
            Command::CmdBeginQuery { query, .. } => Some(("begin", *query)),
            Command::CmdEndQuery { query, .. } => Some(("end", *query)),
            _ => None,
        })
        .collect();
    assert_eq!(queries, vec![("begin", 1), ("begin", 2), ("end", 2)]);
    assert!(names(&output).contains(&"QueueWaitIdle"));
}

#[test]
fn test_dedicated_memory_is_deferred_to_its_buffer() {
    let mut snapshot = base_snapshot();
    let memory = DeviceMemoryHandle(13);
    snapshot.device_memories.insert(
        memory,
        DeviceMemoryRecord {
            handle: memory,
            device: DEVICE,
            allocation_size: 64,
            memory_type_index: 0,
            dedicated_allocation_nv: Some(DedicatedAllocationMemoryAllocateInfoNv {
                image: ImageHandle::NULL,
                buffer: BufferHandle(40),
            }),
            data: vec![0u8; 64],
            ..Default::default()
        },
    );
    snapshot.buffers.insert(
        BufferHandle(40),
        BufferRecord {
            handle: BufferHandle(40),
            device: DEVICE,
            info: BufferCreateInfo {
                size: 64,
                usage: vk::BufferUsageFlags::TRANSFER_DST.as_raw(),
                dedicated_allocation_nv: Some(true),
                ..Default::default()
            },
            memory: Some(memory),
            memory_offset: 0,
            last_bound_queue: Some(QUEUE),
            ..Default::default()
        },
    );

    let output = run(&snapshot);
    let all = names(&output);
    // The dedicated allocation is not emitted in the memory pass; it
    // appears after its buffer's creation.
    let create_buffer = all.iter().position(|&n| n == "CreateBuffer").unwrap();
    let allocate = all.iter().position(|&n| n == "AllocateMemory").unwrap();
    assert!(allocate > create_buffer);
}
