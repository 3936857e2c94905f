//! Rebuilds a captured Vulkan driver state into an ordered stream of
//! synthetic API calls whose replay reconstructs an equivalent state in a
//! fresh driver.
//!
//! The rebuild is a single sequential pass: object kinds are emitted in a
//! fixed dependency order, and within each kind the snapshot's key order
//! is followed, so rebuilding the same snapshot twice yields an identical
//! stream.

use serde::{Deserialize, Serialize};

use midroll_core::RangeList;
use midroll_protocol::CommandRecord;
use midroll_state::Snapshot;

mod buffer;
mod command;
mod descriptor;
mod device;
mod graphics_pipeline;
mod image;
mod instance;
mod memory;
mod pipeline;
mod renderpass;
mod sync;
pub mod writer;

pub use buffer::is_fully_bound;
pub use image::{ImagePrimer, PrimeError, TransferPrimer};
pub use writer::StreamBuilder;

use midroll_protocol::commands::CommandBufferLevel;
use pipeline::{pipelines_in_order, PipelineKind};

/// Knobs for one rebuild pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildOptions {
    /// Thread the synthetic commands are attributed to on replay.
    #[serde(default)]
    pub thread: u64,
    /// First identifier handed out for synthetic helper objects. Must lie
    /// outside the capture's handle range.
    #[serde(default = "default_synthetic_id_base")]
    pub synthetic_id_base: u64,
}

fn default_synthetic_id_base() -> u64 {
    0x5_0000_0000
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self {
            thread: 0,
            synthetic_id_base: default_synthetic_id_base(),
        }
    }
}

/// The rebuilt stream plus the scratch ranges the replay must provision.
#[derive(Debug, Clone)]
pub struct RebuildOutput {
    pub commands: Vec<CommandRecord>,
    pub memory_intervals: RangeList,
}

/// Rebuild with the default transfer-based image primer.
pub fn rebuild(snapshot: &Snapshot, options: &RebuildOptions) -> RebuildOutput {
    let mut primer = TransferPrimer::new();
    rebuild_with_primer(snapshot, options, &mut primer)
}

/// Rebuild, priming image contents through the supplied primer.
pub fn rebuild_with_primer(
    snapshot: &Snapshot,
    options: &RebuildOptions,
    primer: &mut dyn ImagePrimer,
) -> RebuildOutput {
    let mut sb = StreamBuilder::new(snapshot, options.clone());

    for inst in snapshot.instances.values() {
        sb.create_instance(inst);
    }

    sb.create_physical_devices();

    for surface in snapshot.surfaces.values() {
        sb.create_surface(surface);
    }

    for device in snapshot.devices.values() {
        sb.create_device(device);
    }

    for queue in snapshot.queues.values() {
        sb.create_queue(queue);
    }

    for swapchain in snapshot.swapchains.values() {
        sb.create_swapchain(swapchain);
    }

    // Non-dedicated allocations only; dedicated ones are created together
    // with the buffer or image they back.
    for memory in snapshot.device_memories.values() {
        sb.create_device_memory(memory, false);
    }

    for buffer in snapshot.buffers.values() {
        sb.create_buffer(buffer);
    }

    for img in snapshot.images.values() {
        sb.create_image(img, primer);
    }

    for sampler in snapshot.samplers.values() {
        sb.create_sampler(sampler);
    }

    for fence in snapshot.fences.values() {
        sb.create_fence(fence);
    }

    for semaphore in snapshot.semaphores.values() {
        sb.create_semaphore(semaphore);
    }

    for event in snapshot.events.values() {
        sb.create_event(event);
    }

    for pool in snapshot.command_pools.values() {
        sb.create_command_pool(pool);
    }

    for cache in snapshot.pipeline_caches.values() {
        sb.create_pipeline_cache(cache);
    }

    for layout in snapshot.descriptor_set_layouts.values() {
        sb.create_descriptor_set_layout(layout);
    }

    for layout in snapshot.pipeline_layouts.values() {
        sb.create_pipeline_layout(layout);
    }

    for render_pass in snapshot.render_passes.values() {
        sb.create_render_pass(render_pass);
    }

    for module in snapshot.shader_modules.values() {
        sb.create_shader_module(module);
    }

    for entry in pipelines_in_order(snapshot, PipelineKind::Compute) {
        if let Some(p) = snapshot.compute_pipelines.get(&entry.handle) {
            sb.create_compute_pipeline(p, entry.orphaned);
        }
    }

    for entry in pipelines_in_order(snapshot, PipelineKind::Graphics) {
        if let Some(p) = snapshot.graphics_pipelines.get(&entry.handle) {
            sb.create_graphics_pipeline(p, entry.orphaned);
        }
    }

    for view in snapshot.image_views.values() {
        sb.create_image_view(view);
    }

    for view in snapshot.buffer_views.values() {
        sb.create_buffer_view(view);
    }

    for pool in snapshot.descriptor_pools.values() {
        sb.create_descriptor_pool(pool);
    }

    for framebuffer in snapshot.framebuffers.values() {
        sb.create_framebuffer(framebuffer);
    }

    for set in snapshot.descriptor_sets.values() {
        sb.create_descriptor_set(set);
    }

    for pool in snapshot.query_pools.values() {
        sb.create_query_pool(pool);
    }

    // Secondaries first so ExecuteCommands references resolve.
    for cb in snapshot.command_buffers.values() {
        sb.create_command_buffer(cb, CommandBufferLevel::Secondary);
    }
    for cb in snapshot.command_buffers.values() {
        sb.create_command_buffer(cb, CommandBufferLevel::Primary);
    }

    sb.finish()
}
