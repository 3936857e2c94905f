//! The mirror state: an initially empty replica of the driver state that
//! grows as the stream is written. Each emitted command is applied to it,
//! so builders can ask whether a dependency has already been recreated.

use std::collections::BTreeSet;

use midroll_protocol::commands::Command;
use midroll_protocol::handle::*;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MirrorError {
    #[error("{kind} parent {handle:#x} not present")]
    MissingParent { kind: &'static str, handle: u64 },

    #[error("{kind} {handle:#x} not present")]
    UnknownHandle { kind: &'static str, handle: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct MirrorState {
    instances: BTreeSet<InstanceHandle>,
    physical_devices: BTreeSet<PhysicalDeviceHandle>,
    surfaces: BTreeSet<SurfaceHandle>,
    devices: BTreeSet<DeviceHandle>,
    queues: BTreeSet<QueueHandle>,
    swapchains: BTreeSet<SwapchainHandle>,
    device_memories: BTreeSet<DeviceMemoryHandle>,
    buffers: BTreeSet<BufferHandle>,
    buffer_views: BTreeSet<BufferViewHandle>,
    images: BTreeSet<ImageHandle>,
    image_views: BTreeSet<ImageViewHandle>,
    samplers: BTreeSet<SamplerHandle>,
    fences: BTreeSet<FenceHandle>,
    semaphores: BTreeSet<SemaphoreHandle>,
    events: BTreeSet<EventHandle>,
    command_pools: BTreeSet<CommandPoolHandle>,
    command_buffers: BTreeSet<CommandBufferHandle>,
    pipeline_caches: BTreeSet<PipelineCacheHandle>,
    descriptor_set_layouts: BTreeSet<DescriptorSetLayoutHandle>,
    pipeline_layouts: BTreeSet<PipelineLayoutHandle>,
    render_passes: BTreeSet<RenderPassHandle>,
    shader_modules: BTreeSet<ShaderModuleHandle>,
    compute_pipelines: BTreeSet<PipelineHandle>,
    graphics_pipelines: BTreeSet<PipelineHandle>,
    descriptor_pools: BTreeSet<DescriptorPoolHandle>,
    descriptor_sets: BTreeSet<DescriptorSetHandle>,
    framebuffers: BTreeSet<FramebufferHandle>,
    query_pools: BTreeSet<QueryPoolHandle>,
}

impl MirrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_instance(&self, h: InstanceHandle) -> bool {
        self.instances.contains(&h)
    }
    pub fn contains_physical_device(&self, h: PhysicalDeviceHandle) -> bool {
        self.physical_devices.contains(&h)
    }
    pub fn contains_surface(&self, h: SurfaceHandle) -> bool {
        self.surfaces.contains(&h)
    }
    pub fn contains_device(&self, h: DeviceHandle) -> bool {
        self.devices.contains(&h)
    }
    pub fn contains_queue(&self, h: QueueHandle) -> bool {
        self.queues.contains(&h)
    }
    pub fn contains_swapchain(&self, h: SwapchainHandle) -> bool {
        self.swapchains.contains(&h)
    }
    pub fn contains_device_memory(&self, h: DeviceMemoryHandle) -> bool {
        self.device_memories.contains(&h)
    }
    pub fn contains_buffer(&self, h: BufferHandle) -> bool {
        self.buffers.contains(&h)
    }
    pub fn contains_buffer_view(&self, h: BufferViewHandle) -> bool {
        self.buffer_views.contains(&h)
    }
    pub fn contains_image(&self, h: ImageHandle) -> bool {
        self.images.contains(&h)
    }
    pub fn contains_image_view(&self, h: ImageViewHandle) -> bool {
        self.image_views.contains(&h)
    }
    pub fn contains_sampler(&self, h: SamplerHandle) -> bool {
        self.samplers.contains(&h)
    }
    pub fn contains_fence(&self, h: FenceHandle) -> bool {
        self.fences.contains(&h)
    }
    pub fn contains_semaphore(&self, h: SemaphoreHandle) -> bool {
        self.semaphores.contains(&h)
    }
    pub fn contains_event(&self, h: EventHandle) -> bool {
        self.events.contains(&h)
    }
    pub fn contains_command_pool(&self, h: CommandPoolHandle) -> bool {
        self.command_pools.contains(&h)
    }
    pub fn contains_command_buffer(&self, h: CommandBufferHandle) -> bool {
        self.command_buffers.contains(&h)
    }
    pub fn contains_pipeline_cache(&self, h: PipelineCacheHandle) -> bool {
        self.pipeline_caches.contains(&h)
    }
    pub fn contains_descriptor_set_layout(&self, h: DescriptorSetLayoutHandle) -> bool {
        self.descriptor_set_layouts.contains(&h)
    }
    pub fn contains_pipeline_layout(&self, h: PipelineLayoutHandle) -> bool {
        self.pipeline_layouts.contains(&h)
    }
    pub fn contains_render_pass(&self, h: RenderPassHandle) -> bool {
        self.render_passes.contains(&h)
    }
    pub fn contains_shader_module(&self, h: ShaderModuleHandle) -> bool {
        self.shader_modules.contains(&h)
    }
    pub fn contains_compute_pipeline(&self, h: PipelineHandle) -> bool {
        self.compute_pipelines.contains(&h)
    }
    pub fn contains_graphics_pipeline(&self, h: PipelineHandle) -> bool {
        self.graphics_pipelines.contains(&h)
    }
    pub fn contains_pipeline(&self, h: PipelineHandle) -> bool {
        self.compute_pipelines.contains(&h) || self.graphics_pipelines.contains(&h)
    }
    pub fn contains_descriptor_pool(&self, h: DescriptorPoolHandle) -> bool {
        self.descriptor_pools.contains(&h)
    }
    pub fn contains_descriptor_set(&self, h: DescriptorSetHandle) -> bool {
        self.descriptor_sets.contains(&h)
    }
    pub fn contains_framebuffer(&self, h: FramebufferHandle) -> bool {
        self.framebuffers.contains(&h)
    }
    pub fn contains_query_pool(&self, h: QueryPoolHandle) -> bool {
        self.query_pools.contains(&h)
    }

    fn require_device(&self, device: DeviceHandle) -> Result<(), MirrorError> {
        if self.devices.contains(&device) {
            Ok(())
        } else {
            Err(MirrorError::MissingParent {
                kind: "device",
                handle: device.raw(),
            })
        }
    }

    fn require_instance(&self, instance: InstanceHandle) -> Result<(), MirrorError> {
        if self.instances.contains(&instance) {
            Ok(())
        } else {
            Err(MirrorError::MissingParent {
                kind: "instance",
                handle: instance.raw(),
            })
        }
    }

    /// Apply the side-effects of `cmd`.
    ///
    /// Failures leave the mirror in the state it had before the call for
    /// every tracked set except those already updated; the writer treats
    /// them as diagnostics, not as stream errors.
    pub fn apply(&mut self, cmd: &Command) -> Result<(), MirrorError> {
        match cmd {
            Command::CreateInstance { instance, .. } => {
                self.instances.insert(*instance);
            }
            Command::EnumeratePhysicalDevices {
                instance, devices, ..
            } => {
                self.require_instance(*instance)?;
                if let Some(devices) = devices {
                    self.physical_devices.extend(devices.iter().copied());
                }
            }
            Command::GetPhysicalDeviceProperties {
                physical_device, ..
            }
            | Command::GetPhysicalDeviceMemoryProperties {
                physical_device, ..
            }
            | Command::GetPhysicalDeviceQueueFamilyProperties {
                physical_device, ..
            } => {
                if !self.physical_devices.contains(physical_device) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "physical device",
                        handle: physical_device.raw(),
                    });
                }
            }

            Command::CreateXcbSurfaceKhr {
                instance, surface, ..
            }
            | Command::CreateAndroidSurfaceKhr {
                instance, surface, ..
            }
            | Command::CreateWin32SurfaceKhr {
                instance, surface, ..
            }
            | Command::CreateWaylandSurfaceKhr {
                instance, surface, ..
            }
            | Command::CreateXlibSurfaceKhr {
                instance, surface, ..
            }
            | Command::CreateMirSurfaceKhr {
                instance, surface, ..
            } => {
                self.require_instance(*instance)?;
                self.surfaces.insert(*surface);
            }

            Command::CreateDevice {
                physical_device,
                device,
                ..
            } => {
                if !self.physical_devices.contains(physical_device) {
                    return Err(MirrorError::MissingParent {
                        kind: "physical device",
                        handle: physical_device.raw(),
                    });
                }
                self.devices.insert(*device);
            }
            Command::GetDeviceQueue { device, queue, .. } => {
                self.require_device(*device)?;
                self.queues.insert(*queue);
            }
            Command::QueueSubmit { queue, .. }
            | Command::QueueWaitIdle { queue }
            | Command::QueueBindSparse { queue, .. } => {
                if !self.queues.contains(queue) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "queue",
                        handle: queue.raw(),
                    });
                }
            }

            Command::CreateSwapchainKhr {
                device, swapchain, ..
            } => {
                self.require_device(*device)?;
                self.swapchains.insert(*swapchain);
            }
            Command::GetSwapchainImagesKhr {
                swapchain, images, ..
            } => {
                if !self.swapchains.contains(swapchain) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "swapchain",
                        handle: swapchain.raw(),
                    });
                }
                if let Some(images) = images {
                    self.images.extend(images.iter().copied());
                }
            }

            Command::AllocateMemory { device, memory, .. } => {
                self.require_device(*device)?;
                self.device_memories.insert(*memory);
            }
            Command::MapMemory { memory, .. }
            | Command::UnmapMemory { memory, .. } => {
                if !self.device_memories.contains(memory) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "device memory",
                        handle: memory.raw(),
                    });
                }
            }
            Command::FlushMappedMemoryRanges { device, .. } => {
                self.require_device(*device)?;
            }
            Command::FreeMemory { memory, .. } => {
                if !self.device_memories.remove(memory) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "device memory",
                        handle: memory.raw(),
                    });
                }
            }

            Command::CreateBuffer { device, buffer, .. } => {
                self.require_device(*device)?;
                self.buffers.insert(*buffer);
            }
            Command::GetBufferMemoryRequirements { buffer, .. }
            | Command::BindBufferMemory { buffer, .. } => {
                if !self.buffers.contains(buffer) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "buffer",
                        handle: buffer.raw(),
                    });
                }
            }
            Command::DestroyBuffer { buffer, .. } => {
                if !self.buffers.remove(buffer) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "buffer",
                        handle: buffer.raw(),
                    });
                }
            }
            Command::CreateBufferView { device, view, .. } => {
                self.require_device(*device)?;
                self.buffer_views.insert(*view);
            }

            Command::CreateImage { device, image, .. } => {
                self.require_device(*device)?;
                self.images.insert(*image);
            }
            Command::GetImageMemoryRequirements { image, .. }
            | Command::BindImageMemory { image, .. } => {
                if !self.images.contains(image) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "image",
                        handle: image.raw(),
                    });
                }
            }
            Command::CreateImageView { device, view, .. } => {
                self.require_device(*device)?;
                self.image_views.insert(*view);
            }
            Command::CreateSampler { device, sampler, .. } => {
                self.require_device(*device)?;
                self.samplers.insert(*sampler);
            }

            Command::CreateFence { device, fence, .. } => {
                self.require_device(*device)?;
                self.fences.insert(*fence);
            }
            Command::CreateSemaphore { device, semaphore } => {
                self.require_device(*device)?;
                self.semaphores.insert(*semaphore);
            }
            Command::CreateEvent { device, event } => {
                self.require_device(*device)?;
                self.events.insert(*event);
            }
            Command::SetEvent { event, .. } => {
                if !self.events.contains(event) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "event",
                        handle: event.raw(),
                    });
                }
            }

            Command::CreateCommandPool { device, pool, .. } => {
                self.require_device(*device)?;
                self.command_pools.insert(*pool);
            }
            Command::DestroyCommandPool { pool, .. } => {
                if !self.command_pools.remove(pool) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "command pool",
                        handle: pool.raw(),
                    });
                }
            }
            Command::AllocateCommandBuffers {
                pool,
                command_buffers,
                ..
            } => {
                if !self.command_pools.contains(pool) {
                    return Err(MirrorError::MissingParent {
                        kind: "command pool",
                        handle: pool.raw(),
                    });
                }
                self.command_buffers.extend(command_buffers.iter().copied());
            }
            Command::BeginCommandBuffer { command_buffer, .. }
            | Command::EndCommandBuffer { command_buffer } => {
                if !self.command_buffers.contains(command_buffer) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "command buffer",
                        handle: command_buffer.raw(),
                    });
                }
            }

            Command::CreatePipelineCache { device, cache } => {
                self.require_device(*device)?;
                self.pipeline_caches.insert(*cache);
            }
            Command::CreateDescriptorSetLayout { device, layout, .. } => {
                self.require_device(*device)?;
                self.descriptor_set_layouts.insert(*layout);
            }
            Command::CreatePipelineLayout { device, layout, .. } => {
                self.require_device(*device)?;
                self.pipeline_layouts.insert(*layout);
            }
            Command::DestroyPipelineLayout { layout, .. } => {
                if !self.pipeline_layouts.remove(layout) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "pipeline layout",
                        handle: layout.raw(),
                    });
                }
            }
            Command::CreateRenderPass {
                device,
                render_pass,
                ..
            } => {
                self.require_device(*device)?;
                self.render_passes.insert(*render_pass);
            }
            Command::DestroyRenderPass { render_pass, .. } => {
                if !self.render_passes.remove(render_pass) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "render pass",
                        handle: render_pass.raw(),
                    });
                }
            }
            Command::CreateShaderModule { device, module, .. } => {
                self.require_device(*device)?;
                self.shader_modules.insert(*module);
            }
            Command::DestroyShaderModule { module, .. } => {
                if !self.shader_modules.remove(module) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "shader module",
                        handle: module.raw(),
                    });
                }
            }
            Command::CreateComputePipelines {
                device, pipeline, ..
            } => {
                self.require_device(*device)?;
                self.compute_pipelines.insert(*pipeline);
            }
            Command::CreateGraphicsPipelines {
                device, pipeline, ..
            } => {
                self.require_device(*device)?;
                self.graphics_pipelines.insert(*pipeline);
            }

            Command::CreateDescriptorPool { device, pool, .. } => {
                self.require_device(*device)?;
                self.descriptor_pools.insert(*pool);
            }
            Command::CreateFramebuffer {
                device,
                framebuffer,
                ..
            } => {
                self.require_device(*device)?;
                self.framebuffers.insert(*framebuffer);
            }
            Command::AllocateDescriptorSets { pool, sets, .. } => {
                if !self.descriptor_pools.contains(pool) {
                    return Err(MirrorError::MissingParent {
                        kind: "descriptor pool",
                        handle: pool.raw(),
                    });
                }
                self.descriptor_sets.extend(sets.iter().copied());
            }
            Command::UpdateDescriptorSets { device, .. } => {
                self.require_device(*device)?;
            }
            Command::CreateQueryPool { device, pool, .. } => {
                self.require_device(*device)?;
                self.query_pools.insert(*pool);
            }

            // Recorded commands only require a live command buffer; their
            // own argument validity is checked at translation time.
            Command::CmdPipelineBarrier { command_buffer, .. }
            | Command::CmdCopyBuffer { command_buffer, .. }
            | Command::CmdCopyBufferToImage { command_buffer, .. }
            | Command::CmdCopyImageToBuffer { command_buffer, .. }
            | Command::CmdFillBuffer { command_buffer, .. }
            | Command::CmdUpdateBuffer { command_buffer, .. }
            | Command::CmdBindPipeline { command_buffer, .. }
            | Command::CmdBindDescriptorSets { command_buffer, .. }
            | Command::CmdBindVertexBuffers { command_buffer, .. }
            | Command::CmdBindIndexBuffer { command_buffer, .. }
            | Command::CmdDispatch { command_buffer, .. }
            | Command::CmdDraw { command_buffer, .. }
            | Command::CmdDrawIndexed { command_buffer, .. }
            | Command::CmdSetViewport { command_buffer, .. }
            | Command::CmdSetScissor { command_buffer, .. }
            | Command::CmdBeginRenderPass { command_buffer, .. }
            | Command::CmdEndRenderPass { command_buffer }
            | Command::CmdExecuteCommands { command_buffer, .. }
            | Command::CmdBeginQuery { command_buffer, .. }
            | Command::CmdEndQuery { command_buffer, .. } => {
                if !self.command_buffers.contains(command_buffer) {
                    return Err(MirrorError::UnknownHandle {
                        kind: "command buffer",
                        handle: command_buffer.raw(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_contains() {
        let mut mirror = MirrorState::new();
        mirror
            .apply(&Command::CreateInstance {
                enabled_layers: vec![],
                enabled_extensions: vec![],
                instance: InstanceHandle(1),
            })
            .unwrap();
        assert!(mirror.contains_instance(InstanceHandle(1)));
    }

    #[test]
    fn create_on_missing_device_is_an_error() {
        let mut mirror = MirrorState::new();
        let err = mirror.apply(&Command::CreateBuffer {
            device: DeviceHandle(7),
            info: Default::default(),
            buffer: BufferHandle(8),
        });
        assert!(matches!(err, Err(MirrorError::MissingParent { .. })));
        assert!(!mirror.contains_buffer(BufferHandle(8)));
    }

    #[test]
    fn destroy_removes() {
        let mut mirror = MirrorState::new();
        mirror
            .apply(&Command::CreateInstance {
                enabled_layers: vec![],
                enabled_extensions: vec![],
                instance: InstanceHandle(1),
            })
            .unwrap();
        mirror
            .apply(&Command::EnumeratePhysicalDevices {
                instance: InstanceHandle(1),
                device_count: 1,
                devices: Some(vec![PhysicalDeviceHandle(2)]),
            })
            .unwrap();
        mirror
            .apply(&Command::CreateDevice {
                physical_device: PhysicalDeviceHandle(2),
                queue_create_infos: vec![],
                enabled_layers: vec![],
                enabled_extensions: vec![],
                enabled_features: None,
                device: DeviceHandle(3),
            })
            .unwrap();
        mirror
            .apply(&Command::CreateShaderModule {
                device: DeviceHandle(3),
                code: vec![],
                module: ShaderModuleHandle(4),
            })
            .unwrap();
        assert!(mirror.contains_shader_module(ShaderModuleHandle(4)));
        mirror
            .apply(&Command::DestroyShaderModule {
                device: DeviceHandle(3),
                module: ShaderModuleHandle(4),
            })
            .unwrap();
        assert!(!mirror.contains_shader_module(ShaderModuleHandle(4)));
    }
}
