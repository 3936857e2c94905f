//! The captured driver state the rebuilder consumes.
//!
//! Every object kind is held in a `BTreeMap` keyed by handle, so iteration
//! order is the snapshot key order and two walks over the same snapshot are
//! identical.

use std::collections::BTreeMap;

pub use midroll_protocol::commands::*;
use midroll_protocol::handle::*;

/// Default base of the scratch address space when the capture does not
/// carry its own allocator seed.
pub const DEFAULT_SCRATCH_BASE: u64 = 0x4000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceType {
    Xcb,
    Android,
    Win32,
    Wayland,
    Xlib,
    Mir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    NotStarted,
    Recording,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Inactive,
    Active,
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct InstanceRecord {
    pub handle: InstanceHandle,
    pub enabled_layers: Vec<String>,
    pub enabled_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicalDeviceRecord {
    pub handle: PhysicalDeviceHandle,
    pub instance: InstanceHandle,
    pub properties: PhysicalDeviceProperties,
    pub memory_properties: PhysicalDeviceMemoryProperties,
    pub queue_family_properties: BTreeMap<u32, QueueFamilyProperties>,
}

#[derive(Debug, Clone)]
pub struct SurfaceRecord {
    pub handle: SurfaceHandle,
    pub instance: InstanceHandle,
    pub surface_type: SurfaceType,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    pub handle: DeviceHandle,
    pub physical_device: PhysicalDeviceHandle,
    pub enabled_layers: Vec<String>,
    pub enabled_extensions: Vec<String>,
    /// VkPhysicalDeviceFeatures carried as raw bytes
    pub enabled_features: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct QueueRecord {
    pub handle: QueueHandle,
    pub device: DeviceHandle,
    pub family: u32,
    pub index: u32,
    pub priority: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SwapchainRecord {
    pub handle: SwapchainHandle,
    pub device: DeviceHandle,
    pub info: SwapchainCreateInfo,
    /// Images created by the swapchain, in acquisition-index order.
    pub images: Vec<ImageHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceMemoryRecord {
    pub handle: DeviceMemoryHandle,
    pub device: DeviceHandle,
    pub allocation_size: u64,
    pub memory_type_index: u32,
    pub dedicated_allocation_nv: Option<DedicatedAllocationMemoryAllocateInfoNv>,
    /// Non-zero when the memory was mapped at capture time.
    pub mapped_location: u64,
    pub mapped_offset: u64,
    pub mapped_size: u64,
    /// The full contents of the allocation.
    pub data: Vec<u8>,
}

impl DeviceMemoryRecord {
    /// Read `[offset, offset + size)` of the captured contents, zero
    /// padding anything past the recorded bytes.
    pub fn bytes(&self, offset: u64, size: u64) -> Vec<u8> {
        let mut out = vec![0u8; size as usize];
        let start = (offset as usize).min(self.data.len());
        let end = ((offset + size) as usize).min(self.data.len());
        out[..end - start].copy_from_slice(&self.data[start..end]);
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct BufferRecord {
    pub handle: BufferHandle,
    pub device: DeviceHandle,
    pub info: BufferCreateInfo,
    pub memory: Option<DeviceMemoryHandle>,
    pub memory_offset: u64,
    pub memory_requirements: MemoryRequirements,
    /// resource offset -> bind
    pub sparse_bindings: BTreeMap<u64, SparseMemoryBind>,
    pub last_bound_queue: Option<QueueHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct SparseImageLevelBinding {
    pub blocks: Vec<SparseImageMemoryBind>,
}

#[derive(Debug, Clone, Default)]
pub struct SparseImageLayerBinding {
    /// mip level -> blocks
    pub levels: BTreeMap<u32, SparseImageLevelBinding>,
}

#[derive(Debug, Clone, Default)]
pub struct SparseImageAspectBinding {
    /// array layer -> levels
    pub layers: BTreeMap<u32, SparseImageLayerBinding>,
}

#[derive(Debug, Clone, Default)]
pub struct SparseImageFormatProperties {
    pub aspect_mask: u32,
    pub flags: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SparseImageMemoryRequirements {
    pub format_properties: SparseImageFormatProperties,
    pub image_mip_tail_first_lod: u32,
    pub image_mip_tail_size: u64,
    pub image_mip_tail_offset: u64,
    pub image_mip_tail_stride: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ImageRecord {
    pub handle: ImageHandle,
    pub device: DeviceHandle,
    pub info: ImageCreateInfo,
    /// Current layout at capture time (the priming target).
    pub layout: i32,
    pub aspect: u32,
    pub is_swapchain_image: bool,
    pub bound_memory: Option<DeviceMemoryHandle>,
    pub bound_memory_offset: u64,
    pub memory_requirements: MemoryRequirements,
    /// resource offset -> opaque bind
    pub opaque_sparse_bindings: BTreeMap<u64, SparseMemoryBind>,
    /// aspect -> layer -> level -> blocks
    pub sparse_image_bindings: BTreeMap<u32, SparseImageAspectBinding>,
    pub sparse_memory_requirements: Vec<SparseImageMemoryRequirements>,
    /// aspect -> layer -> level -> captured subresource bytes
    pub level_data: BTreeMap<u32, BTreeMap<u32, BTreeMap<u32, Vec<u8>>>>,
    pub last_bound_queue: Option<QueueHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct SamplerRecord {
    pub handle: SamplerHandle,
    pub device: DeviceHandle,
    pub info: SamplerCreateInfo,
}

#[derive(Debug, Clone, Default)]
pub struct FenceRecord {
    pub handle: FenceHandle,
    pub device: DeviceHandle,
    pub signaled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SemaphoreRecord {
    pub handle: SemaphoreHandle,
    pub device: DeviceHandle,
    pub signaled: bool,
    /// Queue the semaphore was last signalled on, when known.
    pub last_queue: QueueHandle,
}

#[derive(Debug, Clone, Default)]
pub struct EventRecord {
    pub handle: EventHandle,
    pub device: DeviceHandle,
    pub signaled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CommandPoolRecord {
    pub handle: CommandPoolHandle,
    pub device: DeviceHandle,
    pub flags: u32,
    pub queue_family_index: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineCacheRecord {
    pub handle: PipelineCacheHandle,
    pub device: DeviceHandle,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayoutRecord {
    pub handle: DescriptorSetLayoutHandle,
    pub device: DeviceHandle,
    /// binding index -> binding
    pub bindings: BTreeMap<u32, DescriptorSetLayoutBinding>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineLayoutRecord {
    pub handle: PipelineLayoutHandle,
    pub device: DeviceHandle,
    pub set_layouts: Vec<DescriptorSetLayoutHandle>,
    pub push_constant_ranges: BTreeMap<u32, PushConstantRange>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderPassRecord {
    pub handle: RenderPassHandle,
    pub device: DeviceHandle,
    pub attachments: BTreeMap<u32, AttachmentDescription>,
    pub subpasses: BTreeMap<u32, SubpassRecord>,
    pub dependencies: BTreeMap<u32, SubpassDependency>,
}

#[derive(Debug, Clone, Default)]
pub struct SubpassRecord {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    pub input_attachments: BTreeMap<u32, AttachmentReference>,
    pub color_attachments: BTreeMap<u32, AttachmentReference>,
    pub resolve_attachments: BTreeMap<u32, AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ShaderModuleRecord {
    pub handle: ShaderModuleHandle,
    pub device: DeviceHandle,
    pub words: Vec<u32>,
}

/// A shader stage as captured, holding the full module record so the stage
/// can be replayed even when the module was destroyed before the capture.
#[derive(Debug, Clone, Default)]
pub struct ShaderStageRecord {
    pub stage: u32,
    pub module: ShaderModuleRecord,
    pub entry_point: String,
    pub specialization: Option<SpecializationRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct SpecializationRecord {
    /// constant id order
    pub entries: BTreeMap<u32, SpecializationMapEntry>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ComputePipelineRecord {
    pub handle: PipelineHandle,
    pub device: DeviceHandle,
    pub cache: Option<PipelineCacheHandle>,
    pub flags: u32,
    pub stage: ShaderStageRecord,
    /// Full layout record, replayable as a temporary if destroyed.
    pub layout: PipelineLayoutRecord,
    /// Zero when the pipeline is not a derivative.
    pub base_pipeline: PipelineHandle,
}

#[derive(Debug, Clone, Default)]
pub struct GraphicsPipelineRecord {
    pub handle: PipelineHandle,
    pub device: DeviceHandle,
    pub cache: Option<PipelineCacheHandle>,
    pub flags: u32,
    /// stage order -> stage
    pub stages: BTreeMap<u32, ShaderStageRecord>,
    pub vertex_input_state: PipelineVertexInputStateCreateInfo,
    pub input_assembly_state: PipelineInputAssemblyStateCreateInfo,
    pub tessellation_state: Option<PipelineTessellationStateCreateInfo>,
    pub viewport_state: Option<PipelineViewportStateCreateInfo>,
    pub rasterization_state: PipelineRasterizationStateCreateInfo,
    pub multisample_state: Option<PipelineMultisampleStateCreateInfo>,
    pub depth_stencil_state: Option<PipelineDepthStencilStateCreateInfo>,
    pub color_blend_state: Option<PipelineColorBlendStateCreateInfo>,
    pub dynamic_state: Option<PipelineDynamicStateCreateInfo>,
    pub layout: PipelineLayoutRecord,
    pub render_pass: RenderPassRecord,
    pub subpass: u32,
    pub base_pipeline: PipelineHandle,
}

#[derive(Debug, Clone, Default)]
pub struct ImageViewRecord {
    pub handle: ImageViewHandle,
    pub device: DeviceHandle,
    pub image: ImageHandle,
    pub view_type: i32,
    pub format: i32,
    pub components: ComponentMapping,
    pub subresource_range: ImageSubresourceRange,
}

#[derive(Debug, Clone, Default)]
pub struct BufferViewRecord {
    pub handle: BufferViewHandle,
    pub device: DeviceHandle,
    pub buffer: BufferHandle,
    pub format: i32,
    pub offset: u64,
    pub range: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorPoolRecord {
    pub handle: DescriptorPoolHandle,
    pub device: DeviceHandle,
    pub flags: u32,
    pub max_sets: u32,
    pub sizes: BTreeMap<u32, DescriptorPoolSize>,
}

#[derive(Debug, Clone, Default)]
pub struct FramebufferRecord {
    pub handle: FramebufferHandle,
    pub device: DeviceHandle,
    /// Full render-pass record, replayable as a temporary if destroyed.
    pub render_pass: RenderPassRecord,
    pub attachments: BTreeMap<u32, ImageViewHandle>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

#[derive(Debug, Clone)]
pub struct DescriptorBindingRecord {
    pub descriptor_type: DescriptorType,
    pub image_bindings: Vec<DescriptorImageInfo>,
    pub buffer_bindings: Vec<DescriptorBufferInfo>,
    pub buffer_view_bindings: Vec<BufferViewHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorSetRecord {
    pub handle: DescriptorSetHandle,
    pub device: DeviceHandle,
    pub pool: DescriptorPoolHandle,
    pub layout: DescriptorSetLayoutHandle,
    /// binding index -> binding contents
    pub bindings: BTreeMap<u32, DescriptorBindingRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryPoolRecord {
    pub handle: QueryPoolHandle,
    pub device: DeviceHandle,
    pub query_type: i32,
    pub query_count: u32,
    pub pipeline_statistics: u32,
    /// One status per query slot.
    pub status: Vec<QueryStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct CommandBufferBeginInfoRecord {
    pub flags: u32,
    pub inherited: bool,
    pub inherited_render_pass: RenderPassHandle,
    pub inherited_subpass: u32,
    pub inherited_framebuffer: FramebufferHandle,
    pub inherited_occlusion_query: bool,
    pub inherited_query_flags: u32,
    pub inherited_pipeline_stats_flags: u32,
}

#[derive(Debug, Clone)]
pub struct CommandBufferRecord {
    pub handle: CommandBufferHandle,
    pub device: DeviceHandle,
    pub pool: CommandPoolHandle,
    pub level: CommandBufferLevel,
    pub recording: RecordingState,
    pub begin_info: CommandBufferBeginInfoRecord,
    pub commands: Vec<RecordedCommand>,
}

/// The full captured state, read-only during a rebuild.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Base address for scratch allocations, past every captured range.
    pub scratch_base: u64,
    pub instances: BTreeMap<InstanceHandle, InstanceRecord>,
    pub physical_devices: BTreeMap<PhysicalDeviceHandle, PhysicalDeviceRecord>,
    pub surfaces: BTreeMap<SurfaceHandle, SurfaceRecord>,
    pub devices: BTreeMap<DeviceHandle, DeviceRecord>,
    pub queues: BTreeMap<QueueHandle, QueueRecord>,
    pub swapchains: BTreeMap<SwapchainHandle, SwapchainRecord>,
    pub device_memories: BTreeMap<DeviceMemoryHandle, DeviceMemoryRecord>,
    pub buffers: BTreeMap<BufferHandle, BufferRecord>,
    pub images: BTreeMap<ImageHandle, ImageRecord>,
    pub samplers: BTreeMap<SamplerHandle, SamplerRecord>,
    pub fences: BTreeMap<FenceHandle, FenceRecord>,
    pub semaphores: BTreeMap<SemaphoreHandle, SemaphoreRecord>,
    pub events: BTreeMap<EventHandle, EventRecord>,
    pub command_pools: BTreeMap<CommandPoolHandle, CommandPoolRecord>,
    pub pipeline_caches: BTreeMap<PipelineCacheHandle, PipelineCacheRecord>,
    pub descriptor_set_layouts: BTreeMap<DescriptorSetLayoutHandle, DescriptorSetLayoutRecord>,
    pub pipeline_layouts: BTreeMap<PipelineLayoutHandle, PipelineLayoutRecord>,
    pub render_passes: BTreeMap<RenderPassHandle, RenderPassRecord>,
    pub shader_modules: BTreeMap<ShaderModuleHandle, ShaderModuleRecord>,
    pub compute_pipelines: BTreeMap<PipelineHandle, ComputePipelineRecord>,
    pub graphics_pipelines: BTreeMap<PipelineHandle, GraphicsPipelineRecord>,
    pub image_views: BTreeMap<ImageViewHandle, ImageViewRecord>,
    pub buffer_views: BTreeMap<BufferViewHandle, BufferViewRecord>,
    pub descriptor_pools: BTreeMap<DescriptorPoolHandle, DescriptorPoolRecord>,
    pub framebuffers: BTreeMap<FramebufferHandle, FramebufferRecord>,
    pub descriptor_sets: BTreeMap<DescriptorSetHandle, DescriptorSetRecord>,
    pub query_pools: BTreeMap<QueryPoolHandle, QueryPoolRecord>,
    pub command_buffers: BTreeMap<CommandBufferHandle, CommandBufferRecord>,
    /// Per-device driver-reported requirements for transfer staging
    /// buffers, when the capture observed them.
    pub transfer_buffer_memory_requirements: BTreeMap<DeviceHandle, MemoryRequirements>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            scratch_base: DEFAULT_SCRATCH_BASE,
            ..Self::default()
        }
    }

    /// True when `raw` is in use as a handle of any kind. The unused-ID
    /// oracle filters candidate synthetic identifiers through this.
    pub fn contains_raw_handle(&self, raw: u64) -> bool {
        self.instances.contains_key(&InstanceHandle(raw))
            || self.physical_devices.contains_key(&PhysicalDeviceHandle(raw))
            || self.surfaces.contains_key(&SurfaceHandle(raw))
            || self.devices.contains_key(&DeviceHandle(raw))
            || self.queues.contains_key(&QueueHandle(raw))
            || self.swapchains.contains_key(&SwapchainHandle(raw))
            || self.device_memories.contains_key(&DeviceMemoryHandle(raw))
            || self.buffers.contains_key(&BufferHandle(raw))
            || self.images.contains_key(&ImageHandle(raw))
            || self.samplers.contains_key(&SamplerHandle(raw))
            || self.fences.contains_key(&FenceHandle(raw))
            || self.semaphores.contains_key(&SemaphoreHandle(raw))
            || self.events.contains_key(&EventHandle(raw))
            || self.command_pools.contains_key(&CommandPoolHandle(raw))
            || self.pipeline_caches.contains_key(&PipelineCacheHandle(raw))
            || self
                .descriptor_set_layouts
                .contains_key(&DescriptorSetLayoutHandle(raw))
            || self.pipeline_layouts.contains_key(&PipelineLayoutHandle(raw))
            || self.render_passes.contains_key(&RenderPassHandle(raw))
            || self.shader_modules.contains_key(&ShaderModuleHandle(raw))
            || self.compute_pipelines.contains_key(&PipelineHandle(raw))
            || self.graphics_pipelines.contains_key(&PipelineHandle(raw))
            || self.image_views.contains_key(&ImageViewHandle(raw))
            || self.buffer_views.contains_key(&BufferViewHandle(raw))
            || self.descriptor_pools.contains_key(&DescriptorPoolHandle(raw))
            || self.framebuffers.contains_key(&FramebufferHandle(raw))
            || self.descriptor_sets.contains_key(&DescriptorSetHandle(raw))
            || self.query_pools.contains_key(&QueryPoolHandle(raw))
            || self.command_buffers.contains_key(&CommandBufferHandle(raw))
    }
}
