use serde::{Deserialize, Serialize};

use crate::handle::*;

// ============================================================================
// Typed Vulkan payload structs
//
// Enum and flag fields are carried as the raw `u32`/`i32` values of the
// corresponding Vulkan types; producers build them from `ash::vk` constants.
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DeviceQueueCreateInfo {
    pub queue_family_index: u32,
    pub queue_count: u32,
    pub queue_priorities: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct MappedMemoryRange {
    pub memory: DeviceMemoryHandle,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct MemoryRequirements {
    pub size: u64,
    pub alignment: u64,
    pub memory_type_bits: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PhysicalDeviceProperties {
    pub api_version: u32,
    pub driver_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: u32,
    pub device_name: String,
    pub pipeline_cache_uuid: [u8; 16],
    /// VkPhysicalDeviceLimits carried as raw bytes
    pub limits_raw: Vec<u8>,
    /// VkPhysicalDeviceSparseProperties carried as raw bytes
    pub sparse_properties_raw: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct MemoryType {
    pub property_flags: u32,
    pub heap_index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct MemoryHeap {
    pub size: u64,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PhysicalDeviceMemoryProperties {
    pub memory_types: Vec<MemoryType>,
    pub memory_heaps: Vec<MemoryHeap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct QueueFamilyProperties {
    pub queue_flags: u32,
    pub queue_count: u32,
    pub timestamp_valid_bits: u32,
    pub min_image_transfer_granularity: [u32; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SubmitInfo {
    pub wait_semaphores: Vec<SemaphoreHandle>,
    pub wait_dst_stage_masks: Vec<u32>,
    pub command_buffers: Vec<CommandBufferHandle>,
    pub signal_semaphores: Vec<SemaphoreHandle>,
}

// ── Sparse binding ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SparseMemoryBind {
    pub resource_offset: u64,
    pub size: u64,
    pub memory: DeviceMemoryHandle,
    pub memory_offset: u64,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SparseBufferMemoryBindInfo {
    pub buffer: BufferHandle,
    pub binds: Vec<SparseMemoryBind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SparseImageOpaqueMemoryBindInfo {
    pub image: ImageHandle,
    pub binds: Vec<SparseMemoryBind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ImageSubresource {
    pub aspect_mask: u32,
    pub mip_level: u32,
    pub array_layer: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SparseImageMemoryBind {
    pub subresource: ImageSubresource,
    pub offset: [i32; 3],
    pub extent: [u32; 3],
    pub memory: DeviceMemoryHandle,
    pub memory_offset: u64,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SparseImageMemoryBindInfo {
    pub image: ImageHandle,
    pub binds: Vec<SparseImageMemoryBind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BindSparseInfo {
    pub wait_semaphores: Vec<SemaphoreHandle>,
    pub buffer_binds: Vec<SparseBufferMemoryBindInfo>,
    pub image_opaque_binds: Vec<SparseImageOpaqueMemoryBindInfo>,
    pub image_binds: Vec<SparseImageMemoryBindInfo>,
    pub signal_semaphores: Vec<SemaphoreHandle>,
}

// ── Memory / buffers ────────────────────────────────────────

/// VK_NV_dedicated_allocation pNext payload on VkMemoryAllocateInfo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DedicatedAllocationMemoryAllocateInfoNv {
    pub image: ImageHandle,
    pub buffer: BufferHandle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BufferCreateInfo {
    pub flags: u32,
    pub size: u64,
    pub usage: u32,
    pub sharing_mode: u32,
    pub queue_family_indices: Vec<u32>,
    /// VK_NV_dedicated_allocation pNext payload, when present.
    pub dedicated_allocation_nv: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BufferViewCreateInfo {
    pub buffer: BufferHandle,
    pub format: i32,
    pub offset: u64,
    pub range: u64,
}

// ── Images ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ImageCreateInfo {
    pub flags: u32,
    pub image_type: i32,
    pub format: i32,
    pub extent: [u32; 3],
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: u32,
    pub tiling: i32,
    pub usage: u32,
    pub sharing_mode: u32,
    pub queue_family_indices: Vec<u32>,
    pub initial_layout: i32,
    /// VK_NV_dedicated_allocation pNext payload, when present.
    pub dedicated_allocation_nv: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ComponentMapping {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ImageSubresourceRange {
    pub aspect_mask: u32,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ImageViewCreateInfo {
    pub image: ImageHandle,
    pub view_type: i32,
    pub format: i32,
    pub components: ComponentMapping,
    pub subresource_range: ImageSubresourceRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SamplerCreateInfo {
    pub mag_filter: i32,
    pub min_filter: i32,
    pub mipmap_mode: i32,
    pub address_mode_u: i32,
    pub address_mode_v: i32,
    pub address_mode_w: i32,
    pub mip_lod_bias: f32,
    pub anisotropy_enable: bool,
    pub max_anisotropy: f32,
    pub compare_enable: bool,
    pub compare_op: i32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: i32,
    pub unnormalized_coordinates: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ImageSubresourceLayers {
    pub aspect_mask: u32,
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    pub buffer_row_length: u32,
    pub buffer_image_height: u32,
    pub image_subresource: ImageSubresourceLayers,
    pub image_offset: [i32; 3],
    pub image_extent: [u32; 3],
}

// ── Barriers ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct MemoryBarrier {
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct BufferMemoryBarrier {
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub buffer: BufferHandle,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ImageMemoryBarrier {
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub old_layout: i32,
    pub new_layout: i32,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub image: ImageHandle,
    pub subresource_range: ImageSubresourceRange,
}

// ── Descriptors ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stage_flags: u32,
    pub immutable_samplers: Vec<SamplerHandle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PushConstantRange {
    pub stage_flags: u32,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DescriptorPoolSize {
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DescriptorImageInfo {
    pub sampler: SamplerHandle,
    pub image_view: ImageViewHandle,
    pub image_layout: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DescriptorBufferInfo {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub range: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct WriteDescriptorSet {
    pub dst_set: DescriptorSetHandle,
    pub dst_binding: u32,
    pub dst_array_element: u32,
    pub descriptor_count: u32,
    pub descriptor_type: DescriptorType,
    pub image_infos: Vec<DescriptorImageInfo>,
    pub buffer_infos: Vec<DescriptorBufferInfo>,
    pub texel_buffer_views: Vec<BufferViewHandle>,
}

// ── Pipelines ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SpecializationMapEntry {
    pub constant_id: u32,
    pub offset: u32,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SpecializationInfo {
    pub map_entries: Vec<SpecializationMapEntry>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineShaderStageCreateInfo {
    pub stage: u32,
    pub module: ShaderModuleHandle,
    pub entry_point: String,
    pub specialization: Option<SpecializationInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ComputePipelineCreateInfo {
    pub flags: u32,
    pub stage: PipelineShaderStageCreateInfo,
    pub layout: PipelineLayoutHandle,
    pub base_pipeline: PipelineHandle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct VertexInputBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct VertexInputAttributeDescription {
    pub location: u32,
    pub binding: u32,
    pub format: i32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineVertexInputStateCreateInfo {
    pub vertex_binding_descriptions: Vec<VertexInputBindingDescription>,
    pub vertex_attribute_descriptions: Vec<VertexInputAttributeDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineInputAssemblyStateCreateInfo {
    pub topology: i32,
    pub primitive_restart_enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineTessellationStateCreateInfo {
    pub patch_control_points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Rect2D {
    pub offset: [i32; 2],
    pub extent: [u32; 2],
}

/// The counts can exceed the array lengths when the corresponding state was
/// dynamic at capture time and the arrays were never observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineViewportStateCreateInfo {
    pub viewport_count: u32,
    pub viewports: Vec<Viewport>,
    pub scissor_count: u32,
    pub scissors: Vec<Rect2D>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineRasterizationStateCreateInfo {
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: i32,
    pub cull_mode: u32,
    pub front_face: i32,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineMultisampleStateCreateInfo {
    pub rasterization_samples: u32,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub sample_mask: Vec<u32>,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct StencilOpState {
    pub fail_op: i32,
    pub pass_op: i32,
    pub depth_fail_op: i32,
    pub compare_op: i32,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineDepthStencilStateCreateInfo {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: i32,
    pub depth_bounds_test_enable: bool,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineColorBlendAttachmentState {
    pub blend_enable: bool,
    pub src_color_blend_factor: i32,
    pub dst_color_blend_factor: i32,
    pub color_blend_op: i32,
    pub src_alpha_blend_factor: i32,
    pub dst_alpha_blend_factor: i32,
    pub alpha_blend_op: i32,
    pub color_write_mask: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineColorBlendStateCreateInfo {
    pub logic_op_enable: bool,
    pub logic_op: i32,
    pub attachments: Vec<PipelineColorBlendAttachmentState>,
    pub blend_constants: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct PipelineDynamicStateCreateInfo {
    pub dynamic_states: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct GraphicsPipelineCreateInfo {
    pub flags: u32,
    pub stages: Vec<PipelineShaderStageCreateInfo>,
    pub vertex_input_state: PipelineVertexInputStateCreateInfo,
    pub input_assembly_state: PipelineInputAssemblyStateCreateInfo,
    pub tessellation_state: Option<PipelineTessellationStateCreateInfo>,
    pub viewport_state: Option<PipelineViewportStateCreateInfo>,
    pub rasterization_state: PipelineRasterizationStateCreateInfo,
    pub multisample_state: Option<PipelineMultisampleStateCreateInfo>,
    pub depth_stencil_state: Option<PipelineDepthStencilStateCreateInfo>,
    pub color_blend_state: Option<PipelineColorBlendStateCreateInfo>,
    pub dynamic_state: Option<PipelineDynamicStateCreateInfo>,
    pub layout: PipelineLayoutHandle,
    pub render_pass: RenderPassHandle,
    pub subpass: u32,
    pub base_pipeline: PipelineHandle,
}

// ── Render passes / framebuffers ────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct AttachmentDescription {
    pub flags: u32,
    pub format: i32,
    pub samples: u32,
    pub load_op: i32,
    pub store_op: i32,
    pub stencil_load_op: i32,
    pub stencil_store_op: i32,
    pub initial_layout: i32,
    pub final_layout: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct FramebufferCreateInfo {
    pub render_pass: RenderPassHandle,
    pub attachments: Vec<ImageViewHandle>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

// ── Queries / swapchain / command buffers ───────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct QueryPoolCreateInfo {
    pub query_type: i32,
    pub query_count: u32,
    pub pipeline_statistics: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct SwapchainCreateInfo {
    pub surface: SurfaceHandle,
    pub min_image_count: u32,
    pub image_format: i32,
    pub image_color_space: i32,
    pub image_extent: [u32; 2],
    pub image_array_layers: u32,
    pub image_usage: u32,
    pub image_sharing_mode: u32,
    pub queue_family_indices: Vec<u32>,
    pub pre_transform: u32,
    pub composite_alpha: u32,
    pub present_mode: i32,
    pub clipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum CommandBufferLevel {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct CommandBufferInheritanceInfo {
    pub render_pass: RenderPassHandle,
    pub subpass: u32,
    pub framebuffer: FramebufferHandle,
    pub occlusion_query_enable: bool,
    pub query_flags: u32,
    pub pipeline_statistics: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct ClearValue {
    pub data: [u8; 16],
}

// ============================================================================
// Recorded command-buffer contents
// ============================================================================

/// A command recorded into a command buffer, as captured in the snapshot.
/// Replay emission translates each of these into the matching `Command`
/// variant after validating every referenced handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum RecordedCommand {
    BindPipeline {
        pipeline_bind_point: u32,
        pipeline: PipelineHandle,
    },
    BindDescriptorSets {
        pipeline_bind_point: u32,
        layout: PipelineLayoutHandle,
        first_set: u32,
        descriptor_sets: Vec<DescriptorSetHandle>,
        dynamic_offsets: Vec<u32>,
    },
    BindVertexBuffers {
        first_binding: u32,
        buffers: Vec<BufferHandle>,
        offsets: Vec<u64>,
    },
    BindIndexBuffer {
        buffer: BufferHandle,
        offset: u64,
        index_type: u32,
    },
    Dispatch {
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    PipelineBarrier {
        src_stage_mask: u32,
        dst_stage_mask: u32,
        dependency_flags: u32,
        memory_barriers: Vec<MemoryBarrier>,
        buffer_memory_barriers: Vec<BufferMemoryBarrier>,
        image_memory_barriers: Vec<ImageMemoryBarrier>,
    },
    CopyBuffer {
        src: BufferHandle,
        dst: BufferHandle,
        regions: Vec<BufferCopy>,
    },
    CopyBufferToImage {
        src_buffer: BufferHandle,
        dst_image: ImageHandle,
        dst_image_layout: i32,
        regions: Vec<BufferImageCopy>,
    },
    CopyImageToBuffer {
        src_image: ImageHandle,
        src_image_layout: i32,
        dst_buffer: BufferHandle,
        regions: Vec<BufferImageCopy>,
    },
    FillBuffer {
        buffer: BufferHandle,
        offset: u64,
        size: u64,
        data: u32,
    },
    UpdateBuffer {
        buffer: BufferHandle,
        offset: u64,
        data: Vec<u8>,
    },
    SetViewport {
        first_viewport: u32,
        viewports: Vec<Viewport>,
    },
    SetScissor {
        first_scissor: u32,
        scissors: Vec<Rect2D>,
    },
    BeginRenderPass {
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        render_area: Rect2D,
        clear_values: Vec<ClearValue>,
        contents: u32,
    },
    EndRenderPass,
    ExecuteCommands {
        command_buffers: Vec<CommandBufferHandle>,
    },
    BeginQuery {
        query_pool: QueryPoolHandle,
        query: u32,
        flags: u32,
    },
    EndQuery {
        query_pool: QueryPoolHandle,
        query: u32,
    },
}

// ============================================================================
// The command stream
// ============================================================================

/// One synthetic Vulkan API call in the rebuild stream.
///
/// Creation variants carry the handle(s) the call introduces; the replay
/// engine registers them before executing later commands that refer back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,
         rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum Command {
    // ── Instance / physical devices ─────────────────────────
    CreateInstance {
        enabled_layers: Vec<String>,
        enabled_extensions: Vec<String>,
        instance: InstanceHandle,
    },
    /// `devices: None` is the count-only query; `Some` is the full query.
    EnumeratePhysicalDevices {
        instance: InstanceHandle,
        device_count: u32,
        devices: Option<Vec<PhysicalDeviceHandle>>,
    },
    GetPhysicalDeviceProperties {
        physical_device: PhysicalDeviceHandle,
        properties: PhysicalDeviceProperties,
    },
    GetPhysicalDeviceMemoryProperties {
        physical_device: PhysicalDeviceHandle,
        properties: PhysicalDeviceMemoryProperties,
    },
    /// `families: None` is the count-only query; `Some` is the full query.
    GetPhysicalDeviceQueueFamilyProperties {
        physical_device: PhysicalDeviceHandle,
        family_count: u32,
        families: Option<Vec<QueueFamilyProperties>>,
    },

    // ── Surfaces (windowing fields are zero; the replay target supplies
    //    its own windowing state) ─────────────────────────────
    CreateXcbSurfaceKhr {
        instance: InstanceHandle,
        connection: u64,
        window: u64,
        surface: SurfaceHandle,
    },
    CreateAndroidSurfaceKhr {
        instance: InstanceHandle,
        window: u64,
        surface: SurfaceHandle,
    },
    CreateWin32SurfaceKhr {
        instance: InstanceHandle,
        hinstance: u64,
        hwnd: u64,
        surface: SurfaceHandle,
    },
    CreateWaylandSurfaceKhr {
        instance: InstanceHandle,
        display: u64,
        wl_surface: u64,
        surface: SurfaceHandle,
    },
    CreateXlibSurfaceKhr {
        instance: InstanceHandle,
        dpy: u64,
        window: u64,
        surface: SurfaceHandle,
    },
    CreateMirSurfaceKhr {
        instance: InstanceHandle,
        connection: u64,
        mir_surface: u64,
        surface: SurfaceHandle,
    },

    // ── Device / queues ─────────────────────────────────────
    CreateDevice {
        physical_device: PhysicalDeviceHandle,
        queue_create_infos: Vec<DeviceQueueCreateInfo>,
        enabled_layers: Vec<String>,
        enabled_extensions: Vec<String>,
        /// VkPhysicalDeviceFeatures carried as raw bytes
        enabled_features: Option<Vec<u8>>,
        device: DeviceHandle,
    },
    GetDeviceQueue {
        device: DeviceHandle,
        queue_family_index: u32,
        queue_index: u32,
        queue: QueueHandle,
    },
    QueueSubmit {
        queue: QueueHandle,
        submits: Vec<SubmitInfo>,
        fence: FenceHandle,
    },
    QueueWaitIdle {
        queue: QueueHandle,
    },
    QueueBindSparse {
        queue: QueueHandle,
        bind_info: BindSparseInfo,
        fence: FenceHandle,
    },

    // ── Swapchain ───────────────────────────────────────────
    CreateSwapchainKhr {
        device: DeviceHandle,
        info: SwapchainCreateInfo,
        swapchain: SwapchainHandle,
    },
    /// `images: None` is the count-only query; `Some` is the full query.
    GetSwapchainImagesKhr {
        device: DeviceHandle,
        swapchain: SwapchainHandle,
        image_count: u32,
        images: Option<Vec<ImageHandle>>,
    },

    // ── Memory ──────────────────────────────────────────────
    AllocateMemory {
        device: DeviceHandle,
        allocation_size: u64,
        memory_type_index: u32,
        dedicated: Option<DedicatedAllocationMemoryAllocateInfoNv>,
        memory: DeviceMemoryHandle,
    },
    MapMemory {
        device: DeviceHandle,
        memory: DeviceMemoryHandle,
        offset: u64,
        size: u64,
        flags: u32,
        mapped_location: u64,
    },
    FlushMappedMemoryRanges {
        device: DeviceHandle,
        ranges: Vec<MappedMemoryRange>,
    },
    UnmapMemory {
        device: DeviceHandle,
        memory: DeviceMemoryHandle,
    },
    FreeMemory {
        device: DeviceHandle,
        memory: DeviceMemoryHandle,
    },

    // ── Buffers ─────────────────────────────────────────────
    CreateBuffer {
        device: DeviceHandle,
        info: BufferCreateInfo,
        buffer: BufferHandle,
    },
    GetBufferMemoryRequirements {
        device: DeviceHandle,
        buffer: BufferHandle,
        requirements: MemoryRequirements,
    },
    BindBufferMemory {
        device: DeviceHandle,
        buffer: BufferHandle,
        memory: DeviceMemoryHandle,
        memory_offset: u64,
    },
    DestroyBuffer {
        device: DeviceHandle,
        buffer: BufferHandle,
    },
    CreateBufferView {
        device: DeviceHandle,
        info: BufferViewCreateInfo,
        view: BufferViewHandle,
    },

    // ── Images ──────────────────────────────────────────────
    CreateImage {
        device: DeviceHandle,
        info: ImageCreateInfo,
        image: ImageHandle,
    },
    GetImageMemoryRequirements {
        device: DeviceHandle,
        image: ImageHandle,
        requirements: MemoryRequirements,
    },
    BindImageMemory {
        device: DeviceHandle,
        image: ImageHandle,
        memory: DeviceMemoryHandle,
        memory_offset: u64,
    },
    CreateImageView {
        device: DeviceHandle,
        info: ImageViewCreateInfo,
        view: ImageViewHandle,
    },
    CreateSampler {
        device: DeviceHandle,
        info: SamplerCreateInfo,
        sampler: SamplerHandle,
    },

    // ── Synchronization ─────────────────────────────────────
    CreateFence {
        device: DeviceHandle,
        signaled: bool,
        fence: FenceHandle,
    },
    CreateSemaphore {
        device: DeviceHandle,
        semaphore: SemaphoreHandle,
    },
    CreateEvent {
        device: DeviceHandle,
        event: EventHandle,
    },
    SetEvent {
        device: DeviceHandle,
        event: EventHandle,
    },

    // ── Pools / command buffers ─────────────────────────────
    CreateCommandPool {
        device: DeviceHandle,
        flags: u32,
        queue_family_index: u32,
        pool: CommandPoolHandle,
    },
    DestroyCommandPool {
        device: DeviceHandle,
        pool: CommandPoolHandle,
    },
    AllocateCommandBuffers {
        device: DeviceHandle,
        pool: CommandPoolHandle,
        level: CommandBufferLevel,
        command_buffers: Vec<CommandBufferHandle>,
    },
    BeginCommandBuffer {
        command_buffer: CommandBufferHandle,
        flags: u32,
        inheritance: Option<CommandBufferInheritanceInfo>,
    },
    EndCommandBuffer {
        command_buffer: CommandBufferHandle,
    },

    // ── Pipeline objects ────────────────────────────────────
    CreatePipelineCache {
        device: DeviceHandle,
        cache: PipelineCacheHandle,
    },
    CreateDescriptorSetLayout {
        device: DeviceHandle,
        bindings: Vec<DescriptorSetLayoutBinding>,
        layout: DescriptorSetLayoutHandle,
    },
    CreatePipelineLayout {
        device: DeviceHandle,
        set_layouts: Vec<DescriptorSetLayoutHandle>,
        push_constant_ranges: Vec<PushConstantRange>,
        layout: PipelineLayoutHandle,
    },
    DestroyPipelineLayout {
        device: DeviceHandle,
        layout: PipelineLayoutHandle,
    },
    CreateRenderPass {
        device: DeviceHandle,
        attachments: Vec<AttachmentDescription>,
        subpasses: Vec<SubpassDescription>,
        dependencies: Vec<SubpassDependency>,
        render_pass: RenderPassHandle,
    },
    DestroyRenderPass {
        device: DeviceHandle,
        render_pass: RenderPassHandle,
    },
    CreateShaderModule {
        device: DeviceHandle,
        code: Vec<u32>,
        module: ShaderModuleHandle,
    },
    DestroyShaderModule {
        device: DeviceHandle,
        module: ShaderModuleHandle,
    },
    CreateComputePipelines {
        device: DeviceHandle,
        cache: PipelineCacheHandle,
        create_info: ComputePipelineCreateInfo,
        pipeline: PipelineHandle,
    },
    CreateGraphicsPipelines {
        device: DeviceHandle,
        cache: PipelineCacheHandle,
        create_info: GraphicsPipelineCreateInfo,
        pipeline: PipelineHandle,
    },

    // ── Descriptors ─────────────────────────────────────────
    CreateDescriptorPool {
        device: DeviceHandle,
        flags: u32,
        max_sets: u32,
        pool_sizes: Vec<DescriptorPoolSize>,
        pool: DescriptorPoolHandle,
    },
    CreateFramebuffer {
        device: DeviceHandle,
        info: FramebufferCreateInfo,
        framebuffer: FramebufferHandle,
    },
    AllocateDescriptorSets {
        device: DeviceHandle,
        pool: DescriptorPoolHandle,
        set_layouts: Vec<DescriptorSetLayoutHandle>,
        sets: Vec<DescriptorSetHandle>,
    },
    UpdateDescriptorSets {
        device: DeviceHandle,
        writes: Vec<WriteDescriptorSet>,
    },

    // ── Queries ─────────────────────────────────────────────
    CreateQueryPool {
        device: DeviceHandle,
        info: QueryPoolCreateInfo,
        pool: QueryPoolHandle,
    },

    // ── Recorded commands ───────────────────────────────────
    CmdPipelineBarrier {
        command_buffer: CommandBufferHandle,
        src_stage_mask: u32,
        dst_stage_mask: u32,
        dependency_flags: u32,
        memory_barriers: Vec<MemoryBarrier>,
        buffer_memory_barriers: Vec<BufferMemoryBarrier>,
        image_memory_barriers: Vec<ImageMemoryBarrier>,
    },
    CmdCopyBuffer {
        command_buffer: CommandBufferHandle,
        src: BufferHandle,
        dst: BufferHandle,
        regions: Vec<BufferCopy>,
    },
    CmdCopyBufferToImage {
        command_buffer: CommandBufferHandle,
        src_buffer: BufferHandle,
        dst_image: ImageHandle,
        dst_image_layout: i32,
        regions: Vec<BufferImageCopy>,
    },
    CmdCopyImageToBuffer {
        command_buffer: CommandBufferHandle,
        src_image: ImageHandle,
        src_image_layout: i32,
        dst_buffer: BufferHandle,
        regions: Vec<BufferImageCopy>,
    },
    CmdFillBuffer {
        command_buffer: CommandBufferHandle,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
        data: u32,
    },
    CmdUpdateBuffer {
        command_buffer: CommandBufferHandle,
        buffer: BufferHandle,
        offset: u64,
        data: Vec<u8>,
    },
    CmdBindPipeline {
        command_buffer: CommandBufferHandle,
        pipeline_bind_point: u32,
        pipeline: PipelineHandle,
    },
    CmdBindDescriptorSets {
        command_buffer: CommandBufferHandle,
        pipeline_bind_point: u32,
        layout: PipelineLayoutHandle,
        first_set: u32,
        descriptor_sets: Vec<DescriptorSetHandle>,
        dynamic_offsets: Vec<u32>,
    },
    CmdBindVertexBuffers {
        command_buffer: CommandBufferHandle,
        first_binding: u32,
        buffers: Vec<BufferHandle>,
        offsets: Vec<u64>,
    },
    CmdBindIndexBuffer {
        command_buffer: CommandBufferHandle,
        buffer: BufferHandle,
        offset: u64,
        index_type: u32,
    },
    CmdDispatch {
        command_buffer: CommandBufferHandle,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    },
    CmdDraw {
        command_buffer: CommandBufferHandle,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    CmdDrawIndexed {
        command_buffer: CommandBufferHandle,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    CmdSetViewport {
        command_buffer: CommandBufferHandle,
        first_viewport: u32,
        viewports: Vec<Viewport>,
    },
    CmdSetScissor {
        command_buffer: CommandBufferHandle,
        first_scissor: u32,
        scissors: Vec<Rect2D>,
    },
    CmdBeginRenderPass {
        command_buffer: CommandBufferHandle,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        render_area: Rect2D,
        clear_values: Vec<ClearValue>,
        contents: u32,
    },
    CmdEndRenderPass {
        command_buffer: CommandBufferHandle,
    },
    CmdExecuteCommands {
        command_buffer: CommandBufferHandle,
        command_buffers: Vec<CommandBufferHandle>,
    },
    CmdBeginQuery {
        command_buffer: CommandBufferHandle,
        query_pool: QueryPoolHandle,
        query: u32,
        flags: u32,
    },
    CmdEndQuery {
        command_buffer: CommandBufferHandle,
        query_pool: QueryPoolHandle,
        query: u32,
    },
}

impl Command {
    /// Short entry-point name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateInstance { .. } => "CreateInstance",
            Command::EnumeratePhysicalDevices { .. } => "EnumeratePhysicalDevices",
            Command::GetPhysicalDeviceProperties { .. } => "GetPhysicalDeviceProperties",
            Command::GetPhysicalDeviceMemoryProperties { .. } => {
                "GetPhysicalDeviceMemoryProperties"
            }
            Command::GetPhysicalDeviceQueueFamilyProperties { .. } => {
                "GetPhysicalDeviceQueueFamilyProperties"
            }
            Command::CreateXcbSurfaceKhr { .. } => "CreateXcbSurfaceKHR",
            Command::CreateAndroidSurfaceKhr { .. } => "CreateAndroidSurfaceKHR",
            Command::CreateWin32SurfaceKhr { .. } => "CreateWin32SurfaceKHR",
            Command::CreateWaylandSurfaceKhr { .. } => "CreateWaylandSurfaceKHR",
            Command::CreateXlibSurfaceKhr { .. } => "CreateXlibSurfaceKHR",
            Command::CreateMirSurfaceKhr { .. } => "CreateMirSurfaceKHR",
            Command::CreateDevice { .. } => "CreateDevice",
            Command::GetDeviceQueue { .. } => "GetDeviceQueue",
            Command::QueueSubmit { .. } => "QueueSubmit",
            Command::QueueWaitIdle { .. } => "QueueWaitIdle",
            Command::QueueBindSparse { .. } => "QueueBindSparse",
            Command::CreateSwapchainKhr { .. } => "CreateSwapchainKHR",
            Command::GetSwapchainImagesKhr { .. } => "GetSwapchainImagesKHR",
            Command::AllocateMemory { .. } => "AllocateMemory",
            Command::MapMemory { .. } => "MapMemory",
            Command::FlushMappedMemoryRanges { .. } => "FlushMappedMemoryRanges",
            Command::UnmapMemory { .. } => "UnmapMemory",
            Command::FreeMemory { .. } => "FreeMemory",
            Command::CreateBuffer { .. } => "CreateBuffer",
            Command::GetBufferMemoryRequirements { .. } => "GetBufferMemoryRequirements",
            Command::BindBufferMemory { .. } => "BindBufferMemory",
            Command::DestroyBuffer { .. } => "DestroyBuffer",
            Command::CreateBufferView { .. } => "CreateBufferView",
            Command::CreateImage { .. } => "CreateImage",
            Command::GetImageMemoryRequirements { .. } => "GetImageMemoryRequirements",
            Command::BindImageMemory { .. } => "BindImageMemory",
            Command::CreateImageView { .. } => "CreateImageView",
            Command::CreateSampler { .. } => "CreateSampler",
            Command::CreateFence { .. } => "CreateFence",
            Command::CreateSemaphore { .. } => "CreateSemaphore",
            Command::CreateEvent { .. } => "CreateEvent",
            Command::SetEvent { .. } => "SetEvent",
            Command::CreateCommandPool { .. } => "CreateCommandPool",
            Command::DestroyCommandPool { .. } => "DestroyCommandPool",
            Command::AllocateCommandBuffers { .. } => "AllocateCommandBuffers",
            Command::BeginCommandBuffer { .. } => "BeginCommandBuffer",
            Command::EndCommandBuffer { .. } => "EndCommandBuffer",
            Command::CreatePipelineCache { .. } => "CreatePipelineCache",
            Command::CreateDescriptorSetLayout { .. } => "CreateDescriptorSetLayout",
            Command::CreatePipelineLayout { .. } => "CreatePipelineLayout",
            Command::DestroyPipelineLayout { .. } => "DestroyPipelineLayout",
            Command::CreateRenderPass { .. } => "CreateRenderPass",
            Command::DestroyRenderPass { .. } => "DestroyRenderPass",
            Command::CreateShaderModule { .. } => "CreateShaderModule",
            Command::DestroyShaderModule { .. } => "DestroyShaderModule",
            Command::CreateComputePipelines { .. } => "CreateComputePipelines",
            Command::CreateGraphicsPipelines { .. } => "CreateGraphicsPipelines",
            Command::CreateDescriptorPool { .. } => "CreateDescriptorPool",
            Command::CreateFramebuffer { .. } => "CreateFramebuffer",
            Command::AllocateDescriptorSets { .. } => "AllocateDescriptorSets",
            Command::UpdateDescriptorSets { .. } => "UpdateDescriptorSets",
            Command::CreateQueryPool { .. } => "CreateQueryPool",
            Command::CmdPipelineBarrier { .. } => "CmdPipelineBarrier",
            Command::CmdCopyBuffer { .. } => "CmdCopyBuffer",
            Command::CmdCopyBufferToImage { .. } => "CmdCopyBufferToImage",
            Command::CmdCopyImageToBuffer { .. } => "CmdCopyImageToBuffer",
            Command::CmdFillBuffer { .. } => "CmdFillBuffer",
            Command::CmdUpdateBuffer { .. } => "CmdUpdateBuffer",
            Command::CmdBindPipeline { .. } => "CmdBindPipeline",
            Command::CmdBindDescriptorSets { .. } => "CmdBindDescriptorSets",
            Command::CmdBindVertexBuffers { .. } => "CmdBindVertexBuffers",
            Command::CmdBindIndexBuffer { .. } => "CmdBindIndexBuffer",
            Command::CmdDispatch { .. } => "CmdDispatch",
            Command::CmdDraw { .. } => "CmdDraw",
            Command::CmdDrawIndexed { .. } => "CmdDrawIndexed",
            Command::CmdSetViewport { .. } => "CmdSetViewport",
            Command::CmdSetScissor { .. } => "CmdSetScissor",
            Command::CmdBeginRenderPass { .. } => "CmdBeginRenderPass",
            Command::CmdEndRenderPass { .. } => "CmdEndRenderPass",
            Command::CmdExecuteCommands { .. } => "CmdExecuteCommands",
            Command::CmdBeginQuery { .. } => "CmdBeginQuery",
            Command::CmdEndQuery { .. } => "CmdEndQuery",
        }
    }
}
