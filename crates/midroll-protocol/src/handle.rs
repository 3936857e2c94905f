use serde::{Deserialize, Serialize};

/// Declares a typed handle for one Vulkan object kind.
///
/// Handles are plain 64-bit identifiers. A zero value is the null handle
/// for every kind, matching Vulkan's `VK_NULL_HANDLE`.
macro_rules! vk_handle {
    ($($(#[$attr:meta])* $name:ident,)*) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
                     Serialize, Deserialize,
                     rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
            pub struct $name(pub u64);

            impl $name {
                pub const NULL: Self = Self(0);

                pub fn is_null(self) -> bool {
                    self.0 == 0
                }

                pub fn raw(self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

vk_handle! {
    InstanceHandle,
    PhysicalDeviceHandle,
    SurfaceHandle,
    DeviceHandle,
    QueueHandle,
    SwapchainHandle,
    DeviceMemoryHandle,
    BufferHandle,
    BufferViewHandle,
    ImageHandle,
    ImageViewHandle,
    SamplerHandle,
    FenceHandle,
    SemaphoreHandle,
    EventHandle,
    CommandPoolHandle,
    CommandBufferHandle,
    PipelineCacheHandle,
    DescriptorSetLayoutHandle,
    PipelineLayoutHandle,
    RenderPassHandle,
    ShaderModuleHandle,
    /// Shared by compute and graphics pipelines, as in the API itself.
    PipelineHandle,
    DescriptorPoolHandle,
    DescriptorSetHandle,
    QueryPoolHandle,
    FramebufferHandle,
}
