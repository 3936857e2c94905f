//! Image recreation: sparse binding, residency-aware primable-range
//! computation, content priming, and layout transitions. Also samplers
//! and image views.

use std::collections::HashSet;

use ash::vk;
use tracing::{error, warn};

use midroll_core::format::{
    depth_element_size, element_and_texel_block_size, mip_size, next_multiple_of_8, round_up_to,
    unpack_aspect_flags,
};
use midroll_protocol::commands::*;
use midroll_protocol::handle::FenceHandle;
use midroll_protocol::Command;
use midroll_state::snapshot::{ImageRecord, ImageViewRecord, QueueRecord, SamplerRecord};

use crate::buffer::full_access_mask;
use crate::writer::StreamBuilder;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PrimeError {
    #[error("image {0:#x} has no queue to prime on")]
    NoQueue(u64),

    #[error("priming mode not implemented for image {0:#x}")]
    Unimplemented(u64),
}

/// Materializes the captured bytes of an image into its recreated
/// counterpart. Each method emits through the same stream writer and
/// returns the raw layout the image is left in on success.
pub trait ImagePrimer {
    fn prime_by_buffer_copy(
        &mut self,
        sb: &mut StreamBuilder<'_>,
        img: &ImageRecord,
        opaque_ranges: &[ImageSubresourceRange],
        queue: &QueueRecord,
        sparse_queue: Option<&QueueRecord>,
    ) -> Result<i32, PrimeError>;

    fn prime_by_rendering(
        &mut self,
        sb: &mut StreamBuilder<'_>,
        img: &ImageRecord,
        opaque_ranges: &[ImageSubresourceRange],
        queue: &QueueRecord,
        sparse_queue: Option<&QueueRecord>,
    ) -> Result<i32, PrimeError>;

    fn prime_by_image_store(
        &mut self,
        sb: &mut StreamBuilder<'_>,
        img: &ImageRecord,
        opaque_ranges: &[ImageSubresourceRange],
        queue: &QueueRecord,
        sparse_queue: Option<&QueueRecord>,
    ) -> Result<i32, PrimeError>;
}

/// Byte size and dimensions of one mip level for one aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelSize {
    pub level_size: u64,
    pub aligned_level_size: u64,
    pub level_size_in_buf: u64,
    pub aligned_level_size_in_buf: u64,
    pub width: u64,
    pub height: u64,
    pub depth: u64,
}

pub(crate) fn level_size(extent: [u32; 3], format: i32, mip_level: u32, aspect: u32) -> LevelSize {
    let block = element_and_texel_block_size(format);

    let width = mip_size(extent[0], mip_level);
    let height = mip_size(extent[1], mip_level);
    let depth = mip_size(extent[2], mip_level);
    let width_in_blocks = round_up_to(width, block.texel_block_width) as u64;
    let height_in_blocks = round_up_to(height, block.texel_block_height) as u64;

    let element_size: u64 = if aspect == vk::ImageAspectFlags::DEPTH.as_raw() {
        depth_element_size(format, false) as u64
    } else if aspect == vk::ImageAspectFlags::STENCIL.as_raw() {
        1
    } else {
        block.element_size as u64
    };
    // Depth data can occupy a different size in a transfer buffer.
    let element_size_in_buf: u64 = if aspect == vk::ImageAspectFlags::DEPTH.as_raw() {
        depth_element_size(format, true) as u64
    } else {
        element_size
    };

    let size = width_in_blocks * height_in_blocks * depth as u64 * element_size;
    let size_in_buf = width_in_blocks * height_in_blocks * depth as u64 * element_size_in_buf;

    LevelSize {
        level_size: size,
        aligned_level_size: next_multiple_of_8(size),
        level_size_in_buf: size_in_buf,
        aligned_level_size_in_buf: next_multiple_of_8(size_in_buf),
        width: width as u64,
        height: height as u64,
        depth: depth as u64,
    }
}

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_image(&mut self, img: &ImageRecord, primer: &mut dyn ImagePrimer) {
        // Swapchain images are created by the swapchain itself.
        if img.is_swapchain_image {
            return;
        }

        let trans_dst = vk::ImageUsageFlags::TRANSFER_DST.as_raw();
        let att_bits = vk::ImageUsageFlags::COLOR_ATTACHMENT.as_raw()
            | vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT.as_raw();
        let storage = vk::ImageUsageFlags::STORAGE.as_raw();

        let prime_by_copy = img.info.usage & trans_dst != 0;
        let prime_by_rendering = !prime_by_copy && img.info.usage & att_bits != 0;
        let prime_by_store =
            !prime_by_copy && !prime_by_rendering && img.info.usage & storage != 0;

        if img.info.dedicated_allocation_nv.is_some() {
            self.alloc_read(&img.info.dedicated_allocation_nv);
        }
        self.alloc_read(&img.info.queue_family_indices);
        self.alloc_read(&img.info);
        self.alloc_write(&img.handle);
        self.emit(Command::CreateImage {
            device: img.device,
            info: img.info.clone(),
            image: img.handle,
        });

        self.alloc_write(&img.memory_requirements);
        self.emit(Command::GetImageMemoryRequirements {
            device: img.device,
            image: img.handle,
            requirements: img.memory_requirements.clone(),
        });

        let dense_bound = img.bound_memory.is_some();
        let sparse_bound =
            !img.opaque_sparse_bindings.is_empty() || !img.sparse_image_bindings.is_empty();
        let sparse_binding =
            img.info.flags & vk::ImageCreateFlags::SPARSE_BINDING.as_raw() != 0;
        let sparse_residency = sparse_binding
            && img.info.flags & vk::ImageCreateFlags::SPARSE_RESIDENCY.as_raw() != 0;

        // A dedicated allocation must not be sparse-bound. Both sides are
        // checked because captures exist that miss one of them.
        let memory_record = img
            .bound_memory
            .and_then(|m| self.snapshot().device_memories.get(&m));
        let dedicated_memory_nv = memory_record.map_or(false, |m| {
            img.info.dedicated_allocation_nv.is_some() || m.dedicated_allocation_nv.is_some()
        });
        if dedicated_memory_nv {
            if img.info.dedicated_allocation_nv.is_none() {
                self.expect_nv_dedicated("VkImage", img.handle.raw());
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

        let queue = self.queue_for(
            img.last_bound_queue,
            img.device,
            &img.info.queue_family_indices,
        );
        let mut sparse_queue = None;
        let mut opaque_ranges: Vec<ImageSubresourceRange> = Vec::new();

        if sparse_bound {
            if queue.is_none() {
                return;
            }
            sparse_queue = self.sparse_queue_for(
                img.last_bound_queue,
                img.device,
                &img.info.queue_family_indices,
            );
            let Some(sq) = sparse_queue else {
                return;
            };

            let mut block_binds: Vec<SparseImageMemoryBind> = Vec::new();
            let mut seen = HashSet::new();
            for (&aspect, aspect_binding) in &img.sparse_image_bindings {
                for (&layer, layer_binding) in &aspect_binding.layers {
                    for (&level, level_binding) in &layer_binding.levels {
                        for block in &level_binding.blocks {
                            if img.info.dedicated_allocation_nv.is_some()
                                && seen.insert(block.memory)
                            {
                                if let Some(m) =
                                    self.snapshot().device_memories.get(&block.memory)
                                {
                                    self.create_device_memory(m, true);
                                }
                            }
                            block_binds.push(SparseImageMemoryBind {
                                subresource: ImageSubresource {
                                    aspect_mask: aspect,
                                    mip_level: level,
                                    array_layer: layer,
                                },
                                offset: block.offset,
                                extent: block.extent,
                                memory: block.memory,
                                memory_offset: block.memory_offset,
                                flags: block.flags,
                            });
                        }
                    }
                }
            }

            let bind_info = BindSparseInfo {
                wait_semaphores: vec![],
                buffer_binds: vec![],
                image_opaque_binds: vec![SparseImageOpaqueMemoryBindInfo {
                    image: img.handle,
                    binds: img.opaque_sparse_bindings.values().cloned().collect(),
                }],
                image_binds: vec![SparseImageMemoryBindInfo {
                    image: img.handle,
                    binds: block_binds,
                }],
                signal_semaphores: vec![],
            };
            self.unpack_read_map(&img.opaque_sparse_bindings);
            self.alloc_read(&bind_info);
            self.emit(Command::QueueBindSparse {
                queue: sq.handle,
                bind_info,
                fence: FenceHandle::NULL,
            });

            if sparse_residency {
                let mut metadata_bound = false;
                for req in &img.sparse_memory_requirements {
                    if req.format_properties.aspect_mask
                        & vk::ImageAspectFlags::METADATA.as_raw()
                        != 0
                    {
                        metadata_bound = crate::is_fully_bound(
                            req.image_mip_tail_offset,
                            req.image_mip_tail_size,
                            &img.opaque_sparse_bindings,
                        );
                    }
                }
                if metadata_bound {
                    for req in &img.sparse_memory_requirements {
                        let single_miptail = req.format_properties.flags
                            & vk::SparseImageFormatFlags::SINGLE_MIPTAIL.as_raw()
                            != 0;
                        if single_miptail {
                            if !crate::is_fully_bound(
                                req.image_mip_tail_offset,
                                req.image_mip_tail_size,
                                &img.opaque_sparse_bindings,
                            ) {
                                continue;
                            }
                            opaque_ranges.push(ImageSubresourceRange {
                                aspect_mask: img.aspect,
                                base_mip_level: req.image_mip_tail_first_lod,
                                level_count: img.info.mip_levels
                                    - req.image_mip_tail_first_lod,
                                base_array_layer: 0,
                                layer_count: img.info.array_layers,
                            });
                        } else {
                            // The mip tail is per layer; a layer is
                            // primable only when its tail is fully bound.
                            for layer in 0..img.info.array_layers {
                                let offset = req.image_mip_tail_offset
                                    + layer as u64 * req.image_mip_tail_stride;
                                if !crate::is_fully_bound(
                                    offset,
                                    req.image_mip_tail_size,
                                    &img.opaque_sparse_bindings,
                                ) {
                                    continue;
                                }
                                opaque_ranges.push(ImageSubresourceRange {
                                    aspect_mask: img.aspect,
                                    base_mip_level: req.image_mip_tail_first_lod,
                                    level_count: img.info.mip_levels
                                        - req.image_mip_tail_first_lod,
                                    base_array_layer: layer,
                                    layer_count: 1,
                                });
                            }
                        }
                    }
                }
            } else if crate::is_fully_bound(
                0,
                img.memory_requirements.size,
                &img.opaque_sparse_bindings,
            ) {
                opaque_ranges.push(ImageSubresourceRange {
                    aspect_mask: img.aspect,
                    base_mip_level: 0,
                    level_count: img.info.mip_levels,
                    base_array_layer: 0,
                    layer_count: img.info.array_layers,
                });
            }
        } else {
            let Some(memory) = memory_record else {
                return;
            };
            opaque_ranges.push(ImageSubresourceRange {
                aspect_mask: img.aspect,
                base_mip_level: 0,
                level_count: img.info.mip_levels,
                base_array_layer: 0,
                layer_count: img.info.array_layers,
            });
            self.emit(Command::BindImageMemory {
                device: img.device,
                image: img.handle,
                memory: memory.handle,
                memory_offset: img.bound_memory_offset,
            });
        }

        // Nothing observable is preserved through an UNDEFINED layout.
        if img.layout == vk::ImageLayout::UNDEFINED.as_raw() {
            return;
        }
        if img.info.samples != vk::SampleCountFlags::TYPE_1.as_raw() {
            self.transition_image(
                img,
                vk::ImageLayout::UNDEFINED.as_raw(),
                img.layout,
                sparse_queue,
                queue,
            );
            error!(
                "[priming the data of image: {:#x}] priming data for MS images not implemented",
                img.handle.raw()
            );
            return;
        }
        if img.last_bound_queue.is_none() {
            warn!(
                "[priming the data of image: {:#x}] image has never been used on any queue, \
                 using arbitrary queue for the priming commands",
                img.handle.raw()
            );
        }

        let Some(queue) = queue else {
            return;
        };

        let primed = if prime_by_copy {
            primer.prime_by_buffer_copy(self, img, &opaque_ranges, queue, sparse_queue)
        } else if prime_by_rendering {
            primer.prime_by_rendering(self, img, &opaque_ranges, queue, sparse_queue)
        } else if prime_by_store {
            primer.prime_by_image_store(self, img, &opaque_ranges, queue, sparse_queue)
        } else {
            Ok(vk::ImageLayout::UNDEFINED.as_raw())
        };

        match primed {
            Ok(layout_after) => {
                self.transition_image(img, layout_after, img.layout, sparse_queue, Some(queue));
            }
            Err(e) => {
                error!("[priming the data of image: {:#x}] {}", img.handle.raw(), e);
            }
        }
    }

    /// Record and submit a transient barrier moving `img` between layouts
    /// and queue families. A no-op for images never bound to a queue.
    pub(crate) fn transition_image(
        &mut self,
        img: &ImageRecord,
        old_layout: i32,
        new_layout: i32,
        old_queue: Option<&QueueRecord>,
        new_queue: Option<&QueueRecord>,
    ) {
        let Some(last_bound) = img
            .last_bound_queue
            .and_then(|h| self.snapshot().queues.get(&h))
        else {
            return;
        };
        let Some(new_queue) = new_queue else {
            return;
        };

        let (command_buffer, command_pool) = self.begin_scratch_commands(last_bound);

        let new_family = new_queue.family;
        let mut old_family = new_queue.family;
        if let Some(old_queue) = old_queue {
            old_family = old_queue.family;
        }

        let all_access = full_access_mask();
        let barrier = ImageMemoryBarrier {
            src_access_mask: all_access,
            dst_access_mask: all_access,
            old_layout,
            new_layout,
            src_queue_family_index: old_family,
            dst_queue_family_index: new_family,
            image: img.handle,
            subresource_range: ImageSubresourceRange {
                aspect_mask: img.aspect,
                base_mip_level: 0,
                level_count: img.info.mip_levels,
                base_array_layer: 0,
                layer_count: img.info.array_layers,
            },
        };
        self.alloc_read(&barrier);
        self.emit(Command::CmdPipelineBarrier {
            command_buffer,
            src_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dst_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dependency_flags: 0,
            memory_barriers: vec![],
            buffer_memory_barriers: vec![],
            image_memory_barriers: vec![barrier],
        });

        self.end_submit_and_destroy(new_queue, command_buffer, command_pool);
    }

    pub(crate) fn create_sampler(&mut self, sampler: &SamplerRecord) {
        self.alloc_read(&sampler.info);
        self.alloc_write(&sampler.handle);
        self.emit(Command::CreateSampler {
            device: sampler.device,
            info: sampler.info.clone(),
            sampler: sampler.handle,
        });
    }

    /// Skipped when the backing image was never recreated.
    pub(crate) fn create_image_view(&mut self, view: &ImageViewRecord) {
        if !self.mirror().contains_image(view.image) {
            return;
        }

        let info = ImageViewCreateInfo {
            image: view.image,
            view_type: view.view_type,
            format: view.format,
            components: view.components.clone(),
            subresource_range: view.subresource_range.clone(),
        };
        self.alloc_read(&info);
        self.alloc_write(&view.handle);
        self.emit(Command::CreateImageView {
            device: view.device,
            info,
            view: view.handle,
        });
    }
}

/// The default primer: uploads captured subresource bytes through a
/// host-visible staging buffer and `CmdCopyBufferToImage`. The rendering
/// and image-store paths are not implemented; they leave the image
/// untouched and the caller transitions the layout only.
#[derive(Debug, Default)]
pub struct TransferPrimer;

impl TransferPrimer {
    pub fn new() -> Self {
        Self
    }
}

impl ImagePrimer for TransferPrimer {
    fn prime_by_buffer_copy(
        &mut self,
        sb: &mut StreamBuilder<'_>,
        img: &ImageRecord,
        opaque_ranges: &[ImageSubresourceRange],
        queue: &QueueRecord,
        sparse_queue: Option<&QueueRecord>,
    ) -> Result<i32, PrimeError> {
        let mut contents: Vec<u8> = Vec::new();
        let mut copies: Vec<BufferImageCopy> = Vec::new();
        let mut offset = 0u64;

        for range in opaque_ranges {
            for aspect in unpack_aspect_flags(range.aspect_mask) {
                for layer in
                    range.base_array_layer..range.base_array_layer + range.layer_count
                {
                    for level in range.base_mip_level..range.base_mip_level + range.level_count
                    {
                        let sizes = level_size(img.info.extent, img.info.format, level, aspect);
                        let data = img
                            .level_data
                            .get(&aspect)
                            .and_then(|layers| layers.get(&layer))
                            .and_then(|levels| levels.get(&level))
                            .cloned()
                            .unwrap_or_else(|| vec![0u8; sizes.level_size_in_buf as usize]);

                        copies.push(BufferImageCopy {
                            buffer_offset: offset,
                            buffer_row_length: 0,
                            buffer_image_height: 0,
                            image_subresource: ImageSubresourceLayers {
                                aspect_mask: aspect,
                                mip_level: level,
                                base_array_layer: layer,
                                layer_count: 1,
                            },
                            image_offset: [0, 0, 0],
                            image_extent: [
                                sizes.width as u32,
                                sizes.height as u32,
                                sizes.depth as u32,
                            ],
                        });
                        let mut level_bytes = data;
                        level_bytes.resize(sizes.aligned_level_size_in_buf as usize, 0);
                        contents.extend_from_slice(&level_bytes);
                        offset += sizes.aligned_level_size_in_buf;
                    }
                }
            }
        }

        let Some(device) = sb.snapshot().devices.get(&img.device) else {
            return Err(PrimeError::NoQueue(img.handle.raw()));
        };

        let (scratch_buffer, scratch_memory) = sb.alloc_and_fill_scratch_buffer(
            device,
            &contents,
            vk::BufferUsageFlags::TRANSFER_SRC.as_raw(),
        );

        let (command_buffer, command_pool) = sb.begin_scratch_commands(queue);

        let all_access = full_access_mask();
        let old_family = sparse_queue.map(|q| q.family).unwrap_or(queue.family);

        let to_transfer = ImageMemoryBarrier {
            src_access_mask: all_access,
            dst_access_mask: all_access,
            old_layout: vk::ImageLayout::UNDEFINED.as_raw(),
            new_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL.as_raw(),
            src_queue_family_index: old_family,
            dst_queue_family_index: queue.family,
            image: img.handle,
            subresource_range: ImageSubresourceRange {
                aspect_mask: img.aspect,
                base_mip_level: 0,
                level_count: img.info.mip_levels,
                base_array_layer: 0,
                layer_count: img.info.array_layers,
            },
        };
        sb.alloc_read(&to_transfer);
        sb.emit(Command::CmdPipelineBarrier {
            command_buffer,
            src_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dst_stage_mask: vk::PipelineStageFlags::ALL_COMMANDS.as_raw(),
            dependency_flags: 0,
            memory_barriers: vec![],
            buffer_memory_barriers: vec![],
            image_memory_barriers: vec![to_transfer.clone()],
        });

        sb.alloc_read(&copies);
        sb.emit(Command::CmdCopyBufferToImage {
            command_buffer,
            src_buffer: scratch_buffer,
            dst_image: img.handle,
            dst_image_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL.as_raw(),
            regions: copies,
        });

        sb.end_submit_and_destroy(queue, command_buffer, command_pool);
        sb.free_scratch_buffer(device, scratch_buffer, scratch_memory);

        Ok(vk::ImageLayout::TRANSFER_DST_OPTIMAL.as_raw())
    }

    fn prime_by_rendering(
        &mut self,
        _sb: &mut StreamBuilder<'_>,
        img: &ImageRecord,
        _opaque_ranges: &[ImageSubresourceRange],
        _queue: &QueueRecord,
        _sparse_queue: Option<&QueueRecord>,
    ) -> Result<i32, PrimeError> {
        warn!(
            "[priming the data of image: {:#x}] priming by rendering not implemented, \
             transitioning layout only",
            img.handle.raw()
        );
        Ok(vk::ImageLayout::UNDEFINED.as_raw())
    }

    fn prime_by_image_store(
        &mut self,
        _sb: &mut StreamBuilder<'_>,
        img: &ImageRecord,
        _opaque_ranges: &[ImageSubresourceRange],
        _queue: &QueueRecord,
        _sparse_queue: Option<&QueueRecord>,
    ) -> Result<i32, PrimeError> {
        warn!(
            "[priming the data of image: {:#x}] priming by image store not implemented, \
             transitioning layout only",
            img.handle.raw()
        );
        Ok(vk::ImageLayout::UNDEFINED.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_size_shrinks_down_the_chain() {
        let format = vk::Format::R8G8B8A8_UNORM.as_raw();
        let color = vk::ImageAspectFlags::COLOR.as_raw();
        let l0 = level_size([64, 64, 1], format, 0, color);
        let l1 = level_size([64, 64, 1], format, 1, color);
        assert_eq!(l0.level_size, 64 * 64 * 4);
        assert_eq!(l1.level_size, 32 * 32 * 4);
        assert_eq!(l0.width, 64);
        assert_eq!(l1.width, 32);
    }

    #[test]
    fn level_size_is_aligned_to_eight() {
        let format = vk::Format::R8_UNORM.as_raw();
        let color = vk::ImageAspectFlags::COLOR.as_raw();
        let l = level_size([3, 3, 1], format, 0, color);
        assert_eq!(l.level_size, 9);
        assert_eq!(l.aligned_level_size, 16);
    }

    #[test]
    fn depth_aspect_uses_buffer_element_size() {
        let format = vk::Format::D24_UNORM_S8_UINT.as_raw();
        let depth = vk::ImageAspectFlags::DEPTH.as_raw();
        let l = level_size([4, 4, 1], format, 0, depth);
        assert_eq!(l.level_size, 4 * 4 * 3);
        assert_eq!(l.level_size_in_buf, 4 * 4 * 4);
    }
}
