//! Descriptor-set layouts, pipeline layouts, descriptor pools, and the
//! descriptor-set update walk.

use tracing::warn;

use midroll_protocol::commands::*;
use midroll_protocol::Command;
use midroll_state::snapshot::{
    DescriptorPoolRecord, DescriptorSetLayoutRecord, DescriptorSetRecord, PipelineLayoutRecord,
};

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_descriptor_set_layout(&mut self, layout: &DescriptorSetLayoutRecord) {
        let mut bindings = Vec::with_capacity(layout.bindings.len());
        for (&index, binding) in &layout.bindings {
            if !binding.immutable_samplers.is_empty() {
                self.alloc_read(&binding.immutable_samplers);
            }
            bindings.push(DescriptorSetLayoutBinding {
                binding: index,
                descriptor_type: binding.descriptor_type,
                descriptor_count: binding.descriptor_count,
                stage_flags: binding.stage_flags,
                immutable_samplers: binding.immutable_samplers.clone(),
            });
        }

        self.alloc_read(&bindings);
        self.alloc_write(&layout.handle);
        self.emit(Command::CreateDescriptorSetLayout {
            device: layout.device,
            bindings,
            layout: layout.handle,
        });
    }

    pub(crate) fn create_pipeline_layout(&mut self, layout: &PipelineLayoutRecord) {
        self.alloc_read(&layout.set_layouts);
        self.unpack_read_map(&layout.push_constant_ranges);
        self.alloc_write(&layout.handle);
        self.emit(Command::CreatePipelineLayout {
            device: layout.device,
            set_layouts: layout.set_layouts.clone(),
            push_constant_ranges: layout.push_constant_ranges.values().cloned().collect(),
            layout: layout.handle,
        });
    }

    pub(crate) fn create_descriptor_pool(&mut self, pool: &DescriptorPoolRecord) {
        self.unpack_read_map(&pool.sizes);
        self.alloc_read(&(pool.flags, pool.max_sets));
        self.alloc_write(&pool.handle);
        self.emit(Command::CreateDescriptorPool {
            device: pool.device,
            flags: pool.flags,
            max_sets: pool.max_sets,
            pool_sizes: pool.sizes.values().cloned().collect(),
            pool: pool.handle,
        });
    }

    /// Allocate the set, then replay its bindings as one batched update.
    /// Slots whose referenced objects were never recreated are skipped
    /// and stay empty.
    pub(crate) fn create_descriptor_set(&mut self, set: &DescriptorSetRecord) {
        if !self.mirror().contains_descriptor_pool(set.pool) {
            return;
        }

        self.alloc_read(&set.layout);
        self.alloc_write(&set.handle);
        self.emit(Command::AllocateDescriptorSets {
            device: set.device,
            pool: set.pool,
            set_layouts: vec![set.layout],
            sets: vec![set.handle],
        });

        let mut writes: Vec<WriteDescriptorSet> = Vec::new();
        for (&binding_index, binding) in &set.bindings {
            match binding.descriptor_type {
                DescriptorType::Sampler
                | DescriptorType::CombinedImageSampler
                | DescriptorType::SampledImage
                | DescriptorType::StorageImage
                | DescriptorType::InputAttachment => {
                    for (i, image) in binding.image_bindings.iter().enumerate() {
                        if image.sampler.is_null() && image.image_view.is_null() {
                            continue;
                        }
                        if binding.descriptor_type == DescriptorType::CombinedImageSampler
                            && (image.sampler.is_null() || image.image_view.is_null())
                        {
                            continue;
                        }
                        if !image.sampler.is_null()
                            && !self.mirror().contains_sampler(image.sampler)
                        {
                            warn!(
                                "Sampler {:#x} is invalid, this descriptor[{:#x}] will remain empty",
                                image.sampler.raw(),
                                set.handle.raw()
                            );
                            continue;
                        }
                        if !image.image_view.is_null()
                            && !self.mirror().contains_image_view(image.image_view)
                        {
                            warn!(
                                "ImageView {:#x} is invalid, this descriptor[{:#x}] will remain empty",
                                image.sampler.raw(),
                                set.handle.raw()
                            );
                            continue;
                        }

                        self.alloc_read(image);
                        writes.push(WriteDescriptorSet {
                            dst_set: set.handle,
                            dst_binding: binding_index,
                            dst_array_element: i as u32,
                            descriptor_count: 1,
                            descriptor_type: binding.descriptor_type,
                            image_infos: vec![image.clone()],
                            buffer_infos: vec![],
                            texel_buffer_views: vec![],
                        });
                    }
                }

                DescriptorType::UniformBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic => {
                    for (i, buffer) in binding.buffer_bindings.iter().enumerate() {
                        if buffer.buffer.is_null() {
                            continue;
                        }
                        if !self.mirror().contains_buffer(buffer.buffer) {
                            warn!(
                                "Buffer {:#x} is invalid, this descriptor[{:#x}] will remain empty",
                                buffer.buffer.raw(),
                                set.handle.raw()
                            );
                            continue;
                        }

                        self.alloc_read(buffer);
                        writes.push(WriteDescriptorSet {
                            dst_set: set.handle,
                            dst_binding: binding_index,
                            dst_array_element: i as u32,
                            descriptor_count: 1,
                            descriptor_type: binding.descriptor_type,
                            image_infos: vec![],
                            buffer_infos: vec![buffer.clone()],
                            texel_buffer_views: vec![],
                        });
                    }
                }

                DescriptorType::UniformTexelBuffer | DescriptorType::StorageTexelBuffer => {
                    for (i, view) in binding.buffer_view_bindings.iter().enumerate() {
                        if view.is_null() {
                            continue;
                        }
                        if !self.mirror().contains_buffer_view(*view) {
                            warn!(
                                "BufferView {:#x} is invalid, this descriptor[{:#x}] will remain empty",
                                view.raw(),
                                set.handle.raw()
                            );
                            continue;
                        }

                        self.alloc_read(view);
                        writes.push(WriteDescriptorSet {
                            dst_set: set.handle,
                            dst_binding: binding_index,
                            dst_array_element: i as u32,
                            descriptor_count: 1,
                            descriptor_type: binding.descriptor_type,
                            image_infos: vec![],
                            buffer_infos: vec![],
                            texel_buffer_views: vec![*view],
                        });
                    }
                }
            }
        }

        self.alloc_read(&writes);
        self.emit(Command::UpdateDescriptorSets {
            device: set.device,
            writes,
        });
    }
}
