//! Logical device, queue, and swapchain recreation.

use std::collections::BTreeMap;

use ash::vk;

use midroll_protocol::commands::*;
use midroll_protocol::Command;
use midroll_state::snapshot::{DeviceRecord, QueueRecord, SwapchainRecord};

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    /// Queues are aggregated per family into one `DeviceQueueCreateInfo`,
    /// with a priority array sized to the highest queue index used.
    pub(crate) fn create_device(&mut self, device: &DeviceRecord) {
        for layer in &device.enabled_layers {
            self.alloc_read(layer);
        }
        self.alloc_read(&device.enabled_layers);
        for ext in &device.enabled_extensions {
            self.alloc_read(ext);
        }
        self.alloc_read(&device.enabled_extensions);

        let mut queue_create: BTreeMap<u32, DeviceQueueCreateInfo> = BTreeMap::new();
        for queue in self.snapshot().queues.values() {
            if queue.device != device.handle {
                continue;
            }
            let entry = queue_create
                .entry(queue.family)
                .or_insert_with(|| DeviceQueueCreateInfo {
                    queue_family_index: queue.family,
                    queue_count: 0,
                    queue_priorities: Vec::new(),
                });
            entry.queue_count += 1;
            if entry.queue_priorities.len() < (queue.index + 1) as usize {
                entry.queue_priorities.resize((queue.index + 1) as usize, 0.0);
            }
            entry.queue_priorities[queue.index as usize] = queue.priority;
        }

        for info in queue_create.values() {
            self.alloc_read(&info.queue_priorities);
        }
        self.unpack_read_map(&queue_create);
        if let Some(features) = &device.enabled_features {
            self.alloc_read(features);
        }
        self.alloc_write(&device.handle);

        self.emit(Command::CreateDevice {
            physical_device: device.physical_device,
            queue_create_infos: queue_create.into_values().collect(),
            enabled_layers: device.enabled_layers.clone(),
            enabled_extensions: device.enabled_extensions.clone(),
            enabled_features: device.enabled_features.clone(),
            device: device.handle,
        });
    }

    pub(crate) fn create_queue(&mut self, queue: &QueueRecord) {
        self.alloc_write(&queue.handle);
        self.emit(Command::GetDeviceQueue {
            device: queue.device,
            queue_family_index: queue.family,
            queue_index: queue.index,
            queue: queue.handle,
        });
    }

    /// Swapchain images come into existence as a side-effect of swapchain
    /// creation; they are queried with the count/full pair and then
    /// transitioned to their captured layouts.
    pub(crate) fn create_swapchain(&mut self, swapchain: &SwapchainRecord) {
        self.alloc_read(&swapchain.info.queue_family_indices);
        self.alloc_read(&swapchain.info);
        self.alloc_write(&swapchain.handle);
        self.emit(Command::CreateSwapchainKhr {
            device: swapchain.device,
            info: swapchain.info.clone(),
            swapchain: swapchain.handle,
        });

        let count = swapchain.images.len() as u32;
        self.alloc_write(&count);
        self.emit(Command::GetSwapchainImagesKhr {
            device: swapchain.device,
            swapchain: swapchain.handle,
            image_count: count,
            images: None,
        });

        self.alloc_read(&count);
        self.alloc_write(&swapchain.images);
        self.emit(Command::GetSwapchainImagesKhr {
            device: swapchain.device,
            swapchain: swapchain.handle,
            image_count: count,
            images: Some(swapchain.images.clone()),
        });

        for handle in &swapchain.images {
            let Some(img) = self.snapshot().images.get(handle) else {
                continue;
            };
            let queue = self.queue_for(
                img.last_bound_queue,
                img.device,
                &img.info.queue_family_indices,
            );
            self.transition_image(
                img,
                vk::ImageLayout::UNDEFINED.as_raw(),
                img.layout,
                None,
                queue,
            );
        }
    }
}
