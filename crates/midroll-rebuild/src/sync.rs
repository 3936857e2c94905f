//! Fence, semaphore, and event recreation, including signalled state.

use midroll_protocol::commands::SubmitInfo;
use midroll_protocol::handle::FenceHandle;
use midroll_protocol::Command;
use midroll_state::snapshot::{EventRecord, FenceRecord, SemaphoreRecord};

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_fence(&mut self, fence: &FenceRecord) {
        self.alloc_read(&fence.signaled);
        self.alloc_write(&fence.handle);
        self.emit(Command::CreateFence {
            device: fence.device,
            signaled: fence.signaled,
            fence: fence.handle,
        });
    }

    /// A signalled semaphore is recreated by an empty submit that signals
    /// it on a queue of the same device.
    pub(crate) fn create_semaphore(&mut self, semaphore: &SemaphoreRecord) {
        self.alloc_read(&0u32);
        self.alloc_write(&semaphore.handle);
        self.emit(Command::CreateSemaphore {
            device: semaphore.device,
            semaphore: semaphore.handle,
        });

        if !semaphore.signaled {
            return;
        }

        let mut queue = semaphore.last_queue;
        if !self.snapshot().queues.contains_key(&queue) {
            for q in self.snapshot().queues.values() {
                if q.device == semaphore.device {
                    queue = q.handle;
                }
            }
        }

        let submit = SubmitInfo {
            wait_semaphores: vec![],
            wait_dst_stage_masks: vec![],
            command_buffers: vec![],
            signal_semaphores: vec![semaphore.handle],
        };
        self.alloc_read(&semaphore.handle);
        self.alloc_read(&submit);
        self.emit(Command::QueueSubmit {
            queue,
            submits: vec![submit],
            fence: FenceHandle::NULL,
        });
    }

    pub(crate) fn create_event(&mut self, event: &EventRecord) {
        self.alloc_read(&0u32);
        self.alloc_write(&event.handle);
        self.emit(Command::CreateEvent {
            device: event.device,
            event: event.handle,
        });

        if event.signaled {
            self.emit(Command::SetEvent {
                device: event.device,
                event: event.handle,
            });
        }
    }
}
