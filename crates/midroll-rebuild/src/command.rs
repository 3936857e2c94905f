//! Command pools, query pools, and the replay of recorded command
//! buffers.

use tracing::warn;

use midroll_protocol::commands::*;
use midroll_protocol::handle::CommandBufferHandle;
use midroll_protocol::{Command, ProtocolError, RecordedCommand};
use midroll_state::mirror::MirrorState;
use midroll_state::snapshot::{
    CommandBufferRecord, CommandPoolRecord, QueryPoolRecord, QueryStatus, RecordingState,
};

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_command_pool(&mut self, pool: &CommandPoolRecord) {
        self.alloc_read(&(pool.flags, pool.queue_family_index));
        self.alloc_write(&pool.handle);
        self.emit(Command::CreateCommandPool {
            device: pool.device,
            flags: pool.flags,
            queue_family_index: pool.queue_family_index,
            pool: pool.handle,
        });
    }

    /// Query slots that were active or complete at capture time are
    /// re-driven with a transient begin/end submission so the pool's
    /// status matches the original.
    pub(crate) fn create_query_pool(&mut self, pool: &QueryPoolRecord) {
        let info = QueryPoolCreateInfo {
            query_type: pool.query_type,
            query_count: pool.query_count,
            pipeline_statistics: pool.pipeline_statistics,
        };
        self.alloc_read(&info);
        self.alloc_write(&pool.handle);
        self.emit(Command::CreateQueryPool {
            device: pool.device,
            info,
            pool: pool.handle,
        });

        if pool.status.iter().all(|&s| s == QueryStatus::Inactive) {
            return;
        }
        let Some(queue) = self.queue_for(None, pool.device, &[]) else {
            return;
        };

        let (command_buffer, command_pool) = self.begin_scratch_commands(queue);
        for query in 0..pool.query_count {
            let status = pool
                .status
                .get(query as usize)
                .copied()
                .unwrap_or(QueryStatus::Inactive);
            if status != QueryStatus::Inactive {
                self.emit(Command::CmdBeginQuery {
                    command_buffer,
                    query_pool: pool.handle,
                    query,
                    flags: 0,
                });
            }
            if status == QueryStatus::Complete {
                self.emit(Command::CmdEndQuery {
                    command_buffer,
                    query_pool: pool.handle,
                    query,
                });
            }
        }
        self.end_submit_and_destroy(queue, command_buffer, command_pool);
    }

    /// Replay one captured command buffer of the given level.
    ///
    /// A command that fails translation truncates the replay for this
    /// buffer: nothing further is recorded and `EndCommandBuffer` is not
    /// emitted, leaving the buffer half-recorded as captured.
    pub(crate) fn create_command_buffer(
        &mut self,
        cb: &CommandBufferRecord,
        level: CommandBufferLevel,
    ) {
        if cb.level != level {
            return;
        }

        self.alloc_read(&(cb.pool, 1u32));
        self.alloc_write(&cb.handle);
        self.emit(Command::AllocateCommandBuffers {
            device: cb.device,
            pool: cb.pool,
            level: cb.level,
            command_buffers: vec![cb.handle],
        });

        if cb.recording == RecordingState::NotStarted {
            return;
        }

        let inheritance = if cb.begin_info.inherited {
            let info = CommandBufferInheritanceInfo {
                render_pass: cb.begin_info.inherited_render_pass,
                subpass: cb.begin_info.inherited_subpass,
                framebuffer: cb.begin_info.inherited_framebuffer,
                occlusion_query_enable: cb.begin_info.inherited_occlusion_query,
                query_flags: cb.begin_info.inherited_query_flags,
                pipeline_statistics: cb.begin_info.inherited_pipeline_stats_flags,
            };
            self.alloc_read(&info);
            Some(info)
        } else {
            None
        };
        self.alloc_read(&cb.begin_info.flags);
        self.emit(Command::BeginCommandBuffer {
            command_buffer: cb.handle,
            flags: cb.begin_info.flags,
            inheritance,
        });

        for recorded in &cb.commands {
            match translate_recorded(cb.handle, recorded, self.mirror()) {
                Ok(cmd) => {
                    self.alloc_read(recorded);
                    self.emit(cmd);
                }
                Err(e) => {
                    warn!(
                        "Command Buffer {:#x} is invalid, it will not be recorded: - {}",
                        cb.handle.raw(),
                        e
                    );
                    return;
                }
            }
        }

        if cb.recording == RecordingState::Completed {
            self.emit(Command::EndCommandBuffer {
                command_buffer: cb.handle,
            });
        }
    }
}

fn invalid(kind: &str, raw: u64) -> ProtocolError {
    ProtocolError::InvalidHandle(format!("{kind} {raw:#x}"))
}

/// Translate a captured command into an emittable one, validating every
/// referenced handle against the mirror.
pub(crate) fn translate_recorded(
    command_buffer: CommandBufferHandle,
    recorded: &RecordedCommand,
    mirror: &MirrorState,
) -> Result<Command, ProtocolError> {
    let cmd = match recorded.clone() {
        RecordedCommand::BindPipeline {
            pipeline_bind_point,
            pipeline,
        } => {
            if !mirror.contains_pipeline(pipeline) {
                return Err(invalid("pipeline", pipeline.raw()));
            }
            Command::CmdBindPipeline {
                command_buffer,
                pipeline_bind_point,
                pipeline,
            }
        }
        RecordedCommand::BindDescriptorSets {
            pipeline_bind_point,
            layout,
            first_set,
            descriptor_sets,
            dynamic_offsets,
        } => {
            if !mirror.contains_pipeline_layout(layout) {
                return Err(invalid("pipeline layout", layout.raw()));
            }
            for set in &descriptor_sets {
                if !mirror.contains_descriptor_set(*set) {
                    return Err(invalid("descriptor set", set.raw()));
                }
            }
            Command::CmdBindDescriptorSets {
                command_buffer,
                pipeline_bind_point,
                layout,
                first_set,
                descriptor_sets,
                dynamic_offsets,
            }
        }
        RecordedCommand::BindVertexBuffers {
            first_binding,
            buffers,
            offsets,
        } => {
            for buffer in &buffers {
                if !mirror.contains_buffer(*buffer) {
                    return Err(invalid("buffer", buffer.raw()));
                }
            }
            Command::CmdBindVertexBuffers {
                command_buffer,
                first_binding,
                buffers,
                offsets,
            }
        }
        RecordedCommand::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        } => {
            if !mirror.contains_buffer(buffer) {
                return Err(invalid("buffer", buffer.raw()));
            }
            Command::CmdBindIndexBuffer {
                command_buffer,
                buffer,
                offset,
                index_type,
            }
        }
        RecordedCommand::Dispatch {
            group_count_x,
            group_count_y,
            group_count_z,
        } => Command::CmdDispatch {
            command_buffer,
            group_count_x,
            group_count_y,
            group_count_z,
        },
        RecordedCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        } => Command::CmdDraw {
            command_buffer,
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        },
        RecordedCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        } => Command::CmdDrawIndexed {
            command_buffer,
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        },
        RecordedCommand::PipelineBarrier {
            src_stage_mask,
            dst_stage_mask,
            dependency_flags,
            memory_barriers,
            buffer_memory_barriers,
            image_memory_barriers,
        } => {
            for barrier in &buffer_memory_barriers {
                if !mirror.contains_buffer(barrier.buffer) {
                    return Err(invalid("buffer", barrier.buffer.raw()));
                }
            }
            for barrier in &image_memory_barriers {
                if !mirror.contains_image(barrier.image) {
                    return Err(invalid("image", barrier.image.raw()));
                }
            }
            Command::CmdPipelineBarrier {
                command_buffer,
                src_stage_mask,
                dst_stage_mask,
                dependency_flags,
                memory_barriers,
                buffer_memory_barriers,
                image_memory_barriers,
            }
        }
        RecordedCommand::CopyBuffer { src, dst, regions } => {
            if !mirror.contains_buffer(src) {
                return Err(invalid("buffer", src.raw()));
            }
            if !mirror.contains_buffer(dst) {
                return Err(invalid("buffer", dst.raw()));
            }
            Command::CmdCopyBuffer {
                command_buffer,
                src,
                dst,
                regions,
            }
        }
        RecordedCommand::CopyBufferToImage {
            src_buffer,
            dst_image,
            dst_image_layout,
            regions,
        } => {
            if !mirror.contains_buffer(src_buffer) {
                return Err(invalid("buffer", src_buffer.raw()));
            }
            if !mirror.contains_image(dst_image) {
                return Err(invalid("image", dst_image.raw()));
            }
            Command::CmdCopyBufferToImage {
                command_buffer,
                src_buffer,
                dst_image,
                dst_image_layout,
                regions,
            }
        }
        RecordedCommand::CopyImageToBuffer {
            src_image,
            src_image_layout,
            dst_buffer,
            regions,
        } => {
            if !mirror.contains_image(src_image) {
                return Err(invalid("image", src_image.raw()));
            }
            if !mirror.contains_buffer(dst_buffer) {
                return Err(invalid("buffer", dst_buffer.raw()));
            }
            Command::CmdCopyImageToBuffer {
                command_buffer,
                src_image,
                src_image_layout,
                dst_buffer,
                regions,
            }
        }
        RecordedCommand::FillBuffer {
            buffer,
            offset,
            size,
            data,
        } => {
            if !mirror.contains_buffer(buffer) {
                return Err(invalid("buffer", buffer.raw()));
            }
            Command::CmdFillBuffer {
                command_buffer,
                buffer,
                offset,
                size,
                data,
            }
        }
        RecordedCommand::UpdateBuffer {
            buffer,
            offset,
            data,
        } => {
            if !mirror.contains_buffer(buffer) {
                return Err(invalid("buffer", buffer.raw()));
            }
            Command::CmdUpdateBuffer {
                command_buffer,
                buffer,
                offset,
                data,
            }
        }
        RecordedCommand::SetViewport {
            first_viewport,
            viewports,
        } => Command::CmdSetViewport {
            command_buffer,
            first_viewport,
            viewports,
        },
        RecordedCommand::SetScissor {
            first_scissor,
            scissors,
        } => Command::CmdSetScissor {
            command_buffer,
            first_scissor,
            scissors,
        },
        RecordedCommand::BeginRenderPass {
            render_pass,
            framebuffer,
            render_area,
            clear_values,
            contents,
        } => {
            if !mirror.contains_render_pass(render_pass) {
                return Err(invalid("render pass", render_pass.raw()));
            }
            if !mirror.contains_framebuffer(framebuffer) {
                return Err(invalid("framebuffer", framebuffer.raw()));
            }
            Command::CmdBeginRenderPass {
                command_buffer,
                render_pass,
                framebuffer,
                render_area,
                clear_values,
                contents,
            }
        }
        RecordedCommand::EndRenderPass => Command::CmdEndRenderPass { command_buffer },
        RecordedCommand::ExecuteCommands { command_buffers } => {
            for secondary in &command_buffers {
                if !mirror.contains_command_buffer(*secondary) {
                    return Err(invalid("command buffer", secondary.raw()));
                }
            }
            Command::CmdExecuteCommands {
                command_buffer,
                command_buffers,
            }
        }
        RecordedCommand::BeginQuery {
            query_pool,
            query,
            flags,
        } => {
            if !mirror.contains_query_pool(query_pool) {
                return Err(invalid("query pool", query_pool.raw()));
            }
            Command::CmdBeginQuery {
                command_buffer,
                query_pool,
                query,
                flags,
            }
        }
        RecordedCommand::EndQuery { query_pool, query } => {
            if !mirror.contains_query_pool(query_pool) {
                return Err(invalid("query pool", query_pool.raw()));
            }
            Command::CmdEndQuery {
                command_buffer,
                query_pool,
                query,
            }
        }
    };
    Ok(cmd)
}
