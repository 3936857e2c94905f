//! Render-pass and framebuffer recreation.

use midroll_protocol::commands::*;
use midroll_protocol::handle::ImageViewHandle;
use midroll_protocol::Command;
use midroll_state::snapshot::{FramebufferRecord, RenderPassRecord};

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_render_pass(&mut self, render_pass: &RenderPassRecord) {
        let mut subpasses = Vec::with_capacity(render_pass.subpasses.len());
        for subpass in render_pass.subpasses.values() {
            if let Some(depth_stencil) = &subpass.depth_stencil_attachment {
                self.alloc_read(depth_stencil);
            }
            if !subpass.resolve_attachments.is_empty() {
                self.unpack_read_map(&subpass.resolve_attachments);
            }
            self.unpack_read_map(&subpass.input_attachments);
            self.unpack_read_map(&subpass.color_attachments);
            self.unpack_read_map(&subpass.preserve_attachments);

            subpasses.push(SubpassDescription {
                flags: subpass.flags,
                pipeline_bind_point: subpass.pipeline_bind_point,
                input_attachments: subpass.input_attachments.values().cloned().collect(),
                color_attachments: subpass.color_attachments.values().cloned().collect(),
                resolve_attachments: subpass.resolve_attachments.values().cloned().collect(),
                depth_stencil_attachment: subpass.depth_stencil_attachment.clone(),
                preserve_attachments: subpass.preserve_attachments.values().copied().collect(),
            });
        }

        self.alloc_read(&subpasses);
        self.unpack_read_map(&render_pass.attachments);
        self.unpack_read_map(&render_pass.dependencies);
        self.alloc_write(&render_pass.handle);
        self.emit(Command::CreateRenderPass {
            device: render_pass.device,
            attachments: render_pass.attachments.values().cloned().collect(),
            subpasses,
            dependencies: render_pass.dependencies.values().cloned().collect(),
            render_pass: render_pass.handle,
        });
    }

    /// Recreates the framebuffer's render pass as a temporary when it was
    /// destroyed before capture.
    pub(crate) fn create_framebuffer(&mut self, framebuffer: &FramebufferRecord) {
        let mut temporary_render_pass = false;
        if !self
            .mirror()
            .contains_render_pass(framebuffer.render_pass.handle)
        {
            self.create_render_pass(&framebuffer.render_pass);
            temporary_render_pass = true;
        }

        let attachments: Vec<ImageViewHandle> =
            framebuffer.attachments.values().copied().collect();

        let info = FramebufferCreateInfo {
            render_pass: framebuffer.render_pass.handle,
            attachments: attachments.clone(),
            width: framebuffer.width,
            height: framebuffer.height,
            layers: framebuffer.layers,
        };
        self.alloc_read(&attachments);
        self.alloc_read(&info);
        self.alloc_write(&framebuffer.handle);
        self.emit(Command::CreateFramebuffer {
            device: framebuffer.device,
            info,
            framebuffer: framebuffer.handle,
        });

        if temporary_render_pass {
            self.emit(Command::DestroyRenderPass {
                device: framebuffer.render_pass.device,
                render_pass: framebuffer.render_pass.handle,
            });
        }
    }
}
