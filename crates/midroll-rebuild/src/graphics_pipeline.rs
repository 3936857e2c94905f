//! Graphics-pipeline recreation, including temporary shader modules,
//! layouts, and render passes for collaborators destroyed before capture.

use midroll_protocol::commands::*;
use midroll_protocol::handle::PipelineCacheHandle;
use midroll_protocol::handle::PipelineHandle;
use midroll_protocol::Command;
use midroll_state::snapshot::GraphicsPipelineRecord;

use crate::writer::StreamBuilder;

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_graphics_pipeline(
        &mut self,
        pipeline: &GraphicsPipelineRecord,
        orphaned: bool,
    ) {
        let cache = pipeline.cache.unwrap_or(PipelineCacheHandle::NULL);

        let mut base_pipeline = PipelineHandle::NULL;
        if !orphaned
            && !pipeline.base_pipeline.is_null()
            && self
                .mirror()
                .contains_graphics_pipeline(pipeline.base_pipeline)
        {
            base_pipeline = pipeline.base_pipeline;
        }

        // Recreate destroyed collaborators first. These sub-builds emit
        // commands of their own and drain the pending observations with
        // them; none of the pipeline's staging may happen before this
        // point, or it would be attached to the wrong command.
        let mut temporary_modules = Vec::new();
        for stage in pipeline.stages.values() {
            if !self.mirror().contains_shader_module(stage.module.handle) {
                self.create_shader_module(&stage.module);
                temporary_modules.push(&stage.module);
            }
        }

        let mut temporary_layout = false;
        if !self.mirror().contains_pipeline_layout(pipeline.layout.handle) {
            self.create_pipeline_layout(&pipeline.layout);
            temporary_layout = true;
        }

        let mut temporary_render_pass = false;
        if !self.mirror().contains_render_pass(pipeline.render_pass.handle) {
            self.create_render_pass(&pipeline.render_pass);
            temporary_render_pass = true;
        }

        let mut stages = Vec::with_capacity(pipeline.stages.len());
        for stage in pipeline.stages.values() {
            stages.push(self.stage_info(stage));
        }
        self.alloc_read(&stages);

        self.alloc_read(&pipeline.vertex_input_state.vertex_binding_descriptions);
        self.alloc_read(&pipeline.vertex_input_state.vertex_attribute_descriptions);
        self.alloc_read(&pipeline.vertex_input_state);
        self.alloc_read(&pipeline.input_assembly_state);

        if let Some(tessellation) = &pipeline.tessellation_state {
            self.alloc_read(tessellation);
        }
        if let Some(viewport) = &pipeline.viewport_state {
            if !viewport.viewports.is_empty() {
                self.alloc_read(&viewport.viewports);
            }
            if !viewport.scissors.is_empty() {
                self.alloc_read(&viewport.scissors);
            }
            self.alloc_read(viewport);
        }
        self.alloc_read(&pipeline.rasterization_state);
        if let Some(multisample) = &pipeline.multisample_state {
            if !multisample.sample_mask.is_empty() {
                self.alloc_read(&multisample.sample_mask);
            }
            self.alloc_read(multisample);
        }
        if let Some(depth_stencil) = &pipeline.depth_stencil_state {
            self.alloc_read(depth_stencil);
        }
        if let Some(color_blend) = &pipeline.color_blend_state {
            if !color_blend.attachments.is_empty() {
                self.alloc_read(&color_blend.attachments);
            }
            self.alloc_read(color_blend);
        }
        if let Some(dynamic) = &pipeline.dynamic_state {
            if !dynamic.dynamic_states.is_empty() {
                self.alloc_read(&dynamic.dynamic_states);
            }
            self.alloc_read(dynamic);
        }

        let create_info = GraphicsPipelineCreateInfo {
            flags: pipeline.flags,
            stages,
            vertex_input_state: pipeline.vertex_input_state.clone(),
            input_assembly_state: pipeline.input_assembly_state.clone(),
            tessellation_state: pipeline.tessellation_state.clone(),
            viewport_state: pipeline.viewport_state.clone(),
            rasterization_state: pipeline.rasterization_state.clone(),
            multisample_state: pipeline.multisample_state.clone(),
            depth_stencil_state: pipeline.depth_stencil_state.clone(),
            color_blend_state: pipeline.color_blend_state.clone(),
            dynamic_state: pipeline.dynamic_state.clone(),
            layout: pipeline.layout.handle,
            render_pass: pipeline.render_pass.handle,
            subpass: pipeline.subpass,
            base_pipeline,
        };
        self.alloc_read(&create_info);
        self.alloc_write(&pipeline.handle);
        self.emit(Command::CreateGraphicsPipelines {
            device: pipeline.device,
            cache,
            create_info,
            pipeline: pipeline.handle,
        });

        for module in temporary_modules {
            self.emit(Command::DestroyShaderModule {
                device: module.device,
                module: module.handle,
            });
        }
        if temporary_render_pass {
            self.emit(Command::DestroyRenderPass {
                device: pipeline.render_pass.device,
                render_pass: pipeline.render_pass.handle,
            });
        }
        if temporary_layout {
            self.emit(Command::DestroyPipelineLayout {
                device: pipeline.layout.device,
                layout: pipeline.layout.handle,
            });
        }
    }
}
