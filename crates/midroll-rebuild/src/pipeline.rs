//! Pipeline caches, shader modules, compute pipelines, and the base-chain
//! ordering shared with the graphics path.

use std::collections::BTreeSet;

use midroll_protocol::commands::*;
use midroll_protocol::handle::*;
use midroll_protocol::Command;
use midroll_state::snapshot::{
    ComputePipelineRecord, PipelineCacheRecord, ShaderModuleRecord, ShaderStageRecord, Snapshot,
    SpecializationRecord,
};

use crate::writer::StreamBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipelineKind {
    Compute,
    Graphics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PipelineScheduleEntry {
    pub handle: PipelineHandle,
    /// Set for members of a base-chain cycle (or chains with dangling
    /// bases); these are emitted without a base pipeline handle.
    pub orphaned: bool,
}

/// Order pipelines so every base precedes its derivatives.
///
/// Two-phase scan: roots (no base) seed the order in key order, then
/// derivatives are appended as their bases are placed. Whatever remains
/// after a pass with no progress is cyclic or dangling and is appended in
/// key order, flagged so emission drops the base reference.
pub(crate) fn pipelines_in_order(snapshot: &Snapshot, kind: PipelineKind) -> Vec<PipelineScheduleEntry> {
    let bases: Vec<(PipelineHandle, PipelineHandle)> = match kind {
        PipelineKind::Compute => snapshot
            .compute_pipelines
            .values()
            .map(|p| (p.handle, p.base_pipeline))
            .collect(),
        PipelineKind::Graphics => snapshot
            .graphics_pipelines
            .values()
            .map(|p| (p.handle, p.base_pipeline))
            .collect(),
    };

    let mut ordered = Vec::with_capacity(bases.len());
    let mut placed: BTreeSet<PipelineHandle> = BTreeSet::new();
    let mut remaining: Vec<(PipelineHandle, PipelineHandle)> = Vec::new();

    for (handle, base) in bases {
        if base.is_null() {
            ordered.push(PipelineScheduleEntry {
                handle,
                orphaned: false,
            });
            placed.insert(handle);
        } else {
            remaining.push((handle, base));
        }
    }

    loop {
        let before = remaining.len();
        remaining.retain(|&(handle, base)| {
            if placed.contains(&base) {
                ordered.push(PipelineScheduleEntry {
                    handle,
                    orphaned: false,
                });
                placed.insert(handle);
                false
            } else {
                true
            }
        });
        if remaining.is_empty() || remaining.len() == before {
            break;
        }
    }

    for (handle, _) in remaining {
        ordered.push(PipelineScheduleEntry {
            handle,
            orphaned: true,
        });
    }

    ordered
}

impl<'a> StreamBuilder<'a> {
    pub(crate) fn create_pipeline_cache(&mut self, cache: &PipelineCacheRecord) {
        self.alloc_read(&0u64);
        self.alloc_write(&cache.handle);
        self.emit(Command::CreatePipelineCache {
            device: cache.device,
            cache: cache.handle,
        });
    }

    pub(crate) fn create_shader_module(&mut self, module: &ShaderModuleRecord) {
        self.alloc_read(&module.words);
        self.alloc_read(&(module.words.len() as u64 * 4));
        self.alloc_write(&module.handle);
        self.emit(Command::CreateShaderModule {
            device: module.device,
            code: module.words.clone(),
            module: module.handle,
        });
    }

    /// Build the shader-stage payload, staging the specialization data and
    /// entry point as read observations.
    pub(crate) fn stage_info(&mut self, stage: &ShaderStageRecord) -> PipelineShaderStageCreateInfo {
        let specialization = stage.specialization.as_ref().map(|s| {
            self.specialization_info(s)
        });
        self.alloc_read(&stage.entry_point);
        PipelineShaderStageCreateInfo {
            stage: stage.stage,
            module: stage.module.handle,
            entry_point: stage.entry_point.clone(),
            specialization,
        }
    }

    fn specialization_info(&mut self, spec: &SpecializationRecord) -> SpecializationInfo {
        self.alloc_read(&spec.data);
        self.unpack_read_map(&spec.entries);
        SpecializationInfo {
            map_entries: spec.entries.values().cloned().collect(),
            data: spec.data.clone(),
        }
    }

    pub(crate) fn create_compute_pipeline(
        &mut self,
        pipeline: &ComputePipelineRecord,
        orphaned: bool,
    ) {
        let cache = pipeline.cache.unwrap_or(PipelineCacheHandle::NULL);

        let mut base_pipeline = PipelineHandle::NULL;
        if !orphaned
            && !pipeline.base_pipeline.is_null()
            && self.mirror().contains_compute_pipeline(pipeline.base_pipeline)
        {
            base_pipeline = pipeline.base_pipeline;
        }

        // Recreate destroyed collaborators first; each sub-build drains
        // its own pending observations, so these must not be interleaved
        // with the pipeline's own staging.
        let mut temporary_module: Option<&ShaderModuleRecord> = None;
        if !self
            .mirror()
            .contains_shader_module(pipeline.stage.module.handle)
        {
            self.create_shader_module(&pipeline.stage.module);
            temporary_module = Some(&pipeline.stage.module);
        }

        let mut temporary_layout = false;
        if !self.mirror().contains_pipeline_layout(pipeline.layout.handle) {
            self.create_pipeline_layout(&pipeline.layout);
            temporary_layout = true;
        }

        let stage = self.stage_info(&pipeline.stage);
        let create_info = ComputePipelineCreateInfo {
            flags: pipeline.flags,
            stage,
            layout: pipeline.layout.handle,
            base_pipeline,
        };
        self.alloc_read(&create_info);
        self.alloc_write(&pipeline.handle);
        self.emit(Command::CreateComputePipelines {
            device: pipeline.device,
            cache,
            create_info,
            pipeline: pipeline.handle,
        });

        if let Some(module) = temporary_module {
            self.emit(Command::DestroyShaderModule {
                device: module.device,
                module: module.handle,
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

#[cfg(test)]
mod tests {
    use super::*;
    use midroll_state::snapshot::GraphicsPipelineRecord;

    fn snapshot_with_graphics(pairs: &[(u64, u64)]) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for &(handle, base) in pairs {
            snapshot.graphics_pipelines.insert(
                PipelineHandle(handle),
                GraphicsPipelineRecord {
                    handle: PipelineHandle(handle),
                    base_pipeline: PipelineHandle(base),
                    ..Default::default()
                },
            );
        }
        snapshot
    }

    fn handles(order: &[PipelineScheduleEntry]) -> Vec<u64> {
        order.iter().map(|e| e.handle.raw()).collect()
    }

    #[test]
    fn roots_emit_in_key_order() {
        let snapshot = snapshot_with_graphics(&[(3, 0), (1, 0), (2, 0)]);
        let order = pipelines_in_order(&snapshot, PipelineKind::Graphics);
        assert_eq!(handles(&order), vec![1, 2, 3]);
        assert!(order.iter().all(|e| !e.orphaned));
    }

    #[test]
    fn derivative_follows_base() {
        let snapshot = snapshot_with_graphics(&[(1, 2), (2, 0)]);
        let order = pipelines_in_order(&snapshot, PipelineKind::Graphics);
        assert_eq!(handles(&order), vec![2, 1]);
    }

    #[test]
    fn chain_is_fully_ordered() {
        let snapshot = snapshot_with_graphics(&[(1, 2), (2, 3), (3, 0)]);
        let order = pipelines_in_order(&snapshot, PipelineKind::Graphics);
        assert_eq!(handles(&order), vec![3, 2, 1]);
    }

    #[test]
    fn cycle_members_are_orphaned() {
        let snapshot = snapshot_with_graphics(&[(1, 2), (2, 1), (3, 0)]);
        let order = pipelines_in_order(&snapshot, PipelineKind::Graphics);
        assert_eq!(order.len(), 3);
        assert_eq!(order[0].handle.raw(), 3);
        assert!(!order[0].orphaned);
        assert!(order[1].orphaned);
        assert!(order[2].orphaned);
    }

    #[test]
    fn dangling_base_is_orphaned() {
        let snapshot = snapshot_with_graphics(&[(1, 99)]);
        let order = pipelines_in_order(&snapshot, PipelineKind::Graphics);
        assert_eq!(handles(&order), vec![1]);
        assert!(order[0].orphaned);
    }
}
