//! Kanban projection: stage columns grouped into super-columns.

use super::Viewer;
use crate::pipeline::catalog::descriptor;
use pb_protocol::{EntityKind, PipelineEntity, StageDefinition};
use serde::Serialize;
use tracing::debug;

/// One stage column.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn {
    pub stage: StageDefinition,
    pub entities: Vec<PipelineEntity>,
    pub count: usize,
    /// Sum of the kind's aggregate field. Missing or non-numeric values
    /// count as zero.
    pub value_total: f64,
}

/// A labeled run of columns.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanGroup {
    pub name: &'static str,
    pub columns: Vec<KanbanColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanProjection {
    pub kind: EntityKind,
    pub groups: Vec<KanbanGroup>,
    /// Visible entities on the archive stage. They are not in any column.
    pub archived: usize,
    /// Visible entities whose stage has no definition.
    pub unplaced: usize,
}

impl KanbanProjection {
    pub fn columns(&self) -> impl Iterator<Item = &KanbanColumn> {
        self.groups.iter().flat_map(|g| g.columns.iter())
    }

    pub fn column(&self, stage: &str) -> Option<&KanbanColumn> {
        self.columns().find(|c| c.stage.stage == stage)
    }

    /// Entities shown across all columns.
    pub fn total_count(&self) -> usize {
        self.columns().map(|c| c.count).sum()
    }

    /// Column holding an entity, if it is on the board.
    pub fn column_of(&self, entity_id: &str) -> Option<&KanbanColumn> {
        self.columns()
            .find(|c| c.entities.iter().any(|e| e.id == entity_id))
    }
}

/// Partition visible entities into the kind's stage columns.
///
/// Columns keep catalog order and entities keep their load order within a
/// column. Archived entities and entities on unknown stages are left out.
pub fn kanban(kind: EntityKind, entities: &[PipelineEntity], viewer: &Viewer) -> KanbanProjection {
    let descriptor = descriptor(kind);
    let visible: Vec<&PipelineEntity> = viewer.visible(entities).collect();

    let groups = descriptor
        .groups()
        .into_iter()
        .map(|(name, stages)| KanbanGroup {
            name,
            columns: stages
                .into_iter()
                .map(|stage| {
                    let members: Vec<PipelineEntity> = visible
                        .iter()
                        .filter(|e| e.stage == stage.stage)
                        .map(|e| (*e).clone())
                        .collect();
                    let value_total = descriptor.aggregate_field.map_or(0.0, |field| {
                        members.iter().filter_map(|e| e.numeric_field(field)).sum()
                    });
                    KanbanColumn {
                        stage: *stage,
                        count: members.len(),
                        entities: members,
                        value_total,
                    }
                })
                .collect(),
        })
        .collect();

    let archived = visible
        .iter()
        .filter(|e| descriptor.is_archive_stage(&e.stage))
        .count();
    let unplaced = visible
        .iter()
        .filter(|e| descriptor.stage(&e.stage).is_none() && !descriptor.is_archive_stage(&e.stage))
        .count();
    if unplaced > 0 {
        debug!(%kind, unplaced, "entities with unknown stages left off the board");
    }

    KanbanProjection {
        kind,
        groups,
        archived,
        unplaced,
    }
}
