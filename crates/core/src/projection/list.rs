//! List projection: a flat, filterable, sortable table.

use super::Viewer;
use crate::pipeline::catalog::descriptor;
use chrono::{DateTime, Utc};
use pb_protocol::{EntityKind, PipelineEntity};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Column to sort the list by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    /// Catalog order. Archived and unknown stages sort last.
    #[default]
    Stage,
    Value,
    UpdatedAt,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Title, SortKey::Stage, SortKey::Value, SortKey::UpdatedAt];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Title => "Título",
            SortKey::Stage => "Etapa",
            SortKey::Value => "Valor",
            SortKey::UpdatedAt => "Actualizado",
        }
    }

    /// The next key, wrapping around.
    pub fn next(self) -> SortKey {
        let index = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "stage" => Ok(SortKey::Stage),
            "value" => Ok(SortKey::Value),
            "updated" | "updated-at" | "updatedat" => Ok(SortKey::UpdatedAt),
            other => Err(format!("unknown sort key '{other}' (expected title, stage, value or updated)")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Filter and order applied to the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Case-insensitive match on title or id.
    pub text: Option<String>,
    /// Only this exact stage.
    pub stage: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

/// One table row.
#[derive(Debug, Clone, Serialize)]
pub struct ListRow {
    pub entity: PipelineEntity,
    pub group: Option<&'static str>,
    pub value: Option<f64>,
    pub archived: bool,
}

/// Build list rows for the visible entities of a kind.
///
/// Archived entities stay listed (flagged) so they remain reachable.
pub fn list(kind: EntityKind, entities: &[PipelineEntity], viewer: &Viewer, query: &ListQuery) -> Vec<ListRow> {
    let descriptor = descriptor(kind);
    let needle = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    let mut rows: Vec<ListRow> = viewer
        .visible(entities)
        .filter(|e| query.stage.as_deref().map_or(true, |stage| e.stage == stage))
        .filter(|e| {
            needle.as_deref().map_or(true, |needle| {
                e.title.to_lowercase().contains(needle) || e.id.to_lowercase().contains(needle)
            })
        })
        .map(|e| ListRow {
            group: descriptor.stage(&e.stage).map(|s| s.group),
            value: descriptor.aggregate_field.and_then(|f| e.numeric_field(f)),
            archived: descriptor.is_archive_stage(&e.stage),
            entity: e.clone(),
        })
        .collect();

    let stage_rank = |row: &ListRow| descriptor.position(&row.entity.stage).unwrap_or(usize::MAX);
    rows.sort_by(|a, b| {
        let ordering = match query.sort {
            SortKey::Title => a
                .entity
                .display_title()
                .to_lowercase()
                .cmp(&b.entity.display_title().to_lowercase()),
            SortKey::Stage => stage_rank(a).cmp(&stage_rank(b)),
            SortKey::Value => compare_values(a.value, b.value),
            SortKey::UpdatedAt => compare_times(a.entity.updated_at, b.entity.updated_at),
        };
        match query.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    rows
}

fn compare_values(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
}

// Missing timestamps sort as oldest.
fn compare_times(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    a.cmp(&b)
}
