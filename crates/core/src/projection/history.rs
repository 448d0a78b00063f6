//! History projection: the activity log of one kind's loaded entities.

use super::Viewer;
use pb_protocol::{ActivityRecord, EntityKind, PipelineEntity, User};
use serde::Serialize;
use std::collections::HashMap;

/// An activity record resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub record: ActivityRecord,
    pub entity_title: String,
    /// The acting user's name, or the raw id when the user is unknown.
    pub user_name: String,
}

/// Activity records whose foreign key points at a visible loaded entity
/// of `kind`, newest first.
///
/// Records pointing at missing entities are skipped silently.
pub fn history(
    kind: EntityKind,
    entities: &[PipelineEntity],
    activities: &[ActivityRecord],
    users: &[User],
    viewer: &Viewer,
) -> Vec<HistoryEntry> {
    let titles: HashMap<&str, &str> = viewer
        .visible(entities)
        .map(|e| (e.id.as_str(), e.display_title()))
        .collect();
    let names: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();

    let mut entries: Vec<HistoryEntry> = activities
        .iter()
        .filter(|r| r.subject.kind == kind)
        .filter_map(|record| {
            let title = titles.get(record.subject.entity_id.as_str())?;
            let user_name = names
                .get(record.user_id.as_str())
                .copied()
                .unwrap_or(record.user_id.as_str());
            Some(HistoryEntry {
                record: record.clone(),
                entity_title: (*title).to_string(),
                user_name: user_name.to_string(),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pb_protocol::{ActivitySubject, Role};

    fn record(kind: EntityKind, entity_id: &str, user: &str, day: u32) -> ActivityRecord {
        let mut record = ActivityRecord::stage_change(
            ActivitySubject::new(kind, entity_id),
            format!("cambio {day}"),
            user,
            Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap(),
        );
        record.id = format!("a-{day}");
        record
    }

    #[test]
    fn test_orphaned_and_foreign_records_are_excluded() {
        let entities = vec![PipelineEntity::new("so-1", "Orden 1", "Pendiente")];
        let activities = vec![
            record(EntityKind::SalesOrder, "so-1", "u-1", 1),
            record(EntityKind::SalesOrder, "so-deleted", "u-1", 2),
            record(EntityKind::Quote, "so-1", "u-1", 3),
        ];

        let entries = history(EntityKind::SalesOrder, &entities, &activities, &[], &Viewer::admin("u"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.id, "a-1");
        assert_eq!(entries[0].entity_title, "Orden 1");
    }

    #[test]
    fn test_newest_first_with_user_names() {
        let entities = vec![PipelineEntity::new("p-1", "Acme", "Nuevo")];
        let activities = vec![
            record(EntityKind::Prospect, "p-1", "u-1", 1),
            record(EntityKind::Prospect, "p-1", "u-ghost", 3),
            record(EntityKind::Prospect, "p-1", "u-1", 2),
        ];
        let users = vec![User {
            id: "u-1".to_string(),
            name: "Lucía".to_string(),
            role: Role::Salesperson,
        }];

        let entries = history(EntityKind::Prospect, &entities, &activities, &users, &Viewer::admin("u"));
        let ids: Vec<_> = entries.iter().map(|e| e.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a-3", "a-2", "a-1"]);
        assert_eq!(entries[0].user_name, "u-ghost");
        assert_eq!(entries[1].user_name, "Lucía");
    }

    #[test]
    fn test_history_respects_visibility() {
        let entities = vec![PipelineEntity::new("p-1", "Acme", "Nuevo").with_owner("u-9")];
        let activities = vec![record(EntityKind::Prospect, "p-1", "u-9", 1)];

        let viewer = Viewer::new("u-2", Role::Salesperson);
        assert!(history(EntityKind::Prospect, &entities, &activities, &[], &viewer).is_empty());
    }
}
