//! Activity (audit) records.
//!
//! Activity records are append-only. Each one points at exactly one entity
//! through a polymorphic foreign key: the document carries one of
//! `prospectId`, `quoteId`, `salesOrderId`, `sampleId` or `companyId`.

use crate::entity_models::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of tracked event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityType {
    /// A persisted stage transition.
    #[serde(rename = "Cambio de Estado")]
    StageChange,
    #[serde(rename = "Nota")]
    Note,
    #[serde(rename = "Llamada")]
    Call,
    #[serde(rename = "Correo")]
    Email,
    #[serde(rename = "Reunión")]
    Meeting,
    /// Any type written by other tools that the engine does not know about.
    #[serde(other)]
    #[default]
    Other,
}

impl ActivityType {
    pub fn label(self) -> &'static str {
        match self {
            ActivityType::StageChange => "Cambio de Estado",
            ActivityType::Note => "Nota",
            ActivityType::Call => "Llamada",
            ActivityType::Email => "Correo",
            ActivityType::Meeting => "Reunión",
            ActivityType::Other => "Otro",
        }
    }
}

/// The entity an activity record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivitySubject {
    pub kind: EntityKind,
    pub entity_id: String,
}

impl ActivitySubject {
    pub fn new(kind: EntityKind, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
        }
    }
}

/// Name of the polymorphic foreign-key field for an entity kind.
pub fn activity_foreign_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Prospect => "prospectId",
        EntityKind::Quote => "quoteId",
        EntityKind::SalesOrder => "salesOrderId",
        EntityKind::Sample => "sampleId",
        EntityKind::Company => "companyId",
    }
}

/// An immutable audit-log entry.
///
/// Serialized with the document-store shape (`type`, `userId`, `createdAt`
/// and one foreign-key field). An empty `id` is omitted so the store can
/// assign one on insert.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "ActivityDocument", into = "ActivityDocument")]
pub struct ActivityRecord {
    pub id: String,
    pub subject: ActivitySubject,
    pub activity_type: ActivityType,
    pub description: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build a stage-change record that has not been stored yet.
    pub fn stage_change(
        subject: ActivitySubject,
        description: String,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            subject,
            activity_type: ActivityType::StageChange,
            description,
            user_id: user_id.into(),
            created_at,
        }
    }
}

/// Wire shape of an activity document.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct ActivityDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prospect_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sales_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sample_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company_id: Option<String>,
    #[serde(rename = "type")]
    activity_type: ActivityType,
    #[serde(default)]
    description: String,
    #[serde(default)]
    user_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityDocument> for ActivityRecord {
    type Error = String;

    fn try_from(doc: ActivityDocument) -> Result<Self, Self::Error> {
        let subject = [
            (EntityKind::Prospect, doc.prospect_id),
            (EntityKind::Quote, doc.quote_id),
            (EntityKind::SalesOrder, doc.sales_order_id),
            (EntityKind::Sample, doc.sample_id),
            (EntityKind::Company, doc.company_id),
        ]
        .into_iter()
        .find_map(|(kind, id)| id.map(|id| ActivitySubject::new(kind, id)))
        .ok_or_else(|| "activity record has no entity foreign key".to_string())?;

        Ok(Self {
            id: doc.id,
            subject,
            activity_type: doc.activity_type,
            description: doc.description,
            user_id: doc.user_id,
            created_at: doc.created_at,
        })
    }
}

impl From<ActivityRecord> for ActivityDocument {
    fn from(record: ActivityRecord) -> Self {
        let mut doc = ActivityDocument {
            id: record.id,
            activity_type: record.activity_type,
            description: record.description,
            user_id: record.user_id,
            created_at: record.created_at,
            ..ActivityDocument::default()
        };
        let entity_id = Some(record.subject.entity_id);
        match record.subject.kind {
            EntityKind::Prospect => doc.prospect_id = entity_id,
            EntityKind::Quote => doc.quote_id = entity_id,
            EntityKind::SalesOrder => doc.sales_order_id = entity_id,
            EntityKind::Sample => doc.sample_id = entity_id,
            EntityKind::Company => doc.company_id = entity_id,
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_foreign_key_resolves_subject() {
        let doc = json!({
            "id": "a-1",
            "salesOrderId": "so-7",
            "type": "Cambio de Estado",
            "description": "Etapa cambiada",
            "userId": "u-1",
            "createdAt": "2024-03-01T10:00:00Z"
        });

        let record: ActivityRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.subject, ActivitySubject::new(EntityKind::SalesOrder, "so-7"));
        assert_eq!(record.activity_type, ActivityType::StageChange);
    }

    #[test]
    fn test_serializes_single_foreign_key_and_omits_empty_id() {
        let record = ActivityRecord::stage_change(
            ActivitySubject::new(EntityKind::Sample, "s-1"),
            "x".to_string(),
            "u-2",
            Utc::now(),
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sampleId"], "s-1");
        assert_eq!(value["type"], "Cambio de Estado");
        assert!(value.get("id").is_none());
        assert!(value.get("prospectId").is_none());
    }

    #[test]
    fn test_missing_foreign_key_is_an_error() {
        let doc = json!({
            "id": "a-2",
            "type": "Nota",
            "createdAt": "2024-03-01T10:00:00Z"
        });
        assert!(serde_json::from_value::<ActivityRecord>(doc).is_err());
    }

    #[test]
    fn test_unknown_activity_type_maps_to_other() {
        let doc = json!({
            "companyId": "c-1",
            "type": "Visita",
            "createdAt": "2024-03-01T10:00:00Z"
        });
        let record: ActivityRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.activity_type, ActivityType::Other);
    }
}
