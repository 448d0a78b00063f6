//! Entity models shared by every pipeline.
//!
//! Prospects, quotes, sales orders, samples and companies are stored as
//! schemaless documents. The engine only cares about the handful of fields
//! defined on [`PipelineEntity`]; every other field is carried through
//! untouched in [`PipelineEntity::fields`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The business entities that move through a stage pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Prospect,
    Quote,
    SalesOrder,
    Sample,
    Company,
}

impl EntityKind {
    /// All kinds, in the order the board cycles through them.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Prospect,
        EntityKind::Quote,
        EntityKind::SalesOrder,
        EntityKind::Sample,
        EntityKind::Company,
    ];

    /// Human-readable plural label shown in headers.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Prospect => "Prospectos",
            EntityKind::Quote => "Cotizaciones",
            EntityKind::SalesOrder => "Órdenes de Venta",
            EntityKind::Sample => "Muestras",
            EntityKind::Company => "Empresas",
        }
    }

    /// Machine name used on the command line and in config files.
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Prospect => "prospect",
            EntityKind::Quote => "quote",
            EntityKind::SalesOrder => "sales-order",
            EntityKind::Sample => "sample",
            EntityKind::Company => "company",
        }
    }

    /// The next kind in [`EntityKind::ALL`], wrapping around.
    pub fn next(self) -> EntityKind {
        let index = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when a string does not name an entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityKind(pub String);

impl fmt::Display for UnknownEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown entity kind '{}' (expected prospect, quote, sales-order, sample or company)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEntityKind {}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    /// Accepts kebab, snake and camel case spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "prospect" | "prospects" => Ok(EntityKind::Prospect),
            "quote" | "quotes" => Ok(EntityKind::Quote),
            "salesorder" | "salesorders" | "order" => Ok(EntityKind::SalesOrder),
            "sample" | "samples" => Ok(EntityKind::Sample),
            "company" | "companies" => Ok(EntityKind::Company),
            _ => Err(UnknownEntityKind(s.to_string())),
        }
    }
}

/// The common shape of every entity rendered on a pipeline board.
///
/// Only `id` and `stage` are required. Kind-specific fields (monetary
/// values, contact data, ...) stay in `fields` so that round-tripping a
/// document through the engine never drops data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEntity {
    /// Opaque identifier, stable for the entity's lifetime.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub title: String,

    /// Current stage, drawn from the kind's stage catalog.
    pub stage: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Every other field of the document.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PipelineEntity {
    /// Create a bare entity in the given stage.
    pub fn new(id: impl Into<String>, title: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            stage: stage.into(),
            owner_id: None,
            salesperson_id: None,
            updated_at: None,
            fields: Map::new(),
        }
    }

    /// Builder helper to set an extra document field.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Builder helper to set the owner.
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Read a numeric field. Numbers stored as strings are parsed.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Title, or the id when the document has no title.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}
