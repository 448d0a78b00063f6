//! Static stage definitions.
//!
//! Stage catalogs are authored in code per entity kind and never change at
//! runtime, so definitions borrow `'static` strings.

use serde::Serialize;

/// One stage of a pipeline.
///
/// `group` partitions stages into labeled super-columns rendered left to
/// right; within a group stages keep their declaration order.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    /// The stage value stored on entities.
    pub stage: &'static str,

    /// Super-column label.
    pub group: &'static str,

    /// What the sales team is trying to achieve while an entity sits here.
    pub objective: &'static str,
}

impl StageDefinition {
    /// Shorthand used by the catalogs.
    pub const fn new(stage: &'static str, group: &'static str, objective: &'static str) -> Self {
        Self {
            stage,
            group,
            objective,
        }
    }
}
