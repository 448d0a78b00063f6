//! Read-only views over loaded board state.
//!
//! Projections never fetch. Switching between kanban, list and history is
//! a pure re-render of what is already loaded. Every projection applies
//! the viewer's visibility first.

pub mod history;
pub mod kanban;
pub mod list;
pub mod visibility;

pub use history::{history, HistoryEntry};
pub use kanban::{kanban, KanbanColumn, KanbanGroup, KanbanProjection};
pub use list::{list, ListQuery, ListRow, SortDirection, SortKey};
pub use visibility::Viewer;
