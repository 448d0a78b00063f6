//! Pipeline definitions and the pure pieces of a stage transition.
//!
//! - [`catalog`]: per-kind stage catalogs and descriptors
//! - [`guard`]: synchronous, side-effect-free transition guards
//! - [`drag`]: drag-session state machine

pub mod catalog;
pub mod drag;
pub mod guard;

pub use catalog::{descriptor, KindDescriptor};
pub use drag::{CancelReason, DragController, DragSession, DropOutcome};
pub use guard::{can_transition, GuardContext, TransitionGuardResult, TransitionKind};
