//! Board state management.
//!
//! This module provides:
//! - BoardState, the loaded collections plus unsettled moves
//! - BoardManager for serving UI operations against that state

pub mod board;
pub mod manager;

pub use board::{AppliedMove, BoardState, MoveToken, Settled, Settlement};
pub use manager::BoardManager;
