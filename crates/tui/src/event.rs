//! Event routing types for the TUI.

/// Whether a view handled an input event.
///
/// Views are asked first; keys they do not consume fall through to the
/// global bindings (quit, view switching, refresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_consumed() {
        assert!(EventStatus::Consumed.is_consumed());
        assert!(!EventStatus::NotConsumed.is_consumed());
    }
}
