//! Assertion helpers over event sequences.

use pb_protocol::{Event, NotificationLevel};

/// Whether a notification of the given level was emitted.
#[allow(dead_code)]
pub fn has_notification(events: &[Event], level: NotificationLevel) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::Notification { level: l, .. } if *l == level))
}

/// Number of ActivityAppended events.
#[allow(dead_code)]
pub fn appended_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::ActivityAppended { .. }))
        .count()
}

/// Position of the first event matching `predicate`.
#[allow(dead_code)]
pub fn position_of(events: &[Event], predicate: impl Fn(&Event) -> bool) -> Option<usize> {
    events.iter().position(predicate)
}

/// Assert that a move's optimistic apply precedes its activity record.
#[allow(dead_code)]
pub fn assert_applied_before_appended(events: &[Event]) {
    let applied = position_of(events, |e| matches!(e, Event::StageApplied { .. }))
        .expect("StageApplied should be emitted");
    let appended = position_of(events, |e| matches!(e, Event::ActivityAppended { .. }))
        .expect("ActivityAppended should be emitted");
    assert!(
        applied < appended,
        "StageApplied ({applied}) should precede ActivityAppended ({appended})"
    );
}
