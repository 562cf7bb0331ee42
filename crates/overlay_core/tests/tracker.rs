use std::collections::HashMap;

use overlay_core::{Document, RowTracker};

#[test]
fn unknown_rows_are_processed() {
    let tracker = RowTracker::new();
    assert!(tracker.should_process(42, "hello"));
}

#[test]
fn skip_requires_both_markers_to_match() {
    let mut tracker = RowTracker::new();
    tracker.mark_observed(1, "hello");
    tracker.mark_translated(1, "hello", "bonjour", HashMap::new());
    // Translated and observed agree: redundant.
    assert!(!tracker.should_process(1, "hello"));

    // Observed moved on, then reverted to the translated value: the rule
    // forces reprocessing because the last observation differs.
    tracker.mark_observed(1, "changed");
    assert!(tracker.should_process(1, "hello"));

    // Matching only the translation is not enough either way around.
    assert!(tracker.should_process(1, "changed"));
}

#[test]
fn in_flight_marker_is_exclusive_and_conditional() {
    let mut tracker = RowTracker::new();
    tracker.mark_in_flight(7, "alpha");
    assert_eq!(tracker.in_flight(7), Some("alpha"));

    // A stale job may only clear its own claim.
    tracker.clear_in_flight_if(7, "beta");
    assert_eq!(tracker.in_flight(7), Some("alpha"));
    tracker.clear_in_flight_if(7, "alpha");
    assert_eq!(tracker.in_flight(7), None);
}

#[test]
fn mark_translated_releases_a_matching_in_flight_claim() {
    let mut tracker = RowTracker::new();
    tracker.mark_in_flight(3, "text");
    tracker.mark_translated(3, "text", "texte", HashMap::new());
    assert_eq!(tracker.in_flight(3), None);
    assert_eq!(tracker.last_translated(3), Some("text"));
    let (translated, _) = tracker.last_translation(3).expect("translation");
    assert_eq!(translated, "texte");
}

#[test]
fn sweep_evicts_detached_rows_only() {
    let mut doc = Document::new();
    let root = doc.root();
    let kept = doc.append_element(root, "div");
    let dropped = doc.append_element(root, "div");

    let mut tracker = RowTracker::new();
    tracker.mark_observed(kept, "a");
    tracker.mark_observed(dropped, "b");
    assert_eq!(tracker.len(), 2);

    doc.detach(dropped);
    tracker.sweep(&doc);
    assert_eq!(tracker.len(), 1);
    assert!(tracker.state(kept).is_some());
    assert!(tracker.state(dropped).is_none());
}

#[test]
fn clear_forgets_everything() {
    let mut tracker = RowTracker::new();
    tracker.mark_observed(1, "a");
    tracker.mark_in_flight(2, "b");
    tracker.clear();
    assert!(tracker.is_empty());
    assert!(tracker.should_process(1, "a"));
}
