use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::extract::EmoteMeta;

/// Per-row memory. Associated with the row by node identity; the sweep drops
/// entries for rows the host has detached, so the table never outlives them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowState {
    pub last_observed_text: Option<String>,
    pub last_translated_text: Option<String>,
    pub last_rendered_translation: Option<String>,
    pub last_emotes: HashMap<String, EmoteMeta>,
    /// Text currently queued or executing for this row; at most one, and by
    /// construction never equal to `last_translated_text`.
    pub in_flight_text: Option<String>,
}

/// Side table of [`RowState`] keyed by row identity.
#[derive(Debug, Default)]
pub struct RowTracker {
    rows: HashMap<NodeId, RowState>,
}

impl RowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a newly observed `text` warrants pipeline work.
    ///
    /// False only when the text both matches the last successful translation
    /// and matches the last observation. Text equality is treated as
    /// sufficient identity here; a row that reverts to an older, already
    /// translated value through a path that skipped `mark_observed` would be
    /// re-skipped. That rule is inherited as-is.
    pub fn should_process(&self, row: NodeId, text: &str) -> bool {
        match self.rows.get(&row) {
            None => true,
            Some(state) => {
                !(state.last_translated_text.as_deref() == Some(text)
                    && state.last_observed_text.as_deref() == Some(text))
            }
        }
    }

    pub fn mark_observed(&mut self, row: NodeId, text: &str) {
        let state = self.rows.entry(row).or_default();
        state.last_observed_text = Some(text.to_string());
    }

    pub fn mark_translated(
        &mut self,
        row: NodeId,
        source_text: &str,
        translation: &str,
        emotes: HashMap<String, EmoteMeta>,
    ) {
        let state = self.rows.entry(row).or_default();
        state.last_translated_text = Some(source_text.to_string());
        state.last_rendered_translation = Some(translation.to_string());
        state.last_emotes = emotes;
        if state.in_flight_text.as_deref() == Some(source_text) {
            state.in_flight_text = None;
        }
    }

    pub fn mark_in_flight(&mut self, row: NodeId, text: &str) {
        let state = self.rows.entry(row).or_default();
        debug_assert!(state.last_translated_text.as_deref() != Some(text));
        state.in_flight_text = Some(text.to_string());
    }

    pub fn clear_in_flight(&mut self, row: NodeId) {
        if let Some(state) = self.rows.get_mut(&row) {
            state.in_flight_text = None;
        }
    }

    /// Clears the marker only when the given text still owns it. A job that
    /// was superseded while suspended must not clobber its successor's claim.
    pub fn clear_in_flight_if(&mut self, row: NodeId, text: &str) {
        if let Some(state) = self.rows.get_mut(&row) {
            if state.in_flight_text.as_deref() == Some(text) {
                state.in_flight_text = None;
            }
        }
    }

    pub fn in_flight(&self, row: NodeId) -> Option<&str> {
        self.rows
            .get(&row)
            .and_then(|state| state.in_flight_text.as_deref())
    }

    pub fn last_translated(&self, row: NodeId) -> Option<&str> {
        self.rows
            .get(&row)
            .and_then(|state| state.last_translated_text.as_deref())
    }

    pub fn last_translation(&self, row: NodeId) -> Option<(&str, &HashMap<String, EmoteMeta>)> {
        self.rows.get(&row).and_then(|state| {
            state
                .last_rendered_translation
                .as_deref()
                .map(|t| (t, &state.last_emotes))
        })
    }

    pub fn state(&self, row: NodeId) -> Option<&RowState> {
        self.rows.get(&row)
    }

    /// Rows currently holding a rendered translation.
    pub fn translated_rows(&self) -> Vec<NodeId> {
        let mut rows: Vec<NodeId> = self
            .rows
            .iter()
            .filter(|(_, state)| state.last_rendered_translation.is_some())
            .map(|(&row, _)| row)
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Evicts entries whose row is no longer attached to the document.
    pub fn sweep(&mut self, doc: &Document) {
        self.rows.retain(|&row, _| doc.is_attached(row));
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
