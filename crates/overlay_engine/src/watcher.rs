use overlay_core::{closest_row, is_message_row, Document, MutationRecord, NodeId};
use overlay_logging::overlay_debug;

/// Lifecycle of the mutation observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Translation disabled; nothing observed.
    Detached,
    /// Enabled, but no valid observation root found yet; probing.
    Searching,
    /// Observing the subtree under `root`.
    Attached { root: NodeId },
}

/// Finds and follows the chat container in a page that keeps remounting it.
///
/// The host is a single-page app: the previously attached root can go stale
/// at any time. The probe runs periodically; it re-attaches whenever a
/// different valid root is found and drops back to [`WatcherState::Searching`]
/// when the current root has left the document.
#[derive(Debug)]
pub struct Watcher {
    state: WatcherState,
}

impl Watcher {
    pub fn new() -> Self {
        Self {
            state: WatcherState::Detached,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn enable(&mut self) {
        if self.state == WatcherState::Detached {
            self.state = WatcherState::Searching;
        }
    }

    pub fn disable(&mut self) {
        self.state = WatcherState::Detached;
    }

    /// Periodic probe. On a (re)attach, returns every message row currently
    /// under the new root for a one-shot backfill; otherwise returns nothing.
    pub fn probe(&mut self, doc: &Document) -> Vec<NodeId> {
        if self.state == WatcherState::Detached {
            return Vec::new();
        }
        if let WatcherState::Attached { root } = self.state {
            if !doc.is_attached(root) {
                overlay_debug!("observation root {root} left the document");
                self.state = WatcherState::Searching;
            }
        }
        let Some(root) = find_root(doc) else {
            return Vec::new();
        };
        if self.state == (WatcherState::Attached { root }) {
            return Vec::new();
        }
        overlay_debug!("attaching to observation root {root}");
        self.state = WatcherState::Attached { root };
        doc.find_all(root, is_message_row)
    }

    /// Maps one mutation batch to the affected message rows, in delivery
    /// order, deduplicated. Records outside the observed subtree are noise.
    pub fn map_mutations(&self, doc: &Document, records: &[MutationRecord]) -> Vec<NodeId> {
        let WatcherState::Attached { root } = self.state else {
            return Vec::new();
        };
        let mut rows: Vec<NodeId> = Vec::new();
        let mut push = |row: NodeId, rows: &mut Vec<NodeId>| {
            if !rows.contains(&row) {
                rows.push(row);
            }
        };
        for record in records {
            match *record {
                MutationRecord::ChildAdded(node) => {
                    if !doc.contains(node) || !doc.is_descendant_of(node, root) {
                        continue;
                    }
                    if doc.element(node).is_some() {
                        // A whole subtree arrived; scan it for rows,
                        // the added node included.
                        for row in doc.find_all(node, is_message_row) {
                            push(row, &mut rows);
                        }
                    } else if let Some(row) = closest_row(doc, node) {
                        push(row, &mut rows);
                    }
                }
                MutationRecord::CharacterData(node) => {
                    // The host rewrote text in place on a reused node.
                    if !doc.contains(node) || !doc.is_descendant_of(node, root) {
                        continue;
                    }
                    if let Some(row) = closest_row(doc, node) {
                        push(row, &mut rows);
                    }
                }
            }
        }
        rows
    }
}

impl Default for Watcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Locates a message row anywhere in the document, then climbs to its
/// nearest scrollable ancestor (falling back to the row's parent) to use as
/// the observation root.
fn find_root(doc: &Document) -> Option<NodeId> {
    let row = doc
        .find_all(doc.root(), is_message_row)
        .into_iter()
        .next()?;
    doc.scroll_container(row).or_else(|| doc.parent(row))
}
