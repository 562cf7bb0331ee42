use std::collections::{BTreeMap, HashMap};

/// Identity of one node in the host document.
///
/// Ids are monotonically increasing and never reused, so a side table keyed by
/// `NodeId` can always distinguish a detached node from a later arrival.
pub type NodeId = u64;

/// A structural or text mutation observed on the document.
///
/// Mirrors the subset of mutation-observer records the overlay consumes:
/// node insertions and in-place text rewrites. Removals are not recorded;
/// detached rows are found by the tracker's eviction sweep instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationRecord {
    ChildAdded(NodeId),
    CharacterData(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    pub tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    children: Vec<NodeId>,
    /// Nominal rendered height in pixels; contributes to an ancestor
    /// scroll container's scroll height.
    pub height: u32,
    scroll: Option<ScrollState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ScrollState {
    scroll_top: u32,
    client_height: u32,
}

impl ElementData {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_string(&self) -> String {
        self.classes.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Arena-backed mutable document standing in for the host page's DOM.
///
/// The overlay never owns host nodes; it reads them and appends its own. The
/// host side of a test (or the demo session) mutates the document the way the
/// chat widget would, and the watcher drains the recorded mutations.
#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: NodeId,
    mutations: Vec<MutationRecord>,
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            1,
            Node {
                parent: None,
                kind: NodeKind::Element(ElementData {
                    tag: "body".to_string(),
                    ..ElementData::default()
                }),
            },
        );
        Self {
            nodes,
            root: 1,
            next_id: 2,
            mutations: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// True when the node's parent chain reaches the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, Node { parent: None, kind });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData {
            tag: tag.to_string(),
            ..ElementData::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Appends `child` as the last child of `parent` and records the mutation.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes.contains_key(&parent));
        debug_assert!(self.nodes.contains_key(&child));
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&parent).map(|n| &mut n.kind) {
            data.children.push(child);
        } else {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.mutations.push(MutationRecord::ChildAdded(child));
    }

    /// Inserts `node` into the tree directly after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&parent).map(|n| &mut n.kind) {
            let index = data
                .children
                .iter()
                .position(|&c| c == sibling)
                .map(|i| i + 1)
                .unwrap_or(data.children.len());
            data.children.insert(index, node);
        } else {
            return;
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        self.mutations.push(MutationRecord::ChildAdded(node));
    }

    /// Detaches the subtree rooted at `id` and drops it from the arena,
    /// the way the host destroys rows that scroll out of its window.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(NodeKind::Element(data)) =
                self.nodes.get_mut(&parent).map(|n| &mut n.kind)
            {
                data.children.retain(|&c| c != id);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                if let NodeKind::Element(data) = node.kind {
                    stack.extend(data.children);
                }
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => &data.children,
            _ => &[],
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Rewrites a text node in place and records the mutation. This is the
    /// node-reuse path: identity survives while content changes.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(NodeKind::Text(current)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            *current = text.to_string();
            self.mutations.push(MutationRecord::CharacterData(id));
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            if !data.has_class(class) {
                data.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            data.classes.retain(|c| c != class);
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            data.attrs.remove(name);
        }
    }

    pub fn set_height(&mut self, id: NodeId, height: u32) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            data.height = height;
        }
    }

    /// Walks from `id` through its ancestors (including `id` itself) and
    /// returns the first element satisfying `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(data) = self.element(node) {
                if pred(data) {
                    return Some(node);
                }
            }
            current = self.parent(node);
        }
        None
    }

    /// Depth-first preorder walk of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.children(current);
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// All elements in the subtree of `from` (inclusive) matching `pred`,
    /// in document order.
    pub fn find_all(&self, from: NodeId, pred: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(&pred))
            .collect()
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Drains the mutation records accumulated since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    // --- scroll model -----------------------------------------------------

    /// Marks an element as a scroll container with the given viewport height.
    pub fn mark_scrollable(&mut self, id: NodeId, client_height: u32) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            data.scroll = Some(ScrollState {
                scroll_top: 0,
                client_height,
            });
        }
    }

    pub fn is_scrollable(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|data| data.scroll.is_some())
    }

    /// Nearest scrollable ancestor of `id`, excluding `id` itself.
    pub fn scroll_container(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.is_scrollable(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Content height of a container: the sum of descendant element heights.
    pub fn scroll_height(&self, id: NodeId) -> u32 {
        self.descendants(id)
            .into_iter()
            .filter(|&d| d != id)
            .filter_map(|d| self.element(d))
            .map(|data| data.height)
            .sum()
    }

    pub fn scroll_top(&self, id: NodeId) -> u32 {
        self.element(id)
            .and_then(|data| data.scroll)
            .map(|s| s.scroll_top)
            .unwrap_or(0)
    }

    pub fn client_height(&self, id: NodeId) -> u32 {
        self.element(id)
            .and_then(|data| data.scroll)
            .map(|s| s.client_height)
            .unwrap_or(0)
    }

    pub fn set_scroll_top(&mut self, id: NodeId, scroll_top: u32) {
        if let Some(NodeKind::Element(data)) = self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            if let Some(scroll) = data.scroll.as_mut() {
                scroll.scroll_top = scroll_top;
            }
        }
    }

    /// Distance in pixels between the bottom of the viewport and the bottom
    /// of the content.
    pub fn distance_from_bottom(&self, id: NodeId) -> u32 {
        let height = self.scroll_height(id);
        let seen = self.scroll_top(id) + self.client_height(id);
        height.saturating_sub(seen)
    }

    pub fn pin_to_bottom(&mut self, id: NodeId) {
        let target = self
            .scroll_height(id)
            .saturating_sub(self.client_height(id));
        self.set_scroll_top(id, target);
    }

    // --- convenience builders (host-side test and demo setup) -------------

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
