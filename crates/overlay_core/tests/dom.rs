use overlay_core::{Document, MutationRecord};

#[test]
fn node_ids_are_never_reused() {
    let mut doc = Document::new();
    let root = doc.root();
    let first = doc.append_element(root, "div");
    doc.detach(first);
    let second = doc.append_element(root, "div");
    assert_ne!(first, second);
    assert!(!doc.contains(first));
}

#[test]
fn structural_and_text_mutations_are_recorded() {
    let mut doc = Document::new();
    let root = doc.root();
    let div = doc.append_element(root, "div");
    let text = doc.append_text(div, "before");
    doc.set_text(text, "after");

    let records = doc.take_mutations();
    assert_eq!(
        records,
        vec![
            MutationRecord::ChildAdded(div),
            MutationRecord::ChildAdded(text),
            MutationRecord::CharacterData(text),
        ]
    );
    assert!(doc.take_mutations().is_empty());
    assert_eq!(doc.text(text), Some("after"));
}

#[test]
fn detach_drops_the_whole_subtree() {
    let mut doc = Document::new();
    let root = doc.root();
    let outer = doc.append_element(root, "div");
    let inner = doc.append_element(outer, "span");
    let text = doc.append_text(inner, "x");

    assert!(doc.is_attached(text));
    doc.detach(outer);
    assert!(!doc.contains(outer));
    assert!(!doc.contains(inner));
    assert!(!doc.contains(text));
    assert!(doc.children(root).is_empty());
}

#[test]
fn insert_after_places_the_node_between_siblings() {
    let mut doc = Document::new();
    let root = doc.root();
    let a = doc.append_element(root, "div");
    let b = doc.append_element(root, "div");
    let between = doc.create_element("div");
    doc.insert_after(a, between);
    assert_eq!(doc.children(root), &[a, between, b]);
    assert_eq!(doc.parent(between), Some(root));
}

#[test]
fn scroll_height_is_derived_from_descendant_heights() {
    let mut doc = Document::new();
    let root = doc.root();
    let container = doc.append_element(root, "div");
    doc.mark_scrollable(container, 100);
    for _ in 0..4 {
        let row = doc.append_element(container, "div");
        doc.set_height(row, 40);
    }

    assert_eq!(doc.scroll_height(container), 160);
    doc.set_scroll_top(container, 60);
    assert_eq!(doc.distance_from_bottom(container), 0);
    doc.set_scroll_top(container, 30);
    assert_eq!(doc.distance_from_bottom(container), 30);

    doc.pin_to_bottom(container);
    assert_eq!(doc.scroll_top(container), 60);
}

#[test]
fn scroll_container_is_the_nearest_scrollable_ancestor() {
    let mut doc = Document::new();
    let root = doc.root();
    let outer = doc.append_element(root, "div");
    doc.mark_scrollable(outer, 500);
    let inner = doc.append_element(outer, "div");
    doc.mark_scrollable(inner, 200);
    let row = doc.append_element(inner, "div");

    assert_eq!(doc.scroll_container(row), Some(inner));
    assert_eq!(doc.scroll_container(inner), Some(outer));
    assert_eq!(doc.scroll_container(outer), None);
}
