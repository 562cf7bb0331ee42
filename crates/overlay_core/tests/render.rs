use std::collections::HashMap;

use overlay_core::{
    clear_all_translations, emote_token, remove_translation, render, DisplayMode, Document,
    EmoteMeta, NodeId, HIDDEN_ATTR, TRANSLATION_CLASS, TRANSLATION_HEIGHT,
};

fn live_row(doc: &mut Document, parent: NodeId) -> (NodeId, NodeId) {
    let row = doc.append_element(parent, "div");
    doc.add_class(row, "chat-line__message");
    doc.set_attr(row, "data-a-target", "chat-line-message");
    let body = doc.append_element(row, "div");
    doc.set_attr(body, "data-a-target", "chat-line-message-body");
    let fragment = doc.append_element(body, "span");
    doc.set_attr(fragment, "data-a-target", "chat-message-text");
    (row, fragment)
}

fn vod_row(doc: &mut Document, parent: NodeId) -> NodeId {
    let row = doc.append_element(parent, "div");
    doc.add_class(row, "vod-message");
    let fragment = doc.append_element(row, "span");
    doc.set_attr(fragment, "data-a-target", "chat-message-text");
    doc.append_text(fragment, ": archived line");
    row
}

fn translation_elements(doc: &Document) -> Vec<NodeId> {
    doc.find_all(doc.root(), |data| data.has_class(TRANSLATION_CLASS))
}

fn emote_map(token: usize, alt: &str, src: &str) -> HashMap<String, EmoteMeta> {
    let mut map = HashMap::new();
    map.insert(
        emote_token(token),
        EmoteMeta {
            alt_text: alt.to_string(),
            image_src: src.to_string(),
            image_srcset: Some(format!("{src} 1x")),
            css_class: Some("chat-line__message--emote".to_string()),
        },
    );
    map
}

#[test]
fn renders_text_and_restores_emote_images_in_order() {
    let mut doc = Document::new();
    let root = doc.root();
    let (row, _) = live_row(&mut doc, root);

    let emotes = emote_map(0, "EMOTE_A", "x.png");
    render(
        &mut doc,
        row,
        &format!("Bonjour {}", emote_token(0)),
        &emotes,
        DisplayMode::Under,
    );

    let elements = translation_elements(&doc);
    assert_eq!(elements.len(), 1);
    let element = elements[0];

    let children = doc.children(element).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(doc.text(children[0]), Some("Bonjour "));
    let img = doc.element(children[1]).expect("img element");
    assert_eq!(img.tag, "img");
    assert_eq!(img.attr("alt"), Some("EMOTE_A"));
    assert_eq!(img.attr("src"), Some("x.png"));
    assert_eq!(img.attr("srcset"), Some("x.png 1x"));
    assert!(img.has_class("chat-line__message--emote"));
}

#[test]
fn unresolved_tokens_stay_as_literal_text() {
    let mut doc = Document::new();
    let root = doc.root();
    let (row, _) = live_row(&mut doc, root);

    // The backend invented an ordinal we never produced.
    render(
        &mut doc,
        row,
        "hola __EMOTE_9__ mundo",
        &HashMap::new(),
        DisplayMode::Under,
    );

    let element = translation_elements(&doc)[0];
    let children = doc.children(element).to_vec();
    assert_eq!(children.len(), 1);
    assert_eq!(doc.text(children[0]), Some("hola __EMOTE_9__ mundo"));
}

#[test]
fn one_element_per_row_reused_across_rerenders() {
    let mut doc = Document::new();
    let root = doc.root();
    let (row, _) = live_row(&mut doc, root);

    render(&mut doc, row, "first", &HashMap::new(), DisplayMode::Under);
    let first = translation_elements(&doc);
    render(&mut doc, row, "second", &HashMap::new(), DisplayMode::Under);
    let second = translation_elements(&doc);

    assert_eq!(first, second);
    let children = doc.children(second[0]).to_vec();
    assert_eq!(doc.text(children[0]), Some("second"));
}

#[test]
fn replace_mode_hides_originals_reversibly() {
    let mut doc = Document::new();
    let root = doc.root();
    let (row, fragment) = live_row(&mut doc, root);
    doc.append_text(fragment, "original");

    render(&mut doc, row, "texte", &HashMap::new(), DisplayMode::Replace);
    assert_eq!(
        doc.element(fragment).unwrap().attr(HIDDEN_ATTR),
        Some("1")
    );
    // The original text is still in the DOM, only marked.
    assert!(doc.text(doc.children(fragment)[0]).is_some());

    // Switching back to under restores visibility, same element.
    render(&mut doc, row, "texte", &HashMap::new(), DisplayMode::Under);
    assert_eq!(doc.element(fragment).unwrap().attr(HIDDEN_ATTR), None);
    assert_eq!(translation_elements(&doc).len(), 1);
}

#[test]
fn vod_translation_follows_the_row_as_a_sibling() {
    let mut doc = Document::new();
    let root = doc.root();
    let row = vod_row(&mut doc, root);

    render(&mut doc, row, "ligne", &HashMap::new(), DisplayMode::Under);
    render(&mut doc, row, "ligne 2", &HashMap::new(), DisplayMode::Under);

    let elements = translation_elements(&doc);
    assert_eq!(elements.len(), 1);
    let siblings = doc.children(root);
    let row_index = siblings.iter().position(|&c| c == row).unwrap();
    assert_eq!(siblings[row_index + 1], elements[0]);
}

#[test]
fn rerender_pins_scroll_only_when_near_the_bottom() {
    let mut doc = Document::new();
    let root = doc.root();
    let container = doc.append_element(root, "div");
    doc.mark_scrollable(container, 100);
    let mut rows = Vec::new();
    for _ in 0..3 {
        let (row, _) = live_row(&mut doc, container);
        doc.set_height(row, 40);
        rows.push(row);
    }

    // Pinned at the bottom: injecting height re-pins.
    doc.set_scroll_top(container, 20);
    render(&mut doc, rows[2], "t", &HashMap::new(), DisplayMode::Under);
    assert_eq!(
        doc.scroll_top(container),
        120 + TRANSLATION_HEIGHT - 100
    );

    // Scrolled up well past the threshold: position untouched.
    let mut doc = Document::new();
    let root = doc.root();
    let container = doc.append_element(root, "div");
    doc.mark_scrollable(container, 100);
    let mut rows = Vec::new();
    for _ in 0..5 {
        let (row, _) = live_row(&mut doc, container);
        doc.set_height(row, 40);
        rows.push(row);
    }
    doc.set_scroll_top(container, 0);
    render(&mut doc, rows[0], "t", &HashMap::new(), DisplayMode::Under);
    assert_eq!(doc.scroll_top(container), 0);
}

#[test]
fn remove_and_clear_restore_the_page() {
    let mut doc = Document::new();
    let root = doc.root();
    let (row_a, fragment_a) = live_row(&mut doc, root);
    doc.append_text(fragment_a, "a");
    let (row_b, fragment_b) = live_row(&mut doc, root);
    doc.append_text(fragment_b, "b");

    render(&mut doc, row_a, "x", &HashMap::new(), DisplayMode::Replace);
    render(&mut doc, row_b, "y", &HashMap::new(), DisplayMode::Replace);
    assert_eq!(translation_elements(&doc).len(), 2);

    remove_translation(&mut doc, row_a);
    assert_eq!(translation_elements(&doc).len(), 1);
    assert_eq!(doc.element(fragment_a).unwrap().attr(HIDDEN_ATTR), None);

    clear_all_translations(&mut doc);
    assert!(translation_elements(&doc).is_empty());
    assert_eq!(doc.element(fragment_b).unwrap().attr(HIDDEN_ATTR), None);
}
