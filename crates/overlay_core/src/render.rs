use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::extract::EmoteMeta;
use crate::selectors::{
    body_anchor, is_text_fragment, is_translation_element, HIDDEN_ATTR, TRANSLATION_CLASS,
    TRANSLATION_FOR_ATTR,
};

/// How a translation is presented relative to the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Original stays visible; translation shown as a dimmed block beneath.
    #[default]
    Under,
    /// Original hidden behind a reversible marker; translation shown inline.
    Replace,
}

const UNDER_CLASS: &str = "chat-translation--under";
const REPLACE_CLASS: &str = "chat-translation--replace";
const TOKEN_PREFIX: &str = "__EMOTE_";

/// Nominal height the injected element contributes to the scroll content.
pub const TRANSLATION_HEIGHT: u32 = 18;

/// How close to the bottom edge (in pixels) the scroll container must be for
/// the renderer to re-pin it after injecting extra height.
pub const BOTTOM_PIN_THRESHOLD: u32 = 30;

/// Materializes or updates the single translation element of `row`.
///
/// Placeholder tokens are substituted back into emote images; a token the
/// backend altered beyond recognition is kept as literal text rather than
/// dropped. The user's scroll position is preserved: only a container already
/// pinned near its bottom edge is re-pinned after the mutation.
pub fn render(
    doc: &mut Document,
    row: NodeId,
    translated: &str,
    emotes: &HashMap<String, EmoteMeta>,
    mode: DisplayMode,
) {
    if !doc.is_attached(row) {
        return;
    }
    let container = doc.scroll_container(row);
    let pinned = container
        .is_some_and(|c| doc.distance_from_bottom(c) <= BOTTOM_PIN_THRESHOLD);

    let element = ensure_element(doc, row);
    set_mode_class(doc, element, mode);
    rebuild_content(doc, element, translated, emotes);
    set_original_visibility(doc, row, mode);

    if pinned {
        if let Some(c) = container {
            doc.pin_to_bottom(c);
        }
    }
}

/// Removes the row's translation element and restores its hidden original.
pub fn remove_translation(doc: &mut Document, row: NodeId) {
    if let Some(element) = translation_element(doc, row) {
        doc.detach(element);
    }
    set_original_visibility(doc, row, DisplayMode::Under);
}

/// Global teardown: every injected element removed, every hidden original
/// restored. Used when translation is disabled.
pub fn clear_all_translations(doc: &mut Document) {
    let root = doc.root();
    for element in doc.find_all(root, is_translation_element) {
        doc.detach(element);
    }
    for element in doc.find_all(root, |data| data.attr(HIDDEN_ATTR).is_some()) {
        doc.remove_attr(element, HIDDEN_ATTR);
    }
}

fn translation_element(doc: &Document, row: NodeId) -> Option<NodeId> {
    if let Some(element) = doc
        .find_all(row, is_translation_element)
        .into_iter()
        .next()
    {
        return Some(element);
    }
    // VOD shape: the element is a following sibling tagged with the row id.
    let parent = doc.parent(row)?;
    let row_tag = row.to_string();
    doc.children(parent)
        .iter()
        .copied()
        .find(|&child| {
            doc.element(child).is_some_and(|data| {
                is_translation_element(data) && data.attr(TRANSLATION_FOR_ATTR) == Some(&row_tag)
            })
        })
}

fn ensure_element(doc: &mut Document, row: NodeId) -> NodeId {
    if let Some(element) = translation_element(doc, row) {
        return element;
    }
    let element = doc.create_element("div");
    doc.add_class(element, TRANSLATION_CLASS);
    doc.set_attr(element, TRANSLATION_FOR_ATTR, &row.to_string());
    doc.set_height(element, TRANSLATION_HEIGHT);
    match body_anchor(doc, row) {
        Some(anchor) => doc.append_child(anchor, element),
        None => doc.insert_after(row, element),
    }
    element
}

fn set_mode_class(doc: &mut Document, element: NodeId, mode: DisplayMode) {
    doc.remove_class(element, UNDER_CLASS);
    doc.remove_class(element, REPLACE_CLASS);
    let class = match mode {
        DisplayMode::Under => UNDER_CLASS,
        DisplayMode::Replace => REPLACE_CLASS,
    };
    doc.add_class(element, class);
}

fn set_original_visibility(doc: &mut Document, row: NodeId, mode: DisplayMode) {
    for fragment in doc.find_all(row, is_text_fragment) {
        match mode {
            DisplayMode::Replace => doc.set_attr(fragment, HIDDEN_ATTR, "1"),
            DisplayMode::Under => doc.remove_attr(fragment, HIDDEN_ATTR),
        }
    }
}

fn rebuild_content(
    doc: &mut Document,
    element: NodeId,
    translated: &str,
    emotes: &HashMap<String, EmoteMeta>,
) {
    for child in doc.children(element).to_vec() {
        doc.detach(child);
    }

    let mut text = String::new();
    let mut rest = translated;
    while let Some((start, end)) = next_token(rest) {
        let token = &rest[start..end];
        match emotes.get(token) {
            Some(meta) => {
                text.push_str(&rest[..start]);
                flush_text(doc, element, &mut text);
                append_emote(doc, element, meta);
            }
            // Unknown ordinal: the backend rewrote the token. Keep it
            // verbatim instead of dropping content.
            None => text.push_str(&rest[..end]),
        }
        rest = &rest[end..];
    }
    text.push_str(rest);
    flush_text(doc, element, &mut text);
}

/// Byte range of the next well-formed `__EMOTE_<digits>__` token, if any.
fn next_token(s: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(pos) = s[from..].find(TOKEN_PREFIX) {
        let start = from + pos;
        let digits_start = start + TOKEN_PREFIX.len();
        let digits = s[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits > 0 && s[digits_start + digits..].starts_with("__") {
            return Some((start, digits_start + digits + 2));
        }
        from = start + 2;
    }
    None
}

fn flush_text(doc: &mut Document, element: NodeId, text: &mut String) {
    if !text.is_empty() {
        doc.append_text(element, text);
        text.clear();
    }
}

fn append_emote(doc: &mut Document, element: NodeId, meta: &EmoteMeta) {
    let img = doc.create_element("img");
    doc.set_attr(img, "alt", &meta.alt_text);
    doc.set_attr(img, "src", &meta.image_src);
    if let Some(srcset) = &meta.image_srcset {
        doc.set_attr(img, "srcset", srcset);
    }
    if let Some(class) = &meta.css_class {
        for name in class.split_whitespace() {
            doc.add_class(img, name);
        }
    }
    doc.append_child(element, img);
}
