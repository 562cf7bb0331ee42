use crate::dom::{Document, ElementData, NodeId};

/// Structural markers of the two supported chat row shapes and of the
/// decorations that must be excluded from extraction. The class and
/// attribute names follow the host widget's conventions.
pub const LIVE_ROW_CLASS: &str = "chat-line__message";
pub const LIVE_ROW_TARGET: &str = "chat-line-message";
pub const VOD_ROW_CLASS: &str = "vod-message";
pub const TARGET_ATTR: &str = "data-a-target";
pub const TEXT_FRAGMENT_TARGET: &str = "chat-message-text";
pub const BODY_ANCHOR_TARGET: &str = "chat-line-message-body";
pub const EMOTE_BUTTON_CLASS: &str = "chat-line__message--emote-button";
pub const TOOLTIP_CLASS: &str = "bttv-tooltip";

/// Markers the overlay itself produces.
pub const TRANSLATION_CLASS: &str = "chat-translation";
pub const TRANSLATION_FOR_ATTR: &str = "data-translation-for";
pub const HIDDEN_ATTR: &str = "data-translation-hidden";

/// Which of the two mutually exclusive row shapes a message row has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Live chat: `div.chat-line__message[data-a-target="chat-line-message"]`.
    Live,
    /// Archived/VOD playback: `div.vod-message`.
    Vod,
}

pub fn row_shape(data: &ElementData) -> Option<RowShape> {
    if data.tag == "div"
        && data.has_class(LIVE_ROW_CLASS)
        && data.attr(TARGET_ATTR) == Some(LIVE_ROW_TARGET)
    {
        return Some(RowShape::Live);
    }
    if data.tag == "div" && data.has_class(VOD_ROW_CLASS) {
        return Some(RowShape::Vod);
    }
    None
}

pub fn is_message_row(data: &ElementData) -> bool {
    row_shape(data).is_some()
}

pub fn is_text_fragment(data: &ElementData) -> bool {
    data.attr(TARGET_ATTR) == Some(TEXT_FRAGMENT_TARGET)
}

/// Inline emotes are images carrying both an alt text and a source.
pub fn is_emote_image(data: &ElementData) -> bool {
    data.tag == "img"
        && data.attr("alt").is_some_and(|alt| !alt.is_empty())
        && data.attr("src").is_some_and(|src| !src.is_empty())
}

/// Subtrees the extractor must not read: our own injected element (feedback
/// loop), the emote picker button, and third-party tooltip overlays that
/// inject unrelated text such as channel names.
pub fn is_excluded_subtree(data: &ElementData) -> bool {
    data.has_class(TRANSLATION_CLASS)
        || data.has_class(EMOTE_BUTTON_CLASS)
        || data.has_class(TOOLTIP_CLASS)
}

pub fn is_translation_element(data: &ElementData) -> bool {
    data.has_class(TRANSLATION_CLASS)
}

/// Nearest enclosing message row of a node, the node itself included.
pub fn closest_row(doc: &Document, from: NodeId) -> Option<NodeId> {
    doc.closest(from, is_message_row)
}

/// Where the translation element goes, relative to the row.
///
/// Live rows anchor at the end of the message body; VOD rows have no such
/// container, so the element follows the whole row as a sibling.
pub fn body_anchor(doc: &Document, row: NodeId) -> Option<NodeId> {
    let shape = doc.element(row).and_then(row_shape)?;
    match shape {
        RowShape::Live => doc
            .find_all(row, |data| {
                data.attr(TARGET_ATTR) == Some(BODY_ANCHOR_TARGET)
            })
            .into_iter()
            .next()
            .or(Some(row)),
        RowShape::Vod => None,
    }
}
