//! Overlay core: host-DOM model and the pure translation-overlay components.
mod dom;
mod extract;
mod render;
mod selectors;
mod tracker;

pub use dom::{Document, ElementData, MutationRecord, NodeId, NodeKind};
pub use extract::{emote_token, extract, EmoteMeta, LogicalPayload};
pub use render::{
    clear_all_translations, remove_translation, render, DisplayMode, BOTTOM_PIN_THRESHOLD,
    TRANSLATION_HEIGHT,
};
pub use selectors::{
    body_anchor, closest_row, is_emote_image, is_message_row, is_text_fragment, row_shape,
    RowShape, HIDDEN_ATTR, TRANSLATION_CLASS, TRANSLATION_FOR_ATTR,
};
pub use tracker::{RowState, RowTracker};
