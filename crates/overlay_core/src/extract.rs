use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::selectors::{
    is_emote_image, is_excluded_subtree, is_text_fragment, row_shape, RowShape,
};

/// Metadata needed to reconstruct an equivalent inline emote image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteMeta {
    pub alt_text: String,
    pub image_src: String,
    pub image_srcset: Option<String>,
    pub css_class: Option<String>,
}

/// Canonical representation of a row's current content.
///
/// `source_text` keeps emote alt text inline and is the identity used for
/// dedup and the live-text recheck; `to_translate` substitutes each emote
/// with an `__EMOTE_<n>__` placeholder. Ordinals are scoped to one extraction
/// call, so only the accompanying map is valid for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalPayload {
    pub source_text: String,
    pub to_translate: String,
    pub emotes: HashMap<String, EmoteMeta>,
}

/// Placeholder token for the `ordinal`-th emote of one extraction.
pub fn emote_token(ordinal: usize) -> String {
    format!("__EMOTE_{ordinal}__")
}

/// Derives the logical payload of a message row, or `None` when no text
/// remains (emote-only rows without alt text, rows not yet fully rendered).
///
/// Deterministic: unchanged DOM content yields byte-equal `source_text`.
pub fn extract(doc: &Document, row: NodeId) -> Option<LogicalPayload> {
    let shape = doc.element(row).and_then(row_shape)?;

    let mut walk = Walk::default();
    for fragment in doc.find_all(row, is_text_fragment) {
        // A fragment nested inside an excluded decoration is itself noise.
        if inside_excluded(doc, fragment, row) {
            continue;
        }
        walk.visit(doc, fragment);
    }

    let mut source_text = collapse_whitespace(&walk.source);
    let mut to_translate = collapse_whitespace(&walk.translate);
    if shape == RowShape::Vod {
        // VOD rows emit a "username: message" artifact; drop the separator.
        source_text = strip_colon_artifact(source_text);
        to_translate = strip_colon_artifact(to_translate);
    }

    if to_translate.is_empty() {
        return None;
    }
    Some(LogicalPayload {
        source_text,
        to_translate,
        emotes: walk.emotes,
    })
}

fn inside_excluded(doc: &Document, node: NodeId, row: NodeId) -> bool {
    let mut current = doc.parent(node);
    while let Some(id) = current {
        if let Some(data) = doc.element(id) {
            if is_excluded_subtree(data) {
                return true;
            }
        }
        if id == row {
            break;
        }
        current = doc.parent(id);
    }
    false
}

#[derive(Default)]
struct Walk {
    source: String,
    translate: String,
    emotes: HashMap<String, EmoteMeta>,
}

impl Walk {
    fn visit(&mut self, doc: &Document, node: NodeId) {
        if let Some(text) = doc.text(node) {
            self.source.push_str(text);
            self.translate.push_str(text);
            return;
        }
        let Some(data) = doc.element(node) else {
            return;
        };
        if is_excluded_subtree(data) {
            return;
        }
        if is_emote_image(data) {
            let ordinal = self.emotes.len();
            let token = emote_token(ordinal);
            let alt = data.attr("alt").unwrap_or_default();
            // Pad both sides so adjacent words stay separated; the collapse
            // pass folds the extra spaces away.
            self.source.push(' ');
            self.source.push_str(alt);
            self.source.push(' ');
            self.translate.push(' ');
            self.translate.push_str(&token);
            self.translate.push(' ');
            self.emotes.insert(
                token,
                EmoteMeta {
                    alt_text: alt.to_string(),
                    image_src: data.attr("src").unwrap_or_default().to_string(),
                    image_srcset: data.attr("srcset").map(str::to_string),
                    css_class: {
                        let class = data.class_string();
                        (!class.is_empty()).then_some(class)
                    },
                },
            );
            return;
        }
        for &child in doc.children(node) {
            self.visit(doc, child);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_colon_artifact(text: String) -> String {
    text.strip_prefix(": ")
        .map(str::to_string)
        .unwrap_or(text)
}
