use ego_tree::NodeRef;
use overlay_core::{Document, NodeId};
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Builds a mutable [`Document`] from an HTML snapshot of the host page.
///
/// Demo sessions and tests describe chat markup as HTML; the importer turns
/// it into the arena DOM the pipeline operates on. The snapshot is a starting
/// state, not observed churn, so no mutation records are left behind.
pub fn import_document(html: &str) -> Document {
    let parsed = Html::parse_fragment(html);
    let mut doc = Document::new();
    let root = doc.root();
    for child in parsed.root_element().children() {
        visit(&mut doc, root, child);
    }
    let _ = doc.take_mutations();
    doc
}

/// Imports a fragment underneath an existing node, as the host would when
/// inserting new rows. Mutation records are kept so the watcher sees them.
pub fn import_fragment(doc: &mut Document, parent: NodeId, html: &str) {
    let parsed = Html::parse_fragment(html);
    let nodes: Vec<_> = parsed.root_element().children().collect();
    for child in nodes {
        visit(doc, parent, child);
    }
}

fn visit(doc: &mut Document, parent: NodeId, node: NodeRef<'_, Node>) {
    match node.value() {
        Node::Text(text) => {
            // Inter-tag indentation would pollute extraction input; the
            // collapse pass handles the rest.
            if !text.trim().is_empty() {
                doc.append_text(parent, text);
            }
        }
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                let value = element.value();
                let id = doc.create_element(value.name());
                for class in value.classes() {
                    doc.add_class(id, class);
                }
                for (name, attr_value) in value.attrs() {
                    if name != "class" {
                        doc.set_attr(id, name, attr_value);
                    }
                }
                doc.append_child(parent, id);
                for child in node.children() {
                    visit(doc, id, child);
                }
            }
        }
        _ => {}
    }
}
