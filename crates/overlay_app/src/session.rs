//! Scripted demo session: a simulated chat feed driven through the pipeline.
//!
//! Stands in for the host page. The script exercises the paths the live
//! widget produces: initial backfill, new rows arriving, in-place text
//! rewrites on reused nodes, and a live display-mode switch.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use overlay_core::{is_message_row, is_text_fragment, DisplayMode, Document, NodeId};
use overlay_engine::{
    import_document, import_fragment, CachingTranslator, DeepLSettings, DeepLTranslator,
    EchoTranslator, OverlaySettings, Pipeline, SettingChange, TranslateRequest, Translator,
};
use overlay_logging::overlay_info;

const CHAT_SCAFFOLD: &str = r#"
<div class="chat-scrollable-area__message-container">
  <div class="chat-line__message" data-a-target="chat-line-message">
    <span class="chat-author">ayumi</span>
    <div data-a-target="chat-line-message-body">
      <span data-a-target="chat-message-text">こんにちは、元気ですか？</span>
    </div>
  </div>
  <div class="chat-line__message" data-a-target="chat-line-message">
    <span class="chat-author">pierre</span>
    <div data-a-target="chat-line-message-body">
      <span data-a-target="chat-message-text">salut tout le monde <img class="chat-line__message--emote" alt="Kappa" src="https://static.example/kappa.png"></span>
    </div>
  </div>
</div>
"#;

/// Runs one sample translation against the configured backend and reports
/// the result on the console. This is where configuration problems surface;
/// the live view never shows them.
pub async fn check_credentials(settings: &OverlaySettings) {
    let translator = DeepLTranslator::new(DeepLSettings {
        endpoint: settings.deepl_endpoint.clone(),
        auth_key: settings.deepl_auth_key.clone(),
        ..DeepLSettings::default()
    });
    let request = TranslateRequest {
        text: "Hello chat, this is a translation test!".to_string(),
        source_lang: settings.source_lang.clone(),
        target_lang: settings.target_lang.clone(),
    };
    match translator.translate(&request).await {
        Ok(translation) => {
            println!("OK{}.", if translation.cached { " (cached)" } else { "" });
            println!("Input:  {}", request.text);
            println!("Output: {}", translation.translated_text);
        }
        Err(err) => println!("Test failed: {err}"),
    }
}

pub async fn run_demo(settings: OverlaySettings) {
    let translator = build_translator(&settings);
    let doc = Rc::new(RefCell::new(import_document(CHAT_SCAFFOLD)));
    let container = {
        let mut doc = doc.borrow_mut();
        let root = doc.root();
        let container = doc
            .find_all(root, |data| {
                data.has_class("chat-scrollable-area__message-container")
            })
            .into_iter()
            .next()
            .unwrap_or(root);
        doc.mark_scrollable(container, 600);
        container
    };

    let mut pipeline = Pipeline::new(doc.clone(), translator, settings);

    overlay_info!("backfill of the initial chat snapshot");
    pipeline.poll_host();
    pipeline.run_until_idle().await;

    overlay_info!("a new message arrives");
    append_chat_line(&mut doc.borrow_mut(), container, "naru", "ça marche très bien");
    pipeline.observe_mutations();
    pipeline.run_until_idle().await;

    overlay_info!("the host reuses a row and rewrites its text in place");
    rewrite_first_message(&mut doc.borrow_mut(), container, "bonjour à tous");
    pipeline.observe_mutations();
    pipeline.run_until_idle().await;

    overlay_info!("switching display mode to replace");
    pipeline.apply_setting(SettingChange::DisplayMode(DisplayMode::Replace));

    print_transcript(&doc.borrow());
}

fn build_translator(settings: &OverlaySettings) -> Arc<dyn Translator> {
    if settings.deepl_auth_key.trim().is_empty() {
        overlay_info!("no DeepL auth key configured; falling back to the echo backend");
        Arc::new(CachingTranslator::new(
            EchoTranslator,
            settings.cache_max_entries,
        ))
    } else {
        let deepl = DeepLTranslator::new(DeepLSettings {
            endpoint: settings.deepl_endpoint.clone(),
            auth_key: settings.deepl_auth_key.clone(),
            ..DeepLSettings::default()
        });
        Arc::new(CachingTranslator::new(deepl, settings.cache_max_entries))
    }
}

fn append_chat_line(doc: &mut Document, container: NodeId, author: &str, text: &str) {
    let html = format!(
        r#"<div class="chat-line__message" data-a-target="chat-line-message"><span class="chat-author">{author}</span><div data-a-target="chat-line-message-body"><span data-a-target="chat-message-text">{text}</span></div></div>"#
    );
    import_fragment(doc, container, &html);
}

fn rewrite_first_message(doc: &mut Document, container: NodeId, text: &str) {
    let Some(fragment) = doc
        .find_all(container, is_text_fragment)
        .into_iter()
        .next()
    else {
        return;
    };
    let Some(&node) = doc
        .children(fragment)
        .iter()
        .find(|&&child| doc.text(child).is_some())
    else {
        return;
    };
    doc.set_text(node, text);
}

fn print_transcript(doc: &Document) {
    println!("--- transcript ---");
    for row in doc.find_all(doc.root(), is_message_row) {
        println!("{}", flatten(doc, row));
    }
}

/// Flattened view of a row for console output, emote images shown as `:alt:`.
fn flatten(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for id in doc.descendants(node) {
        if let Some(text) = doc.text(id) {
            out.push_str(text);
        } else if let Some(data) = doc.element(id) {
            if data.tag == "img" {
                if let Some(alt) = data.attr("alt") {
                    out.push(':');
                    out.push_str(alt);
                    out.push(':');
                }
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
