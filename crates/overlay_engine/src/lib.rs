//! Overlay engine: translation IO, job scheduling, and the DOM watcher.
mod cache;
mod html;
mod pipeline;
mod queue;
mod settings;
mod translate;
mod watcher;

pub use cache::{CachingTranslator, TranslationCache};
pub use html::{import_document, import_fragment};
pub use pipeline::Pipeline;
pub use queue::{
    backoff_delay, EnqueueOutcome, TranslationJob, TranslationQueue, DISPATCH_PACING,
    MAX_ATTEMPTS, MAX_CONCURRENT, RETRY_BACKOFF_STEP,
};
pub use settings::{OverlaySettings, SettingChange};
pub use translate::{
    DeepLSettings, DeepLTranslator, EchoTranslator, TranslateError, TranslateFailureKind,
    TranslateRequest, Translation, Translator,
};
pub use watcher::{Watcher, WatcherState};
