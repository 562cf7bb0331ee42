use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use overlay_core::{
    clear_all_translations, extract, render, Document, NodeId, RowTracker,
};
use overlay_logging::{overlay_debug, overlay_info, overlay_trace};

use crate::queue::{backoff_delay, TranslationJob, TranslationQueue, MAX_ATTEMPTS};
use crate::settings::{OverlaySettings, SettingChange};
use crate::translate::{TranslateError, TranslateRequest, Translation, Translator};
use crate::watcher::{Watcher, WatcherState};

enum JobSettled {
    Finished {
        job: TranslationJob,
        result: Result<Translation, TranslateError>,
    },
    RetryReady {
        job: TranslationJob,
    },
}

/// The overlay's single-loop context: owns the row tracker, the job queue,
/// the watcher, and the set of suspended translation calls.
///
/// Everything runs on one cooperative loop. In-flight backend calls and the
/// pacing/backoff sleeps are the only suspension points; between any two of
/// them a handler runs to completion, so checking and claiming the per-row
/// in-flight marker needs no locking. Every job revalidates the row's live
/// text when it resumes.
pub struct Pipeline {
    doc: Rc<RefCell<Document>>,
    translator: Arc<dyn Translator>,
    settings: OverlaySettings,
    tracker: RowTracker,
    queue: TranslationQueue,
    watcher: Watcher,
    inflight: FuturesUnordered<LocalBoxFuture<'static, JobSettled>>,
    poll_tick: u64,
}

impl Pipeline {
    pub fn new(
        doc: Rc<RefCell<Document>>,
        translator: Arc<dyn Translator>,
        settings: OverlaySettings,
    ) -> Self {
        let mut watcher = Watcher::new();
        if settings.enabled {
            watcher.enable();
        }
        Self {
            doc,
            translator,
            settings,
            tracker: RowTracker::new(),
            queue: TranslationQueue::new(),
            watcher,
            inflight: FuturesUnordered::new(),
            poll_tick: 0,
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn watcher_state(&self) -> WatcherState {
        self.watcher.state()
    }

    pub fn tracker(&self) -> &RowTracker {
        &self.tracker
    }

    pub fn queue(&self) -> &TranslationQueue {
        &self.queue
    }

    /// Count of suspended translation/backoff futures, for tests.
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    /// Periodic probe tick: root discovery, staleness recovery, backfill of
    /// rows under a freshly attached root, and the tracker eviction sweep.
    pub fn poll_host(&mut self) {
        self.poll_tick += 1;
        overlay_logging::set_poll_tick(self.poll_tick);
        let backfill = {
            let doc = self.doc.borrow();
            self.watcher.probe(&doc)
        };
        for row in backfill {
            self.process_row(row);
        }
        {
            let doc = self.doc.borrow();
            self.tracker.sweep(&doc);
        }
        self.observe_mutations();
    }

    /// Drains mutation records from the document and feeds the affected rows
    /// through the pipeline. Records arriving while no root is attached are
    /// discarded, matching an observer that simply is not connected.
    pub fn observe_mutations(&mut self) {
        let rows = {
            let mut doc = self.doc.borrow_mut();
            let records = doc.take_mutations();
            self.watcher.map_mutations(&doc, &records)
        };
        for row in rows {
            self.process_row(row);
        }
    }

    pub fn apply_setting(&mut self, change: SettingChange) {
        match change {
            SettingChange::Enabled(true) => {
                if !self.settings.enabled {
                    overlay_info!("translation enabled");
                    self.settings.enabled = true;
                    self.watcher.enable();
                    self.poll_host();
                }
            }
            SettingChange::Enabled(false) => {
                if self.settings.enabled {
                    overlay_info!("translation disabled");
                    self.settings.enabled = false;
                    self.teardown();
                }
            }
            SettingChange::DisplayMode(mode) => {
                if self.settings.display_mode != mode {
                    self.settings.display_mode = mode;
                    self.rerender_all();
                }
            }
            SettingChange::Languages { source, target } => {
                self.settings.source_lang = source;
                self.settings.target_lang = target;
            }
        }
    }

    /// Extracts the row's logical text and schedules translation work unless
    /// the tracker rules it redundant.
    fn process_row(&mut self, row: NodeId) {
        let payload = {
            let doc = self.doc.borrow();
            extract(&doc, row)
        };
        let Some(payload) = payload else {
            return;
        };
        if !self.tracker.should_process(row, &payload.source_text) {
            return;
        }
        self.tracker.mark_observed(row, &payload.source_text);

        // A newer text supersedes an older pending job for the same row.
        if self
            .tracker
            .in_flight(row)
            .is_some_and(|text| text != payload.source_text)
        {
            self.queue.remove_pending_for(row);
            self.tracker.clear_in_flight(row);
        }

        let job = TranslationJob {
            row,
            source_text: payload.source_text,
            to_translate: payload.to_translate,
            emotes: payload.emotes,
            attempts: 0,
        };
        let outcome = self
            .queue
            .enqueue(&mut self.tracker, self.settings.enabled, job);
        overlay_trace!("row {row}: enqueue -> {outcome:?}");
        self.pump();
    }

    /// Dispatches queued jobs into free concurrency slots, revalidating each
    /// row's live text first.
    fn pump(&mut self) {
        while let Some((job, delay)) = self.queue.next_ready() {
            let still_current = {
                let doc = self.doc.borrow();
                doc.is_attached(job.row)
                    && extract(&doc, job.row)
                        .is_some_and(|payload| payload.source_text == job.source_text)
            };
            if !still_current {
                // The row moved on; abandon silently, no retry.
                overlay_trace!("row {}: abandoning stale job", job.row);
                self.tracker.clear_in_flight_if(job.row, &job.source_text);
                self.queue.job_abandoned();
                continue;
            }

            let request = TranslateRequest {
                text: job.to_translate.clone(),
                source_lang: self.settings.source_lang.clone(),
                target_lang: self.settings.target_lang.clone(),
            };
            let translator = Arc::clone(&self.translator);
            self.inflight.push(Box::pin(async move {
                if delay > Duration::ZERO {
                    tokio::time::sleep(delay).await;
                }
                let result = translator.translate(&request).await;
                JobSettled::Finished { job, result }
            }));
        }
    }

    fn on_settled(&mut self, settled: JobSettled) {
        match settled {
            JobSettled::Finished { job, result } => {
                self.queue.job_settled();
                // A resumed job is only relevant while it still owns the
                // row's in-flight marker.
                if self.tracker.in_flight(job.row) != Some(job.source_text.as_str()) {
                    overlay_trace!("row {}: superseded while in flight", job.row);
                } else {
                    match result {
                        Ok(translation) => self.on_translated(job, translation),
                        Err(err) => self.on_failed(job, err),
                    }
                }
                self.pump();
            }
            JobSettled::RetryReady { job } => {
                if self.settings.enabled
                    && self.tracker.in_flight(job.row) == Some(job.source_text.as_str())
                {
                    self.queue.push_retry(job);
                    self.pump();
                }
            }
        }
    }

    fn on_translated(&mut self, job: TranslationJob, translation: Translation) {
        overlay_debug!(
            "row {}: translated ({}){}",
            job.row,
            job.attempts + 1,
            if translation.cached { " [cached]" } else { "" }
        );
        {
            let mut doc = self.doc.borrow_mut();
            render(
                &mut doc,
                job.row,
                &translation.translated_text,
                &job.emotes,
                self.settings.display_mode,
            );
        }
        self.tracker.mark_translated(
            job.row,
            &job.source_text,
            &translation.translated_text,
            job.emotes,
        );
    }

    fn on_failed(&mut self, mut job: TranslationJob, err: TranslateError) {
        job.attempts += 1;
        if job.attempts < MAX_ATTEMPTS && err.kind.is_retryable() && self.settings.enabled {
            let delay = backoff_delay(job.attempts);
            overlay_debug!(
                "row {}: attempt {} failed ({err}), retrying in {delay:?}",
                job.row,
                job.attempts
            );
            self.inflight.push(Box::pin(async move {
                tokio::time::sleep(delay).await;
                JobSettled::RetryReady { job }
            }));
        } else {
            // Translation failure is non-fatal; the message simply stays
            // untranslated.
            overlay_debug!(
                "row {}: dropping job after {} attempts ({err})",
                job.row,
                job.attempts
            );
            self.tracker.clear_in_flight_if(job.row, &job.source_text);
        }
    }

    /// Re-renders every row holding a translation in the current mode.
    fn rerender_all(&mut self) {
        for row in self.tracker.translated_rows() {
            if let Some((translated, emotes)) = self.tracker.last_translation(row) {
                let mut doc = self.doc.borrow_mut();
                render(&mut doc, row, translated, emotes, self.settings.display_mode);
            }
        }
        // Rendering records mutations; drop them rather than reprocessing
        // our own output.
        self.observe_mutations();
    }

    /// Full teardown on disable: pending work cleared, suspended calls
    /// abandoned, injected elements removed, hidden originals restored,
    /// per-row memory erased.
    fn teardown(&mut self) {
        self.watcher.disable();
        self.queue.clear();
        self.inflight = FuturesUnordered::new();
        self.tracker.clear();
        let mut doc = self.doc.borrow_mut();
        clear_all_translations(&mut doc);
        let _ = doc.take_mutations();
    }

    /// Drives the pipeline until no work remains: drains host mutations,
    /// dispatches, and awaits every suspended call, retry, and pacing delay.
    pub async fn run_until_idle(&mut self) {
        loop {
            self.observe_mutations();
            self.pump();
            match self.inflight.next().await {
                Some(settled) => self.on_settled(settled),
                None => {
                    if self.queue.is_idle() {
                        break;
                    }
                }
            }
        }
        self.observe_mutations();
    }
}
