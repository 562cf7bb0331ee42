use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use overlay_core::{EmoteMeta, NodeId, RowTracker};
use tokio::time::Instant;

/// Maximum simultaneously executing translation calls.
pub const MAX_CONCURRENT: usize = 2;

/// Delay inserted after a job completes before the next dispatch, to smooth
/// bursts such as scrollback replay.
pub const DISPATCH_PACING: Duration = Duration::from_millis(50);

/// Linear backoff step between retry attempts.
pub const RETRY_BACKOFF_STEP: Duration = Duration::from_millis(800);

/// Total attempts per job: one initial call plus two retries.
pub const MAX_ATTEMPTS: u32 = 3;

/// Backoff before retry number `attempts` (1-based over completed attempts).
pub fn backoff_delay(attempts: u32) -> Duration {
    RETRY_BACKOFF_STEP * attempts
}

/// One unit of translation work for one row. Lives only inside the queue and
/// the in-flight set; destroyed on success or attempt exhaustion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub row: NodeId,
    pub source_text: String,
    pub to_translate: String,
    pub emotes: HashMap<String, EmoteMeta>,
    /// Completed attempts so far; 0 until the first call has failed.
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    Disabled,
    AlreadyInFlight,
    AlreadyTranslated,
}

/// FIFO job queue with a concurrency cap and inter-dispatch pacing.
///
/// Dedup state lives in the [`RowTracker`]'s in-flight markers: one marker
/// per row covers the job from enqueue until terminal completion, including
/// retry backoff windows.
#[derive(Debug, Default)]
pub struct TranslationQueue {
    pending: VecDeque<TranslationJob>,
    executing: usize,
    pace_until: Option<Instant>,
}

impl TranslationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a job unless translation is disabled, the same (row, text) is
    /// already queued or executing, or the text was already translated for
    /// this row. Marks the row in flight on acceptance.
    pub fn enqueue(
        &mut self,
        tracker: &mut RowTracker,
        enabled: bool,
        job: TranslationJob,
    ) -> EnqueueOutcome {
        if !enabled {
            return EnqueueOutcome::Disabled;
        }
        if tracker.in_flight(job.row) == Some(job.source_text.as_str()) {
            return EnqueueOutcome::AlreadyInFlight;
        }
        if tracker.last_translated(job.row) == Some(job.source_text.as_str()) {
            return EnqueueOutcome::AlreadyTranslated;
        }
        tracker.mark_in_flight(job.row, &job.source_text);
        self.pending.push_back(job);
        EnqueueOutcome::Queued
    }

    /// Re-admits a job after its retry backoff. The row still owns its
    /// in-flight marker, so the enqueue dedup must not run again.
    pub fn push_retry(&mut self, job: TranslationJob) {
        self.pending.push_back(job);
    }

    /// Pops the next job when a concurrency slot is free, along with the
    /// pacing delay the dispatcher must wait out before the backend call.
    pub fn next_ready(&mut self) -> Option<(TranslationJob, Duration)> {
        if self.executing >= MAX_CONCURRENT {
            return None;
        }
        let job = self.pending.pop_front()?;
        self.executing += 1;
        let delay = self
            .pace_until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO);
        Some((job, delay))
    }

    /// A dispatched job finished (success or failure): frees its slot and
    /// starts the pacing window for the next dispatch.
    pub fn job_settled(&mut self) {
        self.executing = self.executing.saturating_sub(1);
        self.pace_until = Some(Instant::now() + DISPATCH_PACING);
    }

    /// A dispatched job was abandoned before calling the backend (stale row
    /// or stale text): frees its slot without pacing.
    pub fn job_abandoned(&mut self) {
        self.executing = self.executing.saturating_sub(1);
    }

    /// Drops any still-pending job for `row`; a newer observation supersedes.
    pub fn remove_pending_for(&mut self, row: NodeId) {
        self.pending.retain(|job| job.row != row);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.executing = 0;
        self.pace_until = None;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn executing(&self) -> usize {
        self.executing
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.executing == 0
    }
}
