//! Percentage reveal and share/copy
//!
//! Counts the displayed percentage from 0 up to the result over a fixed
//! wall-clock duration, sampling once per frame. Each run belongs to one
//! result id; when a newer result is started, the older task sees that its
//! id is no longer current and stops without touching the display.
//!
//! Display state is published on a `watch` channel for front ends.

use crate::share::{share_text, Clipboard, SharePayload, ShareTarget, SHARE_TITLE};
use crate::error::ClipboardError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uko_common::config::ClientConfig;
use uko_common::PredictionResult;
use uuid::Uuid;

pub const CLIPBOARD_FAILED: &str = "Failed to copy to clipboard";

/// What the result view shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationState {
    pub displayed_percentage: u8,
    /// Set for a short window after a successful copy
    pub copied: bool,
    /// Dismissible, never affects the result
    pub clipboard_error: Option<String>,
}

/// Coloring band for a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentageBand {
    Low,
    Medium,
    High,
}

impl PercentageBand {
    pub fn of(percentage: u8) -> Self {
        match percentage {
            0..=29 => PercentageBand::Low,
            30..=69 => PercentageBand::Medium,
            _ => PercentageBand::High,
        }
    }
}

/// How a share request was fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
    /// No result to share yet
    NoResult,
}

/// Value shown `elapsed` into a reveal of `duration` towards `target`
///
/// `floor(min(elapsed / duration, 1) * target)`; exactly `target` once the
/// duration has passed.
pub fn reveal_sample(elapsed: Duration, duration: Duration, target: u8) -> u8 {
    if duration.is_zero() {
        return target;
    }
    let fraction = (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0);
    (fraction * f64::from(target)).floor() as u8
}

/// Status text with the target percentage swapped for the displayed one
pub fn status_line(result: &PredictionResult, displayed: u8) -> String {
    result
        .status
        .replace(&result.percentage.to_string(), &displayed.to_string())
}

/// Timing knobs
#[derive(Debug, Clone, Copy)]
pub struct AnimatorTiming {
    pub duration: Duration,
    pub frame_interval: Duration,
    pub copied_window: Duration,
}

impl From<&ClientConfig> for AnimatorTiming {
    fn from(config: &ClientConfig) -> Self {
        Self {
            duration: config.reveal_duration,
            frame_interval: config.frame_interval,
            copied_window: config.copied_window,
        }
    }
}

struct Inner {
    state: watch::Sender<AnimationState>,
    current: RwLock<Option<PredictionResult>>,
    copy_generation: AtomicU64,
}

/// Drives the reveal and the share/copy action for the current result
pub struct ResultAnimator {
    inner: Arc<Inner>,
    timing: AnimatorTiming,
    clipboard: Arc<dyn Clipboard>,
    share_target: Option<Arc<dyn ShareTarget>>,
    share_url: Option<String>,
}

impl ResultAnimator {
    pub fn new(
        timing: AnimatorTiming,
        clipboard: Arc<dyn Clipboard>,
        share_target: Option<Arc<dyn ShareTarget>>,
    ) -> Self {
        let (state, _) = watch::channel(AnimationState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                current: RwLock::new(None),
                copy_generation: AtomicU64::new(0),
            }),
            timing,
            clipboard,
            share_target,
            share_url: None,
        }
    }

    /// Link attached to share payloads
    pub fn with_share_url(mut self, url: Option<String>) -> Self {
        self.share_url = url;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AnimationState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> AnimationState {
        self.inner.state.borrow().clone()
    }

    pub async fn current_result(&self) -> Option<PredictionResult> {
        self.inner.current.read().await.clone()
    }

    /// Begin revealing a result
    ///
    /// Resets the display to 0 and makes this result current before the
    /// task is spawned. The returned handle completes when the count reaches
    /// the target, or early if a newer result replaces this one.
    pub async fn start(&self, result: PredictionResult) -> JoinHandle<()> {
        let run_id = result.id;
        let target = result.percentage;
        {
            let mut current = self.inner.current.write().await;
            *current = Some(result);
            self.inner.state.send_replace(AnimationState::default());
        }
        debug!(result_id = %run_id, target, "Starting reveal");

        tokio::spawn(run_reveal(self.inner.clone(), self.timing, run_id, target))
    }

    /// Share the current result, falling back to the clipboard
    pub async fn share_result(&self) -> Result<ShareOutcome, ClipboardError> {
        let text = {
            let current = self.inner.current.read().await;
            let Some(result) = current.as_ref() else {
                debug!("Share requested with no result");
                return Ok(ShareOutcome::NoResult);
            };
            share_text(self.inner.state.borrow().displayed_percentage, &result.message)
        };

        if let Some(target) = &self.share_target {
            let payload = SharePayload {
                title: SHARE_TITLE.to_string(),
                text: text.clone(),
                url: self.share_url.clone(),
            };
            match target.share(&payload).await {
                Ok(()) => {
                    info!("Result shared");
                    return Ok(ShareOutcome::Shared);
                }
                Err(e) => warn!(error = %e, "Share failed, copying to clipboard instead"),
            }
        }

        self.copy_to_clipboard(&text).await?;
        Ok(ShareOutcome::Copied)
    }

    /// Copy text and arm the `copied` window
    ///
    /// A newer copy restarts the window; only the latest timer may clear
    /// the flag.
    pub async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClipboardError> {
        if let Err(e) = self.clipboard.write_text(text).await {
            warn!(error = %e, "Copy failed");
            self.inner
                .state
                .send_modify(|s| s.clipboard_error = Some(CLIPBOARD_FAILED.to_string()));
            return Err(e);
        }

        let generation = self.inner.copy_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|s| {
            s.copied = true;
            s.clipboard_error = None;
        });

        let inner = self.inner.clone();
        let window = self.timing.copied_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if inner.copy_generation.load(Ordering::SeqCst) == generation {
                inner.state.send_if_modified(|s| std::mem::replace(&mut s.copied, false));
            }
        });
        Ok(())
    }

    /// Clear a clipboard error
    pub fn dismiss_error(&self) {
        self.inner
            .state
            .send_if_modified(|s| s.clipboard_error.take().is_some());
    }
}

/// One reveal run, scoped to `run_id`
async fn run_reveal(inner: Arc<Inner>, timing: AnimatorTiming, run_id: Uuid, target: u8) {
    let started = Instant::now();
    let mut frames = tokio::time::interval(timing.frame_interval.max(Duration::from_millis(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frames.tick().await;

        let (value, finished) = match Instant::now().checked_duration_since(started) {
            Some(elapsed) => (
                reveal_sample(elapsed, timing.duration, target),
                elapsed >= timing.duration,
            ),
            None => {
                warn!(result_id = %run_id, "Clock sample failed, showing final value");
                (target, true)
            }
        };

        let current = inner.current.read().await;
        if current.as_ref().map(|r| r.id) != Some(run_id) {
            debug!(result_id = %run_id, "Reveal superseded by newer result");
            return;
        }
        inner.state.send_if_modified(|s| {
            let changed = s.displayed_percentage != value;
            s.displayed_percentage = value;
            changed
        });
        drop(current);

        if finished {
            debug!(result_id = %run_id, target, "Reveal complete");
            return;
        }
    }
}
