//! When to run a pass.
//!
//! Passes are expensive and must not overlap. [`TriggerPolicy`] collapses
//! bursts of structural-change notifications into one pass after a quiet
//! period, runs explicit requests immediately, and drops notifications that
//! arrive while a pass is already running (the pass itself causes them).

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use prism_core::{AssetId, DedupSettings, PrismError, Result};

/// Why a pass was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    Manual,
    StructuralChange,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    root: AssetId,
    reason: TriggerReason,
    due: Option<Instant>,
}

/// Single-threaded pass scheduler with an in-progress guard.
#[derive(Debug)]
pub struct TriggerPolicy {
    debounce: Duration,
    pending: RefCell<Option<Pending>>,
    in_progress: Cell<bool>,
    dropped: Cell<usize>,
}

/// Clears the in-progress flag when the pass ends, including by unwinding.
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl TriggerPolicy {
    #[must_use]
    pub fn new(settings: &DedupSettings) -> Self {
        Self::with_debounce(settings.debounce())
    }

    #[must_use]
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: RefCell::new(None),
            in_progress: Cell::new(false),
            dropped: Cell::new(0),
        }
    }

    /// Schedules a pass from `root`, due on the next [`poll`](Self::poll).
    pub fn request_manual(&self, root: AssetId) {
        *self.pending.borrow_mut() = Some(Pending {
            root,
            reason: TriggerReason::Manual,
            due: None,
        });
    }

    /// Records an edit under `root`, (re)starting the debounce window.
    ///
    /// Returns `false` when the notification was dropped because a pass is
    /// running. A pending manual request is never postponed.
    pub fn notify_structural_change(&self, root: AssetId, now: Instant) -> bool {
        if self.in_progress.get() {
            self.dropped.set(self.dropped.get() + 1);
            log::trace!("Structural change during pass dropped");
            return false;
        }
        let mut pending = self.pending.borrow_mut();
        if let Some(p) = pending.as_ref()
            && p.reason == TriggerReason::Manual
        {
            return true;
        }
        *pending = Some(Pending {
            root,
            reason: TriggerReason::StructuralChange,
            due: Some(now + self.debounce),
        });
        true
    }

    /// Takes the scheduled root if it is due. Never fires while a pass runs.
    pub fn poll(&self, now: Instant) -> Option<AssetId> {
        self.poll_with_reason(now).map(|(root, _)| root)
    }

    pub fn poll_with_reason(&self, now: Instant) -> Option<(AssetId, TriggerReason)> {
        if self.in_progress.get() {
            return None;
        }
        let mut pending = self.pending.borrow_mut();
        let ready = pending.as_ref().is_some_and(|p| p.due.is_none_or(|due| now >= due));
        if !ready {
            return None;
        }
        pending.take().map(|p| (p.root, p.reason))
    }

    /// Runs `pass` for `root` under the in-progress guard.
    ///
    /// A nested call fails with [`PrismError::PassInProgress`] without
    /// running anything.
    pub fn run_pass<R>(&self, root: AssetId, pass: impl FnOnce(AssetId) -> Result<R>) -> Result<R> {
        if self.in_progress.replace(true) {
            log::warn!("Pass for {root} requested while another pass is running");
            return Err(PrismError::PassInProgress);
        }
        let _guard = PassGuard(&self.in_progress);
        log::debug!("Pass for {root} started");
        pass(root)
    }

    /// Pre-export hook: runs `pass` only when exactly one root instance is
    /// active. Returns whether the pass ran.
    pub fn pre_export<R>(&self, active_roots: &[AssetId], pass: impl FnOnce(AssetId) -> Result<R>) -> Result<bool> {
        let [root] = active_roots else {
            log::warn!(
                "Pre-export deduplication needs exactly one active root, found {}",
                active_roots.len()
            );
            return Ok(false);
        };
        self.run_pass(*root, pass)?;
        Ok(true)
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.in_progress.get()
    }

    /// Notifications dropped because they arrived during a pass.
    #[must_use]
    pub fn dropped_notifications(&self) -> usize {
        self.dropped.get()
    }
}
