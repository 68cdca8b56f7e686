//! # Edit-Commit Pipeline
//!
//! Batches rapid UI edits behind a debounce window while keeping one
//! canonical tree that is always valid.
//!
//! ```text
//!            commit_edit                 timer expiry / flush
//!   Idle ───────────────────▶ Pending ─────────────────────────▶ Idle
//!                             │  ▲                 (fold: overlay → canonical)
//!                 commit_edit └──┘ (re-arm timer)
//!                             │
//!                             └── discard ─────────────────────▶ Idle
//! ```
//!
//! ## Semantics
//!
//! - **Overlay**: edits not yet folded. [`CommitPipeline::display_tree`] shows
//!   canonical with the overlay applied in insertion order.
//! - **Admission**: [`CommitPipeline::commit_edit`] validates canonical plus
//!   the overlay plus the new edit before queueing it. An edit that would break
//!   the tree is refused up front, so the overlay always folds cleanly.
//! - **Fold**: applies the overlay to a clone of canonical, validates it, and
//!   swaps it in. A candidate that fails validation leaves canonical alone and
//!   drops the overlay; callers that fold on the way to another operation
//!   surface that as [`EditorError::ValidationFailed`].
//! - **Generations**: every arm, flush and discard bumps a counter. A timer
//!   only folds if the generation it was armed with is still current once it
//!   holds the lock, so a cancelled timer can never fold and a flush racing an
//!   expiring timer folds exactly once.
//! - **Saving**: canonical is only handed out for persistence through
//!   [`CommitPipeline::snapshot_for_save`], which flushes first.

use crate::errors::EditorError;
use chrono::{DateTime, Utc};
use mailframe_tree::{find_by_id, update_by_id, validate, Node, Patch, Registry};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Timing knobs for the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet period after the last UI edit before the overlay is folded
    pub debounce_ms: u64,
    /// Upper bound on one refinement adapter call
    pub refine_timeout_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            refine_timeout_ms: 30_000,
        }
    }
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn refine_timeout(&self) -> Duration {
        Duration::from_millis(self.refine_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Overlay empty, no timer armed
    Idle,
    /// Overlay holds edits waiting for a fold
    Pending,
}

/// One edit that has not been folded into canonical state yet
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub node_id: String,
    pub patch: Patch,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of folding the overlay
#[derive(Debug, Clone, PartialEq)]
pub enum FoldOutcome {
    /// Nothing was pending
    Noop,
    /// Overlay applied; canonical is now at `version`
    Committed { applied: usize, version: u64 },
    /// Candidate failed validation; canonical kept, overlay dropped
    Rejected { errors: Vec<String> },
}

impl FoldOutcome {
    /// `Err` when the fold dropped pending edits
    pub fn into_result(self) -> Result<FoldOutcome, EditorError> {
        match self {
            FoldOutcome::Rejected { errors } => Err(EditorError::ValidationFailed(errors)),
            outcome => Ok(outcome),
        }
    }
}

/// Canonical state handed to persistence
#[derive(Debug, Clone)]
pub struct SaveSnapshot {
    pub tree: Arc<Node>,
    pub version: u64,
    /// What the flush preceding the read did
    pub flushed: FoldOutcome,
}

struct Shared {
    canonical: Arc<Node>,
    version: u64,
    overlay: Vec<OverlayEntry>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    last_fold: Option<FoldOutcome>,
    rejected_folds: u64,
}

struct Inner {
    state: Mutex<Shared>,
    registry: Arc<Registry>,
    versions: watch::Sender<u64>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer entry point
    fn fold_if_current(&self, generation: u64) {
        let mut shared = self.lock();
        if shared.generation != generation {
            debug!(generation, current = shared.generation, "stale timer, skipping fold");
            return;
        }
        shared.timer = None;
        let outcome = self.fold_locked(&mut shared);
        debug!(?outcome, "debounce fold");
    }

    fn cancel_timer(shared: &mut Shared) {
        shared.generation += 1;
        if let Some(timer) = shared.timer.take() {
            timer.abort();
        }
    }

    fn fold_locked(&self, shared: &mut Shared) -> FoldOutcome {
        if shared.overlay.is_empty() {
            return FoldOutcome::Noop;
        }

        let entries = std::mem::take(&mut shared.overlay);
        let candidate = apply_overlay(&shared.canonical, &entries);

        let report = validate(&candidate, &self.registry);
        let outcome = if report.valid {
            self.commit_locked(shared, candidate);
            info!(applied = entries.len(), version = shared.version, "folded overlay");
            FoldOutcome::Committed {
                applied: entries.len(),
                version: shared.version,
            }
        } else {
            shared.rejected_folds += 1;
            warn!(
                dropped = entries.len(),
                errors = report.errors.len(),
                "overlay fold rejected, keeping canonical"
            );
            FoldOutcome::Rejected { errors: report.errors }
        };

        shared.last_fold = Some(outcome.clone());
        outcome
    }

    fn commit_locked(&self, shared: &mut Shared, tree: Node) {
        shared.canonical = Arc::new(tree);
        shared.version += 1;
        self.versions.send_replace(shared.version);
    }
}

fn apply_overlay(canonical: &Node, entries: &[OverlayEntry]) -> Node {
    entries.iter().fold(canonical.clone(), |tree, entry| {
        update_by_id(&tree, &entry.node_id, &entry.patch)
    })
}

/// Debounced path from the live edit stream to canonical state.
///
/// Timers are spawned on the ambient Tokio runtime, so edits must be
/// committed from inside one.
pub struct CommitPipeline {
    inner: Arc<Inner>,
    debounce: Duration,
}

impl CommitPipeline {
    pub fn new(root: Node, registry: Arc<Registry>, config: &EditorConfig) -> Self {
        let (versions, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Shared {
                    canonical: Arc::new(root),
                    version: 0,
                    overlay: Vec::new(),
                    generation: 0,
                    timer: None,
                    last_fold: None,
                    rejected_folds: 0,
                }),
                registry,
                versions,
            }),
            debounce: config.debounce(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Record an edit in the overlay and (re-)arm the debounce timer.
    ///
    /// The edit is refused, leaving the overlay and timer untouched, if its
    /// node is not in the display tree or if the display tree with the edit
    /// applied does not validate.
    pub fn commit_edit(
        &self,
        node_id: impl Into<String>,
        patch: Patch,
        description: impl Into<String>,
    ) -> Result<(), EditorError> {
        let entry = OverlayEntry {
            node_id: node_id.into(),
            patch,
            description: description.into(),
            timestamp: Utc::now(),
        };

        let mut shared = self.inner.lock();
        let display = apply_overlay(&shared.canonical, &shared.overlay);
        if find_by_id(&display, &entry.node_id).is_none() {
            return Err(EditorError::NodeNotFound(entry.node_id));
        }
        let candidate = update_by_id(&display, &entry.node_id, &entry.patch);
        let report = validate(&candidate, &self.inner.registry);
        if !report.valid {
            warn!(node_id = %entry.node_id, errors = report.errors.len(), "edit refused");
            return Err(EditorError::ValidationFailed(report.errors));
        }

        debug!(node_id = %entry.node_id, description = %entry.description, "edit queued");
        shared.overlay.push(entry);
        Inner::cancel_timer(&mut shared);

        let generation = shared.generation;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let debounce = self.debounce;
        shared.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(inner) = weak.upgrade() {
                inner.fold_if_current(generation);
            }
        }));
        Ok(())
    }

    /// Fold now, bypassing the timer. Idempotent.
    pub fn flush(&self) -> FoldOutcome {
        let mut shared = self.inner.lock();
        Inner::cancel_timer(&mut shared);
        self.inner.fold_locked(&mut shared)
    }

    /// Drop every pending edit without folding. Returns how many were dropped.
    pub fn discard(&self) -> usize {
        let mut shared = self.inner.lock();
        Inner::cancel_timer(&mut shared);
        let dropped = std::mem::take(&mut shared.overlay).len();
        if dropped > 0 {
            info!(dropped, "discarded pending edits");
        }
        dropped
    }

    /// Canonical tree with pending edits layered on top
    pub fn display_tree(&self) -> Arc<Node> {
        let shared = self.inner.lock();
        if shared.overlay.is_empty() {
            return Arc::clone(&shared.canonical);
        }
        Arc::new(apply_overlay(&shared.canonical, &shared.overlay))
    }

    /// Flush, then read canonical. The only way canonical leaves the pipeline.
    pub fn snapshot_for_save(&self) -> SaveSnapshot {
        let mut shared = self.inner.lock();
        Inner::cancel_timer(&mut shared);
        let flushed = self.inner.fold_locked(&mut shared);
        SaveSnapshot {
            tree: Arc::clone(&shared.canonical),
            version: shared.version,
            flushed,
        }
    }

    /// Flush, then replace canonical with whatever `edit` builds from it.
    ///
    /// If the flush drops pending edits, `edit` is not run and the fold's
    /// errors are returned. The candidate is validated before it is swapped
    /// in; on any error canonical is unchanged. Runs under the pipeline lock, so `edit` sees
    /// the canonical state the result is committed over.
    pub fn commit_direct<F>(&self, edit: F) -> Result<Arc<Node>, EditorError>
    where
        F: FnOnce(&Node) -> Result<Node, EditorError>,
    {
        let mut shared = self.inner.lock();
        Inner::cancel_timer(&mut shared);
        self.inner.fold_locked(&mut shared).into_result()?;

        let candidate = edit(&shared.canonical)?;
        let report = validate(&candidate, &self.inner.registry);
        if !report.valid {
            return Err(EditorError::ValidationFailed(report.errors));
        }

        self.inner.commit_locked(&mut shared, candidate);
        Ok(Arc::clone(&shared.canonical))
    }

    pub fn state(&self) -> PipelineState {
        if self.inner.lock().overlay.is_empty() {
            PipelineState::Idle
        } else {
            PipelineState::Pending
        }
    }

    pub fn overlay(&self) -> Vec<OverlayEntry> {
        self.inner.lock().overlay.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().overlay.len()
    }

    /// Canonical version, bumped on every canonical change
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// Outcome of the most recent fold that had something to apply
    pub fn last_fold(&self) -> Option<FoldOutcome> {
        self.inner.lock().last_fold.clone()
    }

    /// How many folds have dropped their overlay
    pub fn rejected_folds(&self) -> u64 {
        self.inner.lock().rejected_folds
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.versions.subscribe()
    }

    /// Queue an entry without admission checks
    #[cfg(test)]
    pub(crate) fn queue_unchecked(&self, node_id: &str, patch: Patch) {
        self.inner.lock().overlay.push(OverlayEntry {
            node_id: node_id.to_string(),
            patch,
            description: "unchecked".to_string(),
            timestamp: Utc::now(),
        });
    }
}

impl Drop for CommitPipeline {
    fn drop(&mut self) {
        let mut shared = self.inner.lock();
        Inner::cancel_timer(&mut shared);
    }
}
