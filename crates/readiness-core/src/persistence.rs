//! Durable autosave for the assessment state.
//!
//! Commits are handed to a single background writer through a `watch`
//! channel, so at most one snapshot is ever queued: a newer commit replaces
//! an older one that has not been written yet (last writer wins). Outcomes are
//! published on a second `watch` channel that callers use to confirm their
//! own revision made it to storage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::StorageError;
use crate::model::{AssessmentState, CatalogLayout};
use crate::traits::StateStorage;

/// Storage key used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "readinow-assessment";

/// Version written into every persisted envelope.
pub const STATE_VERSION: u32 = 0;

/// How long a caller waits for its commit before giving up.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// On-disk shape: the state, a format version and when it was written.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: AssessmentState,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    revision: u64,
    state: AssessmentState,
}

/// Result of the most recently finished write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing has been written this session.
    Idle,
    Saved,
    Failed(String),
}

/// Rolling summary of writer activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Revision of the last finished write attempt.
    pub revision: u64,
    pub outcome: CommitOutcome,
    /// Revision of the last successful write.
    pub saved_revision: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl Default for CommitReport {
    fn default() -> Self {
        Self {
            revision: 0,
            outcome: CommitOutcome::Idle,
            saved_revision: 0,
            last_saved_at: None,
        }
    }
}

/// Mirrors assessment state to a [`StateStorage`] backend.
pub struct PersistenceAdapter {
    storage: Arc<dyn StateStorage>,
    namespace: String,
    commits: watch::Sender<Option<Snapshot>>,
    reports: watch::Receiver<CommitReport>,
    last_revision: AtomicU64,
    commit_timeout: Duration,
    /// Write time of the snapshot found by [`PersistenceAdapter::load`].
    restored_at: OnceLock<DateTime<Utc>>,
    writer: JoinHandle<()>,
}

impl PersistenceAdapter {
    /// Start the background writer. Must be called within a tokio runtime.
    pub fn spawn(storage: Arc<dyn StateStorage>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let (commits, commit_rx) = watch::channel(None);
        let (report_tx, reports) = watch::channel(CommitReport::default());

        let writer = tokio::spawn(run_writer(
            Arc::clone(&storage),
            namespace.clone(),
            commit_rx,
            report_tx,
        ));

        Self {
            storage,
            namespace,
            commits,
            reports,
            last_revision: AtomicU64::new(0),
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
            restored_at: OnceLock::new(),
            writer,
        }
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read the last durable snapshot.
    ///
    /// Missing, unreadable or corrupt data yields the initial empty state.
    /// The result is normalized against `layout`.
    pub async fn load(&self, layout: &CatalogLayout) -> AssessmentState {
        let mut state = match read_state(self.storage.as_ref(), &self.namespace).await {
            Ok(Some(envelope)) => {
                if let Some(at) = envelope.saved_at {
                    let _ = self.restored_at.set(at);
                }
                envelope.state
            }
            Ok(None) => {
                tracing::debug!(namespace = %self.namespace, "no saved assessment, starting fresh");
                AssessmentState::default()
            }
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, "discarding saved assessment: {e:#}");
                AssessmentState::default()
            }
        };

        let dropped = state.normalize(layout);
        if dropped > 0 {
            tracing::warn!(dropped, "saved assessment did not match the catalog, dropped answers");
        }
        state
    }

    /// Queue `state` for writing and return its revision.
    ///
    /// Never blocks; an unwritten earlier snapshot is replaced.
    pub fn commit(&self, state: &AssessmentState) -> u64 {
        let revision = self.last_revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.commits.send_replace(Some(Snapshot {
            revision,
            state: state.clone(),
        }));
        tracing::trace!(revision, "commit queued");
        revision
    }

    /// Revision of the most recent commit (0 if none).
    pub fn last_revision(&self) -> u64 {
        self.last_revision.load(Ordering::SeqCst)
    }

    /// Snapshot of the writer's latest outcome.
    ///
    /// Until this session writes, `last_saved_at` is the write time of the
    /// loaded snapshot.
    pub fn latest(&self) -> CommitReport {
        let mut report = self.reports.borrow().clone();
        if report.last_saved_at.is_none() {
            report.last_saved_at = self.restored_at.get().copied();
        }
        report
    }

    pub fn subscribe(&self) -> watch::Receiver<CommitReport> {
        self.reports.clone()
    }

    /// An owned handle for confirming commits from another future.
    pub fn watcher(&self) -> CommitWatcher {
        CommitWatcher {
            reports: Some(self.reports.clone()),
            timeout: self.commit_timeout,
        }
    }

    /// Wait until everything committed so far has been written.
    pub async fn flush(&self) -> Result<(), String> {
        self.watcher().confirm(self.last_revision()).await
    }

    /// Stop accepting commits and wait for the writer to drain.
    pub async fn close(self) {
        let Self {
            commits, writer, ..
        } = self;
        drop(commits);
        if let Err(e) = writer.await {
            tracing::error!("persistence writer ended abnormally: {e}");
        }
    }
}

/// Waits for a specific revision to be durably written.
///
/// Owned and `'static`, so it can be moved into a spawned or abortable
/// future.
#[derive(Debug, Clone)]
pub struct CommitWatcher {
    /// `None` for stores without persistence, where every commit is
    /// trivially confirmed.
    reports: Option<watch::Receiver<CommitReport>>,
    timeout: Duration,
}

impl CommitWatcher {
    /// A watcher that confirms everything immediately.
    pub fn detached() -> Self {
        Self {
            reports: None,
            timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }

    /// Resolve once `revision` (or a later one) has been written.
    ///
    /// `Err` carries a description of the failed write or the timeout.
    pub async fn confirm(self, revision: u64) -> Result<(), String> {
        let Some(mut reports) = self.reports else {
            return Ok(());
        };
        if revision == 0 {
            return Ok(());
        }

        let waited = tokio::time::timeout(
            self.timeout,
            reports.wait_for(|r| r.revision >= revision),
        )
        .await;

        let report = match waited {
            Ok(Ok(report)) => report.clone(),
            Ok(Err(_)) => return Err("persistence writer stopped".into()),
            Err(_) => {
                return Err(format!(
                    "save not confirmed within {}ms",
                    self.timeout.as_millis()
                ))
            }
        };

        if report.saved_revision >= revision {
            return Ok(());
        }
        match report.outcome {
            CommitOutcome::Failed(message) => Err(message),
            CommitOutcome::Saved | CommitOutcome::Idle => {
                Err(format!("revision {revision} was not written"))
            }
        }
    }
}

async fn run_writer(
    storage: Arc<dyn StateStorage>,
    namespace: String,
    mut commits: watch::Receiver<Option<Snapshot>>,
    reports: watch::Sender<CommitReport>,
) {
    while commits.changed().await.is_ok() {
        let Some(snapshot) = commits.borrow_and_update().clone() else {
            continue;
        };

        let saved_at = Utc::now();
        let result = write_state(storage.as_ref(), &namespace, &snapshot.state, saved_at).await;

        reports.send_modify(|report| {
            report.revision = snapshot.revision;
            match result {
                Ok(()) => {
                    tracing::debug!(revision = snapshot.revision, backend = storage.name(), "assessment saved");
                    report.outcome = CommitOutcome::Saved;
                    report.saved_revision = snapshot.revision;
                    report.last_saved_at = Some(saved_at);
                }
                Err(e) => {
                    tracing::warn!(revision = snapshot.revision, backend = storage.name(), "save failed: {e}");
                    report.outcome = CommitOutcome::Failed(e.to_string());
                }
            }
        });
    }
    tracing::debug!(namespace = %namespace, "persistence writer stopped");
}

async fn read_state(storage: &dyn StateStorage, key: &str) -> anyhow::Result<Option<Envelope>> {
    let Some(raw) = storage.get(key).await? else {
        return Ok(None);
    };
    let envelope: Envelope = serde_json::from_str(&raw)?;
    if envelope.version > STATE_VERSION {
        anyhow::bail!("unsupported state version {}", envelope.version);
    }
    Ok(Some(envelope))
}

async fn write_state(
    storage: &dyn StateStorage,
    key: &str,
    state: &AssessmentState,
    saved_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    let envelope = Envelope {
        state: state.clone(),
        version: STATE_VERSION,
        saved_at: Some(saved_at),
    };
    let json = serde_json::to_string(&envelope).map_err(|e| StorageError::Write {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    storage.set(key, &json).await
}
