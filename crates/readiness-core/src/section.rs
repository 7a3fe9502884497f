//! Per-section controller: answer saves and the "Next" gate.
//!
//! Saving an answer is a two-phase commit-and-confirm:
//!
//! 1. [`SectionController::begin_save`] updates the displayed selection,
//!    marks the question `saving`, writes to the store and returns a
//!    [`PendingSave`] holding an abortable future for the durable write.
//! 2. [`SectionController::finish_save`] reads the store back and moves the
//!    question to `saved` or `error`.
//!
//! Navigating away aborts every pending save and bumps the controller epoch,
//! so a confirmation that arrives late is discarded instead of touching a
//! section the user has left.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{NavigationBlocked, SaveError};
use crate::model::{Catalog, QuestionId, SaveStatus, SectionDef, SectionId, Upsert};
use crate::store::AnswerStore;

/// Fixed delays used for save feedback and pacing.
#[derive(Debug, Clone)]
pub struct SectionTiming {
    /// How long a question shows `saved` before reverting to `idle`.
    pub saved_display: Duration,
    /// Pause between the durable write and the answer-count re-check on "Next".
    pub verify_delay: Duration,
    /// Pause after revealing the section score before moving on.
    pub advance_delay: Duration,
    /// Saving/verifying longer than this flags the advance as slow.
    pub slow_threshold: Duration,
}

impl Default for SectionTiming {
    fn default() -> Self {
        Self {
            saved_display: Duration::from_secs(2),
            verify_delay: Duration::from_millis(400),
            advance_delay: Duration::from_millis(1500),
            slow_threshold: Duration::from_secs(3),
        }
    }
}

impl SectionTiming {
    /// No pacing at all; useful for scripted callers.
    pub fn immediate() -> Self {
        Self {
            saved_display: Duration::ZERO,
            verify_delay: Duration::ZERO,
            advance_delay: Duration::ZERO,
            slow_threshold: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnswerSaveState {
    Saving,
    Saved { at: Instant },
    Error,
}

/// Progress of the "Next" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvancePhase {
    #[default]
    Idle,
    Saving { slow: bool },
    Verifying { slow: bool },
}

impl AdvancePhase {
    pub fn is_slow(&self) -> bool {
        matches!(
            self,
            AdvancePhase::Saving { slow: true } | AdvancePhase::Verifying { slow: true }
        )
    }

    fn with_slow(self) -> Self {
        match self {
            AdvancePhase::Saving { .. } => AdvancePhase::Saving { slow: true },
            AdvancePhase::Verifying { .. } => AdvancePhase::Verifying { slow: true },
            AdvancePhase::Idle => AdvancePhase::Idle,
        }
    }
}

/// Where a successful "Next" leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The store now points at this section step.
    Section { step: usize },
    /// The last section is done; show results.
    Results,
}

/// Answer-count summary shown by "Save & Resume".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub answered: usize,
    pub total: usize,
    pub overall_progress: u32,
}

/// Identity of one in-flight save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub section_id: SectionId,
    pub question_id: QuestionId,
    pub label: String,
    pub score: u32,
    /// Store revision that must be durable.
    pub revision: u64,
    epoch: u64,
    seq: u64,
}

/// A save waiting for its durable write.
pub struct PendingSave {
    ticket: SaveTicket,
    confirmation: Abortable<BoxFuture<'static, Result<(), String>>>,
}

impl PendingSave {
    pub fn ticket(&self) -> &SaveTicket {
        &self.ticket
    }

    /// Wait for the write. Resolves even if the save was abandoned.
    pub async fn wait(self) -> SaveResolution {
        let persisted = self.confirmation.await.ok();
        SaveResolution {
            ticket: self.ticket,
            persisted,
        }
    }
}

/// A finished (or abandoned) durable write, ready for read-back.
#[derive(Debug)]
pub struct SaveResolution {
    pub ticket: SaveTicket,
    /// `None` when the save was aborted by navigation.
    persisted: Option<Result<(), String>>,
}

pub struct SectionController {
    section: SectionDef,
    step: usize,
    total_sections: usize,
    timing: SectionTiming,
    /// Optimistically displayed selections.
    selections: BTreeMap<QuestionId, String>,
    saves: HashMap<QuestionId, AnswerSaveState>,
    /// Latest save sequence per question; older confirmations are ignored.
    latest_seq: HashMap<QuestionId, u64>,
    next_seq: u64,
    epoch: u64,
    in_flight: HashMap<u64, AbortHandle>,
    phase: watch::Sender<AdvancePhase>,
    score_revealed: bool,
    active: bool,
}

impl SectionController {
    /// Controller for the section shown at `step`, or `None` if `step` is
    /// the profile step or past the end of the catalog.
    pub fn open(catalog: &Catalog, step: usize, store: &AnswerStore, timing: SectionTiming) -> Option<Self> {
        let section = catalog.section_at_step(step)?.clone();
        let selections: BTreeMap<_, _> = store
            .answers(section.id)
            .iter()
            .map(|a| (a.question_id, a.answer.clone()))
            .collect();
        let score_revealed = selections.len() == section.questions.len();
        let (phase, _) = watch::channel(AdvancePhase::Idle);

        tracing::debug!(section_id = section.id, step, answered = selections.len(), "section opened");

        Some(Self {
            section,
            step,
            total_sections: catalog.section_count(),
            timing,
            selections,
            saves: HashMap::new(),
            latest_seq: HashMap::new(),
            next_seq: 0,
            epoch: 0,
            in_flight: HashMap::new(),
            phase,
            score_revealed,
            active: true,
        })
    }

    pub fn section(&self) -> &SectionDef {
        &self.section
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_sections(&self) -> usize {
        self.total_sections
    }

    pub fn is_last(&self) -> bool {
        self.step == self.total_sections
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn score_revealed(&self) -> bool {
        self.score_revealed
    }

    /// The label currently displayed for a question.
    pub fn selection(&self, question_id: QuestionId) -> Option<&str> {
        self.selections.get(&question_id).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn advance_phase(&self) -> AdvancePhase {
        *self.phase.borrow()
    }

    /// Watch the "Next" phase, including the slow flag, while it runs.
    pub fn subscribe_phase(&self) -> watch::Receiver<AdvancePhase> {
        self.phase.subscribe()
    }

    /// Save state of one question as it should be displayed now.
    pub fn save_status(&self, question_id: QuestionId) -> SaveStatus {
        match self.saves.get(&question_id) {
            None => SaveStatus::Idle,
            Some(AnswerSaveState::Saving) => SaveStatus::Saving,
            Some(AnswerSaveState::Error) => SaveStatus::Error,
            Some(AnswerSaveState::Saved { at }) => {
                if at.elapsed() < self.timing.saved_display {
                    SaveStatus::Saved
                } else {
                    SaveStatus::Idle
                }
            }
        }
    }

    /// Section-wide status: error beats saving beats saved.
    pub fn section_status(&self) -> SaveStatus {
        let statuses: Vec<SaveStatus> = self
            .section
            .questions
            .iter()
            .map(|q| self.save_status(q.id))
            .collect();
        [SaveStatus::Error, SaveStatus::Saving, SaveStatus::Saved]
            .into_iter()
            .find(|s| statuses.contains(s))
            .unwrap_or(SaveStatus::Idle)
    }

    /// Why "Next" is disabled, if it is.
    pub fn can_advance(&self) -> Result<(), NavigationBlocked> {
        if !self.active {
            return Err(NavigationBlocked::SectionClosed);
        }
        let expected = self.section.questions.len();
        if self.selections.len() < expected {
            return Err(NavigationBlocked::Incomplete {
                answered: self.selections.len(),
                expected,
            });
        }
        if self
            .saves
            .values()
            .any(|s| matches!(s, AnswerSaveState::Saving))
        {
            return Err(NavigationBlocked::SavePending);
        }
        let failed: Vec<QuestionId> = self
            .section
            .questions
            .iter()
            .filter(|q| matches!(self.saves.get(&q.id), Some(AnswerSaveState::Error)))
            .map(|q| q.id)
            .collect();
        if !failed.is_empty() {
            return Err(NavigationBlocked::SaveFailed {
                question_ids: failed,
            });
        }
        Ok(())
    }

    // -- answer saves ---------------------------------------------------------

    /// Phase one of a save: record the selection and start the durable write.
    ///
    /// Re-selecting the current option runs the full cycle again.
    pub fn begin_save(
        &mut self,
        store: &mut AnswerStore,
        question_id: QuestionId,
        label: &str,
    ) -> Result<PendingSave, SaveError> {
        if !self.active {
            return Err(SaveError::SectionClosed);
        }
        let question = self
            .section
            .question(question_id)
            .ok_or(SaveError::UnknownQuestion(question_id))?;
        let score = question
            .option(label)
            .ok_or_else(|| SaveError::UnknownOption {
                question_id,
                label: label.to_string(),
            })?
            .score;

        self.selections.insert(question_id, label.to_string());
        self.saves.insert(question_id, AnswerSaveState::Saving);
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest_seq.insert(question_id, seq);

        let confirmation: BoxFuture<'static, Result<(), String>> =
            match store.set_section_answer(self.section.id, question_id, label, score) {
                Upsert::Rejected => {
                    let message = format!("question {question_id} was rejected by the store");
                    async move { Err(message) }.boxed()
                }
                Upsert::Inserted | Upsert::Replaced => {
                    store.commit_watcher().confirm(store.revision()).boxed()
                }
            };

        let (handle, registration) = AbortHandle::new_pair();
        self.in_flight.insert(seq, handle);
        tracing::debug!(section_id = self.section.id, question_id, score, seq, "answer saving");

        Ok(PendingSave {
            ticket: SaveTicket {
                section_id: self.section.id,
                question_id,
                label: label.to_string(),
                score,
                revision: store.revision(),
                epoch: self.epoch,
                seq,
            },
            confirmation: Abortable::new(confirmation, registration),
        })
    }

    /// Phase two: verify by reading the store back.
    ///
    /// Returns `None` when the resolution is discarded: the save was
    /// abandoned by navigation, belongs to another section, or a newer save of
    /// the same question has started since.
    pub fn finish_save(
        &mut self,
        store: &AnswerStore,
        resolution: SaveResolution,
    ) -> Option<Result<(), SaveError>> {
        let SaveResolution { ticket, persisted } = resolution;
        self.in_flight.remove(&ticket.seq);

        let Some(persisted) = persisted else {
            tracing::debug!(question_id = ticket.question_id, "abandoned save discarded");
            return None;
        };
        if !self.active || ticket.epoch != self.epoch || ticket.section_id != self.section.id {
            tracing::debug!(question_id = ticket.question_id, "stale save discarded");
            return None;
        }
        if self.latest_seq.get(&ticket.question_id) != Some(&ticket.seq) {
            tracing::trace!(question_id = ticket.question_id, "superseded save discarded");
            return None;
        }

        let result = match persisted {
            Err(message) => Err(SaveError::PersistFailed(message)),
            Ok(()) => match store.answer(ticket.section_id, ticket.question_id) {
                Some(saved) if saved.answer == ticket.label && saved.score == ticket.score => Ok(()),
                _ => Err(SaveError::VerifyMismatch {
                    question_id: ticket.question_id,
                }),
            },
        };

        match &result {
            Ok(()) => {
                self.saves.insert(
                    ticket.question_id,
                    AnswerSaveState::Saved { at: Instant::now() },
                );
            }
            Err(e) => {
                tracing::warn!(question_id = ticket.question_id, "answer not saved: {e}");
                self.saves.insert(ticket.question_id, AnswerSaveState::Error);
            }
        }
        Some(result)
    }

    /// Both phases of a save, back to back.
    pub async fn select_option(
        &mut self,
        store: &mut AnswerStore,
        question_id: QuestionId,
        label: &str,
    ) -> Result<(), SaveError> {
        let pending = self.begin_save(store, question_id, label)?;
        let resolution = pending.wait().await;
        self.finish_save(store, resolution)
            .unwrap_or_else(|| Err(SaveError::PersistFailed("save abandoned".into())))
    }

    // -- navigation -----------------------------------------------------------

    /// "Next": confirm persistence, re-verify the answer count, reveal the
    /// score, then move to the next section or to results.
    pub async fn next(&mut self, store: &mut AnswerStore) -> Result<Advance, NavigationBlocked> {
        if self.advance_phase() != AdvancePhase::Idle {
            return Err(NavigationBlocked::AlreadyAdvancing);
        }
        if let Err(blocked) = self.can_advance() {
            tracing::info!(section_id = self.section.id, "next blocked: {blocked}");
            return Err(blocked);
        }

        let started = Instant::now();
        self.phase.send_replace(AdvancePhase::Saving { slow: false });

        let confirmation = store.commit_watcher().confirm(store.revision());
        if let Err(message) = self.paced(started, confirmation).await {
            self.phase.send_replace(AdvancePhase::Idle);
            return Err(NavigationBlocked::PersistFailed(message));
        }

        let slow = self.advance_phase().is_slow();
        self.phase.send_replace(AdvancePhase::Verifying { slow });
        let verify_delay = self.timing.verify_delay;
        self.paced(started, tokio::time::sleep(verify_delay)).await;

        let expected = self.section.questions.len();
        let found = store.section_progress(self.section.id);
        self.phase.send_replace(AdvancePhase::Idle);
        if found != expected {
            tracing::warn!(section_id = self.section.id, found, expected, "section verification failed");
            return Err(NavigationBlocked::VerificationFailed { found, expected });
        }

        self.score_revealed = true;
        tracing::info!(
            section_id = self.section.id,
            score = store.section_score(self.section.id),
            "section complete"
        );
        tokio::time::sleep(self.timing.advance_delay).await;

        self.close();
        if self.is_last() {
            Ok(Advance::Results)
        } else {
            let step = self.step + 1;
            store.set_current_step(step);
            Ok(Advance::Section { step })
        }
    }

    /// "Previous": always allowed. Returns the new step.
    pub fn previous(&mut self, store: &mut AnswerStore) -> usize {
        self.close();
        let step = self.step.saturating_sub(1);
        store.set_current_step(step);
        step
    }

    /// "Save & Resume": confirms what is already autosaved without changing it.
    pub fn save_and_resume(&self, store: &AnswerStore) -> SaveSummary {
        SaveSummary {
            answered: store.section_progress(self.section.id),
            total: self.section.questions.len(),
            overall_progress: store.overall_progress(),
        }
    }

    /// Abandon in-flight saves and stop accepting new ones.
    pub fn close(&mut self) {
        for (_, handle) in self.in_flight.drain() {
            handle.abort();
        }
        self.epoch += 1;
        self.active = false;
        self.phase.send_replace(AdvancePhase::Idle);
    }

    /// Drive `work` to completion, flagging the advance as slow once the
    /// threshold measured from `started` passes.
    async fn paced<F: Future>(&self, started: Instant, work: F) -> F::Output {
        tokio::pin!(work);
        let slow_at = started + self.timing.slow_threshold;
        loop {
            tokio::select! {
                out = &mut work => return out,
                _ = tokio::time::sleep_until(slow_at), if !self.advance_phase().is_slow() => {
                    let phase = self.advance_phase().with_slow();
                    tracing::info!(section_id = self.section.id, "save is taking longer than usual");
                    self.phase.send_replace(phase);
                }
            }
        }
    }
}
