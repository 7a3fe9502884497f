//! The answer store: single source of truth for an assessment session.
//!
//! All mutation goes through [`AnswerStore`]; every mutating call hands a
//! snapshot to the persistence adapter before returning. Queries are computed
//! from the current state on every call.

use crate::model::{
    AssessmentState, CatalogLayout, CompanyProfile, QuestionId, SectionAnswer, SectionId, Upsert,
};
use crate::persistence::{CommitWatcher, PersistenceAdapter};

pub struct AnswerStore {
    state: AssessmentState,
    layout: CatalogLayout,
    persistence: Option<PersistenceAdapter>,
    /// Revision of the last snapshot handed to persistence.
    revision: u64,
}

impl AnswerStore {
    /// A store with no durable backing.
    pub fn in_memory(layout: CatalogLayout) -> Self {
        Self {
            state: AssessmentState::default(),
            layout,
            persistence: None,
            revision: 0,
        }
    }

    /// Rehydrate from `persistence` and autosave every mutation to it.
    pub async fn open(layout: CatalogLayout, persistence: PersistenceAdapter) -> Self {
        let state = persistence.load(&layout).await;
        tracing::debug!(
            step = state.current_step,
            has_profile = state.company_profile.is_some(),
            "assessment rehydrated"
        );
        Self {
            state,
            layout,
            persistence: Some(persistence),
            revision: 0,
        }
    }

    pub fn state(&self) -> &AssessmentState {
        &self.state
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    pub fn persistence(&self) -> Option<&PersistenceAdapter> {
        self.persistence.as_ref()
    }

    /// Revision of the latest committed snapshot (0 before any mutation).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Give up the store, keeping its persistence adapter for shutdown.
    pub fn into_persistence(self) -> Option<PersistenceAdapter> {
        self.persistence
    }

    /// A watcher for confirming this store's commits.
    pub fn commit_watcher(&self) -> CommitWatcher {
        self.persistence
            .as_ref()
            .map(PersistenceAdapter::watcher)
            .unwrap_or_else(CommitWatcher::detached)
    }

    // -- mutations ----------------------------------------------------------

    pub fn set_company_profile(&mut self, profile: CompanyProfile) {
        self.state.company_profile = Some(profile);
        self.commit();
    }

    /// Set the active step, clamped to `0..=section_count`.
    pub fn set_current_step(&mut self, step: usize) {
        let max = self.layout.section_count();
        if step > max {
            tracing::warn!(step, max, "step out of range, clamping");
        }
        self.state.current_step = step.min(max);
        self.commit();
    }

    /// Record an answer, replacing any earlier answer to the same question.
    ///
    /// Answers for sections or questions the catalog does not have are
    /// rejected without touching state, so a section never holds more answers
    /// than it has questions.
    pub fn set_section_answer(
        &mut self,
        section_id: SectionId,
        question_id: QuestionId,
        answer: &str,
        score: u32,
    ) -> Upsert {
        let Some(question_ids) = self.layout.question_ids(section_id) else {
            tracing::warn!(section_id, question_id, "answer for unknown section rejected");
            return Upsert::Rejected;
        };
        if !question_ids.contains(&question_id) {
            tracing::warn!(section_id, question_id, "answer for unknown question rejected");
            return Upsert::Rejected;
        }

        let answers = self.state.sections.entry(section_id).or_default();
        let outcome = match answers.iter_mut().find(|a| a.question_id == question_id) {
            Some(existing) => {
                existing.answer = answer.to_string();
                existing.score = score;
                Upsert::Replaced
            }
            None => {
                answers.push(SectionAnswer {
                    question_id,
                    answer: answer.to_string(),
                    score,
                });
                Upsert::Inserted
            }
        };

        self.commit();
        outcome
    }

    /// Clear profile, step and answers. Idempotent.
    pub fn reset_assessment(&mut self) {
        self.state = AssessmentState::default();
        tracing::info!("assessment reset");
        self.commit();
    }

    // -- queries ------------------------------------------------------------

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn company_profile(&self) -> Option<&CompanyProfile> {
        self.state.company_profile.as_ref()
    }

    pub fn answers(&self, section_id: SectionId) -> &[SectionAnswer] {
        self.state.answers(section_id)
    }

    pub fn answer(&self, section_id: SectionId, question_id: QuestionId) -> Option<&SectionAnswer> {
        self.state.answer(section_id, question_id)
    }

    /// Sum of scores in a section; 0 if unanswered or unknown.
    pub fn section_score(&self, section_id: SectionId) -> u32 {
        self.answers(section_id).iter().map(|a| a.score).sum()
    }

    /// Sum of all section scores.
    pub fn total_score(&self) -> u32 {
        self.state
            .sections
            .values()
            .flatten()
            .map(|a| a.score)
            .sum()
    }

    /// Number of answered questions in a section.
    pub fn section_progress(&self, section_id: SectionId) -> usize {
        self.answers(section_id).len()
    }

    /// Percentage of all questions answered, rounded half up.
    ///
    /// Always 0 while no company profile is set.
    pub fn overall_progress(&self) -> u32 {
        if self.state.company_profile.is_none() {
            return 0;
        }
        let total = self.layout.total_questions();
        if total == 0 {
            return 0;
        }
        let answered: usize = self.state.sections.values().map(Vec::len).sum();
        ((200 * answered + total) / (2 * total)) as u32
    }

    /// Whether every question of a section has an answer.
    pub fn is_section_complete(&self, section_id: SectionId) -> bool {
        self.layout
            .question_count(section_id)
            .is_some_and(|count| self.section_progress(section_id) >= count)
    }

    fn commit(&mut self) {
        if let Some(persistence) = &self.persistence {
            self.revision = persistence.commit(&self.state);
        }
    }
}
