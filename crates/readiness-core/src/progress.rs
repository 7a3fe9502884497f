//! Resume prompt and the rolling save indicator.

use chrono::{DateTime, Utc};

use crate::model::SaveStatus;
use crate::persistence::{CommitOutcome, CommitReport};
use crate::store::AnswerStore;

/// Offered when a partially completed assessment is found at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOffer {
    /// Overall progress in percent, strictly between 0 and 100.
    pub progress: u32,
    pub company_name: String,
    /// Step the user will land on when continuing.
    pub step: usize,
}

/// The user's answer to a [`ResumeOffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeChoice {
    Continue,
    StartFresh,
}

/// A resume offer exists only with a profile and `0 < progress < 100`.
pub fn resume_offer(store: &AnswerStore) -> Option<ResumeOffer> {
    let profile = store.company_profile()?;
    let progress = store.overall_progress();
    if progress == 0 || progress >= 100 {
        return None;
    }
    Some(ResumeOffer {
        progress,
        company_name: profile.company_name.clone(),
        step: store.current_step(),
    })
}

/// Apply the user's choice and return the step to display.
pub fn resume(store: &mut AnswerStore, choice: ResumeChoice) -> usize {
    match choice {
        ResumeChoice::Continue => {
            tracing::info!(step = store.current_step(), "continuing saved assessment");
            store.current_step()
        }
        ResumeChoice::StartFresh => {
            store.reset_assessment();
            0
        }
    }
}

/// Coarse autosave status for display. Carries no control-flow meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveIndicator {
    pub status: SaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl SaveIndicator {
    /// `last_revision` is the newest revision committed by the store.
    ///
    /// Before anything is written, a snapshot saved by an earlier session
    /// shows as saved.
    pub fn from_report(report: &CommitReport, last_revision: u64) -> Self {
        let status = if last_revision > report.revision {
            SaveStatus::Saving
        } else {
            match report.outcome {
                CommitOutcome::Idle if report.last_saved_at.is_some() => SaveStatus::Saved,
                CommitOutcome::Idle => SaveStatus::Idle,
                CommitOutcome::Saved => SaveStatus::Saved,
                CommitOutcome::Failed(_) => SaveStatus::Error,
            }
        };
        Self {
            status,
            last_saved_at: report.last_saved_at,
        }
    }

    /// Current indicator for a store; idle when it has no persistence.
    pub fn for_store(store: &AnswerStore) -> Self {
        match store.persistence() {
            Some(p) => Self::from_report(&p.latest(), p.last_revision()),
            None => Self {
                status: SaveStatus::Idle,
                last_saved_at: None,
            },
        }
    }
}
