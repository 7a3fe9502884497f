//! Error types for the assessment core.
//!
//! Nothing in this crate is fatal: every variant here is recoverable either by
//! retrying the same action or by the user correcting input.

use thiserror::Error;

/// Errors raised by a durable storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read.
    #[error("storage read failed for '{key}': {message}")]
    Read { key: String, message: String },

    /// The backend rejected or failed a write.
    #[error("storage write failed for '{key}': {message}")]
    Write { key: String, message: String },

    /// The backend is not reachable at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StorageError::Unavailable(_))
    }
}

/// Why a single answer could not be confirmed as saved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// The durable write failed or did not finish within the commit timeout.
    #[error("answer could not be persisted: {0}")]
    PersistFailed(String),

    /// The store read-back disagreed with the answer that was written.
    #[error("saved answer for question {question_id} does not match the selection")]
    VerifyMismatch { question_id: u32 },

    /// The question is not part of the active section.
    #[error("question {0} is not part of this section")]
    UnknownQuestion(u32),

    /// The option label is not offered by the question.
    #[error("'{label}' is not an option for question {question_id}")]
    UnknownOption { question_id: u32, label: String },

    /// The user has already navigated away from the section.
    #[error("this section is no longer active")]
    SectionClosed,
}

impl SaveError {
    /// Persist failures and mismatches are both fixed by resubmitting the answer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SaveError::PersistFailed(_) | SaveError::VerifyMismatch { .. }
        )
    }
}

/// A user-facing refusal to advance to the next section.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationBlocked {
    #[error("please answer all questions before proceeding ({answered}/{expected} answered)")]
    Incomplete { answered: usize, expected: usize },

    #[error("answers are still being saved")]
    SavePending,

    #[error("some answers failed to save, please reselect them: {question_ids:?}")]
    SaveFailed { question_ids: Vec<u32> },

    #[error("already moving to the next section")]
    AlreadyAdvancing,

    #[error("progress could not be saved: {0}")]
    PersistFailed(String),

    #[error("saved answers could not be verified ({found}/{expected} found), please try again")]
    VerificationFailed { found: usize, expected: usize },

    #[error("this section is no longer active")]
    SectionClosed,
}

/// Company profile validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("company name is required")]
    CompanyName,

    #[error("please select an industry sector")]
    IndustrySector,

    #[error("please select company size")]
    CompanySize,

    #[error("please select GRC maturity level")]
    GrcMaturity,

    #[error("please enter a valid email address")]
    Email,
}
