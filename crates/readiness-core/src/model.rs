//! Core data model types for readiness.
//!
//! Two families live here: the assessment state that is persisted between
//! sessions, and the read-only question catalog that drives it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Identifier of a section within the catalog.
pub type SectionId = u32;

/// Identifier of a question within its section.
pub type QuestionId = u32;

// ---------------------------------------------------------------------------
// Assessment state
// ---------------------------------------------------------------------------

/// The organisation taking the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: String,
    pub industry_sector: String,
    pub company_size: String,
    /// Self-reported GRC maturity tier.
    pub grc_maturity: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CompanyProfile {
    /// Check the profile against the entry form's rules.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.company_name.trim().chars().count() < 2 {
            return Err(ProfileError::CompanyName);
        }
        if self.industry_sector.is_empty() {
            return Err(ProfileError::IndustrySector);
        }
        if self.company_size.is_empty() {
            return Err(ProfileError::CompanySize);
        }
        if self.grc_maturity.is_empty() {
            return Err(ProfileError::GrcMaturity);
        }
        if !is_valid_email(&self.email) {
            return Err(ProfileError::Email);
        }
        Ok(())
    }
}

/// Loose structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// A recorded answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnswer {
    pub question_id: QuestionId,
    /// Label of the selected option.
    pub answer: String,
    pub score: u32,
}

/// Everything that survives a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentState {
    /// 0 is profile entry; `n >= 1` is the n-th section of the catalog.
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub company_profile: Option<CompanyProfile>,
    #[serde(default)]
    pub sections: BTreeMap<SectionId, Vec<SectionAnswer>>,
}

impl AssessmentState {
    /// Answers recorded for a section, in first-answered order.
    pub fn answers(&self, section_id: SectionId) -> &[SectionAnswer] {
        self.sections
            .get(&section_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn answer(&self, section_id: SectionId, question_id: QuestionId) -> Option<&SectionAnswer> {
        self.answers(section_id)
            .iter()
            .find(|a| a.question_id == question_id)
    }

    /// Bring a state loaded from storage back within the layout.
    ///
    /// Drops sections and questions the layout does not know, and duplicate
    /// question entries (the later one wins), then clamps the step. Returns
    /// the number of answers dropped.
    pub fn normalize(&mut self, layout: &CatalogLayout) -> usize {
        let mut dropped = 0;

        self.sections.retain(|section_id, answers| {
            let Some(question_ids) = layout.question_ids(*section_id) else {
                dropped += answers.len();
                return false;
            };

            let mut kept: Vec<SectionAnswer> = Vec::with_capacity(answers.len());
            for answer in answers.drain(..) {
                if !question_ids.contains(&answer.question_id) {
                    dropped += 1;
                } else if let Some(existing) =
                    kept.iter_mut().find(|a| a.question_id == answer.question_id)
                {
                    *existing = answer;
                    dropped += 1;
                } else {
                    kept.push(answer);
                }
            }
            *answers = kept;
            true
        });

        self.current_step = self.current_step.min(layout.section_count());
        dropped
    }
}

/// Outcome of an answer upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First answer for this question.
    Inserted,
    /// An existing answer was replaced in place.
    Replaced,
    /// The section or question is not in the catalog.
    Rejected,
}

/// Save state of a single answer (or a whole section, aggregated).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Idle => write!(f, "idle"),
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved => write!(f, "saved"),
            SaveStatus::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Question catalog
// ---------------------------------------------------------------------------

/// The fixed questionnaire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Sections in presentation order. Step `n` shows `sections[n - 1]`.
    #[serde(default)]
    pub sections: Vec<SectionDef>,
}

impl Catalog {
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, section_id: SectionId) -> Option<&SectionDef> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// The section shown at a step, or `None` for the profile step and
    /// anything past the last section.
    pub fn section_at_step(&self, step: usize) -> Option<&SectionDef> {
        step.checked_sub(1).and_then(|i| self.sections.get(i))
    }

    /// The 1-based step at which a section is shown.
    pub fn step_of(&self, section_id: SectionId) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.id == section_id)
            .map(|i| i + 1)
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Highest reachable total score.
    pub fn max_score(&self) -> u32 {
        self.sections.iter().map(SectionDef::max_score).sum()
    }

    pub fn layout(&self) -> CatalogLayout {
        CatalogLayout {
            sections: self
                .sections
                .iter()
                .map(|s| (s.id, s.questions.iter().map(|q| q.id).collect()))
                .collect(),
        }
    }
}

/// A themed group of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDef {
    pub id: SectionId,
    pub title: String,
    /// Suggested next step when this section scores among the weakest.
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl SectionDef {
    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(Question::max_score).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn option(&self, label: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.label == label)
    }

    pub fn max_score(&self) -> u32 {
        self.options.iter().map(|o| o.score).max().unwrap_or(0)
    }
}

/// One selectable answer and the points it is worth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub timeline: String,
}

/// Section and question ids, all the store needs from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLayout {
    sections: Vec<(SectionId, Vec<QuestionId>)>,
}

impl CatalogLayout {
    /// `section_count` sections with ids `1..=section_count`, each holding
    /// questions `0..questions_per_section`.
    pub fn uniform(section_count: usize, questions_per_section: usize) -> Self {
        Self {
            sections: (1..=section_count as SectionId)
                .map(|id| (id, (0..questions_per_section as QuestionId).collect()))
                .collect(),
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn question_ids(&self, section_id: SectionId) -> Option<&[QuestionId]> {
        self.sections
            .iter()
            .find(|(id, _)| *id == section_id)
            .map(|(_, questions)| questions.as_slice())
    }

    pub fn question_count(&self, section_id: SectionId) -> Option<usize> {
        self.question_ids(section_id).map(<[QuestionId]>::len)
    }

    pub fn contains(&self, section_id: SectionId, question_id: QuestionId) -> bool {
        self.question_ids(section_id)
            .is_some_and(|questions| questions.contains(&question_id))
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|(_, questions)| questions.len()).sum()
    }

    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.iter().map(|(id, _)| *id)
    }
}
