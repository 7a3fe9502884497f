//! Assessment results: section scores, maturity tier and recommendations.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Catalog, Recommendation, SectionId};
use crate::store::AnswerStore;
use crate::traits::ReportRequest;

/// How many of the weakest sections get a recommendation.
pub const RECOMMENDATION_COUNT: usize = 3;

/// Score of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScore {
    pub id: SectionId,
    pub title: String,
    pub score: u32,
    pub max_score: u32,
    /// Rounded half up.
    pub percentage: u32,
}

/// Overall maturity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaturityTier {
    Initial,
    Developing,
    Defined,
    Managed,
    Optimised,
}

impl MaturityTier {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            0..=20 => MaturityTier::Initial,
            21..=40 => MaturityTier::Developing,
            41..=60 => MaturityTier::Defined,
            61..=80 => MaturityTier::Managed,
            _ => MaturityTier::Optimised,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            MaturityTier::Initial => "Immediate Action Required",
            MaturityTier::Developing => "Significant Gaps Exist",
            MaturityTier::Defined => "Good Progress, More Work Needed",
            MaturityTier::Managed => "Strong Position, Minor Enhancements",
            MaturityTier::Optimised => "Ready",
        }
    }
}

impl fmt::Display for MaturityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaturityTier::Initial => "Initial",
            MaturityTier::Developing => "Developing",
            MaturityTier::Defined => "Defined",
            MaturityTier::Managed => "Managed",
            MaturityTier::Optimised => "Optimised",
        };
        f.write_str(name)
    }
}

/// Rough implementation effort implied by the overall percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineHint {
    Critical,
    Important,
    Manageable,
    WellPositioned,
}

impl TimelineHint {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            0..=39 => TimelineHint::Critical,
            40..=60 => TimelineHint::Important,
            61..=80 => TimelineHint::Manageable,
            _ => TimelineHint::WellPositioned,
        }
    }
}

impl fmt::Display for TimelineHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimelineHint::Critical => "Critical: minimum 9-12 months implementation needed",
            TimelineHint::Important => "Important: 6-9 months to bridge gaps",
            TimelineHint::Manageable => "Manageable: 3-6 months for fine-tuning",
            TimelineHint::WellPositioned => "Well positioned: 1-3 months for final validation",
        })
    }
}

/// Everything shown on the results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResults {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub catalog_id: String,
    pub company_name: Option<String>,
    pub sections: Vec<SectionScore>,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub maturity: MaturityTier,
    pub timeline: TimelineHint,
    pub recommendations: Vec<Recommendation>,
}

impl AssessmentResults {
    pub fn compute(store: &AnswerStore, catalog: &Catalog) -> Self {
        let sections: Vec<SectionScore> = catalog
            .sections
            .iter()
            .map(|section| {
                let score = store.section_score(section.id);
                let max_score = section.max_score();
                SectionScore {
                    id: section.id,
                    title: section.title.clone(),
                    score,
                    max_score,
                    percentage: percent(score, max_score),
                }
            })
            .collect();

        let total_score = store.total_score();
        let max_score = catalog.max_score();
        let percentage = percent(total_score, max_score);

        // Stable sort: ties keep catalog order.
        let mut weakest: Vec<&SectionScore> = sections.iter().collect();
        weakest.sort_by_key(|s| s.percentage);
        let recommendations = weakest
            .into_iter()
            .take(RECOMMENDATION_COUNT)
            .filter_map(|s| catalog.section(s.id)?.recommendation.clone())
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            catalog_id: catalog.id.clone(),
            company_name: store.company_profile().map(|p| p.company_name.clone()),
            sections,
            total_score,
            max_score,
            percentage,
            maturity: MaturityTier::from_percentage(percentage),
            timeline: TimelineHint::from_percentage(percentage),
            recommendations,
        }
    }

    /// Save as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize results")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        Ok(())
    }
}

/// Payload for emailing the report, or `None` without a company profile.
///
/// `email` overrides the profile's address.
pub fn build_report_request(
    store: &AnswerStore,
    catalog: &Catalog,
    email: Option<&str>,
) -> Option<ReportRequest> {
    let profile = store.company_profile()?;
    Some(ReportRequest {
        email: email.unwrap_or(&profile.email).to_string(),
        company_profile: profile.clone(),
        overall_score: store.total_score(),
        section_scores: catalog
            .sections
            .iter()
            .map(|s| (s.id, store.section_score(s.id)))
            .collect(),
    })
}

fn percent(score: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    ((200 * u64::from(score) + u64::from(max)) / (2 * u64::from(max))) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, CompanyProfile, Question, SectionDef};

    fn catalog() -> Catalog {
        Catalog {
            id: "p29".into(),
            title: "Provision 29".into(),
            description: String::new(),
            sections: (1..=5)
                .map(|id| SectionDef {
                    id,
                    title: format!("Section {id}"),
                    recommendation: Some(Recommendation {
                        title: format!("Improve section {id}"),
                        description: String::new(),
                        solution: String::new(),
                        timeline: "4-6 weeks".into(),
                    }),
                    questions: (0..5)
                        .map(|q| Question {
                            id: q,
                            text: String::new(),
                            options: (0..5)
                                .map(|score| AnswerOption {
                                    label: score.to_string(),
                                    score,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn store_with(section_scores: [u32; 5]) -> AnswerStore {
        let catalog = catalog();
        let mut store = AnswerStore::in_memory(catalog.layout());
        store.set_company_profile(CompanyProfile {
            company_name: "Contoso".into(),
            industry_sector: "finance".into(),
            company_size: "5000+".into(),
            grc_maturity: "managed".into(),
            email: "board@contoso.example".into(),
            phone: None,
        });
        // Spread each section total over its five questions.
        for (i, mut remaining) in section_scores.into_iter().enumerate() {
            for q in 0..5 {
                let score = remaining.min(4);
                remaining -= score;
                store.set_section_answer(i as u32 + 1, q, &score.to_string(), score);
            }
        }
        store
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(MaturityTier::from_percentage(0), MaturityTier::Initial);
        assert_eq!(MaturityTier::from_percentage(20), MaturityTier::Initial);
        assert_eq!(MaturityTier::from_percentage(21), MaturityTier::Developing);
        assert_eq!(MaturityTier::from_percentage(60), MaturityTier::Defined);
        assert_eq!(MaturityTier::from_percentage(80), MaturityTier::Managed);
        assert_eq!(MaturityTier::from_percentage(81), MaturityTier::Optimised);
    }

    #[test]
    fn timeline_boundaries() {
        assert_eq!(TimelineHint::from_percentage(39), TimelineHint::Critical);
        assert_eq!(TimelineHint::from_percentage(40), TimelineHint::Important);
        assert_eq!(TimelineHint::from_percentage(61), TimelineHint::Manageable);
        assert_eq!(TimelineHint::from_percentage(81), TimelineHint::WellPositioned);
    }

    #[test]
    fn scores_and_percentages() {
        let results = AssessmentResults::compute(&store_with([10, 20, 5, 15, 0]), &catalog());
        assert_eq!(results.total_score, 50);
        assert_eq!(results.max_score, 100);
        assert_eq!(results.percentage, 50);
        assert_eq!(results.maturity, MaturityTier::Defined);
        assert_eq!(results.sections[0].percentage, 50);
        assert_eq!(results.sections[2].percentage, 25);
        assert_eq!(results.company_name.as_deref(), Some("Contoso"));
    }

    #[test]
    fn recommendations_for_three_weakest() {
        let results = AssessmentResults::compute(&store_with([10, 20, 5, 15, 0]), &catalog());
        let titles: Vec<_> = results.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Improve section 5", "Improve section 3", "Improve section 1"]
        );
    }

    #[test]
    fn ties_keep_catalog_order() {
        let results = AssessmentResults::compute(&store_with([0, 0, 0, 0, 0]), &catalog());
        let ids: Vec<_> = results.recommendations.iter().map(|r| r.title.clone()).collect();
        assert_eq!(ids[0], "Improve section 1");
        assert_eq!(ids[2], "Improve section 3");
    }

    #[test]
    fn report_request_requires_profile() {
        let catalog = catalog();
        let empty = AnswerStore::in_memory(catalog.layout());
        assert!(build_report_request(&empty, &catalog, None).is_none());

        let store = store_with([4, 8, 0, 0, 20]);
        let request = build_report_request(&store, &catalog, None).unwrap();
        assert_eq!(request.email, "board@contoso.example");
        assert_eq!(request.overall_score, 32);
        assert_eq!(request.section_scores.get(&5), Some(&20));
        assert_eq!(request.section_scores.len(), 5);

        let request = build_report_request(&store, &catalog, Some("cfo@contoso.example")).unwrap();
        assert_eq!(request.email, "cfo@contoso.example");
    }

    #[test]
    fn results_saved_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        let results = AssessmentResults::compute(&store_with([1, 2, 3, 4, 5]), &catalog());
        results.save_json(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: AssessmentResults = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.total_score, 15);
        assert_eq!(parsed.sections, results.sections);
    }
}
