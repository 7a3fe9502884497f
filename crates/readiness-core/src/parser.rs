//! TOML question catalog parser.
//!
//! Loads catalogs from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerOption, Catalog, Question, Recommendation, SectionDef, SectionId};

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    sections: Vec<TomlSection>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    id: SectionId,
    title: String,
    #[serde(default)]
    recommendation: Option<TomlRecommendation>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlRecommendation {
    title: String,
    description: String,
    #[serde(default)]
    solution: String,
    #[serde(default)]
    timeline: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    /// Defaults to the question's position within its section.
    #[serde(default)]
    id: Option<u32>,
    text: String,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    label: String,
    score: u32,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog`.
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    if parsed.sections.is_empty() {
        anyhow::bail!("catalog '{}' has no sections", parsed.catalog.id);
    }

    let sections = parsed
        .sections
        .into_iter()
        .map(|s| SectionDef {
            id: s.id,
            title: s.title,
            recommendation: s.recommendation.map(|r| Recommendation {
                title: r.title,
                description: r.description,
                solution: r.solution,
                timeline: r.timeline,
            }),
            questions: s
                .questions
                .into_iter()
                .enumerate()
                .map(|(index, q)| Question {
                    id: q.id.unwrap_or(index as u32),
                    text: q.text,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| AnswerOption {
                            label: o.label,
                            score: o.score,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(Catalog {
        id: parsed.catalog.id,
        title: parsed.catalog.title,
        description: parsed.catalog.description,
        sections,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub section_id: Option<SectionId>,
    pub question_id: Option<u32>,
    pub message: String,
}

/// Validate a catalog for common issues.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_sections = HashSet::new();
    for section in &catalog.sections {
        if !seen_sections.insert(section.id) {
            warnings.push(ValidationWarning {
                section_id: Some(section.id),
                question_id: None,
                message: format!("duplicate section ID: {}", section.id),
            });
        }

        if section.questions.is_empty() {
            warnings.push(ValidationWarning {
                section_id: Some(section.id),
                question_id: None,
                message: "section has no questions".into(),
            });
        }

        let mut seen_questions = HashSet::new();
        for question in &section.questions {
            if !seen_questions.insert(question.id) {
                warnings.push(ValidationWarning {
                    section_id: Some(section.id),
                    question_id: Some(question.id),
                    message: format!("duplicate question ID: {}", question.id),
                });
            }

            if question.options.is_empty() {
                warnings.push(ValidationWarning {
                    section_id: Some(section.id),
                    question_id: Some(question.id),
                    message: "question has no options".into(),
                });
            }

            let mut labels = HashSet::new();
            for option in &question.options {
                if !labels.insert(option.label.as_str()) {
                    warnings.push(ValidationWarning {
                        section_id: Some(section.id),
                        question_id: Some(question.id),
                        message: format!("duplicate option label: {}", option.label),
                    });
                }
            }
        }
    }

    // Uneven sections skew the per-section percentages on the results page.
    let counts: HashSet<usize> = catalog.sections.iter().map(|s| s.questions.len()).collect();
    if counts.len() > 1 {
        warnings.push(ValidationWarning {
            section_id: None,
            question_id: None,
            message: "sections have different question counts".into(),
        });
    }

    warnings
}
