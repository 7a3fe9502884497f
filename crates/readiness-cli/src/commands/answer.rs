//! The `readiness answer` command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::session::Session;

pub async fn execute(config: Option<&Path>, question_id: u32, option: String) -> Result<()> {
    let mut session = Session::open(config).await?;
    let mut controller = session
        .controller()
        .context("no section is active; run `readiness start` or `readiness resume --continue`")?;

    let question = controller
        .section()
        .question(question_id)
        .with_context(|| {
            format!(
                "question {question_id} is not part of {}",
                controller.section().title
            )
        })?;
    let label = resolve_option(&question.options, &option);

    controller
        .select_option(&mut session.store, question_id, &label)
        .await?;

    let section = controller.section();
    println!(
        "Saved: question {question_id} -> \"{label}\" ({} of {} answered in {})",
        session.store.section_progress(section.id),
        section.questions.len(),
        section.title
    );
    session.close().await
}

/// Accept an exact label or a 0-based option index.
fn resolve_option(options: &[readiness_core::model::AnswerOption], input: &str) -> String {
    if options.iter().any(|o| o.label == input) {
        return input.to_string();
    }
    input
        .parse::<usize>()
        .ok()
        .and_then(|i| options.get(i))
        .map(|o| o.label.clone())
        .unwrap_or_else(|| input.to_string())
}
