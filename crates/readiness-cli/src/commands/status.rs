//! The `readiness status` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use readiness_core::progress::{resume_offer, SaveIndicator};

use crate::session::Session;

pub async fn execute(config: Option<&Path>) -> Result<()> {
    let session = Session::open(config).await?;
    let store = &session.store;

    match store.company_profile() {
        Some(profile) => println!("Company: {} ({})", profile.company_name, profile.email),
        None => println!("No company profile yet. Run `readiness start` to begin."),
    }
    println!("Current step: {}", session.step_label(store.current_step()));

    let mut table = Table::new();
    table.set_header(vec!["#", "Section", "Answered", "Score"]);
    for (index, section) in session.catalog.sections.iter().enumerate() {
        let marker = if index + 1 == store.current_step() { ">" } else { "" };
        table.add_row(vec![
            Cell::new(format!("{marker}{}", index + 1)),
            Cell::new(&section.title),
            Cell::new(format!(
                "{}/{}",
                store.section_progress(section.id),
                section.questions.len()
            )),
            Cell::new(format!("{}/{}", store.section_score(section.id), section.max_score())),
        ]);
    }
    println!("{table}");
    println!("Overall progress: {}%", store.overall_progress());

    let indicator = SaveIndicator::for_store(store);
    match indicator.last_saved_at {
        Some(at) => println!("Save status: {} (last saved {})", indicator.status, at.to_rfc3339()),
        None => println!("Save status: {}", indicator.status),
    }

    if let Some(offer) = resume_offer(store) {
        println!(
            "\nWelcome back! {} is {}% through the assessment.",
            offer.company_name, offer.progress
        );
        println!("Run `readiness resume --continue` to pick up at {}, or `readiness resume --fresh` to start over.",
            session.step_label(offer.step).to_lowercase());
    }

    session.close().await
}
