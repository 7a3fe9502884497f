//! The `readiness results` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use readiness_core::model::is_valid_email;
use readiness_core::results::{build_report_request, AssessmentResults};
use readiness_services::create_report_service;

use crate::session::Session;

pub async fn execute(
    config: Option<&Path>,
    email: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = Session::open(config).await?;
    anyhow::ensure!(
        session.store.company_profile().is_some(),
        "no company profile found; complete the assessment first"
    );

    let results = AssessmentResults::compute(&session.store, &session.catalog);
    print_results(&results);

    if let Some(path) = &output {
        results.save_json(path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    if let Some(email) = email {
        anyhow::ensure!(is_valid_email(&email), "please enter a valid email address");
        let service_config = session
            .config
            .services
            .report
            .as_ref()
            .context("no report service configured; add [services.report] to readiness.toml")?;
        let service = create_report_service(service_config)?;
        let request = build_report_request(&session.store, &session.catalog, Some(&email))
            .context("company profile not found")?;

        service
            .send_report(&request)
            .await
            .context("failed to send report, please try again")?;
        println!("Report sent to {email}.");
    }

    session.close().await
}

fn print_results(results: &AssessmentResults) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Score", "Max", "%"]);
    for section in &results.sections {
        table.add_row(vec![
            Cell::new(&section.title),
            Cell::new(section.score),
            Cell::new(section.max_score),
            Cell::new(format!("{}%", section.percentage)),
        ]);
    }

    if let Some(company) = &results.company_name {
        println!("Readiness results for {company}");
    }
    println!("{table}");
    println!(
        "Overall: {}/{} ({}%)",
        results.total_score, results.max_score, results.percentage
    );
    println!("Maturity: {} - {}", results.maturity, results.maturity.headline());
    println!("Timeline: {}", results.timeline);

    if !results.recommendations.is_empty() {
        println!("\nPriority recommendations:");
        for (i, rec) in results.recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, rec.title);
            println!("     {}", rec.description);
            if !rec.solution.is_empty() {
                println!("     {}", rec.solution);
            }
            if !rec.timeline.is_empty() {
                println!("     Implementation timeline: {}", rec.timeline);
            }
        }
    }
}
