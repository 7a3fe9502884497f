//! The `readiness consult` command.

use std::path::Path;

use anyhow::{Context, Result};

use readiness_core::model::is_valid_email;
use readiness_core::traits::ConsultationRequest;
use readiness_services::create_consultation_intake;

use crate::session::Session;

pub async fn execute(
    config: Option<&Path>,
    name: String,
    email: Option<String>,
    company: Option<String>,
    phone: Option<String>,
    message: Option<String>,
) -> Result<()> {
    let session = Session::open(config).await?;
    let profile = session.store.company_profile();

    let email = email
        .or_else(|| profile.map(|p| p.email.clone()))
        .context("--email is required when no company profile exists")?;
    let company = company
        .or_else(|| profile.map(|p| p.company_name.clone()))
        .context("--company is required when no company profile exists")?;

    anyhow::ensure!(name.trim().chars().count() >= 2, "please enter your full name");
    anyhow::ensure!(is_valid_email(&email), "please enter a valid email address");
    anyhow::ensure!(company.trim().chars().count() >= 2, "please enter your company name");

    let mut request = ConsultationRequest::new(name.trim(), &email, company.trim());
    request.phone = phone
        .or_else(|| profile.and_then(|p| p.phone.clone()))
        .unwrap_or_default();
    request.message = message.unwrap_or_default();

    let service_config = session
        .config
        .services
        .consultation
        .as_ref()
        .context("no consultation service configured; add [services.consultation] to readiness.toml")?;
    let intake = create_consultation_intake(service_config)?;

    // Fire and forget: delivery problems are logged, the user is not blocked.
    if let Err(e) = intake.submit(&request).await {
        tracing::warn!(intake = intake.name(), "consultation request not delivered: {e:#}");
    }
    println!("Consultation request submitted. Our team will contact you within 24 hours.");

    session.close().await
}
