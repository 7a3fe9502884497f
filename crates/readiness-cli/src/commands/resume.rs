//! The `readiness resume` command.

use std::path::Path;

use anyhow::Result;

use readiness_core::progress::{resume, resume_offer, ResumeChoice};

use crate::session::Session;

pub async fn execute(config: Option<&Path>, continue_: bool, fresh: bool) -> Result<()> {
    anyhow::ensure!(
        continue_ || fresh,
        "choose either --continue or --fresh"
    );

    let mut session = Session::open(config).await?;
    let Some(offer) = resume_offer(&session.store) else {
        println!("No partially completed assessment to resume.");
        return session.close().await;
    };

    let choice = if fresh {
        ResumeChoice::StartFresh
    } else {
        ResumeChoice::Continue
    };
    let step = resume(&mut session.store, choice);

    match choice {
        ResumeChoice::Continue => println!(
            "Continuing {} ({}% complete) at {}",
            offer.company_name,
            offer.progress,
            session.step_label(step)
        ),
        ResumeChoice::StartFresh => println!("Saved answers discarded. Starting fresh."),
    }
    session.close().await
}
