//! The `readiness next` and `readiness previous` commands.

use std::path::Path;

use anyhow::{Context, Result};

use readiness_core::section::Advance;

use crate::session::Session;

pub async fn next(config: Option<&Path>) -> Result<()> {
    let mut session = Session::open(config).await?;
    let mut controller = session
        .controller()
        .context("no section is active; run `readiness start` first")?;
    let mut phases = controller.subscribe_phase();
    let section_id = controller.section().id;
    let title = controller.section().title.clone();
    let max = controller.section().max_score();

    eprintln!("Saving your progress...");
    let advance = {
        let next = controller.next(&mut session.store);
        tokio::pin!(next);
        let mut warned = false;
        loop {
            tokio::select! {
                result = &mut next => break result,
                changed = phases.changed(), if !warned => {
                    if changed.is_err() {
                        warned = true;
                    } else if phases.borrow().is_slow() {
                        eprintln!("This is taking longer than usual, please wait...");
                        warned = true;
                    }
                }
            }
        }
    }?;

    println!(
        "{title} complete: {}/{max}",
        session.store.section_score(section_id)
    );
    match advance {
        Advance::Section { step } => println!("Next: {}", session.step_label(step)),
        Advance::Results => {
            println!("All sections complete. Run `readiness results` to see your readiness score.")
        }
    }
    session.close().await
}

pub async fn previous(config: Option<&Path>) -> Result<()> {
    let mut session = Session::open(config).await?;
    let step = match session.controller() {
        Some(mut controller) => controller.previous(&mut session.store),
        None if session.store.current_step() == 0 => {
            println!("Already at the company profile.");
            return session.close().await;
        }
        None => {
            let step = session.store.current_step() - 1;
            session.store.set_current_step(step);
            step
        }
    };

    println!("Back to {}", session.step_label(step));
    session.close().await
}
