//! The `readiness save` command.

use std::path::Path;

use anyhow::Result;

use crate::session::Session;

pub async fn execute(config: Option<&Path>) -> Result<()> {
    let session = Session::open(config).await?;

    match session.controller() {
        Some(controller) => {
            let summary = controller.save_and_resume(&session.store);
            println!(
                "Progress saved: {}/{} answered in {}, {}% overall.",
                summary.answered,
                summary.total,
                controller.section().title,
                summary.overall_progress
            );
        }
        None => println!(
            "Progress saved: {}% overall.",
            session.store.overall_progress()
        ),
    }
    println!("Run `readiness resume --continue` any time to pick up where you left off.");
    session.close().await
}
