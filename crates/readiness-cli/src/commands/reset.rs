//! The `readiness reset` command.

use std::path::Path;

use anyhow::Result;

use crate::session::Session;

pub async fn execute(config: Option<&Path>) -> Result<()> {
    let mut session = Session::open(config).await?;
    session.store.reset_assessment();
    println!("Assessment reset.");
    session.close().await
}
