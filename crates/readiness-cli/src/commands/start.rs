//! The `readiness start` command.

use std::path::Path;

use anyhow::Result;

use readiness_core::model::CompanyProfile;

use crate::session::Session;

pub async fn execute(config: Option<&Path>, profile: CompanyProfile) -> Result<()> {
    profile.validate()?;

    let mut session = Session::open(config).await?;
    let company = profile.company_name.trim().to_string();
    session.store.set_company_profile(profile);
    session.store.set_current_step(1);

    println!("Profile saved for {company}.");
    println!("{}", session.step_label(1));
    session.close().await
}
