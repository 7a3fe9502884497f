//! The `readiness init` command.

use std::path::Path;

use anyhow::Result;

use crate::session::BUNDLED_CATALOG;

pub fn execute() -> Result<()> {
    if Path::new("readiness.toml").exists() {
        println!("readiness.toml already exists, skipping.");
    } else {
        std::fs::write("readiness.toml", SAMPLE_CONFIG)?;
        println!("Created readiness.toml");
    }

    std::fs::create_dir_all("catalog")?;
    let catalog_path = Path::new("catalog/provision29.toml");
    if catalog_path.exists() {
        println!("catalog/provision29.toml already exists, skipping.");
    } else {
        std::fs::write(catalog_path, BUNDLED_CATALOG)?;
        println!("Created catalog/provision29.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit readiness.toml with your report and consultation endpoints");
    println!("  2. Run: readiness validate --catalog catalog/provision29.toml");
    println!("  3. Run: readiness start --company <NAME> --sector <SECTOR> --size <SIZE> --maturity <LEVEL> --email <EMAIL>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# readiness configuration

data_dir = "./.readiness"
namespace = "readinow-assessment"
catalog = "catalog/provision29.toml"

[timing]
saved_display_ms = 2000
verify_delay_ms = 400
advance_delay_ms = 1500
slow_threshold_ms = 3000
commit_timeout_ms = 10000

[services.report]
type = "http"
base_url = "https://example.functions.supabase.co"
api_key = "${READINESS_REPORT_KEY}"

[services.consultation]
type = "mock"
"#;
