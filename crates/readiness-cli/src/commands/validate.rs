//! The `readiness validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalogs = if catalog_path.is_dir() {
        readiness_core::parser::load_catalog_directory(&catalog_path)?
    } else {
        vec![readiness_core::parser::parse_catalog(&catalog_path)?]
    };

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} sections, {} questions, max score {})",
            catalog.title,
            catalog.section_count(),
            catalog.total_questions(),
            catalog.max_score()
        );

        let warnings = readiness_core::parser::validate_catalog(catalog);
        for w in &warnings {
            let prefix = match (w.section_id, w.question_id) {
                (Some(s), Some(q)) => format!("  [{s}.{q}]"),
                (Some(s), None) => format!("  [{s}]"),
                _ => "  ".to_string(),
            };
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
