//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn readiness() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("readiness").unwrap()
}

const FAST_CONFIG: &str = r#"
data_dir = "data"

[timing]
saved_display_ms = 0
verify_delay_ms = 0
advance_delay_ms = 0

[services.report]
type = "mock"

[services.consultation]
type = "mock"
"#;

/// A workspace with a fast config and no saved assessment.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("readiness.toml"), FAST_CONFIG).unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    readiness()
        .current_dir(dir)
        .env_remove("READINESS_DATA_DIR")
        .args(args)
        .assert()
}

fn start(dir: &Path) {
    run(
        dir,
        &[
            "start",
            "--company",
            "Acme Holdings",
            "--sector",
            "manufacturing",
            "--size",
            "1000-4999",
            "--maturity",
            "developing",
            "--email",
            "risk@acme.example",
        ],
    )
    .success();
}

fn answer_section(dir: &Path, option_index: usize) {
    for q in 0..5 {
        run(
            dir,
            &["answer", "--question", &q.to_string(), "--option", &option_index.to_string()],
        )
        .success();
    }
}

#[test]
fn help_output() {
    readiness()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("readiness self-assessment"));
}

#[test]
fn version_output() {
    readiness()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("readiness"));
}

#[test]
fn validate_reference_catalog() {
    readiness()
        .arg("validate")
        .arg("--catalog")
        .arg("../../catalog/provision29.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 sections, 25 questions, max score 100"))
        .stdout(predicate::str::contains("All catalogs valid"));
}

#[test]
fn validate_nonexistent_file() {
    readiness()
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    readiness()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created readiness.toml"))
        .stdout(predicate::str::contains("Created catalog/provision29.toml"));

    assert!(dir.path().join("readiness.toml").exists());
    assert!(dir.path().join("catalog/provision29.toml").exists());

    readiness()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn start_rejects_invalid_profile() {
    let dir = workspace();
    run(
        dir.path(),
        &[
            "start", "--company", "A", "--sector", "retail", "--size", "1-49", "--maturity",
            "initial", "--email", "a@b.co",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("company name is required"));

    run(
        dir.path(),
        &[
            "start", "--company", "Acme", "--sector", "retail", "--size", "1-49", "--maturity",
            "initial", "--email", "not-an-email",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("valid email"));
}

#[test]
fn answers_persist_between_runs() {
    let dir = workspace();
    start(dir.path());

    run(dir.path(), &["answer", "--question", "0", "--option", "Quarterly"])
        .failure()
        .stderr(predicate::str::contains("is not an option"));

    run(
        dir.path(),
        &["answer", "--question", "0", "--option", "Framework in development"],
    )
    .success()
    .stdout(predicate::str::contains("1 of 5 answered"));

    run(dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("Acme Holdings"))
        .stdout(predicate::str::contains("Overall progress: 4%"))
        .stdout(predicate::str::contains("Save status: saved (last saved"))
        .stdout(predicate::str::contains("Welcome back"));

    assert!(dir.path().join("data/readinow-assessment.json").exists());
}

#[test]
fn next_requires_complete_section() {
    let dir = workspace();
    start(dir.path());
    run(dir.path(), &["answer", "--question", "0", "--option", "2"]).success();

    run(dir.path(), &["next"])
        .failure()
        .stderr(predicate::str::contains("answer all questions"));

    run(dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("Section 1 of 5"));
}

#[test]
fn next_advances_and_previous_goes_back() {
    let dir = workspace();
    start(dir.path());
    answer_section(dir.path(), 2);

    run(dir.path(), &["next"])
        .success()
        .stdout(predicate::str::contains("Risk Governance Framework complete: 10/20"))
        .stdout(predicate::str::contains("Section 2 of 5: Material Controls Identification"));

    run(dir.path(), &["previous"])
        .success()
        .stdout(predicate::str::contains("Section 1 of 5"));

    run(dir.path(), &["previous"])
        .success()
        .stdout(predicate::str::contains("Company profile"));

    run(dir.path(), &["previous"])
        .success()
        .stdout(predicate::str::contains("Already at the company profile"));
}

#[test]
fn full_assessment_reaches_results() {
    let dir = workspace();
    start(dir.path());
    for _ in 0..5 {
        answer_section(dir.path(), 3);
        run(dir.path(), &["next"]).success();
    }

    run(dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("Overall progress: 100%"))
        .stdout(predicate::str::contains("Welcome back").not());

    let out = dir.path().join("results.json");
    run(
        dir.path(),
        &["results", "--output", out.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("Overall: 75/100 (75%)"))
    .stdout(predicate::str::contains("Maturity: Managed"))
    .stdout(predicate::str::contains("Manageable"))
    .stdout(predicate::str::contains("Strengthen Risk Governance Framework"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(json["percentage"], 75);
    assert_eq!(json["maturity"], "managed");
}

#[test]
fn save_reports_progress_without_changes() {
    let dir = workspace();
    start(dir.path());
    run(dir.path(), &["answer", "--question", "1", "--option", "4"]).success();

    run(dir.path(), &["save"])
        .success()
        .stdout(predicate::str::contains("1/5 answered"))
        .stdout(predicate::str::contains("4% overall"));
}

#[test]
fn resume_fresh_discards_answers() {
    let dir = workspace();
    start(dir.path());
    run(dir.path(), &["answer", "--question", "0", "--option", "1"]).success();

    run(dir.path(), &["resume", "--continue"])
        .success()
        .stdout(predicate::str::contains("Continuing Acme Holdings (4% complete)"));

    run(dir.path(), &["resume", "--fresh"])
        .success()
        .stdout(predicate::str::contains("Starting fresh"));

    run(dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("No company profile yet"));

    run(dir.path(), &["resume", "--continue"])
        .success()
        .stdout(predicate::str::contains("No partially completed assessment"));
}

#[test]
fn results_require_profile() {
    let dir = workspace();
    run(dir.path(), &["results"])
        .failure()
        .stderr(predicate::str::contains("no company profile"));
}

#[test]
fn results_email_uses_report_service() {
    let dir = workspace();
    start(dir.path());

    run(dir.path(), &["results", "--email", "bad"])
        .failure()
        .stderr(predicate::str::contains("valid email"));

    run(dir.path(), &["results", "--email", "cfo@acme.example"])
        .success()
        .stdout(predicate::str::contains("Report sent to cfo@acme.example"));
}

#[tokio::test(flavor = "multi_thread")]
async fn results_email_over_http() {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-assessment-report"))
        .and(body_partial_json(serde_json::json!({
            "email": "cfo@acme.example",
            "companyProfile": {"companyName": "Acme Holdings"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "r-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = workspace();
    let config = format!(
        "data_dir = \"data\"\n\n[services.report]\ntype = \"http\"\nbase_url = \"{}\"\n",
        server.uri()
    );
    std::fs::write(dir.path().join("readiness.toml"), config).unwrap();
    start(dir.path());

    run(dir.path(), &["results", "--email", "cfo@acme.example"])
        .success()
        .stdout(predicate::str::contains("Report sent"));
}

#[test]
fn consult_uses_profile_defaults() {
    let dir = workspace();

    run(dir.path(), &["consult", "--name", "Dana Reyes"])
        .failure()
        .stderr(predicate::str::contains("--email is required"));

    start(dir.path());
    run(dir.path(), &["consult", "--name", "Dana Reyes", "--message", "Call me"])
        .success()
        .stdout(predicate::str::contains("Consultation request submitted"));
}

#[test]
fn reset_clears_assessment() {
    let dir = workspace();
    start(dir.path());
    run(dir.path(), &["reset"])
        .success()
        .stdout(predicate::str::contains("Assessment reset"));
    run(dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("Overall progress: 0%"));
}

#[test]
fn explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, FAST_CONFIG.replace("\"data\"", "\"custom-data\"")).unwrap();

    readiness()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("reset")
        .assert()
        .success();
    assert!(dir.path().join("custom-data/readinow-assessment.json").exists());
}
