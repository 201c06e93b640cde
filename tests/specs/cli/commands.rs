//! CLI specs
//!
//! Black-box: invoke the ferry binary and verify stdout, stderr, and
//! exit codes.

use assert_cmd::Command;
use predicates::prelude::*;

const CONFIG: &str = r#"
application = "ferry"
stage = "test"
primary_region = "eu-west-1"
secondary_region = "eu-central-1"
backup_interval = "720m"
domain_id = "dzd_domain"
project_id = "prj_1"
"#;

const ASSETS: &str = r#"[
  {
    "asset_id": "asset-1",
    "asset_type": "table",
    "asset_name": "orders",
    "external_identifier": "arn:orders",
    "created_at": "2024-01-01T00:00:00Z",
    "first_revision_created_at": "2024-01-01T00:00:00Z"
  },
  {
    "asset_id": "asset-2",
    "asset_type": "table",
    "asset_name": "users",
    "external_identifier": null,
    "created_at": "2024-01-02T00:00:00Z",
    "first_revision_created_at": "2024-01-02T00:00:00Z"
  }
]"#;

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config = format!("{}data_dir = \"{}\"\n", CONFIG, data_dir.display());
        std::fs::write(dir.path().join("ferry.toml"), config).unwrap();
        std::fs::write(dir.path().join("assets.json"), ASSETS).unwrap();
        Self { dir }
    }

    fn ferry(&self) -> Command {
        let mut cmd = Command::cargo_bin("ferry").unwrap();
        cmd.current_dir(self.dir.path());
        cmd
    }
}

#[test]
fn help_lists_the_pipeline_commands() {
    Command::cargo_bin("ferry")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_validate_accepts_a_well_formed_file() {
    let project = Project::new();
    project
        .ferry()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn config_validate_rejects_identical_regions() {
    let project = Project::new();
    let config = CONFIG.replace("eu-central-1", "eu-west-1");
    std::fs::write(project.dir.path().join("ferry.toml"), config).unwrap();

    project
        .ferry()
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("secondary region must differ"));
}

#[test]
fn config_show_prints_the_effective_configuration() {
    let project = Project::new();
    project
        .ferry()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("primary_region = \"eu-west-1\""))
        .stdout(predicate::str::contains("backup_interval"));
}

#[test]
fn backup_writes_every_asset_and_reports_success() {
    let project = Project::new();
    project
        .ferry()
        .args(["backup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("State: succeed"))
        .stdout(predicate::str::contains("Assets written: 2"));
}

#[test]
fn backup_failure_sets_the_exit_code_and_reports_the_cause() {
    let project = Project::new();
    std::fs::remove_file(project.dir.path().join("assets.json")).unwrap();

    project
        .ferry()
        .args(["backup"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("State: fail"))
        .stdout(predicate::str::contains("Error:"));
}

#[test]
fn history_shows_the_recorded_execution() {
    let project = Project::new();
    project.ferry().args(["backup"]).assert().success();

    project
        .ferry()
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("execution:started"))
        .stdout(predicate::str::contains("execution:succeeded"));

    // Name filtering narrows to one record kind
    project
        .ferry()
        .args(["history", "--name", "worker:succeeded"])
        .assert()
        .success()
        .stdout(predicate::str::contains("worker:succeeded"))
        .stdout(predicate::str::contains("execution:started").not());
}

#[test]
fn history_with_no_records_says_so() {
    let project = Project::new();
    project
        .ferry()
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No history records"));
}

#[test]
fn backup_emits_json_when_asked() {
    let project = Project::new();
    let output = project
        .ferry()
        .args(["backup", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["state"], "succeed");
    assert_eq!(summary["assets_written"], 2);
}
