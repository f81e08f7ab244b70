use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn trove(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trove").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("TROVE_DATABASE")
        .env_remove("TROVE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn init() -> TempDir {
    let dir = TempDir::new().unwrap();
    trove(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized trove repository"));
    dir
}

fn add_json(home: &Path, args: &[&str]) -> Value {
    let output = trove(home)
        .arg("add")
        .args(args)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_commands_need_init() {
    let dir = TempDir::new().unwrap();
    trove(dir.path())
        .args(["recall", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trove init"));
}

#[test]
fn test_init_twice_needs_force() {
    let dir = init();
    trove(dir.path()).arg("init").assert().failure();
    trove(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn test_add_scores_by_provenance() {
    let dir = init();

    let told = add_json(dir.path(), &["Shaun prefers tea", "--actor", "shaun"]);
    assert_eq!(told["fact"]["trust"]["score"], 0.6);

    let with_context = add_json(
        dir.path(),
        &["Shaun prefers green tea", "--actor", "shaun", "--context", "morning standup"],
    );
    assert_eq!(with_context["fact"]["trust"]["score"], 0.65);

    let experienced = add_json(dir.path(), &["The build takes four minutes", "--kind", "experienced"]);
    assert_eq!(experienced["fact"]["trust"]["score"], 0.9);
    assert_eq!(experienced["fact"]["provenance"]["actor"], "agent");
}

#[test]
fn test_independent_source_corroborates() {
    let dir = init();

    let first = add_json(
        dir.path(),
        &["Deploys happen every Tuesday morning", "--actor", "shaun", "--links", "deploys"],
    );
    let id = first["fact"]["id"].as_str().unwrap().to_string();

    let second = add_json(
        dir.path(),
        &["Deploys happen every Tuesday afternoon", "--kind", "experienced", "--links", "deploys"],
    );
    let corroborated = second["corroborated"].as_array().unwrap();
    assert_eq!(corroborated.len(), 1);
    assert_eq!(corroborated[0]["fact_id"], id.as_str());

    trove(dir.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 corroborating"));
}

#[test]
fn test_recall_ranks_and_marks_used() {
    let dir = init();
    add_json(dir.path(), &["API timeout is 30 seconds", "--kind", "experienced"]);
    add_json(dir.path(), &["API timeout might be 60 seconds", "--kind", "inferred"]);
    add_json(dir.path(), &["The cafeteria opens at noon"]);

    let output = trove(dir.path())
        .args(["recall", "API timeout", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["fact"]["content"], "API timeout is 30 seconds");
    assert!(results[0]["final_score"].as_f64() >= results[1]["final_score"].as_f64());

    let id = results[0]["fact"]["id"].as_str().unwrap();
    let shown = trove(dir.path())
        .args(["show", id, "--format", "json"])
        .output()
        .unwrap();
    let shown: Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(shown["fact"]["lifecycle"]["use_count"], 1);
    assert!(shown["projected_relevance"].as_f64().unwrap() > 0.99);
}

#[test]
fn test_recall_no_touch() {
    let dir = init();
    let added = add_json(dir.path(), &["API timeout is 30 seconds", "--kind", "observed"]);
    let id = added["fact"]["id"].as_str().unwrap();

    trove(dir.path())
        .args(["recall", "timeout", "--no-touch", "--quick"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 result"));

    let shown = trove(dir.path())
        .args(["show", id, "--format", "json"])
        .output()
        .unwrap();
    let shown: Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(shown["fact"]["lifecycle"]["use_count"], 0);
}

#[test]
fn test_about_entity() {
    let dir = init();
    add_json(dir.path(), &["Invoices go out monthly", "--links", "billing"]);
    add_json(dir.path(), &["Unrelated fact"]);

    trove(dir.path())
        .args(["about", "billing", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoices go out monthly"))
        .stdout(predicate::str::contains("Unrelated").not());
}

#[test]
fn test_contradictions_are_flagged() {
    let dir = init();
    add_json(dir.path(), &["the service is enabled", "--actor", "shaun", "--links", "svc"]);
    add_json(dir.path(), &["the service is disabled", "--actor", "maria", "--links", "svc"]);

    trove(dir.path())
        .arg("contradictions")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new contradiction"))
        .stdout(predicate::str::contains("enabled"));

    // Already recorded: a rescan neither reports nor recounts the pair
    trove(dir.path())
        .arg("contradictions")
        .assert()
        .success()
        .stdout(predicate::str::contains("No new contradictions"));

    trove(dir.path())
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"contested_facts\": 2"));
}

#[test]
fn test_sweep_and_protect() {
    let dir = init();
    let added = add_json(dir.path(), &["Standup is at nine"]);
    let id = added["fact"]["id"].as_str().unwrap();

    trove(dir.path()).args(["protect", id]).assert().success();
    trove(dir.path())
        .args(["sweep", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"archived_count\": 0"));
    trove(dir.path())
        .args(["show", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("protected"));
    trove(dir.path()).args(["unprotect", id]).assert().success();
}

#[test]
fn test_verify_and_forget() {
    let dir = init();
    let target = add_json(
        dir.path(),
        &["Standup starts at nine sharp", "--actor", "shaun", "--links", "standup", "--no-corroborate"],
    );
    let id = target["fact"]["id"].as_str().unwrap();
    add_json(
        dir.path(),
        &["Standup starts at nine sharp daily", "--actor", "shaun", "--links", "standup"],
    );

    trove(dir.path())
        .args(["verify", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verified"))
        .stdout(predicate::str::contains("1 new"));
    trove(dir.path())
        .args(["verify", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("none new"));

    let shown = trove(dir.path())
        .args(["show", id, "--format", "json"])
        .output()
        .unwrap();
    let shown: Value = serde_json::from_slice(&shown.stdout).unwrap();
    assert_eq!(shown["fact"]["trust"]["score"], 0.65);

    trove(dir.path()).args(["forget", id, "-y"]).assert().success();
    trove(dir.path()).args(["show", id]).assert().failure();
    trove(dir.path()).args(["verify", id]).assert().failure();
}

#[test]
fn test_embed_without_endpoint() {
    let dir = init();
    add_json(dir.path(), &["Standup is at nine"]);

    trove(dir.path())
        .arg("embed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No embedding endpoint"));
}

#[test]
fn test_config_get_set() {
    let dir = init();
    trove(dir.path())
        .args(["config", "user.name", "scout"])
        .assert()
        .success();
    trove(dir.path())
        .args(["config", "user.name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scout"));

    let added = add_json(dir.path(), &["I wrote the release notes", "--kind", "experienced"]);
    assert_eq!(added["fact"]["provenance"]["actor"], "scout");

    trove(dir.path())
        .args(["config", "decay.hot_days", "soon"])
        .assert()
        .failure();
}
