use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::str::contains;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "claude-3-5-haiku-20241022";
const GREETING: &str = "This will be a TODO list!";

fn frbench(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("frbench").unwrap();
    cmd.current_dir(dir)
        .env_remove("FRBENCH_CONFIG")
        .env_remove("FRBENCH_TEMPLATES")
        .env_remove("FRBENCH_CACHE")
        .env_remove("RUST_LOG");
    cmd
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A one-requirement project whose test greps main.go for the greeting.
fn todo_project(dir: &Path) {
    write(
        &dir.join("templates/todo/project.yml"),
        &format!(
            "name: Simple TODO\ntype: single\nrequirements:\n  - name: Greeting\n    description: \"App should print out '{}' when started.\"\n    score: 2\n",
            GREETING
        ),
    );
    write(&dir.join("templates/todo/init/main.go"), "package main\n");
    write(
        &dir.join("templates/todo/reference/1_test.go"),
        "package main\n",
    );
    write(
        &dir.join("frbench.toml"),
        &format!(
            "k = 2\noracle = [\"sh\", \"-c\", \"grep -q '{}' main.go\"]\n",
            GREETING
        ),
    );
}

fn run_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir.join("out"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    dirs.sort();
    dirs
}

#[test]
fn init_scaffolds_template() {
    let dir = TempDir::new().unwrap();
    frbench(dir.path())
        .args(["init", "hello"])
        .assert()
        .success()
        .stdout(contains("Created template 'hello'"));

    let root = dir.path().join("templates/hello");
    assert!(root.join("project.yml").is_file());
    assert!(root.join("init/main.go").is_file());
    assert!(root.join("reference/main.go").is_file());
    assert!(root.join("reference/1_test.go").is_file());
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    frbench(dir.path()).args(["init", "hello"]).assert().success();
    frbench(dir.path())
        .args(["init", "hello"])
        .assert()
        .failure()
        .stderr(contains("already exists"));
}

#[test]
fn init_honours_templates_flag_and_kind() {
    let dir = TempDir::new().unwrap();
    frbench(dir.path())
        .args(["init", "steps", "--checkpoints", "--templates", "projects"])
        .assert()
        .success();

    let yml = fs::read_to_string(dir.path().join("projects/steps/project.yml")).unwrap();
    assert!(yml.contains("type: checkpoints"));
}

#[test]
fn list_shows_templates() {
    let dir = TempDir::new().unwrap();
    todo_project(dir.path());
    frbench(dir.path()).args(["init", "another"]).assert().success();

    frbench(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("todo"))
        .stdout(contains("Simple TODO"))
        .stdout(contains("another"))
        .stdout(contains("1 requirements"));
}

#[test]
fn list_empty_templates_dir() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("templates")).unwrap();
    frbench(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No templates"));
}

#[test]
fn eval_writes_tables_for_every_mode() {
    let dir = TempDir::new().unwrap();
    let run = dir.path().join("out/20241101T120000");
    let stats = json!({
        "timestamp": "20241101T120000",
        "models": {
            "gpt-4o": {"projects": {"todo": {"requirements": [
                {"cost": 0.01, "completed": true, "max_score": 10, "attempts": 2, "duration_ms": 1500},
                {"cost": 0.02, "completed": false, "max_score": 5, "attempts": 3, "duration_ms": 500}
            ]}}}
        }
    });
    write(&run.join("stats.json"), &stats.to_string());

    frbench(dir.path())
        .arg("eval")
        .arg(&run)
        .assert()
        .success()
        .stdout(contains("score-k"))
        .stdout(contains("gpt-4o"));

    let scores = fs::read_to_string(run.join("scores-score-k.csv")).unwrap();
    assert_eq!(scores, "project/model,gpt-4o\ntodo,10.0\n");
    let weighted = fs::read_to_string(run.join("scores-weighted-score-k.csv")).unwrap();
    assert_eq!(weighted, "project/model,gpt-4o\ntodo,5.0\n");
    let costs = fs::read_to_string(run.join("costs-score-k.csv")).unwrap();
    assert_eq!(costs, "project/model,gpt-4o\ntodo,0.03000\n");
    assert!(run.join("resp_times-weighted-score-k.csv").is_file());

    let eval: Value =
        serde_json::from_str(&fs::read_to_string(run.join("eval-score-k.json")).unwrap()).unwrap();
    assert_eq!(eval["gpt-4o"]["todo"]["score"], 10.0);
}

#[test]
fn eval_single_mode() {
    let dir = TempDir::new().unwrap();
    let run = dir.path().join("run");
    write(
        &run.join("stats.json"),
        r#"{"timestamp": "t", "models": {}}"#,
    );

    frbench(dir.path())
        .args(["eval", "run", "--mode", "weighted-score-k"])
        .assert()
        .success();
    assert!(run.join("scores-weighted-score-k.csv").is_file());
    assert!(!run.join("scores-score-k.csv").exists());
}

#[test]
fn eval_without_stats_fails() {
    let dir = TempDir::new().unwrap();
    frbench(dir.path())
        .args(["eval", "nowhere"])
        .assert()
        .failure()
        .stderr(contains("cannot read stats"));
}

#[test]
fn cache_clear_removes_one_model_or_everything() {
    let dir = TempDir::new().unwrap();
    let entry = "1_0000000000000000000000000000000000000000000000000000000000000000.json";
    write(&dir.path().join("cache/anth").join(MODEL).join(entry), "{}");
    write(&dir.path().join("cache/openai/gpt-4o").join(entry), "{}");

    frbench(dir.path())
        .args(["cache", "clear", "--model", MODEL])
        .assert()
        .success();
    assert!(!dir.path().join("cache/anth").join(MODEL).exists());
    assert!(dir.path().join("cache/openai/gpt-4o").join(entry).is_file());

    frbench(dir.path()).args(["cache", "clear"]).assert().success();
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn cache_clear_unknown_model_fails() {
    let dir = TempDir::new().unwrap();
    frbench(dir.path())
        .args(["cache", "clear", "--model", "gpt-2"])
        .assert()
        .failure()
        .stderr(contains("unknown model"));
}

#[test]
fn run_without_models_fails() {
    let dir = TempDir::new().unwrap();
    todo_project(dir.path());
    frbench(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("no models selected"));
}

#[test]
fn run_unknown_model_fails() {
    let dir = TempDir::new().unwrap();
    todo_project(dir.path());
    frbench(dir.path())
        .args(["run", "--model", "gpt-2"])
        .assert()
        .failure()
        .stderr(contains("unknown model: gpt-2"));
}

#[test]
fn run_missing_api_key_fails() {
    let dir = TempDir::new().unwrap();
    todo_project(dir.path());
    frbench(dir.path())
        .args(["run", "--model", MODEL])
        .env("ANTHROPIC_API_KEY", "")
        .assert()
        .failure()
        .stderr(contains("ANTHROPIC_API_KEY"));
}

#[test]
fn run_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    todo_project(dir.path());
    frbench(dir.path())
        .args(["run", "--model", MODEL, "-k", "0"])
        .env("ANTHROPIC_API_KEY", "test-key")
        .assert()
        .failure()
        .stderr(contains("k must be at least 1"));
}

fn anthropic_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 1000, "output_tokens": 200}
    }))
}

/// `frbench run` on a blocking thread so the mock server keeps serving.
async fn run_against(dir: &Path, server: &MockServer, extra: &[&str]) -> std::process::Output {
    #[allow(deprecated)]
    let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("frbench"));
    cmd.current_dir(dir)
        .args(["run", "--model", MODEL])
        .args(extra)
        .env_remove("FRBENCH_CONFIG")
        .env_remove("FRBENCH_TEMPLATES")
        .env_remove("FRBENCH_CACHE")
        .env_remove("RUST_LOG")
        .env("ANTHROPIC_API_KEY", "test-key")
        .env("ANTHROPIC_BASE_URL", server.uri());
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn run_completes_todo_project_and_reuses_cache() {
    let server = MockServer::start().await;
    let answer = format!(
        "```go\n// start of main.go\npackage main\n\nimport \"fmt\"\n\nfunc main() {{\n\tfmt.Println(\"{}\")\n}}\n// end of main.go\n```",
        GREETING
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .respond_with(anthropic_reply(&answer))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    todo_project(dir.path());

    run_against(dir.path(), &server, &[])
        .await
        .assert()
        .success()
        .stdout(contains("todo: 1/1 requirements"));

    let runs = run_dirs(dir.path());
    assert_eq!(runs.len(), 1);
    let stats: Value =
        serde_json::from_str(&fs::read_to_string(runs[0].join("stats.json")).unwrap()).unwrap();
    let req = &stats["models"][MODEL]["projects"]["todo"]["requirements"][0];
    assert_eq!(req["completed"], true);
    assert_eq!(req["attempts"], 1);
    assert_eq!(req["max_score"], 2);
    assert!(runs[0].join("scores-weighted-score-k.csv").is_file());

    let partition = dir.path().join("cache/anth").join(MODEL);
    assert_eq!(fs::read_dir(&partition).unwrap().count(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    // same prompt again: answered from the cache, no provider call
    std::thread::sleep(std::time::Duration::from_millis(1100));
    run_against(dir.path(), &server, &[]).await.assert().success();

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    let runs = run_dirs(dir.path());
    assert_eq!(runs.len(), 2);
    let stats: Value =
        serde_json::from_str(&fs::read_to_string(runs[1].join("stats.json")).unwrap()).unwrap();
    let req = &stats["models"][MODEL]["projects"]["todo"]["requirements"][0];
    assert_eq!(req["completed"], true);
    assert_eq!(req["cost"], 0.0);
}

#[tokio::test]
async fn run_records_failed_requirement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_reply("Sorry, I cannot do that."))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    todo_project(dir.path());

    run_against(dir.path(), &server, &["--no-cache"])
        .await
        .assert()
        .success()
        .stdout(contains("todo: 0/1 requirements"));

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    let runs = run_dirs(dir.path());
    let stats: Value =
        serde_json::from_str(&fs::read_to_string(runs[0].join("stats.json")).unwrap()).unwrap();
    let req = &stats["models"][MODEL]["projects"]["todo"]["requirements"][0];
    assert_eq!(req["completed"], false);
    assert_eq!(req["attempts"], 2);
    assert!(!dir.path().join("cache/anth").join(MODEL).exists());
}
