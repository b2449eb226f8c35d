use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;
use traceflow::commands::{parse_env_lines, run_cli, STATE_ROOT_ENV};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn cli(args: &[&str]) -> Result<String, String> {
    run_cli(args.iter().map(|arg| arg.to_string()).collect())
}

fn first_token_of(line: &str, prefix: &str) -> String {
    line.strip_prefix(prefix)
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .unwrap_or_default()
}

#[test]
fn deploy_run_status_logs_round_trip() {
    let _env = ENV_LOCK.lock().expect("env lock");
    let dir = tempdir().expect("tempdir");
    std::env::set_var(STATE_ROOT_ENV, dir.path());

    let config_path = dir.path().join("briefing.yaml");
    fs::write(
        &config_path,
        r#"
version: "1.0"
project: Daily-Briefing
resources:
  - id: researcher
    provider: perplexity
workflow:
  type: sequential
  steps:
    - id: research
      agent: researcher
      instruction: "Research ${trigger.input.topic}"
"#,
    )
    .expect("write config");
    let env_path = dir.path().join("briefing.env");
    fs::write(&env_path, "# secrets\nAPI_KEY=\"abc\"\n").expect("write env");

    let deployed = cli(&[
        "deploy",
        "Daily-Briefing",
        config_path.to_str().expect("path"),
        "--env-file",
        env_path.to_str().expect("path"),
    ])
    .expect("deploy");
    assert!(deployed.starts_with("deployed project proj-"));
    let project_id = first_token_of(&deployed, "deployed project ");

    let listed = cli(&["projects"]).expect("projects");
    assert!(listed.contains(&project_id));
    assert!(listed.contains("Daily-Briefing"));

    let ran = cli(&["run", &project_id, "--input", r#"{"topic": "Rust"}"#]).expect("run");
    assert!(ran.contains("finished with status COMPLETED"));
    let run_id = first_token_of(&ran, "run ");

    let status = cli(&["status", &run_id]).expect("status");
    assert!(status.contains("status: COMPLETED"));
    assert!(status.contains("Research Rust"));

    let logs = cli(&["logs", &run_id]).expect("logs");
    assert!(logs.contains("step=research"));
    assert!(logs.contains("status=COMPLETED"));
    assert!(logs.contains("[SIMULATED] Executed step research"));

    std::env::remove_var(STATE_ROOT_ENV);
}

#[test]
fn deploy_rejects_invalid_configurations() {
    let _env = ENV_LOCK.lock().expect("env lock");
    let dir = tempdir().expect("tempdir");
    std::env::set_var(STATE_ROOT_ENV, dir.path());

    let config_path = dir.path().join("broken.yaml");
    fs::write(&config_path, "workflow: [unclosed").expect("write config");

    let err = cli(&["deploy", "Broken", config_path.to_str().expect("path")])
        .expect_err("invalid config");
    assert!(err.contains("invalid process configuration"));
    assert_eq!(cli(&["projects"]).expect("projects"), "no projects deployed");

    std::env::remove_var(STATE_ROOT_ENV);
}

#[test]
fn unknown_runs_projects_and_verbs_report_errors() {
    let _env = ENV_LOCK.lock().expect("env lock");
    let dir = tempdir().expect("tempdir");
    std::env::set_var(STATE_ROOT_ENV, dir.path());

    let err = cli(&["run", "proj-ghost"]).expect_err("missing project");
    assert!(err.contains("project `proj-ghost` not found"));

    let err = cli(&["status", "run-ghost"]).expect_err("missing run");
    assert!(err.contains("run `run-ghost` not found"));

    let err = cli(&["destroy"]).expect_err("unknown verb");
    assert!(err.contains("unknown command `destroy`"));

    std::env::remove_var(STATE_ROOT_ENV);
}

#[test]
fn run_rejects_non_object_inputs() {
    let _env = ENV_LOCK.lock().expect("env lock");
    let dir = tempdir().expect("tempdir");
    std::env::set_var(STATE_ROOT_ENV, dir.path());

    let err = cli(&["run", "proj-any", "--input", "[1, 2]"]).expect_err("bad input");
    assert!(err.contains("--input must be a json object"));

    std::env::remove_var(STATE_ROOT_ENV);
}

#[test]
fn help_and_version_are_always_available() {
    let help = cli(&[]).expect("help");
    assert!(help.contains("deploy"));
    assert!(help.contains("logs"));
    assert_eq!(cli(&["help"]).expect("help verb"), help);

    let version = cli(&["version"]).expect("version");
    assert!(version.starts_with("traceflow "));
}

#[test]
fn env_files_parse_as_key_value_lines() {
    let vars = parse_env_lines(
        r#"
# comment
API_KEY="abc"
MODEL='llama3'
EMPTY=
not a pair
  SPACED = value
"#,
    );
    assert_eq!(vars.get("API_KEY"), Some(&"abc".to_string()));
    assert_eq!(vars.get("MODEL"), Some(&"llama3".to_string()));
    assert_eq!(vars.get("EMPTY"), Some(&String::new()));
    assert_eq!(vars.get("SPACED"), Some(&"value".to_string()));
    assert!(!vars.contains_key("not a pair"));
}
