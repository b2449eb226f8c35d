use crate::config::parse_process_config;
use crate::engine::{CapabilityRegistry, RunEngine};
use crate::shared::ids::generate_record_id;
use crate::store::{FileStore, ProjectRecord, RunRecord, TraceEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const STATE_ROOT_ENV: &str = "TRACEFLOW_STATE_ROOT";
pub const DEFAULT_STATE_ROOT: &str = "./traceflow_data";

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let mut args = args.into_iter();
    let Some(verb) = args.next() else {
        return Ok(help_text());
    };
    let rest: Vec<String> = args.collect();
    match verb.as_str() {
        "deploy" => cmd_deploy(&rest),
        "projects" => cmd_projects(&rest),
        "run" => cmd_run(&rest),
        "status" => cmd_status(&rest),
        "logs" => cmd_logs(&rest),
        "version" => Ok(format!("traceflow {}", env!("CARGO_PKG_VERSION"))),
        "help" | "--help" | "-h" => Ok(help_text()),
        other => Err(format!("unknown command `{other}`; run `traceflow help`")),
    }
}

pub fn resolve_state_root() -> PathBuf {
    std::env::var(STATE_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_ROOT))
}

fn help_text() -> String {
    [
        "traceflow commands:",
        "  deploy <name> <config.yaml> [--env-file <path>]   validate and store a process configuration",
        "  projects                                          list deployed projects",
        "  run <project_id> [--input <json>]                 trigger and execute a run",
        "  status <run_id>                                   show run status and final context",
        "  logs <run_id>                                     show the run's trace events",
        "  version                                           print the engine version",
    ]
    .join("\n")
}

fn open_store() -> FileStore {
    FileStore::new(resolve_state_root())
}

fn cmd_deploy(rest: &[String]) -> Result<String, String> {
    let usage = "usage: traceflow deploy <name> <config.yaml> [--env-file <path>]";
    let mut name = None;
    let mut config_path = None;
    let mut env_file = None;

    let mut args = rest.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--env-file" => {
                let path = args.next().ok_or_else(|| usage.to_string())?;
                env_file = Some(PathBuf::from(path));
            }
            other if name.is_none() => name = Some(other.to_string()),
            other if config_path.is_none() => config_path = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument `{other}`; {usage}")),
        }
    }
    let name = name.ok_or_else(|| usage.to_string())?;
    let config_path = config_path.ok_or_else(|| usage.to_string())?;

    let config_yaml = fs::read_to_string(&config_path)
        .map_err(|err| format!("failed to read {}: {err}", config_path.display()))?;
    parse_process_config(&config_yaml)
        .map_err(|err| format!("invalid process configuration: {err}"))?;

    let env_vars = match env_file {
        Some(path) => Some(read_env_file(&path)?),
        None => None,
    };

    let project = ProjectRecord {
        id: generate_record_id("proj", Utc::now().timestamp_millis())?,
        name,
        config_yaml,
        env_vars,
        created_at: Utc::now(),
    };
    let store = open_store();
    store
        .save_project(&project)
        .map_err(|err| err.to_string())?;
    Ok(format!("deployed project {} ({})", project.id, project.name))
}

fn cmd_projects(rest: &[String]) -> Result<String, String> {
    if !rest.is_empty() {
        return Err("usage: traceflow projects".to_string());
    }
    let projects = open_store().list_projects().map_err(|err| err.to_string())?;
    if projects.is_empty() {
        return Ok("no projects deployed".to_string());
    }
    let lines = projects
        .iter()
        .map(|project| {
            format!(
                "{}  {}  {}",
                project.id,
                project.name,
                project.created_at.to_rfc3339()
            )
        })
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

fn cmd_run(rest: &[String]) -> Result<String, String> {
    let usage = "usage: traceflow run <project_id> [--input <json>]";
    let mut project_id = None;
    let mut input_raw = None;

    let mut args = rest.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                let raw = args.next().ok_or_else(|| usage.to_string())?;
                input_raw = Some(raw.clone());
            }
            other if project_id.is_none() => project_id = Some(other.to_string()),
            other => return Err(format!("unexpected argument `{other}`; {usage}")),
        }
    }
    let project_id = project_id.ok_or_else(|| usage.to_string())?;

    let input_context = match input_raw {
        Some(raw) => {
            let value: Value =
                serde_json::from_str(&raw).map_err(|err| format!("invalid --input json: {err}"))?;
            match value {
                Value::Object(map) => Some(map),
                _ => return Err("--input must be a json object".to_string()),
            }
        }
        None => None,
    };

    let store = open_store();
    let project = store
        .get_project(&project_id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("project `{project_id}` not found"))?;

    let run = RunRecord::pending(
        generate_record_id("run", Utc::now().timestamp_millis())?,
        project.id.clone(),
        input_context,
    );
    store.save_run(&run).map_err(|err| err.to_string())?;

    let engine = RunEngine::new(store.clone(), CapabilityRegistry::with_defaults());
    engine.execute_run(&run.id, &project.config_yaml);

    let finished = store
        .get_run(&run.id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("run `{}` not found after execution", run.id))?;
    Ok(format!(
        "run {} finished with status {}",
        finished.id, finished.status
    ))
}

fn cmd_status(rest: &[String]) -> Result<String, String> {
    let [run_id] = rest else {
        return Err("usage: traceflow status <run_id>".to_string());
    };
    let run = open_store()
        .get_run(run_id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("run `{run_id}` not found"))?;

    let context = match &run.context {
        Some(context) => serde_json::to_string_pretty(context).map_err(|err| err.to_string())?,
        None => "-".to_string(),
    };
    Ok([
        format!("run {}", run.id),
        format!("project: {}", run.project_id),
        format!("status: {}", run.status),
        format!("started_at: {}", render_timestamp(run.started_at)),
        format!("ended_at: {}", render_timestamp(run.ended_at)),
        format!("context: {context}"),
    ]
    .join("\n"))
}

fn cmd_logs(rest: &[String]) -> Result<String, String> {
    let [run_id] = rest else {
        return Err("usage: traceflow logs <run_id>".to_string());
    };
    let run = open_store()
        .get_run(run_id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("run `{run_id}` not found"))?;

    if run.trace_events.is_empty() {
        return Ok(format!("run {} has no trace events", run.id));
    }
    let lines = run
        .trace_events
        .iter()
        .enumerate()
        .map(|(index, event)| render_trace_event(index + 1, event))
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

fn render_trace_event(position: usize, event: &TraceEvent) -> String {
    let latency = event
        .metrics
        .as_ref()
        .and_then(|metrics| metrics.latency_ms)
        .map(|latency| latency.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut lines = vec![format!(
        "{position}. step={} status={} latency_ms={latency} at={}",
        event.step_id,
        event.status,
        event.timestamp.to_rfc3339()
    )];
    if let Some(input) = &event.input {
        lines.push(format!("   input: {input}"));
    }
    if let Some(output) = &event.output {
        lines.push(format!("   output: {output}"));
    }
    lines.join("\n")
}

fn render_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}

fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    Ok(parse_env_lines(&raw))
}

pub fn parse_env_lines(raw: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        vars.insert(key.to_string(), value.to_string());
    }
    vars
}
