use super::error::StoreError;
use super::records::{ProjectRecord, RunRecord};
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::logging::{append_engine_log_line, engine_log_path};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_project(&self, project: &ProjectRecord) -> Result<(), StoreError> {
        write_record(&self.project_path(&project.id), project)
    }

    pub fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, StoreError> {
        read_record(&self.project_path(project_id))
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        let projects_root = self.root.join("projects");
        let entries = match fs::read_dir(&projects_root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(&projects_root, source)),
        };

        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| io_error(&projects_root, source))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|value| value.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = fs::read_to_string(&path) else {
                continue;
            };
            if let Ok(project) = serde_json::from_str::<ProjectRecord>(&raw) {
                projects.push(project);
            }
        }

        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    pub fn save_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        write_record(&self.run_path(&run.id), run)
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        read_record(&self.run_path(run_id))
    }

    pub fn append_engine_log(&self, run_id: &str, message: &str) -> Result<(), StoreError> {
        let line = format!("ts={} run_id={run_id} {message}", Utc::now().timestamp());
        append_engine_log_line(&self.root, &line)
            .map_err(|source| io_error(engine_log_path(&self.root).as_path(), source))
    }

    fn project_path(&self, project_id: &str) -> PathBuf {
        self.root.join("projects").join(format!("{project_id}.json"))
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.root.join("runs").join(format!("{run_id}.json"))
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }
    let body = serde_json::to_vec_pretty(record).map_err(|source| json_error(path, source))?;
    atomic_write_file(path, &body).map_err(|source| io_error(path, source))
}

// Undecodable records read as absent; saves are full-record overwrites.
fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(path, source)),
    };
    Ok(serde_json::from_str(&raw).ok())
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn json_error(path: &Path, source: serde_json::Error) -> StoreError {
    StoreError::Json {
        path: path.display().to_string(),
        source,
    }
}
