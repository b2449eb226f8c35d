use super::{ConfigError, ProcessConfig, WorkflowKind};
use crate::shared::ids::validate_identifier_value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub fn load_process_config(path: &Path) -> Result<ProcessConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_process_config(&raw)
}

pub fn parse_process_config(raw: &str) -> Result<ProcessConfig, ConfigError> {
    let config: ProcessConfig = serde_yaml::from_str(raw)?;
    validate_process_config(&config)?;
    Ok(config)
}

fn validate_process_config(config: &ProcessConfig) -> Result<(), ConfigError> {
    let mut resource_ids = BTreeSet::new();
    for resource in &config.resources {
        validate_identifier_value("resource id", &resource.id)
            .map_err(ConfigError::Validation)?;
        if !resource_ids.insert(resource.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate resource id `{}`",
                resource.id
            )));
        }
    }

    if config.workflow.kind == WorkflowKind::Sequential && config.workflow.steps.is_empty() {
        return Err(ConfigError::Validation(
            "sequential workflow declares no steps".to_string(),
        ));
    }

    let mut step_ids = BTreeSet::new();
    for step in &config.workflow.steps {
        validate_identifier_value("step id", &step.id).map_err(ConfigError::Validation)?;
        if !step_ids.insert(step.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate step id `{}`",
                step.id
            )));
        }
        if let Some(agent) = step.agent.as_deref() {
            if !resource_ids.contains(agent) {
                return Err(ConfigError::Validation(format!(
                    "step `{}` references undeclared resource `{agent}`",
                    step.id
                )));
            }
        }
    }

    Ok(())
}
