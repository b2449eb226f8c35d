use super::blackboard::Blackboard;
use super::error::EngineError;
use crate::config::{ResourceConfig, StepConfig};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("provider transport failure: {0}")]
    Transport(String),
    #[error("capability invocation failed: {0}")]
    Invocation(String),
}

pub trait Capability: Send + Sync {
    fn invoke(&self, instruction: &str, resource: &ResourceConfig)
        -> Result<String, CapabilityError>;
}

pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Box<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            capabilities: BTreeMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("ollama", Box::new(crate::provider::OllamaCapability::new()));
        registry
    }

    pub fn register(&mut self, provider: impl Into<String>, capability: Box<dyn Capability>) {
        self.capabilities.insert(provider.into(), capability);
    }

    pub fn get(&self, provider: &str) -> Option<&dyn Capability> {
        self.capabilities
            .get(provider)
            .map(|capability| &**capability)
    }

    pub fn providers(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub input: Map<String, Value>,
    pub output: Map<String, Value>,
}

pub fn dispatch_step(
    registry: &CapabilityRegistry,
    step: &StepConfig,
    resources: &[ResourceConfig],
    blackboard: &Blackboard,
) -> Result<DispatchOutcome, EngineError> {
    let instruction = blackboard.resolve(step.instruction.as_deref().unwrap_or_default());
    let input = step_input_payload(step, &instruction);

    let resource = match step.agent.as_deref() {
        Some(agent_id) => Some(resources.iter().find(|r| r.id == agent_id).ok_or_else(
            || EngineError::StepExecution {
                step_id: step.id.clone(),
                reason: format!("step references undeclared resource `{agent_id}`"),
            },
        )?),
        None => None,
    };
    let capability = resource
        .and_then(|r| r.provider.as_deref())
        .and_then(|provider| registry.get(provider));

    let output = match (resource, capability) {
        (Some(resource), Some(capability)) => {
            match capability.invoke(&instruction, resource) {
                Ok(text) => result_payload(text, &instruction),
                // Transport failures degrade the step result instead of
                // failing the run.
                Err(CapabilityError::Transport(reason)) => {
                    result_payload(format!("[Error: {reason}]"), &instruction)
                }
                Err(CapabilityError::Invocation(reason)) => {
                    return Err(EngineError::StepExecution {
                        step_id: step.id.clone(),
                        reason,
                    })
                }
            }
        }
        _ => simulated_payload(step, &instruction),
    };

    Ok(DispatchOutcome { input, output })
}

fn simulated_payload(step: &StepConfig, instruction: &str) -> Map<String, Value> {
    Map::from_iter([
        (
            "result".to_string(),
            Value::String(format!("[SIMULATED] Executed step {}", step.id)),
        ),
        (
            "instruction".to_string(),
            Value::String(instruction.to_string()),
        ),
    ])
}

fn result_payload(result: String, instruction: &str) -> Map<String, Value> {
    Map::from_iter([
        ("result".to_string(), Value::String(result)),
        (
            "instruction".to_string(),
            Value::String(instruction.to_string()),
        ),
    ])
}

fn step_input_payload(step: &StepConfig, instruction: &str) -> Map<String, Value> {
    Map::from_iter([
        (
            "agent".to_string(),
            step.agent
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        ),
        (
            "instruction".to_string(),
            Value::String(instruction.to_string()),
        ),
        (
            "inputs".to_string(),
            step.inputs
                .clone()
                .map(|inputs| Value::Array(inputs.into_iter().map(Value::String).collect()))
                .unwrap_or(Value::Null),
        ),
    ])
}
