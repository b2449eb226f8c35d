use super::blackboard::Blackboard;
use super::dispatch::{dispatch_step, CapabilityRegistry};
use super::error::EngineError;
use super::run_locks::RunLocks;
use super::trace::record_trace;
use crate::config::{parse_process_config, WorkflowKind};
use crate::store::{FileStore, RunRecord, RunStatus, TraceStatus};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::thread;

pub const SYSTEM_ERROR_STEP_ID: &str = "system_error";

#[derive(Debug)]
pub struct RunEngine {
    store: FileStore,
    registry: CapabilityRegistry,
    locks: RunLocks,
}

impl RunEngine {
    pub fn new(store: FileStore, registry: CapabilityRegistry) -> Self {
        Self {
            store,
            registry,
            locks: RunLocks::new(),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn locks(&self) -> &RunLocks {
        &self.locks
    }

    // Fire-and-forget entry point: nothing propagates to the caller, every
    // outcome lands in the persisted run record.
    pub fn execute_run(&self, run_id: &str, config_yaml: &str) {
        let Some(_guard) = self.locks.try_acquire(run_id) else {
            let _ = self
                .store
                .append_engine_log(run_id, "decision=skip reason=execution_already_active");
            return;
        };
        if let Err(err) = self.try_execute(run_id, config_yaml) {
            self.fail_run(run_id, &err);
        }
    }

    fn try_execute(&self, run_id: &str, config_yaml: &str) -> Result<(), EngineError> {
        let Some(mut run) = self.store.get_run(run_id)? else {
            return Ok(());
        };
        self.store.append_engine_log(
            run_id,
            &format!("decision=start project_id={}", run.project_id),
        )?;

        let config = parse_process_config(config_yaml)?;
        if config.workflow.kind != WorkflowKind::Sequential {
            return Err(EngineError::UnsupportedWorkflowKind(
                config.workflow.kind.to_string(),
            ));
        }

        transition(&mut run, RunStatus::Running)?;
        run.started_at = Some(Utc::now());
        self.store.save_run(&run)?;

        let mut blackboard = Blackboard::new(run.input_context.as_ref());

        for step in &config.workflow.steps {
            // Reload before each mutation: the store is shared with other
            // readers/writers and saves are full-record overwrites.
            let Some(mut run) = self.store.get_run(run_id)? else {
                return Ok(());
            };
            let step_started_at = Utc::now();

            match dispatch_step(&self.registry, step, &config.resources, &blackboard) {
                Ok(outcome) => {
                    blackboard.record_step_output(&step.id, outcome.output.clone());
                    run.trace_events.push(record_trace(
                        &step.id,
                        TraceStatus::Completed,
                        Some(Value::Object(outcome.input)),
                        Some(Value::Object(outcome.output)),
                        step_started_at,
                        Utc::now(),
                    ));
                    run.context = Some(blackboard.value());
                    self.store.save_run(&run)?;
                    self.store.append_engine_log(
                        run_id,
                        &format!("step_id={} transition=completed", step.id),
                    )?;
                }
                Err(err) => {
                    let reason = err.to_string();
                    run.trace_events.push(record_trace(
                        &step.id,
                        TraceStatus::Failed,
                        Some(Value::Object(Map::from_iter([(
                            "error".to_string(),
                            Value::String(reason.clone()),
                        )]))),
                        None,
                        step_started_at,
                        Utc::now(),
                    ));
                    run.context = Some(blackboard.value());
                    transition(&mut run, RunStatus::Failed)?;
                    run.ended_at = Some(Utc::now());
                    self.store.save_run(&run)?;
                    self.store.append_engine_log(
                        run_id,
                        &format!("step_id={} transition=failed error={reason}", step.id),
                    )?;
                    // First failure aborts the run; remaining steps never
                    // dispatch.
                    return Ok(());
                }
            }
        }

        let Some(mut run) = self.store.get_run(run_id)? else {
            return Ok(());
        };
        transition(&mut run, RunStatus::Completed)?;
        run.ended_at = Some(Utc::now());
        run.context = Some(blackboard.value());
        self.store.save_run(&run)?;
        self.store.append_engine_log(run_id, "transition=completed")?;
        Ok(())
    }

    // Last-resort handler for failures outside a single step: the run is
    // marked FAILED with a synthetic `system_error` trace event. Store
    // failures here are swallowed; there is no caller left to notify.
    fn fail_run(&self, run_id: &str, err: &EngineError) {
        let reason = err.to_string();
        let _ = self
            .store
            .append_engine_log(run_id, &format!("transition=failed reason={reason}"));
        let Ok(Some(mut run)) = self.store.get_run(run_id) else {
            return;
        };
        if run.status.is_terminal() {
            return;
        }
        let now = Utc::now();
        run.status = RunStatus::Failed;
        run.ended_at = Some(now);
        if run.context.is_none() {
            run.context = Some(Value::Object(Map::from_iter([(
                "error".to_string(),
                Value::String(reason.clone()),
            )])));
        }
        run.trace_events.push(record_trace(
            SYSTEM_ERROR_STEP_ID,
            TraceStatus::Failed,
            None,
            Some(Value::Object(Map::from_iter([(
                "error".to_string(),
                Value::String(reason),
            )]))),
            now,
            now,
        ));
        let _ = self.store.save_run(&run);
    }
}

fn transition(run: &mut RunRecord, next: RunStatus) -> Result<(), EngineError> {
    if !run.status.can_transition_to(next) {
        return Err(EngineError::InvalidTransition {
            from: run.status,
            to: next,
        });
    }
    run.status = next;
    Ok(())
}

pub fn spawn_execution(
    engine: Arc<RunEngine>,
    run_id: String,
    config_yaml: String,
) -> thread::JoinHandle<()> {
    thread::spawn(move || engine.execute_run(&run_id, &config_yaml))
}
