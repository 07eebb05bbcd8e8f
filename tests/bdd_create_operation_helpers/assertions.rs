//! Assertion helpers for create operation behavioural tests.

use std::time::Duration;

use kassert::resource::ObjectKey;
use rstest_bdd_macros::then;
use serde_json::Value;

use super::StepResult;
use super::state::{CreateState, StepOutcome};

fn outcome(create_state: &CreateState) -> StepResult<StepOutcome> {
    create_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

fn config_map_key(name: &str) -> ObjectKey {
    ObjectKey::new("v1", "ConfigMap", Some("default"), name)
}

#[then("the step succeeds")]
fn step_succeeds(create_state: &CreateState) -> StepResult<()> {
    match outcome(create_state)? {
        StepOutcome::Ok(_) => Ok(()),
        StepOutcome::Err(msg) => Err(format!("expected success, got error: {msg}")),
    }
}

#[then("the step fails with already exists")]
fn step_fails_with_already_exists(create_state: &CreateState) -> StepResult<()> {
    match outcome(create_state)? {
        StepOutcome::Err(msg) if msg.contains("already exists") => Ok(()),
        StepOutcome::Err(msg) => Err(format!("expected an already exists error, got: {msg}")),
        StepOutcome::Ok(_) => Err(String::from("expected failure, got success")),
    }
}

#[then("the step produced no outputs")]
fn step_produced_no_outputs(create_state: &CreateState) -> StepResult<()> {
    match outcome(create_state)? {
        StepOutcome::Ok(outputs) if outputs.is_empty() => Ok(()),
        StepOutcome::Ok(outputs) => Err(format!("expected no outputs, got {outputs:?}")),
        StepOutcome::Err(msg) => Err(format!("expected success, got error: {msg}")),
    }
}

#[then("output {name} is {expected}")]
fn output_is(create_state: &CreateState, name: String, expected: String) -> StepResult<()> {
    let StepOutcome::Ok(outputs) = outcome(create_state)? else {
        return Err(String::from("expected success"));
    };
    let value = outputs
        .get(&name)
        .map(|binding| binding.value().clone())
        .ok_or_else(|| format!("output {name} should be present"))?;
    if value == Value::String(expected.clone()) {
        Ok(())
    } else {
        Err(format!("expected output {name} to be {expected}, got {value}"))
    }
}

#[then("the store holds {name}")]
fn store_holds(create_state: &CreateState, name: String) -> StepResult<()> {
    let store = create_state
        .store
        .get()
        .ok_or_else(|| String::from("store should be configured"))?;
    if store.contains(&config_map_key(&name)) {
        Ok(())
    } else {
        Err(format!("store should hold {name}"))
    }
}

#[then("cleanup is recorded for {name}")]
fn cleanup_is_recorded(create_state: &CreateState, name: String) -> StepResult<()> {
    let registry = create_state
        .registry
        .get()
        .ok_or_else(|| String::from("registry should be configured"))?;
    let keys = registry.keys();
    if keys == vec![config_map_key(&name)] {
        Ok(())
    } else {
        Err(format!("expected cleanup for {name}, got {keys:?}"))
    }
}

#[then("the step took {seconds} seconds")]
fn step_took(create_state: &CreateState, seconds: u64) -> StepResult<()> {
    let elapsed = create_state
        .elapsed
        .get()
        .ok_or_else(|| String::from("elapsed time should be set"))?;
    if elapsed == Duration::from_secs(seconds) {
        Ok(())
    } else {
        Err(format!("expected {seconds}s, got {elapsed:?}"))
    }
}
