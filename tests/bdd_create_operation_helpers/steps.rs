//! Given/when steps for create operation scenarios.

use std::sync::Arc;
use std::time::Duration;

use kassert::api::run_operations;
use kassert::bindings::Bindings;
use kassert::cleanup::Cleaner;
use kassert::client::InMemoryStore;
use kassert::expectation::Expectation;
use kassert::operation::{CreateOperation, Operation, Timeouts};
use kassert::output::{Output, Outputs};
use kassert::resource::Resource;
use rstest_bdd_macros::{given, when};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::StepResult;
use super::state::{CreateState, StepOutcome};

fn config_map(name: &str) -> StepResult<Resource> {
    Resource::from_value(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "default" },
        "data": { "mode": "fast" }
    }))
    .map_err(|e| format!("invalid fixture resource: {e}"))
}

#[given("an empty store")]
fn given_empty_store(create_state: &CreateState) {
    create_state.store.set(Arc::new(InMemoryStore::new()));
}

#[given("a store already holding {name}")]
fn given_store_holding(create_state: &CreateState, name: String) -> StepResult<()> {
    let existing = config_map(&name)?;
    create_state
        .store
        .set(Arc::new(InMemoryStore::with_resources([existing])));
    Ok(())
}

#[given("a ConfigMap named {name}")]
fn given_config_map(create_state: &CreateState, name: String) -> StepResult<()> {
    create_state.resource.set(config_map(&name)?);
    Ok(())
}

#[given("an apply budget of {seconds} seconds")]
fn given_apply_budget(create_state: &CreateState, seconds: u64) {
    create_state.budget.set(Duration::from_secs(seconds));
}

#[given("the step expects failure")]
fn given_expects_failure(create_state: &CreateState) {
    create_state.expectations.set(vec![Expectation::failure()]);
}

#[given("an output {name} taken from the metadata name")]
fn given_output_from_metadata(create_state: &CreateState, name: String) {
    create_state
        .outputs
        .set(vec![Output::new(name, json!("{{ metadata.name }}"))]);
}

#[given("the run is cancelled after {seconds} seconds")]
fn given_cancel_after(create_state: &CreateState, seconds: u64) {
    create_state.cancel_after.set(Duration::from_secs(seconds));
}

#[when("the create step runs")]
fn when_create_step_runs(create_state: &CreateState) -> StepResult<()> {
    let store = create_state
        .store
        .get()
        .ok_or_else(|| String::from("store should be configured"))?;
    let resource = create_state
        .resource
        .get()
        .ok_or_else(|| String::from("resource should be configured"))?;
    let registry = create_state
        .registry
        .get()
        .ok_or_else(|| String::from("registry should be configured"))?;
    let cleaner: Arc<dyn Cleaner> = registry;
    let declared = create_state.outputs.get().unwrap_or_default();
    let operation = CreateOperation::new(store, resource)
        .with_cleaner(cleaner)
        .with_expectations(create_state.expectations.get().unwrap_or_default())
        .with_outputs(declared.clone());
    let operations: Vec<Box<dyn Operation>> = vec![Box::new(operation)];
    let timeouts = Timeouts {
        apply: create_state.budget.get().unwrap_or(Duration::from_secs(30)),
        ..Timeouts::default()
    };
    let cancel_after = create_state.cancel_after.get();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(|e| format!("failed to create runtime: {e}"))?;
    let (result, elapsed) = runtime.block_on(async {
        let token = CancellationToken::new();
        if let Some(delay) = cancel_after {
            let canceller = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                canceller.cancel();
            });
        }
        let started = tokio::time::Instant::now();
        let result = run_operations(&token, Bindings::new(), &timeouts, &operations).await;
        (result, started.elapsed())
    });

    let outcome = match result {
        Ok(chain) => {
            let outputs: Outputs = declared
                .iter()
                .filter_map(|output| {
                    chain
                        .get(&format!("${}", output.name))
                        .map(|binding| (output.name.clone(), binding.clone()))
                })
                .collect();
            StepOutcome::Ok(outputs)
        }
        Err(e) => StepOutcome::Err(e.to_string()),
    };
    create_state.outcome.set(outcome);
    create_state.elapsed.set(elapsed);
    Ok(())
}
