//! Scenario state for create operation behavioural tests.

use std::sync::Arc;
use std::time::Duration;

use kassert::cleanup::CleanupRegistry;
use kassert::client::InMemoryStore;
use kassert::expectation::Expectation;
use kassert::output::{Output, Outputs};
use kassert::resource::Resource;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// Outcome of running the create step.
#[derive(Debug, Clone)]
pub(crate) enum StepOutcome {
    /// The step succeeded with these outputs.
    Ok(Outputs),
    /// The step failed; the error's display text.
    Err(String),
}

#[derive(Default, ScenarioState)]
pub(crate) struct CreateState {
    pub(crate) store: Slot<Arc<InMemoryStore>>,
    pub(crate) registry: Slot<Arc<CleanupRegistry>>,
    pub(crate) resource: Slot<Resource>,
    pub(crate) expectations: Slot<Vec<Expectation>>,
    pub(crate) outputs: Slot<Vec<Output>>,
    pub(crate) budget: Slot<Duration>,
    pub(crate) cancel_after: Slot<Duration>,
    pub(crate) outcome: Slot<StepOutcome>,
    pub(crate) elapsed: Slot<Duration>,
}

#[fixture]
pub(crate) fn create_state() -> CreateState {
    let state = CreateState::default();
    state.registry.set(Arc::new(CleanupRegistry::new()));
    state.expectations.set(Vec::new());
    state.outputs.set(Vec::new());
    state.budget.set(Duration::from_secs(30));
    state
}
