//! Orchestration API for kassert test steps.
//!
//! These functions tie configuration, operations and cleanup together for
//! embedders: [`create_operation`] builds a step from [`EngineConfig`],
//! [`run_operations`] drives steps in order while threading outputs through
//! the bindings chain, and [`teardown`] releases what the steps created.
//!
//! None of them print or exit the process; failures are returned.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bindings::Bindings;
use crate::cleanup::{Cleaner, CleanupRegistry};
use crate::client::StoreClient;
use crate::config::EngineConfig;
use crate::error::{CleanupError, NamespaceError, OperationError};
use crate::operation::{CreateOperation, Deadline, Operation, Timeouts};
use crate::output::register_outputs;
use crate::resource::Resource;

/// Build a create operation from configuration defaults.
///
/// The configured namespace, templating switch and conflict policy are
/// applied. `cleaner` is attached unless `skip_delete` is set.
///
/// # Errors
///
/// Returns [`NamespaceError::InvalidNamespace`] when the configured
/// namespace is not a valid label.
pub fn create_operation(
    config: &EngineConfig,
    client: Arc<dyn StoreClient>,
    resource: Resource,
    cleaner: Option<Arc<dyn Cleaner>>,
) -> Result<CreateOperation, NamespaceError> {
    let namespacer = Arc::new(config.namespacer()?);
    let operation = CreateOperation::new(client, resource)
        .with_namespacer(namespacer)
        .with_template(config.template)
        .with_fail_fast_on_conflict(config.fail_fast_on_conflict);
    Ok(match cleaner {
        Some(cleaner) if !config.skip_delete => operation.with_cleaner(cleaner),
        _ => operation,
    })
}

/// Run `operations` one after another.
///
/// Each operation gets a [`Deadline`] below `token` sized by its kind's
/// budget in `timeouts`. Outputs of a step are registered into the chain
/// seen by the following steps.
///
/// # Errors
///
/// Returns the first operation error; later operations do not run.
pub async fn run_operations(
    token: &CancellationToken,
    bindings: Bindings,
    timeouts: &Timeouts,
    operations: &[Box<dyn Operation>],
) -> Result<Bindings, OperationError> {
    let mut chain = bindings;
    for (step, operation) in operations.iter().enumerate() {
        let kind = operation.kind();
        let deadline = Deadline::new(token, timeouts.for_kind(kind));
        debug!(step, %kind, timeout = ?deadline.timeout(), "running step");
        let outputs = deadline
            .run(operation.exec(deadline.token(), Some(chain.clone())))
            .await?;
        chain = register_outputs(&chain, &outputs);
    }
    info!(steps = operations.len(), "all steps succeeded");
    Ok(chain)
}

/// Delete everything recorded in `registry` within the cleanup budget.
///
/// # Errors
///
/// Returns the registry's [`CleanupError`], including
/// [`CleanupError::Cancelled`] when the budget runs out.
pub async fn teardown(
    token: &CancellationToken,
    registry: &CleanupRegistry,
    timeouts: &Timeouts,
) -> Result<usize, CleanupError> {
    let deadline = Deadline::new(token, timeouts.cleanup);
    deadline.run(registry.teardown(deadline.token())).await
}
