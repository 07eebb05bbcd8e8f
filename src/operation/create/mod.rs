//! Creation of a resource that must not exist yet.
//!
//! Each attempt looks the object up first. An existing object is reported
//! as [`OperationError::AlreadyExists`]; a missing one is created and, once
//! the store accepts it, handed to the cleaner before any expectation or
//! output runs. The attempt's outcome is bound as `$error` while
//! expectations and outputs are evaluated.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::logging::{log_end, log_start};
use super::poll::{Attempt, poll_until_cancelled};
use super::{BoxFuture, Operation, OperationKind, POLL_INTERVAL};
use crate::bindings::{Binding, Bindings};
use crate::check::{AssertionTree, Checker};
use crate::cleanup::Cleaner;
use crate::client::StoreClient;
use crate::error::OperationError;
use crate::expectation::{self, Expectation};
use crate::namespacer::Namespacer;
use crate::output::{self, Output, Outputs};
use crate::resource::Resource;
use crate::template::{ExpressionRenderer, TemplateRenderer, render_resource};

/// Binding holding the current attempt's error, or `null` on success.
pub const ERROR_BINDING: &str = "$error";

/// Creates one resource, retrying until it is created or cancelled.
pub struct CreateOperation {
    client: Arc<dyn StoreClient>,
    resource: Resource,
    namespacer: Option<Arc<dyn Namespacer>>,
    cleaner: Option<Arc<dyn Cleaner>>,
    template: bool,
    expectations: Vec<Expectation>,
    outputs: Vec<Output>,
    renderer: Arc<dyn TemplateRenderer>,
    checker: Arc<dyn Checker>,
    fail_fast_on_conflict: bool,
}

impl CreateOperation {
    /// Create `resource` through `client` with default collaborators.
    ///
    /// Templating is enabled; there is no namespacer, cleaner, expectation
    /// or output until one is configured.
    #[must_use]
    pub fn new(client: Arc<dyn StoreClient>, resource: Resource) -> Self {
        Self {
            client,
            resource,
            namespacer: None,
            cleaner: None,
            template: true,
            expectations: Vec::new(),
            outputs: Vec::new(),
            renderer: Arc::new(ExpressionRenderer),
            checker: Arc::new(AssertionTree),
            fail_fast_on_conflict: false,
        }
    }

    /// Assign namespaces with `namespacer` before submission.
    #[must_use]
    pub fn with_namespacer(mut self, namespacer: Arc<dyn Namespacer>) -> Self {
        self.namespacer = Some(namespacer);
        self
    }

    /// Record created resources with `cleaner`.
    #[must_use]
    pub fn with_cleaner(mut self, cleaner: Arc<dyn Cleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Enable or disable rendering the resource against the bindings.
    #[must_use]
    pub const fn with_template(mut self, template: bool) -> Self {
        self.template = template;
        self
    }

    /// Declare the step's expectations.
    #[must_use]
    pub fn with_expectations(mut self, expectations: Vec<Expectation>) -> Self {
        self.expectations = expectations;
        self
    }

    /// Declare the step's outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<Output>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Replace the template renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the check engine.
    #[must_use]
    pub fn with_checker(mut self, checker: Arc<dyn Checker>) -> Self {
        self.checker = checker;
        self
    }

    /// Stop after the first attempt that finds the object already present.
    #[must_use]
    pub const fn with_fail_fast_on_conflict(mut self, fail_fast: bool) -> Self {
        self.fail_fast_on_conflict = fail_fast;
        self
    }

    /// The resource as declared, before rendering.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    async fn run(
        &self,
        token: &CancellationToken,
        bindings: Bindings,
    ) -> Result<Outputs, OperationError> {
        let resource = match self.prepare(&bindings) {
            Ok(prepared) => prepared,
            Err(error) => {
                let result = Err(error);
                log_end(OperationKind::Create, &self.resource.key(), &result);
                return result;
            }
        };
        let key = resource.key();
        log_start(OperationKind::Create, &key);
        let result = poll_until_cancelled(token, POLL_INTERVAL, || {
            self.attempt(&resource, &bindings)
        })
        .await;
        log_end(OperationKind::Create, &key, &result);
        result
    }

    fn prepare(&self, bindings: &Bindings) -> Result<Resource, OperationError> {
        let mut resource = if self.template {
            render_resource(self.renderer.as_ref(), &self.resource, bindings)
                .map_err(OperationError::Render)?
        } else {
            self.resource.clone()
        };
        if let Some(namespacer) = &self.namespacer {
            namespacer.apply(&mut resource)?;
        }
        Ok(resource)
    }

    async fn attempt(&self, resource: &Resource, bindings: &Bindings) -> Attempt<Outputs> {
        let outcome = self.try_create(resource).await;
        let created = outcome.is_ok();
        let error = outcome.as_ref().err().map_or_else(Binding::null, |failure| {
            Binding::new(Value::String(failure.to_string()))
        });
        let step_bindings = bindings.register(ERROR_BINDING, error);
        let document = resource.to_value();

        let verdict = expectation::evaluate(
            self.checker.as_ref(),
            &document,
            &step_bindings,
            outcome,
            &self.expectations,
        );
        if let Err(failure) = verdict.result {
            return self.classify(failure);
        }
        if !created {
            return Attempt::Done(Outputs::new());
        }
        match output::extract(
            self.renderer.as_ref(),
            self.checker.as_ref(),
            &document,
            &step_bindings,
            &self.outputs,
        ) {
            Ok((outputs, _)) => Attempt::Done(outputs),
            Err(failure) => Attempt::Abort(failure.into()),
        }
    }

    async fn try_create(&self, resource: &Resource) -> Result<(), OperationError> {
        let key = resource.key();
        match self.client.get(&key).await {
            Ok(_) => Err(OperationError::AlreadyExists { key }),
            Err(error) if error.is_not_found() => self.create(resource).await,
            Err(error) => Err(OperationError::Store(error)),
        }
    }

    async fn create(&self, resource: &Resource) -> Result<(), OperationError> {
        self.client.create(resource).await?;
        if let Some(cleaner) = &self.cleaner {
            cleaner.record(resource.clone(), Arc::clone(&self.client));
        }
        Ok(())
    }

    fn classify(&self, error: OperationError) -> Attempt<Outputs> {
        let conflict = matches!(error, OperationError::AlreadyExists { .. });
        if error.is_terminal() || (conflict && self.fail_fast_on_conflict) {
            Attempt::Abort(error)
        } else {
            Attempt::Retry(error)
        }
    }
}

impl Operation for CreateOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Create
    }

    fn exec<'a>(
        &'a self,
        token: &'a CancellationToken,
        bindings: Option<Bindings>,
    ) -> BoxFuture<'a, Result<Outputs, OperationError>> {
        Box::pin(self.run(token, bindings.unwrap_or_default()))
    }
}
