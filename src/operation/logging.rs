//! Start and end events emitted around an operation.

use tracing::{info, warn};

use super::OperationKind;
use crate::error::OperationError;
use crate::output::Outputs;
use crate::resource::ObjectKey;

pub(crate) fn log_start(kind: OperationKind, object: &ObjectKey) {
    info!(operation = %kind, object = %object, "operation started");
}

pub(crate) fn log_end(
    kind: OperationKind,
    object: &ObjectKey,
    result: &Result<Outputs, OperationError>,
) {
    match result {
        Ok(outputs) => info!(
            operation = %kind,
            object = %object,
            outputs = outputs.len(),
            "operation succeeded"
        ),
        Err(error) => warn!(
            operation = %kind,
            object = %object,
            error = %error,
            "operation failed"
        ),
    }
}
