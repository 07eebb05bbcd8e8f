//! Named values extracted from an operation's result.
//!
//! Outputs are evaluated in declaration order and each produced value is
//! bound as `$name` before the next output renders, so a later output can
//! build on an earlier one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bindings::{Binding, Bindings};
use crate::check::Checker;
use crate::error::OutputError;
use crate::template::TemplateRenderer;

/// Values produced by one operation, in declaration order.
pub type Outputs = IndexMap<String, Binding>;

/// A declared output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Name the value is bound under, without the `$` prefix.
    pub name: String,

    /// Assertion tree gating the output; a mismatch skips it.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub r#match: Option<Value>,

    /// Value template rendered against the document.
    pub value: Value,
}

impl Output {
    /// Declare an ungated output.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            r#match: None,
            value,
        }
    }

    /// Produce this output only when the document matches `predicate`.
    #[must_use]
    pub fn with_match(mut self, predicate: Value) -> Self {
        self.r#match = Some(predicate);
        self
    }
}

/// Validate an output name against `[A-Za-z_][A-Za-z0-9_]*`.
///
/// # Errors
///
/// Returns [`OutputError::InvalidName`] for any other name.
pub fn check_name(name: &str) -> Result<(), OutputError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(OutputError::InvalidName {
            name: String::from(name),
        })
    }
}

/// Bind every output as `$name` on top of `bindings`.
#[must_use]
pub fn register_outputs(bindings: &Bindings, outputs: &Outputs) -> Bindings {
    outputs.iter().fold(bindings.clone(), |chain, (name, binding)| {
        chain.register(format!("${name}"), binding.clone())
    })
}

/// Evaluate `outputs` against `document`.
///
/// Returns the produced values together with `bindings` extended by each
/// of them.
///
/// # Errors
///
/// Stops at the first invalid name, gating predicate that cannot be
/// evaluated, or value that fails to render.
pub fn extract(
    renderer: &dyn TemplateRenderer,
    checker: &dyn Checker,
    document: &Value,
    bindings: &Bindings,
    outputs: &[Output],
) -> Result<(Outputs, Bindings), OutputError> {
    let mut produced = Outputs::with_capacity(outputs.len());
    let mut chain = bindings.clone();
    for output in outputs {
        check_name(&output.name)?;
        if let Some(predicate) = &output.r#match {
            let mismatches = checker.check(document, &chain, predicate).map_err(|source| {
                OutputError::Check {
                    name: output.name.clone(),
                    source,
                }
            })?;
            if !mismatches.is_empty() {
                continue;
            }
        }
        let value = renderer
            .render(&output.value, document, &chain)
            .map_err(|source| OutputError::Render {
                name: output.name.clone(),
                source,
            })?;
        let binding = Binding::new(value);
        chain = chain.register(format!("${}", output.name), binding.clone());
        produced.insert(output.name.clone(), binding);
    }
    Ok((produced, chain))
}
