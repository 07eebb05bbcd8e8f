//! Placeholder rendering for resource documents and output values.
//!
//! Strings may embed `{{ expr }}` placeholders evaluated by
//! [`crate::expression`]. A string that consists of exactly one placeholder
//! renders to the expression's typed value; otherwise every placeholder is
//! replaced by its textual form and the result stays a string. Objects and
//! arrays are walked recursively. Object keys are left as written.

use serde_json::{Map, Value};

use crate::bindings::Bindings;
use crate::error::TemplateError;
use crate::expression;
use crate::resource::Resource;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Resolves placeholders in a JSON value.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render `template`, evaluating relative paths against `current`.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] when a placeholder is malformed or its
    /// expression fails.
    fn render(
        &self,
        template: &Value,
        current: &Value,
        bindings: &Bindings,
    ) -> Result<Value, TemplateError>;
}

/// The default renderer, backed by the in-crate expression evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionRenderer;

impl TemplateRenderer for ExpressionRenderer {
    fn render(
        &self,
        template: &Value,
        current: &Value,
        bindings: &Bindings,
    ) -> Result<Value, TemplateError> {
        render_node(template, "", current, bindings)
    }
}

/// Render a resource against itself and revalidate the result.
///
/// # Errors
///
/// Returns a [`TemplateError`] when rendering fails or the rendered
/// document lost an identity field.
pub fn render_resource(
    renderer: &dyn TemplateRenderer,
    resource: &Resource,
    bindings: &Bindings,
) -> Result<Resource, TemplateError> {
    let document = resource.to_value();
    let rendered = renderer.render(&document, &document, bindings)?;
    Ok(Resource::from_value(rendered)?)
}

/// Path of a member below `parent`, written `parent.key`.
pub(crate) fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        String::from(key)
    } else {
        format!("{parent}.{key}")
    }
}

/// Path of an element below `parent`, written `parent[index]`.
pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Display form of a path, `@` for the root.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        String::from("@")
    } else {
        String::from(path)
    }
}

fn render_node(
    node: &Value,
    path: &str,
    current: &Value,
    bindings: &Bindings,
) -> Result<Value, TemplateError> {
    match node {
        Value::String(text) => render_string(text, path, current, bindings),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| render_node(item, &index_path(path, index), current, bindings))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| {
                render_node(value, &field_path(path, key), current, bindings)
                    .map(|rendered| (key.clone(), rendered))
            })
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        scalar => Ok(scalar.clone()),
    }
}

/// Render one string value found at `path`.
///
/// # Errors
///
/// Returns [`TemplateError::Unterminated`] for an unclosed placeholder and
/// [`TemplateError::Expression`] when an embedded expression fails.
pub fn render_string(
    text: &str,
    path: &str,
    current: &Value,
    bindings: &Bindings,
) -> Result<Value, TemplateError> {
    let evaluate = |source: &str| {
        expression::evaluate(source, current, bindings).map_err(|error| {
            TemplateError::Expression {
                path: display_path(path),
                source: error,
            }
        })
    };

    if let Some(inner) = sole_placeholder(text) {
        return evaluate(inner);
    }

    let mut rendered = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, after)) = rest.split_once(OPEN) {
        let (source, remaining) =
            after
                .split_once(CLOSE)
                .ok_or_else(|| TemplateError::Unterminated {
                    text: String::from(text),
                })?;
        rendered.push_str(before);
        push_text(&mut rendered, &evaluate(source)?);
        rest = remaining;
    }
    rendered.push_str(rest);
    Ok(Value::String(rendered))
}

fn sole_placeholder(text: &str) -> Option<&str> {
    text.strip_prefix(OPEN)
        .and_then(|body| body.strip_suffix(CLOSE))
        .filter(|inner| !inner.contains(OPEN) && !inner.contains(CLOSE))
}

fn push_text(buffer: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(text) => buffer.push_str(text),
        other => buffer.push_str(&other.to_string()),
    }
}
