//! Tree resolution over configuration values
//!
//! Both entry points share one walk: every string leaf that is a secret
//! reference becomes a [`PendingSecret`] slot borrowing the leaf mutably.
//! In-place resolution fills the slots of the caller's value; copy mode
//! copies the root without recursion and fills the copy's slots. Objects and arrays are
//! descended into to any depth; `null` and other scalars are left alone.

use crate::{Error, ResolverOptions, Result, SecretReference, resolve_secret};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A string leaf waiting for its secret value
#[derive(Debug)]
pub struct PendingSecret<'a> {
    /// JSON pointer of the leaf, e.g. `/database/password`
    pub pointer: String,
    /// The parsed reference
    pub reference: SecretReference,
    slot: &'a mut String,
}

/// Walk `root` and collect every string leaf that is a secret reference.
///
/// Uses an explicit stack so nesting depth is bounded only by memory.
/// Object keys are visited in insertion order.
#[must_use]
pub fn collect_pending(root: &mut Value) -> Vec<PendingSecret<'_>> {
    let mut pending = Vec::new();
    let mut stack: Vec<(String, &mut Value)> = vec![(String::new(), root)];

    while let Some((pointer, node)) = stack.pop() {
        match node {
            Value::Object(map) => {
                // reversed so the first key is popped first
                let children: Vec<_> = map
                    .iter_mut()
                    .map(|(key, child)| (format!("{pointer}/{}", escape_token(key)), child))
                    .collect();
                stack.extend(children.into_iter().rev());
            }
            Value::Array(items) => {
                let children: Vec<_> = items
                    .iter_mut()
                    .enumerate()
                    .map(|(index, child)| (format!("{pointer}/{index}"), child))
                    .collect();
                stack.extend(children.into_iter().rev());
            }
            Value::String(text) => {
                if let Some(reference) = SecretReference::parse(text) {
                    pending.push(PendingSecret {
                        pointer,
                        reference,
                        slot: text,
                    });
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    pending
}

// RFC 6901
fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// List every secret reference in `root` with its JSON pointer, without
/// resolving anything. Visits the same leaves, in the same order, as
/// [`collect_pending`].
#[must_use]
pub fn find_references(root: &Value) -> Vec<(String, SecretReference)> {
    let mut found = Vec::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), root)];

    while let Some((pointer, node)) = stack.pop() {
        match node {
            Value::Object(map) => stack.extend(
                map.iter()
                    .rev()
                    .map(|(key, child)| (format!("{pointer}/{}", escape_token(key)), child)),
            ),
            Value::Array(items) => stack.extend(
                items
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(index, child)| (format!("{pointer}/{index}"), child)),
            ),
            Value::String(text) => {
                if let Some(reference) = SecretReference::parse(text) {
                    found.push((pointer, reference));
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    found
}

/// Copy `root` without recursing. `Value::clone` descends one stack frame
/// per level.
fn deep_clone(root: &Value) -> Value {
    enum Step<'a> {
        Visit(&'a Value),
        Array(usize),
        Object(Vec<&'a String>),
    }

    let mut steps = vec![Step::Visit(root)];
    // finished children, in visiting order, waiting for their parent
    let mut built: Vec<Value> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Visit(Value::Array(items)) => {
                steps.push(Step::Array(items.len()));
                steps.extend(items.iter().rev().map(Step::Visit));
            }
            Step::Visit(Value::Object(map)) => {
                steps.push(Step::Object(map.keys().collect()));
                steps.extend(map.values().rev().map(Step::Visit));
            }
            Step::Visit(scalar) => built.push(scalar.clone()),
            Step::Array(len) => {
                let items = built.split_off(built.len() - len);
                built.push(Value::Array(items));
            }
            Step::Object(keys) => {
                let values = built.split_off(built.len() - keys.len());
                built.push(Value::Object(
                    keys.into_iter().cloned().zip(values).collect(),
                ));
            }
        }
    }

    built.pop().unwrap_or(Value::Null)
}

/// Drop `value` without recursing
fn drop_flat(value: Value) {
    let mut stack = vec![value];
    while let Some(node) = stack.pop() {
        match node {
            Value::Array(items) => stack.extend(items),
            Value::Object(map) => stack.extend(map.into_iter().map(|(_, child)| child)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

/// Resolve every secret reference in `root`, writing values back into it.
///
/// On error `root` may be partially resolved.
///
/// # Errors
///
/// Returns the first resolution error; see [`resolve_secret`].
pub async fn resolve_tree_in_place(options: &ResolverOptions, root: &mut Value) -> Result<()> {
    let pending = collect_pending(root);
    if pending.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        count = pending.len(),
        concurrency = options.concurrency(),
        "Resolving key vault references"
    );

    stream::iter(pending)
        .map(
            |PendingSecret {
                 pointer,
                 reference,
                 slot,
             }| async move {
                *slot = resolve_secret(options, &reference).await?;
                tracing::trace!(%pointer, secret = %reference.secret_name, "Resolved");
                Ok::<_, Error>(())
            },
        )
        .buffer_unordered(options.concurrency())
        .try_collect::<Vec<()>>()
        .await?;

    Ok(())
}

/// Resolve every secret reference into a new value. `root` is not modified.
///
/// The copy is built without recursion, so nesting depth is bounded only by
/// memory.
///
/// # Errors
///
/// Returns the first resolution error; see [`resolve_secret`].
pub async fn resolve_tree(options: &ResolverOptions, root: &Value) -> Result<Value> {
    let mut output = deep_clone(root);
    match resolve_tree_in_place(options, &mut output).await {
        Ok(()) => Ok(output),
        Err(e) => {
            drop_flat(output);
            Err(e)
        }
    }
}

/// Resolve every secret reference in a typed configuration.
///
/// The value is converted to JSON, resolved, and converted back, so every
/// string field at any depth is a candidate.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if `T` does not round-trip through JSON,
/// otherwise the first resolution error.
pub async fn resolve_config<T>(config: &T, options: &ResolverOptions) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(config)
        .map_err(|e| Error::serialization(format!("failed to serialize config: {e}")))?;
    resolve_tree_in_place(options, &mut value).await?;
    serde_json::from_value(value)
        .map_err(|e| Error::serialization(format!("failed to deserialize resolved config: {e}")))
}
