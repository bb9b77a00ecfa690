//! Context squashing.
//!
//! Contributions are applied strictly in order. Mappings that meet at the same
//! key path merge recursively; any other pairing is replaced wholesale by the
//! later value. Sequences are never concatenated and keys are never deleted.

use serde_json::Value;

use super::Context;
use crate::core::{J2Error, Result};

/// One decoded source waiting to be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    /// Source identity, used in errors and logs
    pub name: String,
    pub data: Context,
    /// Dotted key path to attach `data` under
    pub mount: Option<String>,
}

impl Contribution {
    pub fn new(name: impl Into<String>, data: Context) -> Self {
        Self {
            name: name.into(),
            data,
            mount: None,
        }
    }

    #[must_use]
    pub fn mounted_at(mut self, mount: Option<String>) -> Self {
        self.mount = mount;
        self
    }
}

/// Deep-merge `incoming` into `target`.
///
/// ```rust
/// use j2cli::context::{Context, squash};
/// use serde_json::json;
///
/// let mut target: Context = serde_json::from_value(json!({"c": {"x": 2, "y": 3}})).unwrap();
/// let incoming: Context = serde_json::from_value(json!({"c": {"y": 4}})).unwrap();
/// squash(&mut target, &incoming);
/// assert_eq!(serde_json::Value::Object(target), json!({"c": {"x": 2, "y": 4}}));
/// ```
pub fn squash(target: &mut Context, incoming: &Context) {
    for (key, value) in incoming {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (target.get_mut(key), value)
        {
            squash(existing, nested);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Merges ordered contributions into one context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextMerger;

impl ContextMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge contributions in order into a fresh context.
    ///
    /// The contributions themselves are never modified. A contribution with a
    /// mount path is attached under that path: missing intermediate nodes are
    /// created, non-mapping ones are replaced by mappings, and the terminal
    /// node is merged with the same rule as top-level squashing.
    pub fn merge(&self, contributions: &[Contribution]) -> Result<Context> {
        let mut result = Context::new();

        for contribution in contributions {
            match contribution.mount.as_deref() {
                None => {
                    tracing::debug!(
                        "Squashing {} ({} keys) at top level",
                        contribution.name,
                        contribution.data.len()
                    );
                    squash(&mut result, &contribution.data);
                }
                Some(mount) => {
                    let segments = parse_mount_path(mount).map_err(|reason| J2Error::MergeError {
                        source_name: contribution.name.clone(),
                        reason,
                    })?;
                    tracing::debug!(
                        "Mounting {} ({} keys) at '{}'",
                        contribution.name,
                        contribution.data.len(),
                        mount
                    );
                    let node = navigate(&mut result, &segments);
                    squash(node, &contribution.data);
                }
            }
        }

        Ok(result)
    }
}

fn parse_mount_path(mount: &str) -> std::result::Result<Vec<&str>, String> {
    let segments: Vec<&str> = mount.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(format!("mount path '{mount}' has an empty segment"));
    }
    Ok(segments)
}

/// Walk to the mapping at `segments`, creating or replacing nodes on the way.
fn navigate<'a>(root: &'a mut Context, segments: &[&str]) -> &'a mut Context {
    let mut node = root;
    for segment in segments {
        let slot = node.entry((*segment).to_string()).or_insert_with(|| Value::Object(Context::new()));
        if !slot.is_object() {
            *slot = Value::Object(Context::new());
        }
        node = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just made a mapping"),
        };
    }
    node
}
