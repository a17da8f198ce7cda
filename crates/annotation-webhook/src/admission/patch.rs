use std::{collections::BTreeMap, fmt, str::FromStr};

use json_patch::{AddOperation, Patch, PatchOperation, RemoveOperation};
use jsonptr::PointerBuf;
use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;

use crate::admission::errors::{AdmissionError, Result};

/// How annotation changes are expressed inside of the JSON Patch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStrategy {
    /// Write the whole annotations map at `/metadata/annotations`.
    /// Annotations added to the object by other mutating webhooks after it
    /// has been sent to us are lost.
    #[default]
    Map,
    /// Write every changed annotation at its own path, leaving the other
    /// ones untouched.
    Key,
}

impl FromStr for PatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "map" => Ok(PatchStrategy::Map),
            "key" => Ok(PatchStrategy::Key),
            other => Err(format!("unknown patch strategy: {other}")),
        }
    }
}

impl fmt::Display for PatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatchStrategy::Map => write!(f, "map"),
            PatchStrategy::Key => write!(f, "key"),
        }
    }
}

/// Build the JSON Patch document turning `original` into `mutated`.
///
/// Annotation changes are expressed following `strategy`, every other
/// difference between the two objects is computed field by field. A patch
/// is always returned: with the `map` strategy it always writes the
/// annotations map, even when its contents did not change, so that the
/// same review evaluated twice yields the same patch.
pub fn build_patch(original: &Pod, mutated: &Pod, strategy: PatchStrategy) -> Result<Vec<u8>> {
    let mut operations = object_operations(original, mutated)?;

    operations.extend(match strategy {
        PatchStrategy::Map => map_operations(original, mutated),
        PatchStrategy::Key => key_operations(original, mutated),
    });

    serde_json::to_vec(&Patch(operations)).map_err(AdmissionError::PatchEncoding)
}

fn annotations_path() -> PointerBuf {
    PointerBuf::from_tokens(["metadata", "annotations"])
}

// Differences outside of `metadata.annotations`, those are handled by the
// patch strategy
fn object_operations(original: &Pod, mutated: &Pod) -> Result<Vec<PatchOperation>> {
    let without_annotations = |pod: &Pod| {
        let mut pod = pod.clone();
        pod.metadata.annotations = None;
        serde_json::to_value(pod).map_err(AdmissionError::PatchEncoding)
    };

    let diff = json_patch::diff(
        &without_annotations(original)?,
        &without_annotations(mutated)?,
    );

    Ok(diff.0)
}

// `add` both creates the map and replaces an existing one, while `replace`
// fails when the target location does not exist
fn map_operations(original: &Pod, mutated: &Pod) -> Vec<PatchOperation> {
    match (&original.metadata.annotations, &mutated.metadata.annotations) {
        (_, Some(after)) => vec![PatchOperation::Add(AddOperation {
            path: annotations_path(),
            value: serde_json::Value::Object(
                after
                    .iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                    .collect(),
            ),
        })],
        (Some(_), None) => vec![PatchOperation::Remove(RemoveOperation {
            path: annotations_path(),
        })],
        (None, None) => Vec::new(),
    }
}

fn key_operations(original: &Pod, mutated: &Pod) -> Vec<PatchOperation> {
    let empty = BTreeMap::new();
    let before = original.metadata.annotations.as_ref().unwrap_or(&empty);
    let after = mutated.metadata.annotations.as_ref().unwrap_or(&empty);

    let mut operations = Vec::new();

    for (key, value) in after {
        if before.get(key) == Some(value) {
            continue;
        }
        operations.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["metadata", "annotations", key.as_str()]),
            value: serde_json::Value::String(value.clone()),
        }));
    }

    for key in before.keys().filter(|key| !after.contains_key(*key)) {
        operations.push(PatchOperation::Remove(RemoveOperation {
            path: PointerBuf::from_tokens(["metadata", "annotations", key.as_str()]),
        }));
    }

    // The parent map must exist before keys can be added to it
    if original.metadata.annotations.is_none() && !operations.is_empty() {
        operations.insert(
            0,
            PatchOperation::Add(AddOperation {
                path: annotations_path(),
                value: serde_json::Value::Object(serde_json::Map::new()),
            }),
        );
    }

    operations
}
