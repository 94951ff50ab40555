//! Priority-ordered front matter merging
//!
//! ## Behavior
//!
//! Patches are stable-sorted by ascending priority (equal priorities keep
//! submission order) and folded into a clone of the base mapping:
//!
//! | Mode           | Effect per key in the patch                                   |
//! |----------------|---------------------------------------------------------------|
//! | `Replace`      | overwrite, even when both sides are mappings                  |
//! | `SetIfMissing` | set only when the key is absent                               |
//! | `DeepMerge`    | mappings recurse, sequences follow the array strategy, else replace |
//!
//! Neither the base nor any patch is modified; every value written into the
//! result is a clone. Type mismatches are resolved by letting the incoming
//! value win and are only reported at `debug` level.

use log::debug;
use serde_yaml::{Mapping, Value};

use super::{ArrayStrategy, FrontMatterPatch, PatchMode};

/// Apply `patches` to `base` and return the merged metadata.
pub fn apply_patches(base: &Mapping, patches: &[FrontMatterPatch]) -> Mapping {
    let mut ordered: Vec<&FrontMatterPatch> = patches.iter().collect();
    // `sort_by_key` is stable, so equal priorities keep submission order.
    ordered.sort_by_key(|patch| patch.priority);

    let mut merged = base.clone();
    for patch in ordered {
        apply_patch(&mut merged, patch);
    }
    merged
}

/// Fold a single patch into `target` according to its mode.
pub fn apply_patch(target: &mut Mapping, patch: &FrontMatterPatch) {
    match patch.mode {
        PatchMode::Replace => {
            for (key, value) in &patch.data {
                target.insert(key.clone(), value.clone());
            }
        }
        PatchMode::SetIfMissing => {
            for (key, value) in &patch.data {
                if !target.contains_key(key) {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        PatchMode::DeepMerge => {
            merge_mappings(target, &patch.data, patch.array_strategy, "", &patch.source);
        }
    }
}

/// Recursively merge `source` into `target`.
///
/// Keys absent from `target` are inserted; mappings present on both sides
/// recurse; sequences on both sides combine per `strategy`; anything else is
/// replaced by the incoming value.
pub fn merge_mappings(
    target: &mut Mapping,
    source: &Mapping,
    strategy: ArrayStrategy,
    path: &str,
    origin: &str,
) {
    for (key, value) in source {
        let key_path = child_path(path, key);
        match target.get_mut(key) {
            Some(existing) => merge_values(existing, value, strategy, &key_path, origin),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_values(
    existing: &mut Value,
    incoming: &Value,
    strategy: ArrayStrategy,
    path: &str,
    origin: &str,
) {
    match (existing, incoming) {
        (Value::Mapping(target_map), Value::Mapping(source_map)) => {
            merge_mappings(target_map, source_map, strategy, path, origin);
        }
        (Value::Sequence(target_seq), Value::Sequence(source_seq)) => {
            merge_sequences(target_seq, source_seq, strategy);
        }
        (slot, value) => {
            if type_name(slot) != type_name(value) {
                debug!(
                    "{}: type mismatch at '{}': replacing {} with {}",
                    origin,
                    path,
                    type_name(slot),
                    type_name(value)
                );
            }
            *slot = value.clone();
        }
    }
}

/// Combine two sequences under the same key.
pub fn merge_sequences(target: &mut Vec<Value>, source: &[Value], strategy: ArrayStrategy) {
    match strategy {
        ArrayStrategy::Replace => {
            *target = source.to_vec();
        }
        ArrayStrategy::Append => {
            target.extend(source.iter().cloned());
        }
        ArrayStrategy::Union => {
            for item in source {
                if !target.contains(item) {
                    target.push(item.clone());
                }
            }
        }
    }
}

fn child_path(path: &str, key: &Value) -> String {
    let key = match key {
        Value::String(s) => s.clone(),
        other => format!("{:?}", other),
    };
    if path.is_empty() {
        key
    } else {
        format!("{}.{}", path, key)
    }
}

/// Human-readable type name of a value, for diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Sequence(_) => "Sequence",
        Value::Mapping(_) => "Mapping",
        Value::Tagged(_) => "Tagged",
    }
}
