//! Property-based tests for hashing, change detection and patch merging.
//!
//! These tests use proptest to generate random path sets and patch lists and
//! verify that the invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::change::detect_changes;
    use crate::document::{DocumentRecord, DocumentSet};
    use crate::frontmatter::{apply_patches, ArrayStrategy, FrontMatterPatch, PatchMode};
    use crate::hash::compute_signature;
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};
    use std::collections::BTreeSet;

    fn path_strategy() -> impl Strategy<Value = String> {
        "[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.md"
    }

    fn unique_paths(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set(path_strategy(), 0..max)
            .prop_map(|set| set.into_iter().collect())
    }

    fn set(paths: &[String]) -> DocumentSet {
        DocumentSet::new(
            paths
                .iter()
                .map(|p| DocumentRecord::new("repo", "repo", p.clone(), Vec::new()))
                .collect(),
        )
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-z]{0,8}".prop_map(Value::String),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                prop::collection::vec(("[a-d]", inner), 0..4).prop_map(|entries| {
                    Value::Mapping(
                        entries
                            .into_iter()
                            .map(|(k, v)| (Value::String(k), v))
                            .collect(),
                    )
                }),
            ]
        })
    }

    fn mapping() -> impl Strategy<Value = Mapping> {
        prop::collection::vec(("[a-e]", value()), 0..5).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect()
        })
    }

    fn patch() -> impl Strategy<Value = FrontMatterPatch> {
        (
            prop_oneof![
                Just(PatchMode::Replace),
                Just(PatchMode::SetIfMissing),
                Just(PatchMode::DeepMerge)
            ],
            prop_oneof![
                Just(ArrayStrategy::Replace),
                Just(ArrayStrategy::Union),
                Just(ArrayStrategy::Append)
            ],
            -5i64..5,
            mapping(),
        )
            .prop_map(|(mode, strategy, priority, data)| {
                FrontMatterPatch::new("generated", mode, priority, data).with_array_strategy(strategy)
            })
    }

    // ============================================================================
    // compute_signature property tests
    // ============================================================================

    proptest! {
        /// Property: the signature ignores input order
        #[test]
        fn signature_is_permutation_invariant(
            paths in prop::collection::vec(path_strategy(), 0..20).prop_shuffle()
        ) {
            let mut sorted = paths.clone();
            sorted.sort();
            prop_assert_eq!(compute_signature(&paths), compute_signature(&sorted));
        }

        /// Property: signatures of different path sets differ
        #[test]
        fn signature_distinguishes_sets(a in unique_paths(10), b in unique_paths(10)) {
            prop_assume!(a != b);
            prop_assert_ne!(compute_signature(&a), compute_signature(&b));
        }

        /// Property: the signature is always 64 lowercase hex characters
        #[test]
        fn signature_is_hex_sha256(paths in prop::collection::vec(".*", 0..8)) {
            let signature = compute_signature(&paths);
            prop_assert_eq!(signature.as_str().len(), 64);
            prop_assert!(signature.as_str().chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }

    // ============================================================================
    // detect_changes property tests
    // ============================================================================

    proptest! {
        /// Property: a set never differs from itself
        #[test]
        fn identical_sets_are_unchanged(paths in unique_paths(15)) {
            prop_assert!(!detect_changes(&set(&paths), &set(&paths)));
        }

        /// Property: an empty previous generation never reports a change
        #[test]
        fn first_generation_is_unchanged(paths in unique_paths(15)) {
            prop_assert!(!detect_changes(&DocumentSet::default(), &set(&paths)));
        }

        /// Property: for non-empty generations, a change is reported exactly
        /// when the path sets differ
        #[test]
        fn change_matches_path_set_difference(a in unique_paths(8), b in unique_paths(8)) {
            prop_assume!(!a.is_empty());
            let expected = a.iter().collect::<BTreeSet<_>>() != b.iter().collect::<BTreeSet<_>>();
            prop_assert_eq!(detect_changes(&set(&a), &set(&b)), expected);
        }

        /// Property: record order does not matter
        #[test]
        fn detection_ignores_order(paths in unique_paths(12).prop_shuffle()) {
            let mut sorted = paths.clone();
            sorted.sort();
            prop_assert!(!detect_changes(&set(&sorted), &set(&paths)));
        }
    }

    // ============================================================================
    // apply_patches property tests
    // ============================================================================

    proptest! {
        /// Property: merging is deterministic
        #[test]
        fn merge_is_deterministic(base in mapping(), patches in prop::collection::vec(patch(), 0..6)) {
            prop_assert_eq!(apply_patches(&base, &patches), apply_patches(&base, &patches));
        }

        /// Property: no patches means the base comes back unchanged
        #[test]
        fn empty_patch_list_is_identity(base in mapping()) {
            prop_assert_eq!(apply_patches(&base, &[]), base);
        }

        /// Property: applying a set-if-missing patch twice equals applying it once
        #[test]
        fn set_if_missing_is_idempotent(base in mapping(), data in mapping()) {
            let patch = FrontMatterPatch::new("defaults", PatchMode::SetIfMissing, 0, data);
            let once = apply_patches(&base, std::slice::from_ref(&patch));
            let twice = apply_patches(&once, std::slice::from_ref(&patch));
            prop_assert_eq!(once, twice);
        }

        /// Property: set-if-missing never changes keys already present
        #[test]
        fn set_if_missing_keeps_existing_keys(base in mapping(), data in mapping()) {
            let patch = FrontMatterPatch::new("defaults", PatchMode::SetIfMissing, 0, data);
            let merged = apply_patches(&base, &[patch]);
            for (key, value) in &base {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }

        /// Property: among equal priorities, the later replace patch wins
        #[test]
        fn later_replace_wins_on_equal_priority(a in scalar(), b in scalar()) {
            let mut first = Mapping::new();
            first.insert(Value::String("k".to_string()), a);
            let mut second = Mapping::new();
            second.insert(Value::String("k".to_string()), b.clone());
            let patches = vec![
                FrontMatterPatch::new("first", PatchMode::Replace, 1, first),
                FrontMatterPatch::new("second", PatchMode::Replace, 1, second),
            ];
            let merged = apply_patches(&Mapping::new(), &patches);
            prop_assert_eq!(merged.get("k"), Some(&b));
        }

        /// Property: the inputs are never mutated
        #[test]
        fn merge_does_not_mutate_inputs(base in mapping(), patches in prop::collection::vec(patch(), 0..4)) {
            let base_before = base.clone();
            let patches_before: Vec<Mapping> = patches.iter().map(|p| p.data.clone()).collect();
            let _ = apply_patches(&base, &patches);
            prop_assert_eq!(base, base_before);
            let patches_after: Vec<Mapping> = patches.iter().map(|p| p.data.clone()).collect();
            prop_assert_eq!(patches_after, patches_before);
        }
    }
}
