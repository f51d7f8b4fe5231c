// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Override metadata resolution and tag extraction.
//!
//! The runner stores per-test configuration metadata in one of several
//! places depending on how the test was declared. Adapters report every
//! location they found as an [`OverrideCandidate`]; resolution takes the
//! first non-empty one. Tags are then extracted from the resolved map.

use indexmap::IndexSet;
use serde_json::Value;
use zephyr_report::ConfigOverrides;

/// Field holding a direct tag array on the override map.
const TAGS_FIELD: &str = "tags";
/// Field holding a list of override entries, each with a nested tag array.
const CONFIG_LIST_FIELD: &str = "testConfigList";
/// Key under which each config-list entry nests its override map.
const CONFIG_LIST_OVERRIDES_FIELD: &str = "overrides";
/// Field holding a single unverified configuration with a tag array.
const UNVERIFIED_FIELD: &str = "unverifiedTestConfig";

/// Where on the runner's test object an override map was found.
///
/// Variants are listed in precedence order: when more than one location is
/// populated, the earlier one wins.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum OverrideOrigin {
    /// The test's own configuration field.
    TestConfig,

    /// The test's configuration-override field.
    TestConfigOverride,

    /// The configuration reachable through the test's execution context.
    ExecutionContext,
}

/// An override map together with the location it was found at.
#[derive(Clone, Debug)]
pub struct OverrideCandidate {
    /// Where the map was found.
    pub origin: OverrideOrigin,

    /// The map itself, stored opaquely.
    pub overrides: ConfigOverrides,
}

impl OverrideCandidate {
    /// Creates a new candidate.
    pub fn new(origin: OverrideOrigin, overrides: ConfigOverrides) -> Self {
        Self { origin, overrides }
    }
}

/// Resolves the override map for a test: the first candidate with a
/// non-empty map wins, sorted by origin precedence. Absence of any populated
/// candidate yields an empty map.
pub fn resolve_overrides(candidates: &[OverrideCandidate]) -> ConfigOverrides {
    let mut candidates: Vec<_> = candidates.iter().collect();
    candidates.sort_by_key(|candidate| candidate.origin);
    candidates
        .into_iter()
        .find(|candidate| !candidate.overrides.is_empty())
        .map(|candidate| candidate.overrides.clone())
        .unwrap_or_default()
}

/// Extracts the canonical tag list from an override map.
///
/// Three locations are scanned in priority order: the direct `tags` array,
/// the `testConfigList` entries' nested tag arrays (flattened in encounter
/// order), and the single `unverifiedTestConfig` tag array. Values are
/// coerced to strings and trimmed; empty strings are discarded; duplicates
/// collapse case-sensitively with the first occurrence's position kept.
///
/// No error is possible: absence of every location yields an empty list.
pub fn extract_tags(overrides: &ConfigOverrides) -> Vec<String> {
    let mut tags = IndexSet::new();

    add_tags(&mut tags, overrides.get(TAGS_FIELD));

    if let Some(Value::Array(entries)) = overrides.get(CONFIG_LIST_FIELD) {
        for entry in entries {
            add_tags(
                &mut tags,
                entry
                    .get(CONFIG_LIST_OVERRIDES_FIELD)
                    .and_then(|overrides| overrides.get(TAGS_FIELD)),
            );
        }
    }

    if let Some(Value::Object(unverified)) = overrides.get(UNVERIFIED_FIELD) {
        add_tags(&mut tags, unverified.get(TAGS_FIELD));
    }

    tags.into_iter().collect()
}

/// Adds the elements of a candidate tag array to the set. Non-array values
/// are ignored.
fn add_tags(tags: &mut IndexSet<String>, maybe_tags: Option<&Value>) {
    let Some(Value::Array(values)) = maybe_tags else {
        return;
    };
    for value in values {
        if let Some(tag) = coerce_tag(value) {
            tags.insert(tag);
        }
    }
}

/// Coerces a scalar JSON value to a trimmed tag string. Empty strings and
/// non-scalar values yield `None`.
fn coerce_tag(value: &Value) -> Option<String> {
    let tag = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!tag.is_empty()).then_some(tag)
}
