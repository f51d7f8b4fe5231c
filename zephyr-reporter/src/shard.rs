// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shard identifiers for parallel test execution.
//!
//! Each parallel worker process runs a subset of tests and is identified by
//! an opaque string. The primary shard is the one allowed to run the global
//! merge by default; everything else is gated off to avoid every worker
//! repeating the same work.

use std::fmt;

/// The shard identifier designated as primary.
pub static PRIMARY_SHARD: &str = "1";

/// Identifies one parallel worker process.
///
/// The identifier is threaded explicitly into the merge operation rather than
/// read from ambient process state inside the core. [`ShardId::from_env`]
/// exists for callers that do source it from the conventional environment
/// variable at the edge.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ShardId(String);

impl ShardId {
    /// The environment variable conventionally carrying the shard identifier.
    pub const ENV_VAR: &str = "CYPRESS_THREAD";

    /// Creates a shard identifier from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the primary shard identifier.
    pub fn primary() -> Self {
        Self(PRIMARY_SHARD.to_owned())
    }

    /// Reads the shard identifier from [`Self::ENV_VAR`], defaulting to the
    /// primary shard when the variable is unset or empty.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) if !value.is_empty() => Self(value),
            _ => Self::primary(),
        }
    }

    /// Returns true if this is the designated primary shard.
    pub fn is_primary(&self) -> bool {
        self.0 == PRIMARY_SHARD
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShardId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
