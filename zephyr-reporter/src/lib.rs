// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Turns a test runner's lifecycle notifications into zephyr-json reports,
//! and merges the per-run reports written by parallel shards into one
//! consolidated report.
//!
//! The flow is: one [`EventCollector`](collector::EventCollector) per run
//! writes a report under `<root>/zephyr/temp/`; after all shards finish,
//! [`merge_reports`](merge::merge_reports) scans that tree, deduplicates and
//! recomputes statistics, and writes the combined report to
//! `<root>/zephyr/zephyr-report-<shard>.json`.

pub mod collector;
pub mod errors;
pub mod events;
pub mod merge;
pub mod overrides;
mod paths;
pub mod scan;
pub mod shard;
