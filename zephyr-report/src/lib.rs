// Copyright (c) The zephyr-reports Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate, read and validate zephyr-json test run reports.
//!
//! This crate only defines the data model and its JSON serialization. Policy
//! around where reports live on disk and how they are combined belongs to the
//! `zephyr-reporter` crate.

#![warn(missing_docs)]

mod errors;
mod report;

pub use errors::*;
pub use report::*;
