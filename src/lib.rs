//! # ans-flagger
//!
//! Automates review of student submissions hosted on the Ans assessment
//! platform: fetches graded results, runs pluggable checkers against each
//! submission's answers and uploaded files, posts explanatory comments
//! ("flags") back to the platform, and can later retract them again.
//!
//! The interesting part is the flag reconciliation engine in [`flags`]: it
//! joins the platform's paginated REST resources into a per-student,
//! per-question view, drives the checker protocol over that view, and
//! applies idempotent, filterable posting (and deletion) of flags. All
//! flag state lives on the platform; this tool holds nothing durable.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Typed client and data model for the Ans REST API
pub mod ans;
/// The checker protocol and the stock checker families
pub mod checker;
/// Environment configuration and marker/module configuration types
pub mod config;
/// The flag build and clear workflows
pub mod flags;
/// The module registry mapping module names to marker configurations
pub mod modules;
/// Generic rate-limited REST session and paginated fetcher
pub mod rest;
/// Small helpers for cleaning up free-form answer text
pub mod util;
