#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use anyhow::{Context, Result};

use crate::checker::CheckerFactory;

/// Fixed prefix for every posted flag, so students can tell automated
/// comments from hand-written ones.
pub const DISCLAIMER: &str =
    "<strong>This flag was generated automatically.</strong><br/><br/>";

/// Connection settings read from the environment once at startup.
pub struct Config {
    /// Bearer credential for the Ans API.
    pub api_token: String,
    /// School whose courses are searched when resolving `--course`.
    pub school_id: u64,
    /// API base URL.
    pub base_url:  String,
    /// Minimum delay between consecutive API calls.
    pub throttle:  Duration,
}

impl Config {
    /// Reads the configuration from the environment. `ANS_API_TOKEN` and
    /// `ANS_SCHOOL_ID` are required; the base URL and throttle have
    /// defaults matching the live platform.
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("ANS_API_TOKEN")
            .context("ANS_API_TOKEN is not set; it should hold an Ans API bearer token")?;
        let school_id = std::env::var("ANS_SCHOOL_ID")
            .context("ANS_SCHOOL_ID is not set; it should hold the numeric school ID")?
            .trim()
            .parse()
            .context("ANS_SCHOOL_ID is not a number")?;
        let base_url = std::env::var("ANS_BASE_URL")
            .unwrap_or_else(|_| "https://ans.app/api/v2".to_string());
        let throttle_ms = std::env::var("ANS_THROTTLE_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(200);

        Ok(Self {
            api_token,
            school_id,
            base_url,
            throttle: Duration::from_millis(throttle_ms),
        })
    }
}

/// One reviewable question: a display label, the 1-based position of the
/// question in the assignment's flattened question sequence, and the
/// checkers to run against it, in order.
pub struct Marker {
    /// Label shown in the console report.
    pub name:        String,
    /// 1-based question position this marker targets.
    pub question:    usize,
    /// Checker constructors to run, in configured order.
    pub checkers:    Vec<CheckerFactory>,
    /// When set, the marker also runs against an empty response. By default
    /// an empty response skips the marker entirely.
    pub maybe_empty: bool,
}

impl Marker {
    /// Creates a marker that skips empty responses.
    pub fn new(name: &str, question: usize, checkers: Vec<CheckerFactory>) -> Self {
        Self {
            name: name.to_owned(),
            question,
            checkers,
            maybe_empty: false,
        }
    }

    /// Marks this marker as applicable to empty responses too.
    pub fn maybe_empty(mut self) -> Self {
        self.maybe_empty = true;
        self
    }
}

/// The marker configuration for one course module: a default assignment
/// name plus the ordered marker list. Passed into the workflows explicitly;
/// there is no process-wide registry state.
pub struct ModuleConfig {
    /// Module name, the CLI's positional argument.
    pub name:               String,
    /// Assignment name used when `--assignment` is not given.
    pub assignment_default: String,
    /// Markers to review, in configured order.
    pub markers:            Vec<Marker>,
}
