#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Result, bail};

use crate::{
    checker::{file_present, lines_equal, matches_question, response_equals},
    config::{Marker, ModuleConfig},
};

/// The course modules this tool knows how to review. The registry is built
/// here and passed around explicitly; nothing reads it through global state.
pub fn registry() -> Vec<ModuleConfig> {
    vec![assembly()]
}

/// Looks a module up by name, failing with a descriptive message when the
/// name is unknown. A typo here is a setup mistake, never retried.
pub fn resolve(name: &str) -> Result<ModuleConfig> {
    let Some(module) = registry().into_iter().find(|module| module.name == name) else {
        bail!("No markers for `{name}`");
    };
    Ok(module)
}

/// Markers for the assembly practical.
fn assembly() -> ModuleConfig {
    ModuleConfig {
        name:               "assembly".to_owned(),
        assignment_default: "Practicum 2: assembly".to_owned(),
        markers:            vec![
            Marker::new("Word size", 1, vec![response_equals("32")]),
            Marker::new(
                "Register trace",
                2,
                vec![lines_equal(&["r0 = 0", "r1 = 4", "r2 = 8"])],
            ),
            Marker::new("Trace matches pseudocode", 3, vec![matches_question(2)]),
            Marker::new("Uploaded program", 4, vec![file_present(".s")]).maybe_empty(),
        ],
    }
}
