#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Marker phrase students use to open a free-form comment block below their
/// actual answer. Lines from this phrase onward are not part of the answer.
const EPIGRAPH_MARKER: &str = "commentaar onder";

/// Splits an answer into trimmed, non-empty lines, preserving order.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Drops everything from the epigraph marker onward, so checkers only see
/// the answer proper.
pub fn filter_epigraph(lines: Vec<String>) -> Vec<String> {
    let mut filtered = Vec::with_capacity(lines.len());
    for line in lines {
        if line.to_lowercase().contains(EPIGRAPH_MARKER) {
            break;
        }
        filtered.push(line);
    }
    filtered
}
