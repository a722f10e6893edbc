//! Configuration diff
//!
//! Unified, line-based diff between the expected (golden) and the actual
//! device configuration, sized for inclusion in a tool response.

use similar::{DiffTag, TextDiff};
use std::fmt::Write;
use std::time::Duration;
use tracing::warn;

/// Returned when both texts are identical
pub const NO_DIFFERENCES: &str = "No differences detected in configuration comparison";

/// Appended after a cut diff
pub const TRUNCATION_MARKER: &str = "\n... [diff truncated for readability] ...";

/// Longest diff kept, in characters
pub const MAX_DIFF_CHARS: usize = 5000;

/// Upper bound on diff computation; past it the diff gets coarser
const DIFF_TIMEOUT: Duration = Duration::from_secs(2);

const CONTEXT_LINES: usize = 3;

/// Unified diff of `expected` against `actual`
pub fn config_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::configure()
        .timeout(DIFF_TIMEOUT)
        .diff_lines(expected, actual);

    if diff.ops().iter().all(|op| op.tag() == DiffTag::Equal) {
        return NO_DIFFERENCES.to_string();
    }

    let mut rendered = String::new();
    if let Err(e) = write!(
        rendered,
        "{}",
        diff.unified_diff()
            .context_radius(CONTEXT_LINES)
            .header("Expected Config", "Actual Config")
    ) {
        warn!(error = %e, "Failed to render config diff");
        return format!(
            "Config difference detected but unable to generate diff: {}",
            e
        );
    }

    truncate(rendered.trim_end_matches('\n'))
}

fn truncate(diff: &str) -> String {
    match diff.char_indices().nth(MAX_DIFF_CHARS) {
        Some((cut, _)) => format!("{}{}", &diff[..cut], TRUNCATION_MARKER),
        None => diff.to_string(),
    }
}
