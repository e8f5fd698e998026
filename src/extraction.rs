use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder returned when no strategy produces a usable summary.
pub const NO_SUMMARY: &str = "No summary available";

/// Summary and task list pulled out of a raw model completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub summary: String,
    pub tasks: Vec<String>,
}

// Only same-line whitespace may follow the marker: a `\s*` here would eat
// the newline the terminator needs and make the capture overrun an empty
// summary section into the tasks block.
static SUMMARY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)summary:[ \t]*(.*?)(?:\n\s*tasks:|\z)").unwrap());
static TASKS_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)tasks:(.*)\z").unwrap());
static TASK_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*-\s*").unwrap());
static BULLET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-\u{2022}*]|\d+\.)\s+").unwrap());

/// Parse a raw completion into a summary and a list of tasks.
///
/// The model is prompted for a `Summary:` line followed by a `Tasks:` section
/// with dash-prefixed items, but compliance is not guaranteed, so extraction
/// is an ordered cascade of strategies: marker capture first, then a
/// bullet-line scan for tasks, then a first-paragraph heuristic for the
/// summary. Never fails; completely unstructured input yields an empty task
/// list and the [`NO_SUMMARY`] placeholder.
pub fn extract(raw: &str) -> Extraction {
    let summary = summary_after_marker(raw)
        .or_else(|| summary_from_first_paragraph(raw))
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    let mut tasks = tasks_after_marker(raw);
    if tasks.is_empty() {
        tasks = tasks_from_bullets(raw);
    }

    Extraction { summary, tasks }
}

/// Strategy 1: text between a case-insensitive `Summary:` marker and the
/// following `Tasks:` marker (or end of input). Empty captures fall through
/// to the paragraph fallback.
fn summary_after_marker(raw: &str) -> Option<String> {
    let captured = SUMMARY_MARKER.captures(raw)?.get(1)?.as_str().trim();
    if captured.is_empty() {
        None
    } else {
        Some(captured.to_string())
    }
}

/// Strategy 2: everything after a case-insensitive `Tasks:` marker, split on
/// dash-prefixed line boundaries. Empty fragments are dropped.
fn tasks_after_marker(raw: &str) -> Vec<String> {
    let Some(captures) = TASKS_MARKER.captures(raw) else {
        return Vec::new();
    };
    let section = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    TASK_SPLIT
        .split(section)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Task fallback: scan every line of the full input for bullet (`-`, `•`,
/// `*`) or numbered (`N.`) prefixes and strip the marker.
fn tasks_from_bullets(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| BULLET_LINE.is_match(line))
        .map(|line| BULLET_LINE.replace(line, "").trim().to_string())
        .filter(|task| !task.is_empty())
        .collect()
}

/// Summary fallback: the first blank-line-separated paragraph longer than 30
/// characters that does not itself contain `tasks:`.
fn summary_from_first_paragraph(raw: &str) -> Option<String> {
    raw.split("\n\n")
        .find(|paragraph| {
            paragraph.chars().count() > 30 && !paragraph.to_lowercase().contains("tasks:")
        })
        .map(|paragraph| paragraph.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let result = extract("Summary: X\n\nTasks:\n- A\n- B");
        assert_eq!(result.summary, "X");
        assert_eq!(result.tasks, vec!["A", "B"]);
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let result = extract("SUMMARY: key points here\n\ntasks:\n- follow up with legal");
        assert_eq!(result.summary, "key points here");
        assert_eq!(result.tasks, vec!["follow up with legal"]);
    }

    #[test]
    fn test_multiline_summary_stops_before_tasks() {
        let result = extract("Summary: first line\nsecond line\n\nTasks:\n- A");
        assert_eq!(result.summary, "first line\nsecond line");
        assert_eq!(result.tasks, vec!["A"]);
    }

    #[test]
    fn test_summary_on_line_after_marker() {
        let result = extract("Summary:\nkey points here\n\nTasks:\n- A");
        assert_eq!(result.summary, "key points here");
        assert_eq!(result.tasks, vec!["A"]);
    }

    #[test]
    fn test_first_paragraph_fallback_when_no_marker() {
        let raw = "The team agreed to ship the beta by Friday after QA signs off.\n\nShort tail.";
        let result = extract(raw);
        assert_eq!(
            result.summary,
            "The team agreed to ship the beta by Friday after QA signs off."
        );
    }

    #[test]
    fn test_paragraph_fallback_skips_short_and_task_paragraphs() {
        let raw = "Too short.\n\nTasks: everything in this paragraph mentions tasks: a lot\n\nThis paragraph is comfortably longer than thirty characters.";
        let result = extract(raw);
        assert_eq!(
            result.summary,
            "This paragraph is comfortably longer than thirty characters."
        );
    }

    #[test]
    fn test_bullet_fallback_strips_mixed_markers() {
        let raw = "Here is what was discussed in the meeting today, at length.\n\n1. Do X\n* Do Y";
        let result = extract(raw);
        assert_eq!(result.tasks, vec!["Do X", "Do Y"]);
    }

    #[test]
    fn test_bullet_fallback_handles_multi_digit_numbering() {
        let result = extract("12. Renew the office lease\n\u{2022} Email the vendor");
        assert_eq!(
            result.tasks,
            vec!["Renew the office lease", "Email the vendor"]
        );
    }

    #[test]
    fn test_unstructured_input_yields_placeholder() {
        let result = extract("nothing useful");
        assert_eq!(result.summary, NO_SUMMARY);
        assert!(result.tasks.is_empty());
    }

    #[test]
    fn test_empty_summary_capture_falls_through() {
        // Marker present but empty; the paragraph fallback should not pick
        // the tasks section either, so we land on the placeholder.
        let result = extract("Summary:\n\nTasks:\n- A");
        assert_eq!(result.summary, NO_SUMMARY);
        assert_eq!(result.tasks, vec!["A"]);
    }

    #[test]
    fn test_marker_section_takes_precedence_over_bullet_scan() {
        // The numbered line outside the Tasks: section is ignored once the
        // marker split yields anything.
        let result = extract("1. agenda item, not a task\n\nTasks:\n- A\n- B");
        assert_eq!(result.tasks, vec!["A", "B"]);
    }

    #[test]
    fn test_trailing_empty_fragment_dropped() {
        let result = extract("Tasks:\n- A\n- B\n- ");
        assert_eq!(result.tasks, vec!["A", "B"]);
    }
}
