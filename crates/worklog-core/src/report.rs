//! Aggregation and display tables over completed log entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::log::LogEntry;
use crate::timefmt::{format_duration, format_stamp};

/// Column headers of the export table, in order. The first data cell
/// is the entry id; consumers key on these names, so they are fixed.
pub const EXPORT_HEADER: [&str; 6] = ["id", "START", "STOP", "PROJECT", "DURATION", "PAUSE"];

/// Per-project rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectTotals {
    pub count: usize,
    pub total_secs: i64,
}

/// Group entries by project name. The map iterates in name order,
/// which is also the display order of the summary.
pub fn aggregate(entries: &[LogEntry]) -> BTreeMap<String, ProjectTotals> {
    let mut totals: BTreeMap<String, ProjectTotals> = BTreeMap::new();
    for entry in entries {
        let slot = totals.entry(entry.project.clone()).or_default();
        slot.count += 1;
        slot.total_secs += entry.duration();
    }
    totals
}

/// One display row per entry, in the order given: start, stop,
/// project, duration, pause.
pub fn tabulate(entries: &[LogEntry], tz_hours: i64) -> Vec<[String; 5]> {
    entries
        .iter()
        .map(|entry| {
            [
                format_stamp(entry.start, tz_hours),
                format_stamp(entry.stop, tz_hours),
                entry.project.clone(),
                format_duration(entry.duration()),
                format_duration(entry.pause_total),
            ]
        })
        .collect()
}

/// Full export table: the fixed header row, then one row per entry
/// with the id prepended to its display cells.
pub fn export_rows(entries: &[LogEntry], tz_hours: i64) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(entries.len() + 1);
    rows.push(EXPORT_HEADER.iter().map(|s| s.to_string()).collect());
    for (entry, cells) in entries.iter().zip(tabulate(entries, tz_hours)) {
        let mut row = Vec::with_capacity(6);
        row.push(entry.id.to_string());
        row.extend(cells);
        rows.push(row);
    }
    rows
}

/// The per-project summary screen body.
pub fn summary_text(entries: &[LogEntry]) -> String {
    let mut text = String::from("Summary (Project Total Duration):\n");
    text.push_str(&"-".repeat(60));
    text.push('\n');
    for (project, totals) in aggregate(entries) {
        text.push_str(&format!(
            "📝 {} ({:>3} logs): {}\n",
            project,
            totals.count,
            format_duration(totals.total_secs)
        ));
    }
    text
}

/// The full listing screen body, one line per entry in insertion
/// order.
pub fn listing_text(entries: &[LogEntry], tz_hours: i64) -> String {
    let mut text = String::from("Logs:\n");
    text.push_str(&"-".repeat(60));
    text.push('\n');
    for entry in entries {
        text.push_str(&format!(
            "📅 {} - {} | 📝 {} | 🕓 {} (pause {})\n",
            format_stamp(entry.start, tz_hours),
            format_stamp(entry.stop, tz_hours),
            entry.project,
            format_duration(entry.duration()),
            format_duration(entry.pause_total)
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(project: &str, start: i64, stop: i64, pause: i64) -> LogEntry {
        LogEntry::new(project, start, stop, pause)
    }

    #[test]
    fn aggregate_groups_and_sorts_by_name() {
        let entries = vec![
            entry("Work", 0, 100, 0),
            entry("Education", 200, 260, 10),
            entry("Work", 300, 360, 0),
        ];
        let totals = aggregate(&entries);
        let keys: Vec<&str> = totals.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Education", "Work"]);
        assert_eq!(totals["Work"], ProjectTotals { count: 2, total_secs: 160 });
        assert_eq!(totals["Education"], ProjectTotals { count: 1, total_secs: 50 });
    }

    #[test]
    fn summary_lists_projects_in_name_order() {
        let entries = vec![entry("Work", 0, 100, 0), entry("Art", 0, 50, 0)];
        let text = summary_text(&entries);
        assert!(text.starts_with("Summary (Project Total Duration):"));
        let art = text.find("Art").unwrap();
        let work = text.find("Work").unwrap();
        assert!(art < work);
        assert!(text.contains("0:01:40"));
    }

    #[test]
    fn tabulate_keeps_insertion_order() {
        let entries = vec![entry("B", 500, 600, 0), entry("A", 0, 100, 0)];
        let rows = tabulate(&entries, 0);
        assert_eq!(rows[0][2], "B");
        assert_eq!(rows[1][2], "A");
    }

    #[test]
    fn export_rows_start_with_the_fixed_header() {
        let entries = vec![entry("Work", 1000, 1300, 50)];
        let rows = export_rows(&entries, 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["id", "START", "STOP", "PROJECT", "DURATION", "PAUSE"]);
        assert_eq!(rows[1][0], entries[0].id.to_string());
        assert_eq!(rows[1][3], "Work");
        assert_eq!(rows[1][4], "0:04:10");
        assert_eq!(rows[1][5], "0:00:50");
    }

    #[test]
    fn empty_input_yields_header_only() {
        assert_eq!(export_rows(&[], 0).len(), 1);
        assert!(summary_text(&[]).starts_with("Summary"));
    }
}
