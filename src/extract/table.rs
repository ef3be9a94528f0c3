//! Table detection on plain page text.

use regex::Regex;

use crate::model::{Table, TableCell, TableRow};

/// A run of page text classified as prose or table.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Consecutive non-table lines, joined with newlines
    Prose(String),
    /// A detected table
    Table(Table),
}

/// Decides which lines of a page form tables.
pub trait TableClassifier: Send + Sync {
    /// Partition page text into prose and table segments, in reading order.
    fn classify(&self, text: &str) -> Vec<Segment>;
}

/// Classifier that never detects tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTables;

impl TableClassifier for NoTables {
    fn classify(&self, text: &str) -> Vec<Segment> {
        if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![Segment::Prose(text.to_string())]
        }
    }
}

/// Whitespace heuristic: a line is a candidate row when it contains a tab or
/// a run of two or more whitespace characters; `min_rows` consecutive
/// candidates form a table whose first row is the header.
#[derive(Debug, Clone)]
pub struct WhitespaceTableClassifier {
    min_rows: usize,
    candidate: Regex,
    separator: Regex,
}

impl WhitespaceTableClassifier {
    /// Create a classifier with the default two-row minimum.
    pub fn new() -> Self {
        Self::with_min_rows(2)
    }

    /// Create a classifier requiring `min_rows` consecutive candidate lines.
    pub fn with_min_rows(min_rows: usize) -> Self {
        Self {
            min_rows: min_rows.max(1),
            candidate: Regex::new(r"\t|\s{2,}").expect("static regex"),
            separator: Regex::new(r"\t+|\s{2,}").expect("static regex"),
        }
    }

    fn cells(&self, line: &str) -> Vec<String> {
        self.separator
            .split(line.trim())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    fn is_candidate(&self, line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty() && self.candidate.is_match(trimmed) && self.cells(trimmed).len() >= 2
    }

    fn build_table(&self, lines: &[&str]) -> Table {
        let mut table = Table::new();
        for (idx, line) in lines.iter().enumerate() {
            let cells = self.cells(line).into_iter().map(TableCell::text).collect();
            if idx == 0 {
                table.add_row(TableRow::header(cells));
            } else {
                table.add_row(TableRow::new(cells));
            }
        }
        table
    }
}

impl Default for WhitespaceTableClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TableClassifier for WhitespaceTableClassifier {
    fn classify(&self, text: &str) -> Vec<Segment> {
        let lines: Vec<&str> = text.lines().collect();
        let mut segments = Vec::new();
        let mut prose: Vec<&str> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let run_end = lines[i..]
                .iter()
                .position(|l| !self.is_candidate(l))
                .map_or(lines.len(), |p| i + p);

            if run_end - i >= self.min_rows {
                flush_prose(&mut prose, &mut segments);
                let table = self.build_table(&lines[i..run_end]);
                log::debug!(
                    "detected table: {} rows x {} columns",
                    table.row_count(),
                    table.column_count()
                );
                segments.push(Segment::Table(table));
                i = run_end;
            } else {
                prose.push(lines[i]);
                i += 1;
            }
        }
        flush_prose(&mut prose, &mut segments);

        segments
    }
}

fn flush_prose(prose: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    if prose.iter().any(|l| !l.trim().is_empty()) {
        segments.push(Segment::Prose(prose.join("\n")));
    }
    prose.clear();
}
