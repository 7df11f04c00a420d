use std::collections::HashMap;

use crate::row::Cell;

/// Half-open cell timestamp window in microseconds: `start <= ts < end`.
/// A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start_micros: Option<i64>,
    pub end_micros: Option<i64>,
}

impl TimeRange {
    pub fn new(start_micros: Option<i64>, end_micros: Option<i64>) -> Self {
        Self {
            start_micros,
            end_micros,
        }
    }

    pub fn contains(&self, timestamp_micros: i64) -> bool {
        self.start_micros.is_none_or(|start| timestamp_micros >= start)
            && self.end_micros.is_none_or(|end| timestamp_micros < end)
    }
}

/// Which cells of a row are retained.
///
/// The time window is applied first, then `latest_only` keeps the newest
/// remaining cell of each column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFilter {
    pub time_range: Option<TimeRange>,
    pub latest_only: bool,
}

impl Default for CellFilter {
    fn default() -> Self {
        Self {
            time_range: None,
            latest_only: true,
        }
    }
}

impl CellFilter {
    /// Keep every version of every column.
    pub fn all_versions() -> Self {
        Self {
            time_range: None,
            latest_only: false,
        }
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// The retained cells, in source order.
    pub fn apply(&self, cells: &[Cell]) -> Vec<Cell> {
        let in_window: Vec<&Cell> = cells
            .iter()
            .filter(|cell| {
                self.time_range
                    .is_none_or(|range| range.contains(cell.timestamp_micros))
            })
            .collect();

        if !self.latest_only {
            return in_window.into_iter().cloned().collect();
        }

        // Index of the newest cell per column; ties go to the earlier cell.
        let mut newest: HashMap<&str, usize> = HashMap::new();
        for (index, cell) in in_window.iter().enumerate() {
            newest
                .entry(cell.column.as_str())
                .and_modify(|best| {
                    if cell.timestamp_micros > in_window[*best].timestamp_micros {
                        *best = index;
                    }
                })
                .or_insert(index);
        }

        in_window
            .iter()
            .enumerate()
            .filter(|(index, cell)| newest.get(cell.column.as_str()) == Some(index))
            .map(|(_, cell)| (*cell).clone())
            .collect()
    }
}
