//! Results table model
//!
//! Rows are kept in insertion order until the user sorts a column. All lookups
//! are positional against the displayed order.
//!
//! Every change bumps a revision number. A view that holds revision `n` can
//! apply the row added at `n + 1` in place; any other gap means it must reload.

use crate::metadata::{Record, COLUMNS};

#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    rows: Vec<Record>,
    revision: u64,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; returns its index
    pub fn push(&mut self, record: Record) -> usize {
        self.rows.push(record);
        self.revision += 1;
        self.rows.len() - 1
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Text of one cell, or `None` when either index is out of range
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.field(column)
    }

    /// All values of one row joined by tabs
    pub fn row_text(&self, row: usize) -> Option<String> {
        self.rows.get(row).map(|r| r.values().join("\t"))
    }

    /// Stable sort by the text of `column`
    ///
    /// Returns false (and leaves the order alone) for an unknown column.
    pub fn sort_by_column(&mut self, column: usize, descending: bool) -> bool {
        if column >= COLUMNS.len() {
            return false;
        }
        self.rows.sort_by(|a, b| {
            let ord = a.field(column).cmp(&b.field(column));
            if descending { ord.reverse() } else { ord }
        });
        self.revision += 1;
        true
    }
}
