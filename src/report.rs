//! Timing table written as CSV
//!
//! Layout: a `Method,<count>,...` header, then one row per method with one
//! value per body count.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const HOST_ROW: &str = "Host (CPU)";
pub const ACCELERATOR_ROW: &str = "Accelerator (GPU)";
pub const SPEEDUP_ROW: &str = "Accelerator Speedup";

#[derive(Debug, Clone, PartialEq)]
struct Row {
    method: String,
    values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingTable {
    counts: Vec<usize>,
    rows: Vec<Row>,
}

impl TimingTable {
    pub fn new(counts: Vec<usize>) -> Self {
        Self {
            counts,
            rows: Vec::new(),
        }
    }

    /// Append `value` to the row for `method`, creating it on first use.
    /// Rows keep first-use order.
    pub fn record(&mut self, method: &str, value: f64) {
        match self.rows.iter_mut().find(|row| row.method == method) {
            Some(row) => row.values.push(value),
            None => self.rows.push(Row {
                method: method.to_string(),
                values: vec![value],
            }),
        }
    }

    #[cfg(test)]
    pub fn values(&self, method: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|row| row.method == method)
            .map(|row| row.values.as_slice())
    }

    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "Method")?;
        for count in &self.counts {
            write!(out, ",{count}")?;
        }
        writeln!(out)?;

        for row in &self.rows {
            write!(out, "{}", row.method)?;
            for value in &row.values {
                write!(out, ",{value}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }

    /// Write to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }
}
