// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{RawTable, RawValue};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Reads a CSV export. Empty cells become nulls, everything else is kept as text.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Read CSV header")?.clone();
    let mut table = RawTable::new(headers.iter().map(|h| h.trim().to_string()).collect());
    for (i, result) in rdr.records().enumerate() {
        let rec = result.with_context(|| format!("Read CSV record {}", i + 1))?;
        table.push_row(
            rec.iter()
                .map(|cell| {
                    if cell.is_empty() {
                        RawValue::Null
                    } else {
                        RawValue::Text(cell.to_string())
                    }
                })
                .collect(),
        );
    }
    tracing::debug!(rows = table.len(), columns = table.columns.len(), "loaded CSV");
    Ok(table)
}

pub fn read_csv_path(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("Open CSV {}", path.display()))?;
    read_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let data = "Номер инвойса,Сумма инвойса,Страна\nINV-1,\"1 200,50\"\nINV-2,,Египет\n";
        let t = read_csv(data.as_bytes()).unwrap();
        assert_eq!(t.columns.len(), 3);
        assert_eq!(t.rows[0][1], RawValue::from("1 200,50"));
        assert_eq!(t.rows[0][2], RawValue::Null);
        assert_eq!(t.rows[1][1], RawValue::Null);
        assert_eq!(t.rows[1][2], RawValue::from("Египет"));
    }
}
