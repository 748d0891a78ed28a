// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cleanlog::{CleaningLog, LogValue};
use crate::models::{Field, RawTable, RawValue};
use std::collections::{BTreeMap, HashMap};

/// One input row keyed by canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Position in the source table.
    pub row: usize,
    values: HashMap<Field, RawValue>,
}

impl NormalizedRow {
    /// `None` when the field has no source column at all.
    pub fn get(&self, field: Field) -> Option<&RawValue> {
        self.values.get(&field)
    }
}

/// Canonical view over a raw table. The source stays borrowed for diagnostics.
#[derive(Debug, Clone)]
pub struct Normalized<'a> {
    pub source: &'a RawTable,
    /// Fields that had a source column, in source column order.
    pub fields: Vec<Field>,
    pub rows: Vec<NormalizedRow>,
}

impl Normalized<'_> {
    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Same view with a different row set.
    pub fn with_rows(&self, rows: Vec<NormalizedRow>) -> Self {
        Self {
            source: self.source,
            fields: self.fields.clone(),
            rows,
        }
    }
}

pub fn normalize(table: &RawTable) -> (Normalized<'_>, CleaningLog) {
    let mut mapping: Vec<(usize, Field)> = Vec::new();
    let mut renamed = BTreeMap::new();
    let mut dropped = Vec::new();

    for (idx, name) in table.columns.iter().enumerate() {
        match Field::from_source(name) {
            Some(f) if !mapping.iter().any(|(_, seen)| *seen == f) => {
                mapping.push((idx, f));
                renamed.insert(name.clone(), f.to_string());
            }
            _ => dropped.push(name.clone()),
        }
    }

    let fields: Vec<Field> = mapping.iter().map(|(_, f)| *f).collect();
    let missing: Vec<String> = Field::ALL
        .iter()
        .filter(|f| !fields.contains(f))
        .map(|f| f.to_string())
        .collect();

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| NormalizedRow {
            row,
            values: mapping
                .iter()
                .map(|(idx, f)| (*f, cells.get(*idx).cloned().unwrap_or(RawValue::Null)))
                .collect(),
        })
        .collect();

    if !dropped.is_empty() {
        tracing::debug!(columns = ?dropped, "dropping unrecognized columns");
    }
    if !missing.is_empty() {
        tracing::info!(fields = ?missing, "expected fields absent from input");
    }

    let log = CleaningLog::new()
        .count("initial_rows", table.len())
        .with("initial_columns", LogValue::Columns(table.columns.clone()))
        .with("columns_renamed", LogValue::Renames(renamed))
        .with("columns_dropped", LogValue::Columns(dropped))
        .with("columns_missing", LogValue::Columns(missing));

    (
        Normalized {
            source: table,
            fields,
            rows,
        },
        log,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        let mut t = RawTable::new(vec![
            "Номер инвойса".into(),
            "Сумма инвойса".into(),
            "Примечание бухгалтера".into(),
            "invoice_id".into(),
        ]);
        t.push_row(vec!["INV-1".into(), "100".into(), "x".into(), "OTHER".into()]);
        t.push_row(vec!["INV-2".into()]);
        t
    }

    #[test]
    fn renames_known_columns_and_drops_the_rest() {
        let t = table();
        let (n, log) = normalize(&t);
        assert_eq!(n.fields, vec![Field::InvoiceId, Field::InvoiceAmount]);
        assert_eq!(n.rows[0].get(Field::InvoiceId), Some(&RawValue::from("INV-1")));
        assert_eq!(n.rows[1].get(Field::InvoiceAmount), Some(&RawValue::Null));
        assert_eq!(n.rows[0].get(Field::Status), None);
        assert_eq!(
            log.get("columns_dropped"),
            Some(&LogValue::Columns(vec![
                "Примечание бухгалтера".to_string(),
                "invoice_id".to_string()
            ]))
        );
        assert_eq!(log.get_count("initial_rows"), Some(2));
        assert!(std::ptr::eq(n.source, &t));
    }

    #[test]
    fn missing_fields_are_logged_not_fatal() {
        let t = RawTable::new(vec!["Страна".into()]);
        let (n, log) = normalize(&t);
        assert!(!n.has_field(Field::InvoiceId));
        match log.get("columns_missing") {
            Some(LogValue::Columns(cols)) => {
                assert!(cols.contains(&"invoice_id".to_string()));
                assert_eq!(cols.len(), 15);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
