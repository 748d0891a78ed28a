// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cleanlog::CleaningLog;
use crate::models::Field;
use crate::normalizer::Normalized;
use crate::utils::text_cell;
use std::collections::HashSet;

/// Business key of a row: trimmed text, blank counts as null.
pub fn business_key(row: &crate::normalizer::NormalizedRow) -> Option<String> {
    row.get(Field::InvoiceId)
        .and_then(text_cell)
        .filter(|k| !k.is_empty())
}

/// Keeps the first row for every non-null `invoice_id`. Null keys never
/// collide with each other.
pub fn deduplicate<'a>(input: &Normalized<'a>) -> (Normalized<'a>, CleaningLog) {
    let mut seen = HashSet::new();
    let mut removed = 0usize;
    let mut null_keys = 0usize;
    let mut rows = Vec::with_capacity(input.rows.len());

    for row in &input.rows {
        match business_key(row) {
            Some(key) => {
                if seen.insert(key) {
                    rows.push(row.clone());
                } else {
                    removed += 1;
                }
            }
            None => {
                null_keys += 1;
                rows.push(row.clone());
            }
        }
    }

    if removed > 0 {
        tracing::info!(removed, "removed duplicate invoices");
    }
    if null_keys > 0 {
        tracing::warn!(null_keys, "records without invoice_id kept but excluded from keyed views");
    }

    let log = CleaningLog::new()
        .count("duplicates_removed", removed)
        .count("null_keys", null_keys);
    (input.with_rows(rows), log)
}
