// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cleanlog::{CleaningLog, LogValue};
use crate::pipeline::PipelineOutput;
use crate::utils::pretty_table;
use anyhow::Result;

/// Issues worth a human look: non-zero invalid/missing/duplicate counters,
/// absent expected columns and records that could not be converted.
pub fn issues(out: &PipelineOutput) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let log: &CleaningLog = &out.log;

    for (key, value) in log.iter() {
        let noteworthy = key.ends_with("_invalid_dates")
            || key.ends_with("_invalid_values")
            || key.ends_with("_missing")
            || key == "duplicates_removed"
            || key == "null_keys"
            || key == "cross_rate_nulls_filled"
            || key == "amount_conversion_overflow";
        if noteworthy {
            if let LogValue::Count(n) = value {
                if *n > 0 {
                    rows.push(vec![key.clone(), n.to_string()]);
                }
            }
        }
    }
    if let Some(LogValue::Columns(cols)) = log.get("columns_missing") {
        for c in cols {
            rows.push(vec!["column_missing".into(), c.clone()]);
        }
    }
    if let Some(LogValue::Amount(None)) = log.get("cross_rate_median_value") {
        rows.push(vec!["no_cross_rates".into(), "foreign amounts cannot be converted".into()]);
    }
    for r in out
        .records
        .iter()
        .filter(|r| r.amount_reporting_currency.is_none())
    {
        rows.push(vec![
            "unconverted_amount".into(),
            r.invoice_id.clone().unwrap_or_else(|| format!("row {}", r.row + 1)),
        ]);
    }
    rows
}

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    let (out, _) = super::run_pipeline(m)?;
    let rows = issues(&out);
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
