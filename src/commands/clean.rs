// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{InvoiceRecord, DATETIME_FMT};
use crate::utils::{fmt_opt, maybe_print_json, pretty_table};
use anyhow::Result;
use serde_json::json;

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");
    let show_records = m.get_flag("records");
    let (out, _) = super::run_pipeline(m)?;

    let payload = if show_records {
        json!({ "log": out.log, "records": out.records })
    } else {
        json!({ "log": out.log })
    };
    if maybe_print_json(json_flag, jsonl_flag, &payload)? {
        return Ok(());
    }

    let rows: Vec<Vec<String>> = out
        .log
        .iter()
        .map(|(k, v)| vec![k.clone(), v.to_string()])
        .collect();
    println!("{}", pretty_table(&["Check", "Value"], rows));
    if show_records {
        println!("{}", records_table(&out.records));
    }
    Ok(())
}

pub fn record_row(r: &InvoiceRecord) -> Vec<String> {
    vec![
        r.invoice_id.clone().unwrap_or_else(|| "-".into()),
        r.contractor.clone().unwrap_or_default(),
        r.country.clone().unwrap_or_default(),
        r.status.clone().unwrap_or_default(),
        r.invoice_currency.clone().unwrap_or_default(),
        fmt_opt(r.invoice_amount),
        fmt_opt(r.amount_reporting_currency),
        r.due_date
            .map(|d| d.format(DATETIME_FMT).to_string())
            .unwrap_or_else(|| "-".into()),
        r.risk_score.to_string(),
    ]
}

pub fn records_table(records: &[InvoiceRecord]) -> comfy_table::Table {
    pretty_table(
        &[
            "Invoice", "Contractor", "Country", "Status", "CCY", "Amount", "Reporting", "Due",
            "Risk",
        ],
        records.iter().map(record_row).collect(),
    )
}
