// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::HighRiskRecord;
use crate::models::{InvoiceRecord, DATETIME_FMT};
use anyhow::{bail, Result};

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    let what = m.get_one::<String>("what").unwrap().as_str();
    let fmt = m.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out_path = m.get_one::<String>("out").unwrap().trim();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let (out, config) = super::run_pipeline(m)?;
    match (what, fmt.as_str()) {
        ("cleaned", "csv") => write_records_csv(out_path, &out.records, None)?,
        ("cleaned", _) => std::fs::write(out_path, serde_json::to_string_pretty(&out.records)?)?,
        ("high-risk", "csv") => {
            let subset = out.high_risk(&config);
            let records: Vec<InvoiceRecord> = subset.iter().map(|h| h.record.clone()).collect();
            let critical: Vec<bool> = subset.iter().map(|h| h.critical).collect();
            write_records_csv(out_path, &records, Some(critical.as_slice()))?
        }
        ("high-risk", _) => {
            let subset: Vec<HighRiskRecord> = out.high_risk(&config);
            std::fs::write(out_path, serde_json::to_string_pretty(&subset)?)?
        }
        ("kpi", "csv") => {
            let mut wtr = csv::Writer::from_path(out_path)?;
            wtr.write_record(["metric", "value"])?;
            for (label, value) in out.kpis().labeled() {
                wtr.write_record([label.to_string(), value.to_string()])?;
            }
            wtr.flush()?;
        }
        ("kpi", _) => std::fs::write(
            out_path,
            serde_json::to_string_pretty(&super::reports::kpi_json(&out.kpis()))?,
        )?,
        _ => bail!("Unknown export target: {}", what),
    }
    tracing::info!(kind = what, format = %fmt, path = out_path, "export written");
    println!("Exported {} to {}", what, out_path);
    Ok(())
}

/// Canonical columns followed by the derived ones; `critical` is appended
/// when flags are given.
fn write_records_csv(path: &str, records: &[InvoiceRecord], critical: Option<&[bool]>) -> Result<()> {
    let table = InvoiceRecord::to_raw_table(records);
    let mut header: Vec<String> = table.columns.clone();
    header.extend(["amount_reporting_currency", "risk_score", "due_date"].map(String::from));
    if critical.is_some() {
        header.push("critical".into());
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&header)?;
    for (i, (raw, r)) in table.rows.iter().zip(records).enumerate() {
        let mut row: Vec<String> = raw.iter().map(|v| v.as_text().unwrap_or_default()).collect();
        row.push(
            r.amount_reporting_currency
                .map(|d| d.to_string())
                .unwrap_or_default(),
        );
        row.push(r.risk_score.to_string());
        row.push(
            r.due_date
                .map(|d| d.format(DATETIME_FMT).to_string())
                .unwrap_or_default(),
        );
        if let Some(flags) = critical {
            row.push(flags[i].to_string());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}
