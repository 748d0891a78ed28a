// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{
    self, by_ratio_desc, CurrencyStats, Debtor, DetailedStats, GroupBy, GroupStats,
    HypothesisCheck, Kpis,
};
use crate::risk::{self, RiskBreakdown, RiskContext};
use crate::utils::{fmt_money, fmt_opt, maybe_print_json, pretty_table};
use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("kpi", sub)) => kpi(sub)?,
        Some(("debtors", sub)) => debtors(sub)?,
        Some(("countries", sub)) => groups(sub, GroupBy::Country)?,
        Some(("managers", sub)) => groups(sub, GroupBy::Manager)?,
        Some(("hypothesis", sub)) => hypothesis(sub)?,
        Some(("risk", sub)) => risk_list(sub)?,
        Some(("currencies", sub)) => currencies(sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub reporting_currency: String,
    pub kpis: Kpis,
    pub details: DetailedStats,
}

/// KPI mapping keyed by its literal labels, values as JSON numbers.
pub fn kpi_json(k: &Kpis) -> Value {
    let mut map = Map::new();
    for (label, value) in k.labeled() {
        let v = if label == "invoice_count" {
            json!(k.invoice_count)
        } else {
            json!(value.to_f64())
        };
        map.insert(label.to_string(), v);
    }
    Value::Object(map)
}

pub fn kpi_report(sub: &clap::ArgMatches) -> Result<KpiReport> {
    let (out, config) = super::run_pipeline(sub)?;
    let view = super::record_filter(sub).apply(&out.records);
    Ok(KpiReport {
        reporting_currency: config.reporting_currency,
        kpis: Kpis::compute(&view, out.now),
        details: DetailedStats::compute(&view, out.now),
    })
}

fn kpi(sub: &clap::ArgMatches) -> Result<()> {
    let r = kpi_report(sub)?;
    let payload = json!({
        "kpi": kpi_json(&r.kpis),
        "details": r.details,
        "reporting_currency": r.reporting_currency,
    });
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &payload)? {
        return Ok(());
    }
    let ccy = r.reporting_currency.as_str();
    let rows = vec![
        vec!["Invoices".into(), r.kpis.invoice_count.to_string()],
        vec!["Expected revenue".into(), fmt_money(&r.kpis.expected_revenue, ccy)],
        vec!["Overdue amount".into(), fmt_money(&r.kpis.overdue_amount, ccy)],
        vec!["Overdue share".into(), format!("{:.1}%", r.kpis.overdue_ratio_pct)],
        vec!["Total amount".into(), fmt_money(&r.kpis.total_amount, ccy)],
        vec!["Paid amount".into(), fmt_money(&r.details.paid_amount, ccy)],
        vec!["Unpaid invoices".into(), r.details.unpaid_count.to_string()],
        vec!["Overdue invoices".into(), r.details.overdue_count.to_string()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));
    Ok(())
}

pub fn debtors_report(sub: &clap::ArgMatches) -> Result<Vec<Debtor>> {
    let (out, config) = super::run_pipeline(sub)?;
    let n = sub.get_one::<usize>("top").copied().unwrap_or(config.top_debtors);
    let view = super::record_filter(sub).apply(&out.records);
    Ok(aggregate::top_debtors(&view, out.now, n))
}

fn debtors(sub: &clap::ArgMatches) -> Result<()> {
    let data = debtors_report(sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    if data.is_empty() {
        println!("No overdue invoices.");
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|d| vec![d.contractor.clone(), format!("{:.2}", d.overdue_amount)])
        .collect();
    println!("{}", pretty_table(&["Contractor", "Overdue (reporting)"], rows));
    Ok(())
}

/// Breakdown ordered by descending overdue ratio.
pub fn group_report(sub: &clap::ArgMatches, group_by: GroupBy) -> Result<Vec<GroupStats>> {
    let (out, _) = super::run_pipeline(sub)?;
    Ok(by_ratio_desc(aggregate::breakdown(&out.records, group_by, out.now)))
}

fn groups(sub: &clap::ArgMatches, group_by: GroupBy) -> Result<()> {
    let data = group_report(sub, group_by)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let key = match group_by {
        GroupBy::Country => "Country",
        GroupBy::Manager => "Manager",
    };
    let rows = data
        .iter()
        .map(|g| {
            vec![
                g.key.clone(),
                g.total_invoices.to_string(),
                g.overdue_invoices.to_string(),
                format!("{:.2}", g.overdue_ratio_pct),
                fmt_opt(g.avg_amount),
                format!("{:.2}", g.avg_overdue_amount),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[key, "Invoices", "Overdue", "Overdue %", "Avg amount", "Avg overdue"],
            rows
        )
    );
    Ok(())
}

pub fn hypothesis_report(sub: &clap::ArgMatches) -> Result<Option<HypothesisCheck>> {
    let (out, _) = super::run_pipeline(sub)?;
    let stats = aggregate::breakdown(&out.records, GroupBy::Country, out.now);
    Ok(aggregate::hypothesis_check(&stats))
}

fn hypothesis(sub: &clap::ArgMatches) -> Result<()> {
    let data = hypothesis_report(sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let Some(h) = data else {
        println!("Not enough data: no invoices with both an id and a country.");
        return Ok(());
    };
    println!(
        "Hypothesis: invoices from {} are overdue more often than elsewhere",
        h.riskiest_group
    );
    println!(
        "Result: {} ({}% overdue vs median {}%)",
        h.verdict.label().to_uppercase(),
        h.riskiest_ratio_pct,
        h.median_ratio_pct
    );
    println!(
        "Lowest: {} ({}%), countries: {}, mean ratio: {}%",
        h.safest_group, h.safest_ratio_pct, h.group_count, h.mean_ratio_pct
    );
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskRow {
    pub invoice_id: Option<String>,
    pub contractor: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub risk_score: u8,
    pub critical: bool,
    pub components: RiskBreakdown,
}

/// High-risk invoices, riskiest first. `--min-risk` replaces the configured threshold.
pub fn risk_report(sub: &clap::ArgMatches) -> Result<Vec<RiskRow>> {
    let (out, config) = super::run_pipeline(sub)?;
    let mut filter = super::record_filter(sub);
    filter.min_risk = Some(filter.min_risk.unwrap_or(config.high_risk_threshold));
    let ctx = RiskContext::for_batch(&out.records, out.now.date(), &config.high_risk_countries);
    let mut rows: Vec<RiskRow> = filter
        .apply(&out.records)
        .into_iter()
        .map(|r| RiskRow {
            components: risk::breakdown(&r, &ctx),
            critical: r.risk_score >= config.critical_risk_threshold,
            risk_score: r.risk_score,
            invoice_id: r.invoice_id,
            contractor: r.contractor,
            country: r.country,
            status: r.status,
        })
        .collect();
    rows.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    Ok(rows)
}

fn risk_list(sub: &clap::ArgMatches) -> Result<()> {
    let data = risk_report(sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|r| {
            vec![
                r.invoice_id.clone().unwrap_or_else(|| "-".into()),
                r.contractor.clone().unwrap_or_default(),
                r.country.clone().unwrap_or_default(),
                r.status.clone().unwrap_or_default(),
                r.components.days_overdue.to_string(),
                format!(
                    "{}/{}/{}/{}",
                    r.components.overdue,
                    r.components.large_invoice,
                    r.components.outstanding,
                    r.components.country
                ),
                if r.critical {
                    format!("{} !", r.risk_score)
                } else {
                    r.risk_score.to_string()
                },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "Invoice",
                "Contractor",
                "Country",
                "Status",
                "Days overdue",
                "Overdue/Large/Open/Country",
                "Risk",
            ],
            rows
        )
    );
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyReport {
    pub currencies: Vec<CurrencyStats>,
    pub statuses: Vec<(String, usize)>,
}

pub fn currency_report(sub: &clap::ArgMatches) -> Result<CurrencyReport> {
    let (out, _) = super::run_pipeline(sub)?;
    let view = super::record_filter(sub).apply(&out.records);
    Ok(CurrencyReport {
        currencies: aggregate::currency_summary(&view),
        statuses: aggregate::status_counts(&view),
    })
}

fn currencies(sub: &clap::ArgMatches) -> Result<()> {
    let data = currency_report(sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .currencies
        .iter()
        .map(|c| {
            vec![
                c.currency.clone(),
                c.invoice_count.to_string(),
                c.avg_cross_rate
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["CCY", "Invoices", "Avg cross rate"], rows));
    let rows = data
        .statuses
        .iter()
        .map(|(s, n)| vec![s.clone(), n.to_string()])
        .collect();
    println!("{}", pretty_table(&["Status", "Invoices"], rows));
    Ok(())
}
