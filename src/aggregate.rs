// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! KPIs and grouped breakdowns over a scored invoice table.
//!
//! All sums are in the reporting currency and skip records whose converted
//! amount is null. Ratios with a zero denominator are zero.

use crate::models::InvoiceRecord;
use crate::utils::{mean, median, pct, saturating_sum};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Dashboard-style filters. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub min_risk: Option<u8>,
    pub country: Option<String>,
    pub status: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, r: &InvoiceRecord) -> bool {
        self.min_risk.is_none_or(|m| r.risk_score >= m)
            && self
                .country
                .as_ref()
                .is_none_or(|c| r.country.as_deref() == Some(c.as_str()))
            && self
                .status
                .as_ref()
                .is_none_or(|s| r.status.as_deref() == Some(s.as_str()))
    }

    pub fn apply(&self, records: &[InvoiceRecord]) -> Vec<InvoiceRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

fn sum_reporting<'a>(records: impl Iterator<Item = &'a InvoiceRecord>) -> Decimal {
    saturating_sum(records.filter_map(|r| r.amount_reporting_currency))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub expected_revenue: Decimal,
    pub overdue_amount: Decimal,
    pub overdue_ratio_pct: Decimal,
    pub total_amount: Decimal,
    pub invoice_count: usize,
}

impl Kpis {
    pub fn compute(records: &[InvoiceRecord], now: NaiveDateTime) -> Self {
        let expected_revenue = sum_reporting(records.iter().filter(|r| !r.is_settled()));
        let overdue_amount = sum_reporting(records.iter().filter(|r| r.is_past_due(now)));
        let total_amount = sum_reporting(records.iter());
        Self {
            expected_revenue,
            overdue_amount,
            overdue_ratio_pct: pct(overdue_amount, total_amount),
            total_amount,
            invoice_count: records.len(),
        }
    }

    /// Label/value pairs in reporting order.
    pub fn labeled(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("expected_revenue", self.expected_revenue),
            ("overdue_amount", self.overdue_amount),
            ("overdue_ratio_pct", self.overdue_ratio_pct),
            ("total_amount", self.total_amount),
            ("invoice_count", Decimal::from(self.invoice_count)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedStats {
    pub paid_amount: Decimal,
    pub unpaid_count: usize,
    pub overdue_count: usize,
}

impl DetailedStats {
    pub fn compute(records: &[InvoiceRecord], now: NaiveDateTime) -> Self {
        Self {
            paid_amount: sum_reporting(records.iter().filter(|r| r.is_settled())),
            unpaid_count: records.iter().filter(|r| !r.is_settled()).count(),
            overdue_count: records.iter().filter(|r| r.is_past_due(now)).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Debtor {
    pub contractor: String,
    pub overdue_amount: Decimal,
}

/// Contractors with the largest past-due totals. Equal totals keep
/// ascending contractor order.
pub fn top_debtors(records: &[InvoiceRecord], now: NaiveDateTime, n: usize) -> Vec<Debtor> {
    let mut groups: BTreeMap<&str, Decimal> = BTreeMap::new();
    for r in records.iter().filter(|r| r.is_past_due(now)) {
        if let Some(c) = r.contractor.as_deref() {
            let total = groups.entry(c).or_insert(Decimal::ZERO);
            *total = total.saturating_add(r.amount_reporting_currency.unwrap_or_default());
        }
    }
    let mut debtors: Vec<Debtor> = groups
        .into_iter()
        .map(|(c, amt)| Debtor {
            contractor: c.to_string(),
            overdue_amount: amt,
        })
        .collect();
    debtors.sort_by(|a, b| b.overdue_amount.cmp(&a.overdue_amount));
    debtors.truncate(n);
    debtors
}

/// Which column a breakdown groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Country,
    Manager,
}

impl GroupBy {
    fn key<'a>(&self, r: &'a InvoiceRecord) -> Option<&'a str> {
        match self {
            GroupBy::Country => r.country.as_deref(),
            GroupBy::Manager => r.manager.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    pub total_invoices: usize,
    pub overdue_invoices: usize,
    pub overdue_ratio_pct: Decimal,
    /// `None` when no record in the group has a converted amount.
    pub avg_amount: Option<Decimal>,
    pub avg_overdue_amount: Decimal,
}

/// Per-group counts and averages, in ascending key order.
///
/// Only keyed records (non-null `invoice_id` and group value) take part.
/// A record counts as overdue when its due date passed and it is not settled.
pub fn breakdown(records: &[InvoiceRecord], group_by: GroupBy, now: NaiveDateTime) -> Vec<GroupStats> {
    let mut groups: BTreeMap<&str, Vec<&InvoiceRecord>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.invoice_id.is_some()) {
        if let Some(k) = group_by.key(r) {
            groups.entry(k).or_default().push(r);
        }
    }

    groups
        .into_iter()
        .map(|(key, rows)| {
            let overdue: Vec<&InvoiceRecord> =
                rows.iter().copied().filter(|r| r.is_overdue(now)).collect();
            let total = rows.len();
            GroupStats {
                key: key.to_string(),
                total_invoices: total,
                overdue_invoices: overdue.len(),
                overdue_ratio_pct: pct(Decimal::from(overdue.len()), Decimal::from(total)).round_dp(2),
                avg_amount: mean(rows.iter().filter_map(|r| r.amount_reporting_currency))
                    .map(|d| d.round_dp(2)),
                avg_overdue_amount: mean(overdue.iter().filter_map(|r| r.amount_reporting_currency))
                    .unwrap_or_default()
                    .round_dp(2),
            }
        })
        .collect()
}

/// Same rows ordered by descending overdue ratio (stable), as displayed.
pub fn by_ratio_desc(mut stats: Vec<GroupStats>) -> Vec<GroupStats> {
    stats.sort_by(|a, b| b.overdue_ratio_pct.cmp(&a.overdue_ratio_pct));
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirmed,
    PartiallyConfirmed,
    NotConfirmed,
}

impl Verdict {
    pub fn classify(ratio: Decimal, median_ratio: Decimal) -> Self {
        if ratio > median_ratio * Decimal::new(15, 1) {
            Verdict::Confirmed
        } else if ratio > median_ratio {
            Verdict::PartiallyConfirmed
        } else {
            Verdict::NotConfirmed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Confirmed => "confirmed",
            Verdict::PartiallyConfirmed => "partially confirmed",
            Verdict::NotConfirmed => "not confirmed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisCheck {
    pub riskiest_group: String,
    pub riskiest_ratio_pct: Decimal,
    pub median_ratio_pct: Decimal,
    pub verdict: Verdict,
    pub safest_group: String,
    pub safest_ratio_pct: Decimal,
    pub group_count: usize,
    pub mean_ratio_pct: Decimal,
}

/// "The group with the highest overdue ratio is unusually risky."
///
/// Expects the key-ordered output of [`breakdown`]; ties resolve to the
/// first group. `None` for an empty breakdown.
pub fn hypothesis_check(stats: &[GroupStats]) -> Option<HypothesisCheck> {
    let first = stats.first()?;
    let mut riskiest = first;
    let mut safest = first;
    for s in stats {
        if s.overdue_ratio_pct > riskiest.overdue_ratio_pct {
            riskiest = s;
        }
        if s.overdue_ratio_pct < safest.overdue_ratio_pct {
            safest = s;
        }
    }
    let ratios = || stats.iter().map(|s| s.overdue_ratio_pct);
    let median_ratio = median(ratios())?;
    Some(HypothesisCheck {
        riskiest_group: riskiest.key.clone(),
        riskiest_ratio_pct: riskiest.overdue_ratio_pct,
        median_ratio_pct: median_ratio,
        verdict: Verdict::classify(riskiest.overdue_ratio_pct, median_ratio),
        safest_group: safest.key.clone(),
        safest_ratio_pct: safest.overdue_ratio_pct,
        group_count: stats.len(),
        mean_ratio_pct: mean(ratios()).unwrap_or_default().round_dp(2),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyStats {
    pub currency: String,
    pub invoice_count: usize,
    pub avg_cross_rate: Option<Decimal>,
}

/// Invoice count and mean cross rate per invoice currency.
pub fn currency_summary(records: &[InvoiceRecord]) -> Vec<CurrencyStats> {
    let mut groups: BTreeMap<&str, Vec<&InvoiceRecord>> = BTreeMap::new();
    for r in records {
        if let Some(c) = r.invoice_currency.as_deref() {
            groups.entry(c).or_default().push(r);
        }
    }
    groups
        .into_iter()
        .map(|(c, rows)| CurrencyStats {
            currency: c.to_string(),
            invoice_count: rows.len(),
            avg_cross_rate: mean(rows.iter().filter_map(|r| r.cross_rate)).map(|d| d.round_dp(4)),
        })
        .collect()
}

/// Record count per normalized status, most frequent first.
pub fn status_counts(records: &[InvoiceRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        if let Some(s) = r.status.as_deref() {
            *counts.entry(s).or_insert(0) += 1;
        }
    }
    let mut v: Vec<(String, usize)> = counts.into_iter().map(|(s, n)| (s.to_string(), n)).collect();
    v.sort_by(|a, b| b.1.cmp(&a.1));
    v
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskRecord {
    #[serde(flatten)]
    pub record: InvoiceRecord,
    /// Score at or above the critical threshold; reporting highlights these.
    pub critical: bool,
}

pub fn high_risk(records: &[InvoiceRecord], threshold: u8, critical_threshold: u8) -> Vec<HighRiskRecord> {
    records
        .iter()
        .filter(|r| r.risk_score >= threshold)
        .map(|r| HighRiskRecord {
            record: r.clone(),
            critical: r.risk_score >= critical_threshold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn rec(id: &str, country: &str, status: &str, amount: Option<&str>, overdue: bool) -> InvoiceRecord {
        let due = if overdue {
            now() - Duration::days(3)
        } else {
            now() + Duration::days(3)
        };
        InvoiceRecord {
            invoice_id: Some(id.to_string()),
            country: Some(country.to_string()),
            contractor: Some(format!("{}-buyer", country)),
            manager: Some("ivanov".to_string()),
            status: Some(status.to_string()),
            amount_reporting_currency: amount.map(dec),
            due_date: Some(due),
            ..Default::default()
        }
    }

    fn sample() -> Vec<InvoiceRecord> {
        vec![
            rec("1", "египет", "open", Some("100"), true),
            rec("2", "египет", "paid", Some("300"), true),
            rec("3", "турция", "open", Some("50"), false),
            rec("4", "турция", "open", None, true),
            rec("5", "индия", "closed", Some("50"), false),
        ]
    }

    #[test]
    fn kpis_skip_null_amounts() {
        let k = Kpis::compute(&sample(), now());
        assert_eq!(k.expected_revenue, dec("150"));
        assert_eq!(k.overdue_amount, dec("400"));
        assert_eq!(k.total_amount, dec("500"));
        assert_eq!(k.overdue_ratio_pct, dec("80"));
        assert_eq!(k.invoice_count, 5);
        assert_eq!(k.labeled()[4], ("invoice_count", dec("5")));
    }

    #[test]
    fn zero_total_gives_zero_ratio() {
        let records = vec![rec("1", "x", "open", None, true)];
        let k = Kpis::compute(&records, now());
        assert_eq!(k.total_amount, Decimal::ZERO);
        assert_eq!(k.overdue_ratio_pct, Decimal::ZERO);
        assert_eq!(Kpis::compute(&[], now()).overdue_ratio_pct, Decimal::ZERO);
    }

    #[test]
    fn detailed_stats_split_paid_and_unpaid() {
        let s = DetailedStats::compute(&sample(), now());
        assert_eq!(s.paid_amount, dec("350"));
        assert_eq!(s.unpaid_count, 3);
        assert_eq!(s.overdue_count, 3);
    }

    #[test]
    fn top_debtors_sorted_and_truncated() {
        let mut records = sample();
        records.push(rec("6", "аргентина", "open", Some("400"), true));
        let top = top_debtors(&records, now(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].contractor, "аргентина-buyer");
        assert_eq!(top[1].contractor, "египет-buyer");
        // ties keep key order
        assert_eq!(top[0].overdue_amount, dec("400"));
        assert_eq!(top[1].overdue_amount, dec("400"));
    }

    #[test]
    fn breakdown_by_country() {
        let stats = breakdown(&sample(), GroupBy::Country, now());
        let keys: Vec<&str> = stats.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["египет", "индия", "турция"]);

        let egypt = &stats[0];
        assert_eq!(egypt.total_invoices, 2);
        assert_eq!(egypt.overdue_invoices, 1);
        assert_eq!(egypt.overdue_ratio_pct, dec("50"));
        assert_eq!(egypt.avg_amount, Some(dec("200")));
        assert_eq!(egypt.avg_overdue_amount, dec("100"));

        let india = &stats[1];
        assert_eq!(india.overdue_invoices, 0);
        assert_eq!(india.avg_overdue_amount, Decimal::ZERO);

        let turkey = &stats[2];
        assert_eq!(turkey.avg_amount, Some(dec("50")));
        // the only overdue invoice has no converted amount
        assert_eq!(turkey.avg_overdue_amount, Decimal::ZERO);

        let sorted = by_ratio_desc(stats);
        assert_eq!(sorted[0].key, "египет");
        assert_eq!(sorted[1].key, "турция");
    }

    #[test]
    fn null_keys_stay_out_of_groups() {
        let mut records = sample();
        records.push(InvoiceRecord {
            invoice_id: None,
            ..rec("x", "египет", "open", Some("1"), true)
        });
        let stats = breakdown(&records, GroupBy::Manager, now());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_invoices, 5);
        assert_eq!(Kpis::compute(&records, now()).invoice_count, 6);
    }

    fn group(key: &str, ratio: &str) -> GroupStats {
        GroupStats {
            key: key.to_string(),
            total_invoices: 1,
            overdue_invoices: 0,
            overdue_ratio_pct: dec(ratio),
            avg_amount: None,
            avg_overdue_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn hypothesis_thresholds_are_strict() {
        let equal = vec![group("a", "40"), group("b", "40"), group("c", "40")];
        let h = hypothesis_check(&equal).unwrap();
        assert_eq!(h.riskiest_group, "a");
        assert_eq!(h.verdict, Verdict::NotConfirmed);

        let partial = vec![group("a", "10"), group("b", "20"), group("c", "30")];
        assert_eq!(hypothesis_check(&partial).unwrap().verdict, Verdict::PartiallyConfirmed);

        let exactly_one_and_half = vec![group("a", "10"), group("b", "20"), group("c", "30"), group("d", "20")];
        // median 20, max 30 == 1.5 x median
        assert_eq!(
            hypothesis_check(&exactly_one_and_half).unwrap().verdict,
            Verdict::PartiallyConfirmed
        );

        let confirmed = vec![group("a", "10"), group("b", "20"), group("c", "90")];
        let h = hypothesis_check(&confirmed).unwrap();
        assert_eq!(h.verdict, Verdict::Confirmed);
        assert_eq!(h.safest_group, "a");
        assert_eq!(h.group_count, 3);
        assert_eq!(h.mean_ratio_pct, dec("40"));

        assert!(hypothesis_check(&[]).is_none());
    }

    #[test]
    fn filter_and_high_risk_subset() {
        let mut records = sample();
        records[0].risk_score = 80;
        records[1].risk_score = 55;
        records[2].risk_score = 20;
        let f = RecordFilter {
            min_risk: Some(50),
            country: Some("египет".into()),
            status: None,
        };
        assert_eq!(f.apply(&records).len(), 2);

        let hr = high_risk(&records, 50, 70);
        assert_eq!(hr.len(), 2);
        assert!(hr[0].critical);
        assert!(!hr[1].critical);
    }

    #[test]
    fn currency_and_status_summaries() {
        let mut records = sample();
        records[0].invoice_currency = Some("USD".into());
        records[0].cross_rate = Some(dec("90"));
        records[1].invoice_currency = Some("USD".into());
        records[1].cross_rate = Some(dec("91"));
        records[2].invoice_currency = Some("RUB".into());
        let cs = currency_summary(&records);
        assert_eq!(cs[0].currency, "RUB");
        assert_eq!(cs[0].avg_cross_rate, None);
        assert_eq!(cs[1].invoice_count, 2);
        assert_eq!(cs[1].avg_cross_rate, Some(dec("90.5")));

        let sc = status_counts(&records);
        assert_eq!(sc[0], ("open".to_string(), 3));
    }
}
