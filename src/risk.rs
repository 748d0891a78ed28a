// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Heuristic credit-risk score in [0, 100].

use crate::models::InvoiceRecord;
use crate::utils::median;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

pub const OVERDUE_BASE: i64 = 50;
pub const OVERDUE_PER_DAY: i64 = 5;
pub const OVERDUE_DAYS_CAP: i64 = 50;
pub const LARGE_INVOICE: i64 = 10;
pub const OUTSTANDING: i64 = 15;
pub const HIGH_RISK_COUNTRY: i64 = 15;

/// Batch-wide inputs, computed once before any record is scored.
#[derive(Debug, Clone)]
pub struct RiskContext<'a> {
    pub today: NaiveDate,
    pub median_amount: Option<Decimal>,
    pub high_risk_countries: &'a BTreeSet<String>,
}

impl<'a> RiskContext<'a> {
    pub fn for_batch(
        records: &[InvoiceRecord],
        today: NaiveDate,
        high_risk_countries: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            today,
            median_amount: median(records.iter().filter_map(|r| r.amount_reporting_currency)),
            high_risk_countries,
        }
    }
}

/// Unclamped components of a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskBreakdown {
    pub days_overdue: i64,
    pub overdue: i64,
    pub large_invoice: i64,
    pub outstanding: i64,
    pub country: i64,
}

impl RiskBreakdown {
    /// Sum of the components, clamped once.
    pub fn score(&self) -> u8 {
        let raw = self.overdue + self.large_invoice + self.outstanding + self.country;
        raw.clamp(0, 100) as u8
    }
}

pub fn breakdown(r: &InvoiceRecord, ctx: &RiskContext<'_>) -> RiskBreakdown {
    let mut b = RiskBreakdown::default();

    if let Some(due) = r.due_date {
        let today = ctx.today.and_time(NaiveTime::MIN);
        let days = (today - due).num_days();
        if days > 0 {
            b.days_overdue = days;
            b.overdue = OVERDUE_BASE + (days.saturating_mul(OVERDUE_PER_DAY)).min(OVERDUE_DAYS_CAP);
        }
    }

    if let (Some(amount), Some(median)) = (r.amount_reporting_currency, ctx.median_amount) {
        if amount > median {
            b.large_invoice = LARGE_INVOICE;
        }
    }

    if !r.is_settled() {
        b.outstanding = OUTSTANDING;
    }

    if r
        .country
        .as_ref()
        .is_some_and(|c| ctx.high_risk_countries.contains(c))
    {
        b.country = HIGH_RISK_COUNTRY;
    }

    b
}

pub fn risk_score(r: &InvoiceRecord, ctx: &RiskContext<'_>) -> u8 {
    breakdown(r, ctx).score()
}

/// Scores every record against one shared context.
pub fn score_all(
    records: Vec<InvoiceRecord>,
    today: NaiveDate,
    high_risk_countries: &BTreeSet<String>,
) -> Vec<InvoiceRecord> {
    let ctx = RiskContext::for_batch(&records, today, high_risk_countries);
    tracing::debug!(median = ?ctx.median_amount, %today, "scoring records");
    records
        .into_iter()
        .map(|r| {
            let risk_score = risk_score(&r, &ctx);
            InvoiceRecord { risk_score, ..r }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn countries() -> BTreeSet<String> {
        BTreeSet::from(["египет".to_string()])
    }

    fn invoiced_days_ago(days: i64) -> InvoiceRecord {
        let invoice_date = today().and_time(NaiveTime::MIN) - Duration::days(days);
        InvoiceRecord {
            invoice_id: Some("INV".into()),
            invoice_date: Some(invoice_date),
            due_date: Some(invoice_date + Duration::days(30)),
            ..Default::default()
        }
    }

    #[test]
    fn everything_at_once_clamps_to_100() {
        let hot = InvoiceRecord {
            status: Some("open".into()),
            country: Some("египет".into()),
            amount_reporting_currency: Some(dec("1000")),
            ..invoiced_days_ago(45)
        };
        let small = InvoiceRecord {
            status: Some("paid".into()),
            amount_reporting_currency: Some(dec("10")),
            ..Default::default()
        };
        let set = countries();
        let scored = score_all(vec![hot, small], today(), &set);
        let ctx = RiskContext::for_batch(&scored, today(), &set);
        let b = breakdown(&scored[0], &ctx);
        assert_eq!(b.days_overdue, 15);
        assert_eq!(b.overdue, 100);
        assert_eq!(b.large_invoice + b.outstanding + b.country, 40);
        assert_eq!(scored[0].risk_score, 100);
        assert_eq!(scored[1].risk_score, 0);
    }

    #[test]
    fn overdue_penalty_grows_per_day() {
        let set = countries();
        let ctx = RiskContext {
            today: today(),
            median_amount: None,
            high_risk_countries: &set,
        };
        let settled = |r: InvoiceRecord| InvoiceRecord {
            status: Some("closed".into()),
            ..r
        };
        assert_eq!(risk_score(&settled(invoiced_days_ago(30)), &ctx), 0);
        assert_eq!(risk_score(&settled(invoiced_days_ago(31)), &ctx), 55);
        assert_eq!(risk_score(&settled(invoiced_days_ago(34)), &ctx), 70);
        assert_eq!(risk_score(&settled(invoiced_days_ago(400)), &ctx), 100);
        assert_eq!(risk_score(&settled(invoiced_days_ago(2)), &ctx), 0);
    }

    #[test]
    fn empty_record_scores_only_outstanding() {
        let set = countries();
        let ctx = RiskContext {
            today: today(),
            median_amount: Some(dec("5")),
            high_risk_countries: &set,
        };
        assert_eq!(risk_score(&InvoiceRecord::default(), &ctx), 15);
        let paid = InvoiceRecord {
            status: Some("оплачен".into()),
            ..Default::default()
        };
        assert_eq!(risk_score(&paid, &ctx), 0);
    }

    #[test]
    fn amount_equal_to_median_is_not_large() {
        let set = BTreeSet::new();
        let ctx = RiskContext {
            today: today(),
            median_amount: Some(dec("100")),
            high_risk_countries: &set,
        };
        let at = InvoiceRecord {
            status: Some("paid".into()),
            amount_reporting_currency: Some(dec("100")),
            ..Default::default()
        };
        let above = InvoiceRecord {
            amount_reporting_currency: Some(dec("100.01")),
            ..at.clone()
        };
        assert_eq!(risk_score(&at, &ctx), 0);
        assert_eq!(risk_score(&above, &ctx), 10);
    }
}
