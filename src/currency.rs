// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cleanlog::CleaningLog;
use crate::models::InvoiceRecord;
use rust_decimal::Decimal;

/// Amount of one invoice in the reporting currency.
///
/// Invoices already in the reporting currency (exact, case-sensitive match)
/// keep their amount untouched. Everything else is multiplied by its cross
/// rate; a missing amount or rate yields `None`, never zero. So does a
/// product that does not fit a `Decimal`.
pub fn to_reporting(
    amount: Option<Decimal>,
    currency: Option<&str>,
    cross_rate: Option<Decimal>,
    reporting_currency: &str,
) -> Option<Decimal> {
    let amount = amount?;
    if currency == Some(reporting_currency) {
        return Some(amount);
    }
    amount.checked_mul(cross_rate?)
}

/// Fills `amount_reporting_currency` for every record. Runs once per pipeline.
///
/// Logs `amount_conversion_overflow`: records whose amount and rate were both
/// present but whose product overflowed.
pub fn convert(records: Vec<InvoiceRecord>, reporting_currency: &str) -> (Vec<InvoiceRecord>, CleaningLog) {
    let mut overflow = 0usize;
    let converted: Vec<InvoiceRecord> = records
        .into_iter()
        .map(|r| {
            let currency = r.invoice_currency.as_deref();
            let amount = to_reporting(r.invoice_amount, currency, r.cross_rate, reporting_currency);
            if amount.is_none() && r.invoice_amount.is_some() && r.cross_rate.is_some() {
                overflow += 1;
                tracing::warn!(row = r.row, "amount overflows after conversion; left null");
            }
            InvoiceRecord {
                amount_reporting_currency: amount,
                ..r
            }
        })
        .collect();
    let unconverted = converted
        .iter()
        .filter(|r| r.amount_reporting_currency.is_none())
        .count();
    tracing::debug!(
        records = converted.len(),
        unconverted,
        currency = reporting_currency,
        "converted amounts to reporting currency"
    );
    let log = CleaningLog::new().count("amount_conversion_overflow", overflow);
    (converted, log)
}
