// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-column sanitization of a normalized table.
//!
//! Every column is cleaned independently. A bad cell becomes a null and a
//! counter in the log; it never fails the batch.

use crate::cleanlog::{CleaningLog, LogValue};
use crate::dedup::business_key;
use crate::models::{Cell, Field, InvoiceRecord};
use crate::normalizer::{Normalized, NormalizedRow};
use crate::utils::{median, parse_amount_cell, parse_datetime_cell, text_cell};
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;

/// Parses one column of every row, counting missing and invalid cells.
fn parse_column<T>(
    rows: &[NormalizedRow],
    field: Field,
    parse: impl Fn(&crate::models::RawValue) -> Cell<T>,
) -> (Vec<Cell<T>>, usize, usize) {
    let cells: Vec<Cell<T>> = rows
        .iter()
        .map(|r| r.get(field).map(&parse).unwrap_or(Cell::Missing))
        .collect();
    let invalid = cells.iter().filter(|c| c.is_invalid()).count();
    let missing = cells.iter().filter(|c| c.is_missing()).count();
    (cells, invalid, missing)
}

fn dates(input: &Normalized<'_>, field: Field, log: CleaningLog) -> (Vec<Option<NaiveDateTime>>, CleaningLog) {
    let (cells, invalid, missing) = parse_column(&input.rows, field, parse_datetime_cell);
    let log = if input.has_field(field) {
        if invalid > 0 {
            tracing::warn!(column = %field, invalid, "unparseable dates set to null");
        }
        log.count(format!("{}_invalid_dates", field), invalid)
            .count(format!("{}_missing", field), missing)
    } else {
        log
    };
    (cells.into_iter().map(Cell::into_option).collect(), log)
}

fn amounts(input: &Normalized<'_>, field: Field, log: CleaningLog) -> (Vec<Option<Decimal>>, CleaningLog) {
    let (cells, invalid, missing) = parse_column(&input.rows, field, parse_amount_cell);
    let log = if input.has_field(field) {
        if invalid > 0 {
            tracing::warn!(column = %field, invalid, "unparseable amounts set to null");
        }
        log.count(format!("{}_invalid_values", field), invalid)
            .count(format!("{}_missing", field), missing)
    } else {
        log
    };
    (cells.into_iter().map(Cell::into_option).collect(), log)
}

/// Rates must be positive; nulls are imputed with the batch median.
/// Without a cross-rate column every rate stays null and nothing is logged.
fn cross_rates(input: &Normalized<'_>, log: CleaningLog) -> (Vec<Option<Decimal>>, CleaningLog) {
    if !input.has_field(Field::CrossRate) {
        return (vec![None; input.rows.len()], log);
    }
    let (cells, _, _) = parse_column(&input.rows, Field::CrossRate, parse_amount_cell);
    let mut invalid = 0usize;
    let rates: Vec<Option<Decimal>> = cells
        .into_iter()
        .map(|c| match c {
            Cell::Parsed(r) if r > Decimal::ZERO => Some(r),
            Cell::Missing => None,
            _ => {
                invalid += 1;
                None
            }
        })
        .collect();

    let median_rate = median(rates.iter().flatten().copied());
    let nulls = rates.iter().filter(|r| r.is_none()).count();
    if nulls > 0 {
        match median_rate {
            Some(m) => tracing::info!(nulls, median = %m, "imputing missing cross rates"),
            None => tracing::warn!(nulls, "no valid cross rate in batch; foreign amounts stay null"),
        }
    }

    let filled = rates.into_iter().map(|r| r.or(median_rate)).collect();
    let log = log
        .count("cross_rate_invalid_values", invalid)
        .count("cross_rate_nulls_filled", nulls)
        .with("cross_rate_median_value", LogValue::Amount(median_rate));
    (filled, log)
}

fn texts(input: &Normalized<'_>, field: Field) -> Vec<Option<String>> {
    input
        .rows
        .iter()
        .map(|r| r.get(field).and_then(|v| v.as_text()))
        .collect()
}

fn categorical(input: &Normalized<'_>, field: Field, log: CleaningLog) -> (Vec<Option<String>>, CleaningLog) {
    let values = input
        .rows
        .iter()
        .map(|r| r.get(field).and_then(text_cell).map(|s| s.to_lowercase()))
        .collect();
    let log = if input.has_field(field) {
        log.flag(format!("{}_normalized", field), true)
    } else {
        log
    };
    (values, log)
}

/// Builds typed records from a normalized, deduplicated view.
///
/// `due_date` is set here as `invoice_date + payment_terms_days`.
pub fn clean(input: &Normalized<'_>, payment_terms_days: i64) -> (Vec<InvoiceRecord>, CleaningLog) {
    let log = CleaningLog::new();
    let (invoice_dates, log) = dates(input, Field::InvoiceDate, log);
    let (payment_dates, log) = dates(input, Field::PaymentDate, log);
    let (invoice_amounts, log) = amounts(input, Field::InvoiceAmount, log);
    let (payment_amounts, log) = amounts(input, Field::PaymentAmount, log);
    let (rates, log) = cross_rates(input, log);
    let (statuses, log) = categorical(input, Field::Status, log);
    let (contractors, log) = categorical(input, Field::Contractor, log);
    let (countries, log) = categorical(input, Field::Country, log);
    let (managers, log) = categorical(input, Field::Manager, log);

    let vessels = texts(input, Field::Vessel);
    let incoterms = texts(input, Field::Incoterms);
    let banks = texts(input, Field::Bank);
    let channels = texts(input, Field::SalesChannel);
    let comments = texts(input, Field::Comment);
    let terms = Duration::try_days(payment_terms_days);

    let records: Vec<InvoiceRecord> = input
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| InvoiceRecord {
            row: row.row,
            invoice_id: business_key(row),
            contractor: contractors[i].clone(),
            vessel: vessels[i].clone(),
            country: countries[i].clone(),
            incoterms: incoterms[i].clone(),
            bank: banks[i].clone(),
            sales_channel: channels[i].clone(),
            invoice_date: invoice_dates[i],
            invoice_amount: invoice_amounts[i],
            invoice_currency: row
                .get(Field::InvoiceCurrency)
                .and_then(text_cell)
                .filter(|c| !c.is_empty()),
            status: statuses[i].clone(),
            payment_date: payment_dates[i],
            payment_amount: payment_amounts[i],
            cross_rate: rates[i],
            manager: managers[i].clone(),
            comment: comments[i].clone(),
            amount_reporting_currency: None,
            risk_score: 0,
            due_date: invoice_dates[i].and_then(|d| d.checked_add_signed(terms?)),
        })
        .collect();

    let log = log.count("final_rows", records.len());
    (records, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawTable, RawValue};
    use crate::normalizer::normalize;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample() -> RawTable {
        let mut t = RawTable::new(vec![
            "Номер инвойса".into(),
            "Дата инвойса или его отправки".into(),
            "Сумма инвойса".into(),
            "кросс-курс".into(),
            "Состояние инвойса".into(),
            "Страна".into(),
            "Судно".into(),
        ]);
        t.push_row(vec![
            "A".into(),
            "05.03.2025".into(),
            "≈ 1 200,50 usd".into(),
            "90".into(),
            "  Оплачен ".into(),
            "ЕГИПЕТ".into(),
            " Vessel One ".into(),
        ]);
        t.push_row(vec![
            "B".into(),
            "not a date".into(),
            "lots".into(),
            RawValue::Null,
            "OPEN".into(),
            RawValue::Null,
            RawValue::Null,
        ]);
        t.push_row(vec![
            "C".into(),
            RawValue::Null,
            "300 ₽".into(),
            "100".into(),
            "".into(),
            "Турция".into(),
            RawValue::Null,
        ]);
        t
    }

    #[test]
    fn cleans_each_column_and_logs_counts() {
        let t = sample();
        let (n, _) = normalize(&t);
        let (records, log) = clean(&n, 30);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].invoice_amount, Some(dec("1200.50")));
        assert_eq!(records[0].status.as_deref(), Some("оплачен"));
        assert_eq!(records[0].country.as_deref(), Some("египет"));
        assert_eq!(records[0].vessel.as_deref(), Some(" Vessel One "));
        assert_eq!(records[2].status.as_deref(), Some(""));
        assert_eq!(records[1].country, None);

        assert_eq!(log.get_count("invoice_date_invalid_dates"), Some(1));
        assert_eq!(log.get_count("invoice_date_missing"), Some(1));
        assert_eq!(log.get_count("invoice_amount_invalid_values"), Some(1));
        assert_eq!(log.get("status_normalized"), Some(&LogValue::Flag(true)));
        assert_eq!(log.get("manager_normalized"), None);
        assert_eq!(log.get("payment_date_invalid_dates"), None);
        assert_eq!(log.get_count("final_rows"), Some(3));
    }

    #[test]
    fn cross_rate_nulls_take_the_median() {
        let t = sample();
        let (n, _) = normalize(&t);
        let (records, log) = clean(&n, 30);
        assert!(records.iter().all(|r| r.cross_rate.is_some()));
        assert_eq!(records[1].cross_rate, Some(dec("95")));
        assert_eq!(log.get_count("cross_rate_nulls_filled"), Some(1));
        assert_eq!(
            log.get("cross_rate_median_value"),
            Some(&LogValue::Amount(Some(dec("95"))))
        );
    }

    #[test]
    fn all_null_rates_leave_a_null_median() {
        let mut t = RawTable::new(vec!["invoice_id".into(), "cross_rate".into()]);
        t.push_row(vec!["A".into(), "zero?".into()]);
        t.push_row(vec!["B".into(), "0".into()]);
        let (n, _) = normalize(&t);
        let (records, log) = clean(&n, 30);
        assert!(records.iter().all(|r| r.cross_rate.is_none()));
        assert_eq!(log.get_count("cross_rate_invalid_values"), Some(2));
        assert_eq!(log.get("cross_rate_median_value"), Some(&LogValue::Amount(None)));
    }

    #[test]
    fn due_date_follows_payment_terms() {
        let t = sample();
        let (n, _) = normalize(&t);
        let (records, _) = clean(&n, 30);
        let due = records[0].due_date.unwrap();
        assert_eq!(due.date().to_string(), "2025-04-04");
        assert_eq!(records[1].due_date, None);
    }

    #[test]
    fn due_date_out_of_range_is_null() {
        let t = sample();
        let (n, _) = normalize(&t);
        let (records, _) = clean(&n, i64::MAX);
        assert_eq!(records[0].due_date, None);
        let (records, _) = clean(&n, 100_000_000);
        assert_eq!(records[0].due_date, None);
    }

    #[test]
    fn no_cross_rate_column_logs_nothing_about_rates() {
        let mut t = RawTable::new(vec!["invoice_id".into(), "invoice_amount".into()]);
        t.push_row(vec!["A".into(), "10".into()]);
        t.push_row(vec!["B".into(), "20".into()]);
        let (n, _) = normalize(&t);
        let (records, log) = clean(&n, 30);
        assert!(records.iter().all(|r| r.cross_rate.is_none()));
        assert!(log.get("cross_rate_nulls_filled").is_none());
        assert!(log.get("cross_rate_invalid_values").is_none());
        assert!(log.get("cross_rate_median_value").is_none());
    }
}
