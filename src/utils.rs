// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Cell, RawValue};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL, Cell as TableCell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

// Currency symbols, approximation marks, the "usd" token and any Unicode
// whitespace (exports use non-breaking spaces as thousands separators).
static AMOUNT_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)usd|[₽$≈\s]").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

// Day first; ISO is only tried after the day-first shapes.
// Two-digit years go first so "03.04.25" is not read as year 25.
const DATE_FORMATS: &[&str] = &["%d.%m.%y", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parses an invoice date cell, preferring day-before-month.
pub fn parse_datetime_cell(v: &RawValue) -> Cell<NaiveDateTime> {
    let raw = match v {
        RawValue::Null => return Cell::Missing,
        RawValue::Number(d) => return Cell::Invalid(d.to_string()),
        RawValue::Text(s) => s,
    };
    let s = raw.trim();
    if s.is_empty() {
        return Cell::Missing;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Cell::Parsed(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Cell::Parsed(d.and_time(chrono::NaiveTime::MIN));
        }
    }
    Cell::Invalid(raw.clone())
}

/// Strips currency noise from a free-text amount and parses it.
///
/// Negative values are rejected; invoice and payment amounts are never
/// below zero.
pub fn parse_amount_cell(v: &RawValue) -> Cell<Decimal> {
    let parsed = match v {
        RawValue::Null => return Cell::Missing,
        RawValue::Number(d) => Some(*d),
        RawValue::Text(s) => {
            let cleaned = AMOUNT_NOISE.replace_all(s, "").replace(',', ".");
            if cleaned.is_empty() {
                return if s.trim().is_empty() {
                    Cell::Missing
                } else {
                    Cell::Invalid(s.clone())
                };
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
        }
    };
    match parsed {
        Some(d) if !d.is_sign_negative() || d.is_zero() => Cell::Parsed(d),
        _ => Cell::Invalid(v.as_text().unwrap_or_default()),
    }
}

/// Trimmed text of a cell; blank text is kept as an empty string.
pub fn text_cell(v: &RawValue) -> Option<String> {
    v.as_text().map(|s| s.trim().to_string())
}

/// Median of the values, `None` for an empty input.
pub fn median(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    let mut v: Vec<Decimal> = values.into_iter().collect();
    if v.is_empty() {
        return None;
    }
    v.sort();
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        let (lo, hi) = (v[mid - 1], v[mid]);
        Some(match lo.checked_add(hi) {
            Some(sum) => sum / Decimal::TWO,
            // both large and of one sign, so the gap fits
            None => lo + (hi - lo) / Decimal::TWO,
        })
    }
}

/// Sum that saturates at `Decimal::MAX` instead of panicking.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, d| acc.saturating_add(d))
}

pub fn mean(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    let v: Vec<Decimal> = values.into_iter().collect();
    if v.is_empty() {
        return None;
    }
    let n = Decimal::from(v.len());
    match v.iter().try_fold(Decimal::ZERO, |acc, d| acc.checked_add(*d)) {
        Some(sum) => Some(sum / n),
        None => Some(v.iter().fold(Decimal::ZERO, |acc, d| acc.saturating_add(*d / n))),
    }
}

/// `part / whole * 100`, zero when `whole` is zero or the ratio does not fit.
pub fn pct(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

pub fn fmt_opt(d: Option<Decimal>) -> String {
    d.map(|d| format!("{:.2}", d)).unwrap_or_else(|| "-".to_string())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| TableCell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(TableCell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
