// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Diagnostic log produced by the cleaning stages.
//!
//! Every stage returns its own `CleaningLog` fragment; the pipeline merges
//! them in stage order. Keys follow the `{column}_{metric}` convention so
//! the log can be shown as-is.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogValue {
    Count(usize),
    Flag(bool),
    Amount(Option<Decimal>),
    Columns(Vec<String>),
    Renames(BTreeMap<String, String>),
}

impl std::fmt::Display for LogValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogValue::Count(n) => write!(f, "{}", n),
            LogValue::Flag(b) => write!(f, "{}", b),
            LogValue::Amount(Some(d)) => write!(f, "{}", d),
            LogValue::Amount(None) => f.write_str("null"),
            LogValue::Columns(cols) => f.write_str(&cols.join(", ")),
            LogValue::Renames(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{} -> {}", k, v)).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CleaningLog {
    entries: BTreeMap<String, LogValue>,
}

impl CleaningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: LogValue) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn count(self, key: impl Into<String>, n: usize) -> Self {
        self.with(key, LogValue::Count(n))
    }

    pub fn flag(self, key: impl Into<String>, b: bool) -> Self {
        self.with(key, LogValue::Flag(b))
    }

    /// Folds a later stage's fragment in; later keys overwrite earlier ones.
    pub fn merge(mut self, other: CleaningLog) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn get(&self, key: &str) -> Option<&LogValue> {
        self.entries.get(key)
    }

    pub fn get_count(&self, key: &str) -> Option<usize> {
        match self.entries.get(key) {
            Some(LogValue::Count(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LogValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
