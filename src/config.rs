// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest accepted payment term, ten years.
pub const MAX_PAYMENT_TERMS_DAYS: i64 = 3650;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Invoicewatch", "invoicewatch"));

/// Knobs shared by the converter, the risk scorer and the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Currency every amount is normalized into.
    pub reporting_currency: String,
    /// Normalized (lower-case) country names that carry the country penalty.
    pub high_risk_countries: BTreeSet<String>,
    pub payment_terms_days: i64,
    pub top_debtors: usize,
    pub high_risk_threshold: u8,
    pub critical_risk_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reporting_currency: "RUB".to_string(),
            high_risk_countries: BTreeSet::from(["египет".to_string()]),
            payment_terms_days: 30,
            top_debtors: 5,
            high_risk_threshold: 50,
            critical_risk_threshold: 70,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Read config {}", path.display()))?;
        let mut cfg: PipelineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Parse config {}", path.display()))?;
        if !(0..=MAX_PAYMENT_TERMS_DAYS).contains(&cfg.payment_terms_days) {
            bail!(
                "Invalid payment_terms_days {} in {} (expected 0..={})",
                cfg.payment_terms_days,
                path.display(),
                MAX_PAYMENT_TERMS_DAYS
            );
        }
        cfg.high_risk_countries = cfg
            .high_risk_countries
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        Ok(cfg)
    }

    /// Explicit file if given, else the platform config file if it exists,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::from_file(p);
        }
        match default_config_path() {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Ok(Self::default()),
        }
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn apply_matches(mut self, m: &clap::ArgMatches) -> Self {
        if let Some(ccy) = m.get_one::<String>("reporting-currency") {
            self.reporting_currency = ccy.trim().to_uppercase();
        }
        if let Some(countries) = m.get_many::<String>("high-risk-country") {
            self.high_risk_countries = countries.map(|c| c.trim().to_lowercase()).collect();
        }
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP.0, APP.1, APP.2).map(|p| p.config_dir().join("config.json"))
}
