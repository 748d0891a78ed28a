// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod clean;
pub mod reports;
pub mod exporter;
pub mod doctor;
pub mod settings;

use crate::aggregate::RecordFilter;
use crate::config::PipelineConfig;
use crate::pipeline::{self, PipelineOutput};
use crate::{loader, utils};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;

/// Effective config: file (explicit or platform default) plus CLI overrides.
pub fn load_config(m: &clap::ArgMatches) -> Result<PipelineConfig> {
    let explicit = m.get_one::<String>("config").map(|s| Path::new(s.trim()));
    Ok(PipelineConfig::load(explicit)?.apply_matches(m))
}

/// Midnight of `--as-of`, or the current local time.
pub fn evaluation_time(m: &clap::ArgMatches) -> Result<NaiveDateTime> {
    match m.get_one::<String>("as-of") {
        Some(s) => Ok(utils::parse_date(s.trim())?.and_time(chrono::NaiveTime::MIN)),
        None => Ok(chrono::Local::now().naive_local()),
    }
}

/// Loads `--path` and runs the whole pipeline on it.
pub fn run_pipeline(m: &clap::ArgMatches) -> Result<(PipelineOutput, PipelineConfig)> {
    let config = load_config(m)?;
    let now = evaluation_time(m)?;
    let path = m.get_one::<String>("path").unwrap().trim();
    let table = loader::read_csv_path(path)?;
    let out = pipeline::run(&table, &config, now)
        .with_context(|| format!("Cannot process {}", path))?;
    Ok((out, config))
}

/// Filter from `--min-risk`, `--country` and `--status`; values are
/// normalized the same way the cleaner normalizes the columns.
pub fn record_filter(m: &clap::ArgMatches) -> RecordFilter {
    let norm = |s: &String| s.trim().to_lowercase();
    RecordFilter {
        min_risk: m.get_one::<u8>("min-risk").copied(),
        country: m.get_one::<String>("country").map(norm),
        status: m.get_one::<String>("status").map(norm),
    }
}
