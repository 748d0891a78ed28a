// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{self, HighRiskRecord, Kpis};
use crate::cleanlog::CleaningLog;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{Field, InvoiceRecord, RawTable};
use crate::{cleaner, currency, dedup, normalizer, risk};
use chrono::NaiveDateTime;

/// Terminal artifact of one run: scored records plus the merged log.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<InvoiceRecord>,
    pub log: CleaningLog,
    /// Evaluation timestamp every date comparison used.
    pub now: NaiveDateTime,
}

impl PipelineOutput {
    pub fn kpis(&self) -> Kpis {
        Kpis::compute(&self.records, self.now)
    }

    pub fn high_risk(&self, config: &PipelineConfig) -> Vec<HighRiskRecord> {
        aggregate::high_risk(
            &self.records,
            config.high_risk_threshold,
            config.critical_risk_threshold,
        )
    }
}

/// normalize → deduplicate → clean → convert → score.
pub fn run(table: &RawTable, config: &PipelineConfig, now: NaiveDateTime) -> Result<PipelineOutput> {
    if table.is_empty() {
        return Err(PipelineError::EmptyTable);
    }

    let (normalized, log) = normalizer::normalize(table);
    if !normalized.has_field(Field::InvoiceId) {
        return Err(PipelineError::MissingKeyColumn(Field::InvoiceId.to_string()));
    }

    let (unique, dedup_log) = dedup::deduplicate(&normalized);
    let (records, clean_log) = cleaner::clean(&unique, config.payment_terms_days);
    let (records, convert_log) = currency::convert(records, &config.reporting_currency);
    let records = risk::score_all(records, now.date(), &config.high_risk_countries);

    let log = log.merge(dedup_log).merge(clean_log).merge(convert_log);
    tracing::info!(
        input_rows = table.len(),
        output_rows = records.len(),
        "pipeline finished"
    );
    Ok(PipelineOutput { records, log, now })
}
