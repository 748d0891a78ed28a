// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures that abort a whole pipeline run.
///
/// Bad individual cells never end up here; they are recorded in the
/// cleaning log and turned into nulls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("input table has no rows")]
    EmptyTable,

    #[error("required column '{0}' is missing from the input")]
    MissingKeyColumn(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
