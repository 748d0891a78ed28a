// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregate;
pub mod cleaner;
pub mod cleanlog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod currency;
pub mod dedup;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod risk;
pub mod utils;
