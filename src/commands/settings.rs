// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::default_config_path;
use anyhow::Result;

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    let config = super::load_config(m)?;
    if let Some(p) = default_config_path() {
        let state = if p.exists() { "found" } else { "not present" };
        eprintln!("Default config file: {} ({})", p.display(), state);
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
