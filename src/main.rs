// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use invoicewatch::{cli, commands, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    logging::init_logging(matches.get_count("verbose"), matches.get_flag("quiet"))?;

    match matches.subcommand() {
        Some(("clean", sub)) => commands::clean::handle(sub)?,
        Some(("report", sub)) => commands::reports::handle(sub)?,
        Some(("export", sub)) => commands::exporter::handle(sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(sub)?,
        Some(("config", sub)) => commands::settings::handle(sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
