// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn path_arg() -> Arg {
    Arg::new("path")
        .long("path")
        .short('p')
        .required(true)
        .help("Invoice export (CSV, first row is the header)")
}

fn output_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn filter_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("min-risk")
            .long("min-risk")
            .value_parser(value_parser!(u8).range(0..=100))
            .help("Only invoices with risk score at or above this value"),
    )
    .arg(
        Arg::new("country")
            .long("country")
            .help("Only invoices from this (normalized) country"),
    )
    .arg(
        Arg::new("status")
            .long("status")
            .help("Only invoices with this (normalized) status"),
    )
}

fn report(name: &'static str, about: &'static str, filtered: bool) -> Command {
    let cmd = output_flags(Command::new(name).about(about).arg(path_arg()));
    if filtered { filter_args(cmd) } else { cmd }
}

pub fn build_cli() -> Command {
    Command::new("invoicewatch")
        .about("Clean invoice exports, score credit risk and report receivables KPIs")
        .version(clap::crate_version!())
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("JSON config file (defaults to the platform config dir)"),
        )
        .arg(
            Arg::new("reporting-currency")
                .long("reporting-currency")
                .global(true)
                .help("Currency all amounts are converted into"),
        )
        .arg(
            Arg::new("high-risk-country")
                .long("high-risk-country")
                .global(true)
                .action(ArgAction::Append)
                .help("Country that carries the country penalty (repeatable)"),
        )
        .arg(
            Arg::new("as-of")
                .long("as-of")
                .global(true)
                .help("Evaluation date YYYY-MM-DD (defaults to now)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More log output (-v info, -vv debug, -vvv trace)"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log errors"),
        )
        .subcommand(
            output_flags(
                Command::new("clean")
                    .about("Run the cleaning pipeline and show the cleaning log")
                    .arg(path_arg())
                    .arg(
                        Arg::new("records")
                            .long("records")
                            .action(ArgAction::SetTrue)
                            .help("Also list the cleaned records"),
                    ),
            ),
        )
        .subcommand(
            Command::new("report")
                .about("KPIs and breakdowns")
                .subcommand(report("kpi", "Key receivables figures", true))
                .subcommand(
                    report("debtors", "Contractors with the largest overdue totals", true).arg(
                        Arg::new("top")
                            .long("top")
                            .value_parser(value_parser!(usize))
                            .help("How many contractors to show"),
                    ),
                )
                .subcommand(report("countries", "Overdue breakdown by country", false))
                .subcommand(report("managers", "Overdue breakdown by manager", false))
                .subcommand(report(
                    "hypothesis",
                    "Is the country with the highest overdue ratio an outlier?",
                    false,
                ))
                .subcommand(report("risk", "High-risk invoices with score components", true))
                .subcommand(report("currencies", "Invoice currencies, rates and statuses", true)),
        )
        .subcommand(
            Command::new("export")
                .about("Write pipeline results to a file")
                .arg(
                    Arg::new("what")
                        .value_parser(["cleaned", "high-risk", "kpi"])
                        .required(true)
                        .help("Which result to export"),
                )
                .arg(path_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .help("csv or json"),
                )
                .arg(Arg::new("out").long("out").required(true).help("Output file")),
        )
        .subcommand(
            Command::new("doctor")
                .about("List data-quality issues found while cleaning")
                .arg(path_arg()),
        )
        .subcommand(Command::new("config").about("Show the effective configuration"))
}
