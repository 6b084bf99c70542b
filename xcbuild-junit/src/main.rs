// Copyright (c) The xcbuild-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end: converts xcodebuild output into JUnit XML
//! reports and exits with the run's outcome code.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};
use xcbuild_parser::{
    console::ConsoleParser, outcome::FAILURE_SENTINEL, reports::ReportDir,
    summaries::SummariesParser,
};

#[derive(Debug, Parser)]
#[command(
    name = "xcbuild-junit",
    about = "Convert xcodebuild output into JUnit XML test reports",
    version
)]
struct App {
    /// Hostname to record in emitted reports. Defaults to the local
    /// hostname.
    #[arg(long, global = true)]
    hostname: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse console output from a log file or standard input.
    Console {
        /// Log file to read; standard input if omitted.
        #[arg(long)]
        log: Option<Utf8PathBuf>,

        /// Directory to write TEST-<suite>.xml reports into.
        #[arg(long, short = 'o', default_value = "test-reports")]
        output: Utf8PathBuf,
    },

    /// Parse a test-summaries document exported from a result bundle as
    /// JSON.
    Summaries {
        /// Path to the exported TestSummaries JSON document.
        summaries: Utf8PathBuf,

        /// Directory to write TEST-<suite>.xml reports into.
        #[arg(long, short = 'o', default_value = "test-reports")]
        output: Utf8PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let app = App::parse();
    let hostname = app
        .hostname
        .unwrap_or_else(|| whoami::hostname().unwrap_or_else(|_| "localhost".to_owned()));

    let code = match app.command {
        Command::Console { log, output } => run_console(&hostname, log.as_deref(), &output)?,
        Command::Summaries { summaries, output } => {
            run_summaries(&hostname, &summaries, &output)?
        }
    };
    std::process::exit(code);
}

fn run_console(hostname: &str, log: Option<&Utf8Path>, output: &Utf8Path) -> Result<i32> {
    let sink = ReportDir::new(output.to_owned())?;
    let mut parser = ConsoleParser::new(hostname, sink);

    let feed_result = match log {
        Some(path) => {
            let file = File::open(path).wrap_err_with(|| format!("failed to open {path}"))?;
            feed(&mut parser, BufReader::new(file))
        }
        None => feed(&mut parser, io::stdin().lock()),
    };

    if let Err(error) = feed_result {
        eprintln!("{error:?}");
        return Ok(FAILURE_SENTINEL);
    }
    Ok(parser.outcome().code())
}

fn feed(parser: &mut ConsoleParser<ReportDir>, reader: impl BufRead) -> Result<()> {
    for line in reader.lines() {
        let line = line.wrap_err("failed to read log input")?;
        parser.consume_line(&line)?;
    }
    Ok(())
}

fn run_summaries(hostname: &str, summaries: &Utf8Path, output: &Utf8Path) -> Result<i32> {
    let sink = ReportDir::new(output.to_owned())?;
    let mut parser = SummariesParser::new(hostname, sink);
    if let Err(error) = parser.parse_file(summaries) {
        eprintln!("{error:?}");
        return Ok(FAILURE_SENTINEL);
    }
    Ok(parser.outcome().code())
}
