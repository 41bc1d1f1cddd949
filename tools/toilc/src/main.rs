// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use clap::Parser;
use clap_derive::Parser;
use std::path::PathBuf;
use toil_compiler::{TranslateOptions, translate};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)] // requires `derive` feature
#[clap(
    version,
    about = "Translates a toil source program into a stack-machine instruction listing"
)]
pub struct Args {
    #[clap(help = "Path to the source program; reads stdin when omitted")]
    source: Option<PathBuf>,

    #[clap(long, help = "Enable debug logging")]
    debug: bool,
}

fn main() -> Result<(), eyre::Report> {
    color_eyre::install().unwrap();
    let args: Args = Args::parse();

    // Diagnostics go to stderr; stdout carries nothing but the listing.
    let main_subscriber = tracing_subscriber::fmt()
        .compact()
        .with_ansi(true)
        .with_span_events(FmtSpan::NONE)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .finish();
    tracing::subscriber::set_global_default(main_subscriber).unwrap_or_else(|e| {
        eprintln!("Unable to configure logging: {e}");
        std::process::exit(1);
    });

    let source = match &args.source {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    match translate(&source, TranslateOptions::default()) {
        Ok(program) => {
            print!("{program}");
            Ok(())
        }
        Err(e) => {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    }
}
