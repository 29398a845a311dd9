//! Interactive page-table simulator.
//!
//! Loads a page-table description file, then reads virtual addresses from
//! stdin one per line (decimal or `0x` hex) and prints one outcome per
//! address: the physical address in hex, `SEGFAULT`, `DISK`, or a
//! `PAGEFAULT` notice followed by the physical address.

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use pagesim::io::{load_table, parse_address};
use pagesim::translation::{Outcome, Translator};

#[derive(Parser, Debug)]
#[command(
    name = "pagesim",
    about = "Translate virtual addresses against a page table description"
)]
struct Args {
    /// Page table description file
    table: PathBuf,

    /// Handle page faults with Second-Chance (clock) replacement
    #[arg(long)]
    clock: bool,

    /// Log fault handling and eviction decisions
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Warn
        })
        .init();

    let table = load_table(&args.table)
        .with_context(|| format!("loading page table from {}", args.table.display()))?;
    let mut translator = if args.clock {
        Translator::with_clock(table)
    } else {
        Translator::new(table)
    };

    println!("Enter virtual addresses (decimal or hex with 0x prefix):");
    for line in io::stdin().lock().lines() {
        let line = line.context("reading address from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // A malformed address is reported but never ends the session
        let addr = match parse_address(line) {
            Ok(addr) => addr,
            Err(_) => {
                println!("Invalid address format");
                continue;
            }
        };

        let outcome = translator
            .translate(addr)
            .context("page replacement failed")?;
        render(&outcome);
    }

    Ok(())
}

fn render(outcome: &Outcome) {
    match outcome {
        Outcome::Translated(pa) => println!("0x{pa:x}"),
        Outcome::PageFault(pa) => {
            println!("PAGEFAULT");
            println!("0x{pa:x}");
        }
        Outcome::Segfault(_) => println!("SEGFAULT"),
        Outcome::Disk => println!("DISK"),
    }
}
