// src/report.rs
// =============================================================================
// Prints scan results.
//
// Everything is printed in ascending origin order (line 0 first, anchor 0
// first), whatever order the probes finished in.
//
// - File mode:  "<line> > <url>" for every dead link (yellow line, green URL)
// - Crawl mode: "[ '<url>' => <code> OK ]" or "[ '<url>' => <code> RIP ]"
// - --json:     the verdicts as a pretty JSON array
//
// The summary goes to stderr so stdout stays clean for piping.
// =============================================================================

use crate::checker::{ResultTable, Verdict};
use anyhow::Result;
use colored::Colorize;

/// Which verdicts make it into the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    DeadOnly,
    All,
}

impl Filter {
    fn keeps(self, verdict: &Verdict) -> bool {
        match self {
            Filter::DeadOnly => !verdict.alive,
            Filter::All => true,
        }
    }
}

// Verdicts to print, in origin order then position order
fn selected(table: &ResultTable, filter: Filter) -> Vec<Verdict> {
    table
        .origin_keys()
        .into_iter()
        .flat_map(|origin_key| table.verdicts_for(origin_key))
        .filter(|v| filter.keeps(v))
        .collect()
}

pub fn print_file_report(table: &ResultTable, filter: Filter, json: bool) -> Result<()> {
    let verdicts = selected(table, filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&verdicts)?);
    } else {
        for verdict in &verdicts {
            println!("{}", format_line_entry(verdict, filter, true));
        }
    }

    print_summary(table);
    Ok(())
}

pub fn print_crawl_report(table: &ResultTable, json: bool) -> Result<()> {
    let verdicts = selected(table, Filter::All);

    if json {
        println!("{}", serde_json::to_string_pretty(&verdicts)?);
    } else {
        for verdict in &verdicts {
            let line = format_crawl_entry(verdict);
            if verdict.alive {
                println!("{}", line.green());
            } else {
                println!("{}", line.red());
            }
        }
    }

    print_summary(table);
    Ok(())
}

// "3 > http://example.com/gone"; with --all the status is appended
fn format_line_entry(verdict: &Verdict, filter: Filter, paint: bool) -> String {
    let line = verdict.origin_key.to_string();
    let entry = if paint {
        format!("{} > {}", line.yellow(), verdict.url.green())
    } else {
        format!("{} > {}", line, verdict.url)
    };

    match filter {
        Filter::DeadOnly => entry,
        Filter::All => format!("{} ({} {})", entry, verdict.status_code, label(verdict)),
    }
}

// "[ 'http://example.com/' => 200 OK ]"
pub fn format_crawl_entry(verdict: &Verdict) -> String {
    format!(
        "[ '{}' => {} {} ]",
        verdict.url,
        verdict.status_code,
        label(verdict)
    )
}

fn label(verdict: &Verdict) -> &'static str {
    if verdict.status_code == 200 {
        "OK"
    } else {
        "RIP"
    }
}

fn print_summary(table: &ResultTable) {
    // One snapshot, so both counts describe the same table
    let verdicts: Vec<Verdict> = table.all().into_values().flatten().collect();
    let total = verdicts.len();
    let dead = verdicts.iter().filter(|v| !v.alive).count();

    eprintln!();
    eprintln!("📊 Summary:");
    eprintln!("   ✅ Alive: {}", total - dead);
    eprintln!("   💀 Dead: {}", dead);
    eprintln!("   📋 Total: {}", total);
}
