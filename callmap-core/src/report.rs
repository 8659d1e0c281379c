//! Output formatting - plaintext and JSON.

use serde::Serialize;
use serde_json::json;
use std::fmt::Write;

use crate::callgraph::{Analysis, FunctionRecord};

/// Catalogued functions, longest first; equal counts are ordered by name.
pub fn functions_by_size(analysis: &Analysis) -> Vec<&FunctionRecord> {
    let mut records: Vec<&FunctionRecord> = analysis.catalog.records().collect();
    records.sort_by(|a, b| b.line_count.cmp(&a.line_count).then_with(|| a.name.cmp(&b.name)));
    records
}

/// Plain-text report for one analysis.
pub fn format_plain(analysis: &Analysis) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_plain(&mut out, analysis);
    out
}

fn write_plain(out: &mut String, analysis: &Analysis) -> std::fmt::Result {
    if analysis.catalog.is_empty() {
        writeln!(out, "No functions found.")?;
        return Ok(());
    }

    writeln!(out, "FUNCTIONS ({}):", analysis.catalog.len())?;
    for record in functions_by_size(analysis) {
        writeln!(
            out,
            "- {}: {} lines (line {})",
            record.name, record.line_count, record.defining_line
        )?;
    }

    let roots: Vec<&str> = analysis.roots_with_calls().collect();
    writeln!(out)?;
    writeln!(out, "ROOTS ({}):", roots.len())?;
    for root in roots {
        writeln!(out, "- {}", root)?;
    }

    writeln!(out)?;
    writeln!(out, "CALLS:")?;
    if analysis.relation.is_empty() {
        writeln!(out, "(none)")?;
    }
    for (caller, callees) in &analysis.relation {
        let list: Vec<&str> = callees.iter().map(String::as_str).collect();
        writeln!(out, "- {} -> {}", caller, list.join(", "))?;
    }

    if analysis.dead != analysis.roots {
        writeln!(out)?;
        writeln!(out, "DEAD ({}):", analysis.dead.len())?;
        for name in &analysis.dead {
            writeln!(out, "- {}", name)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct FunctionEntry<'a> {
    name: &'a str,
    line_count: usize,
    defining_line: usize,
}

/// JSON report value for one analysis.
pub fn report_json(analysis: &Analysis) -> serde_json::Value {
    let functions: Vec<FunctionEntry<'_>> = functions_by_size(analysis)
        .into_iter()
        .map(|r| FunctionEntry {
            name: &r.name,
            line_count: r.line_count,
            defining_line: r.defining_line,
        })
        .collect();
    let roots: Vec<&str> = analysis.roots_with_calls().collect();

    json!({
        "functions": functions,
        "roots": roots,
        "calls": analysis.relation,
        "dead": analysis.dead,
        "stats": analysis.stats,
    })
}

/// Prints the report in plain text format.
pub fn print_plain(analysis: &Analysis) {
    print!("{}", format_plain(analysis));
}

/// Prints the report in JSON format.
pub fn print_json(analysis: &Analysis) {
    match serde_json::to_string_pretty(&report_json(analysis)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            println!("{{\"dead\": {:?}}}", analysis.dead);
        }
    }
}
