//! Output formatting for the command-line front end
//!
//! Results are rendered either as indented plain text or as pretty JSON.

use crate::crawler::{FirmFilings, IndividualReport, SearchResult};
use serde::Serialize;
use std::path::PathBuf;

/// Serializes any result as pretty-printed JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Formats one search batch as plain text
pub fn format_search_batch(page: usize, batch: &[SearchResult]) -> String {
    let mut out = format!("=== Page {} ({} results) ===\n", page, batch.len());

    for result in batch {
        out.push_str(&format!("\n{}\n", result.name));
        if let Some(crd) = result.crd {
            out.push_str(&format!("  CRD#: {}\n", crd));
        }
        if let Some(sec) = &result.sec {
            out.push_str(&format!("  SEC#: {}\n", sec));
        }
        if let Some(names) = &result.alternate_names {
            out.push_str(&format!("  Also known as: {}\n", names));
        }
        if let Some(address) = &result.address {
            out.push_str(&format!("  Address: {}\n", address));
        }
        if !result.registrations.is_empty() {
            let registrations: Vec<String> = result
                .registrations
                .iter()
                .map(|r| {
                    if r.active {
                        r.name.clone()
                    } else {
                        format!("{} (inactive)", r.name)
                    }
                })
                .collect();
            out.push_str(&format!("  Registrations: {}\n", registrations.join(", ")));
        }
        out.push_str(&format!("  URL: {}\n", result.url));
    }

    out
}

/// Formats firm filings as plain text
pub fn format_firm_filings(filings: &FirmFilings) -> String {
    let mut out = String::new();
    if let Some(name) = &filings.firm_name {
        out.push_str(&format!("{}\n", name));
    }
    push_document(
        &mut out,
        "Form ADV",
        &filings.adv_form_url,
        &filings.adv_form_local_path,
    );
    push_document(
        &mut out,
        "Part 2 brochure",
        &filings.part_2_brochures_url,
        &filings.part_2_brochures_local_path,
    );
    out
}

/// Formats an individual report as plain text
pub fn format_individual_report(report: &IndividualReport) -> String {
    let mut out = String::new();
    push_document(
        &mut out,
        "Detailed report",
        &report.detailed_report_url,
        &report.detailed_report_local_path,
    );
    out
}

fn push_document(out: &mut String, label: &str, url: &Option<String>, path: &Option<PathBuf>) {
    match url {
        Some(url) => out.push_str(&format!("  {}: {}\n", label, url)),
        None => out.push_str(&format!("  {}: not available\n", label)),
    }
    if let Some(path) = path {
        out.push_str(&format!("    saved to {}\n", path.display()));
    }
}
