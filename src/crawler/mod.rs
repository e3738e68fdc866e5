//! Crawler for the IAPD website
//!
//! This module contains the client-facing operations:
//! - Paged search for firms and individuals
//! - Firm filing lookup (Form ADV and Part 2 brochure)
//! - Individual detailed report lookup
//! - Optional download of the linked documents

mod client;
mod filings;
mod parser;
mod search;

pub use client::{Iapd, Target};
pub use filings::{FirmFilings, IndividualReport};
pub use parser::{
    parse_brochure_link, parse_firm_page, parse_form_state, parse_report_link, parse_search_page,
    FirmPage, FormState, Registration, SearchPage, SearchResult,
};
pub use search::{SearchOptions, SearchPages, SearchScope};
