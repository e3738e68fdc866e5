//! Filing lookups by CRD number or profile URL

use super::client::{Iapd, Target, FIRM_PATH, INDIVIDUAL_PATH};
use super::parser::{parse_brochure_link, parse_firm_page, parse_report_link};
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Link to the Part 2 brochure listing; the document itself is one hop further
const BROCHURE_LIST_PATH: &str = "/IAPD/Part2Brochures.aspx";

/// Filings published on a firm profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirmFilings {
    pub firm_name: Option<String>,
    pub adv_form_url: Option<String>,
    pub adv_form_local_path: Option<PathBuf>,
    pub part_2_brochures_url: Option<String>,
    pub part_2_brochures_local_path: Option<PathBuf>,
}

/// Detailed report published on an individual profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndividualReport {
    pub detailed_report_url: Option<String>,
    pub detailed_report_local_path: Option<PathBuf>,
}

impl Iapd {
    /// Looks up the Form ADV and Part 2 brochure of a firm
    ///
    /// # Arguments
    ///
    /// * `target` - CRD number or firm profile URL
    /// * `download` - Save the documents to disk
    /// * `output_dir` - Where to save them; falls back to the configured
    ///   directory, then a temp directory. Created if missing.
    ///
    /// # Returns
    ///
    /// * `Ok(FirmFilings)` - Document URLs, plus local paths when downloaded
    /// * `Err(IapdError::UnknownCrd)` - The site has no firm for this CRD
    /// * `Err(IapdError)` - Request, parse or write failure
    pub async fn get_firm_filings(
        &self,
        target: &Target,
        download: bool,
        output_dir: Option<&Path>,
    ) -> Result<FirmFilings> {
        let url = target.profile_url(self.base_url(), FIRM_PATH)?;
        let html = self.fetch_profile(target, &url).await?;
        let page = parse_firm_page(&html);
        if page.is_empty() {
            return Err(target.not_found(&url));
        }

        let brochures_href = match page.brochures_href {
            Some(href) if href.starts_with(BROCHURE_LIST_PATH) => {
                let listing = self.session().get_text(&self.resolve(&href)?).await?;
                parse_brochure_link(&listing)
            }
            other => other,
        };

        let adv_form_url = page
            .adv_form_href
            .map(|href| self.resolve(&href))
            .transpose()?;
        let part_2_brochures_url = brochures_href
            .map(|href| self.resolve(&href))
            .transpose()?;

        let mut filings = FirmFilings {
            firm_name: page.firm_name,
            adv_form_url,
            part_2_brochures_url,
            ..FirmFilings::default()
        };

        if download {
            let dir = self.output_dir(output_dir);
            filings.adv_form_local_path = self
                .download_optional(filings.adv_form_url.as_deref(), &dir)
                .await?;
            filings.part_2_brochures_local_path = self
                .download_optional(filings.part_2_brochures_url.as_deref(), &dir)
                .await?;
        }

        tracing::info!(
            "Filings for {}: ADV {}, Part 2 {}",
            target,
            filings.adv_form_url.is_some(),
            filings.part_2_brochures_url.is_some()
        );
        Ok(filings)
    }

    /// Looks up the detailed report of an individual
    ///
    /// Same download semantics as [`Iapd::get_firm_filings`]. A profile
    /// without a report link is reported as unknown.
    pub async fn get_individual_report(
        &self,
        target: &Target,
        download: bool,
        output_dir: Option<&Path>,
    ) -> Result<IndividualReport> {
        let url = target.profile_url(self.base_url(), INDIVIDUAL_PATH)?;
        let html = self.fetch_profile(target, &url).await?;
        let href = parse_report_link(&html).ok_or_else(|| target.not_found(&url))?;

        let mut report = IndividualReport {
            detailed_report_url: Some(self.resolve(&href)?),
            detailed_report_local_path: None,
        };

        if download {
            let dir = self.output_dir(output_dir);
            report.detailed_report_local_path = self
                .download_optional(report.detailed_report_url.as_deref(), &dir)
                .await?;
        }

        Ok(report)
    }
}
