//! Paged search
//!
//! A search is an ASP.NET postback conversation:
//!
//! 1. GET the landing page and read its hidden form state
//! 2. POST the search form back to the landing page
//! 3. GET the results page
//! 4. While the results page has a "next" link, POST its form state with the
//!    pager event target to get the following page
//!
//! [`SearchPages`] walks that conversation one page per call.

use super::client::Iapd;
use super::parser::{parse_form_state, parse_search_page, FormState, SearchResult};
use crate::{IapdError, Result};
use std::fmt;
use std::str::FromStr;

const SEARCH_BUTTON_EVENT: &str = "ctl00$cphMain$sbox$searchBtn";
const NEXT_PAGE_EVENT: &str = "ctl00$cphMain$ucSearchPagerTop$pageNext";

/// Whether to search firms or individuals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    #[default]
    Firm,
    Individual,
}

impl SearchScope {
    /// Radio button value of the scope selector
    fn form_value(&self) -> &'static str {
        match self {
            SearchScope::Firm => "rdoFirm",
            SearchScope::Individual => "rdoIndvl",
        }
    }

    /// Name of the text box holding the search term for this scope
    fn term_field(&self) -> &'static str {
        match self {
            SearchScope::Firm => "ctl00$cphMain$sbox$txtFirm",
            SearchScope::Individual => "ctl00$cphMain$sbox$txtIndvl",
        }
    }
}

impl FromStr for SearchScope {
    type Err = IapdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firm" => Ok(SearchScope::Firm),
            "individual" => Ok(SearchScope::Individual),
            _ => Err(IapdError::InvalidScope(s.to_string())),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::Firm => write!(f, "firm"),
            SearchScope::Individual => write!(f, "individual"),
        }
    }
}

/// Search filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub scope: SearchScope,

    /// Restrict results to this zip code
    pub zip_code: Option<String>,

    /// Radius around `zip_code`, in miles
    pub zip_code_range: String,

    /// Current employer filter (individual searches only)
    pub at_firm: Option<String>,

    /// Keep only results whose profile lives on the IAPD site
    pub iapd_only: bool,

    /// Stop after this many pages
    pub page_limit: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            scope: SearchScope::Firm,
            zip_code: None,
            zip_code_range: "5".to_string(),
            at_firm: None,
            iapd_only: false,
            page_limit: None,
        }
    }
}

impl SearchOptions {
    /// Form fields for a search postback
    fn form_fields(&self, term: &str, state: &FormState, event_target: &str) -> Vec<(String, String)> {
        let mut fields = vec![
            ("__EVENTTARGET".to_string(), event_target.to_string()),
            ("__VIEWSTATE".to_string(), state.view_state.clone()),
            (
                "__VIEWSTATEGENERATOR".to_string(),
                state.view_state_generator.clone(),
            ),
            (
                "__EVENTVALIDATION".to_string(),
                state.event_validation.clone(),
            ),
            (
                "ctl00$cphMain$sbox$searchScope".to_string(),
                self.scope.form_value().to_string(),
            ),
            (self.scope.term_field().to_string(), term.to_string()),
            (
                "ctl00$cphMain$sbox$ddlZipRange".to_string(),
                self.zip_code_range.clone(),
            ),
        ];

        if let Some(zip_code) = &self.zip_code {
            fields.push(("ctl00$cphMain$sbox$txtZip".to_string(), zip_code.clone()));
        }
        if let Some(at_firm) = &self.at_firm {
            fields.push(("ctl00$cphMain$sbox$txtAtFirm".to_string(), at_firm.clone()));
        }

        fields
    }
}

#[derive(Debug)]
enum PagerState {
    Start,
    Next(FormState),
    Finished,
}

/// Lazy sequence of search result batches, one batch per results page
///
/// Finite: ends after the page without a "next" link, or after
/// `page_limit` pages. A failed request is returned once as `Err` and ends
/// the sequence. No request is retried here.
#[derive(Debug)]
pub struct SearchPages<'a> {
    iapd: &'a Iapd,
    term: String,
    options: SearchOptions,
    state: PagerState,
    pages_read: usize,
}

impl<'a> SearchPages<'a> {
    pub(crate) fn new(iapd: &'a Iapd, term: &str, options: SearchOptions) -> Self {
        Self {
            iapd,
            term: term.to_string(),
            options,
            state: PagerState::Start,
            pages_read: 0,
        }
    }

    /// Number of pages fetched so far
    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PagerState::Finished)
    }

    /// Fetches the next batch of results
    ///
    /// # Returns
    ///
    /// * `Ok(Some(batch))` - Results of the next page
    /// * `Ok(None)` - No more pages
    /// * `Err(IapdError)` - The request failed; the sequence is now finished
    pub async fn next_page(&mut self) -> Result<Option<Vec<SearchResult>>> {
        if self
            .options
            .page_limit
            .is_some_and(|limit| self.pages_read >= limit)
        {
            self.state = PagerState::Finished;
            return Ok(None);
        }

        let html = match std::mem::replace(&mut self.state, PagerState::Finished) {
            PagerState::Finished => return Ok(None),
            PagerState::Start => self.open().await?,
            PagerState::Next(form) => {
                let fields = self.options.form_fields(&self.term, &form, NEXT_PAGE_EVENT);
                self.iapd
                    .session()
                    .post_form_text(&self.iapd.search_url()?, &fields)
                    .await?
            }
        };

        let page = parse_search_page(&html, self.iapd.base_url());
        if page.has_next {
            let Some(form) = page.form_state else {
                return Err(IapdError::UnexpectedResponse {
                    url: self.iapd.search_url()?,
                    message: "next page link without form state".to_string(),
                });
            };
            self.state = PagerState::Next(form);
        }
        self.pages_read += 1;

        let mut results = page.results;
        if self.options.iapd_only {
            results.retain(|result| self.iapd.is_iapd_url(&result.url));
        }

        tracing::debug!(
            "Search '{}' page {}: {} results",
            self.term,
            self.pages_read,
            results.len()
        );
        Ok(Some(results))
    }

    /// Runs the initial search postback and returns the first results page
    async fn open(&self) -> Result<String> {
        let session = self.iapd.session();
        let landing_url = self.iapd.landing_url()?;

        let landing = session.get_text(&landing_url).await?;
        let form = parse_form_state(&landing).ok_or_else(|| IapdError::UnexpectedResponse {
            url: landing_url.clone(),
            message: "missing view state on landing page".to_string(),
        })?;

        let fields = self
            .options
            .form_fields(&self.term, &form, SEARCH_BUTTON_EVENT);
        session.post_form(&landing_url, &fields).await?;

        session.get_text(&self.iapd.search_url()?).await
    }
}

impl Iapd {
    /// Starts a search for `term`
    ///
    /// Nothing is requested until the first [`SearchPages::next_page`] call.
    pub fn search(&self, term: &str, options: SearchOptions) -> SearchPages<'_> {
        SearchPages::new(self, term, options)
    }

    /// Runs a search to completion and returns every batch
    pub async fn search_all(
        &self,
        term: &str,
        options: SearchOptions,
    ) -> Result<Vec<Vec<SearchResult>>> {
        let mut pages = self.search(term, options);
        let mut batches = Vec::new();
        while let Some(batch) = pages.next_page().await? {
            batches.push(batch);
        }
        Ok(batches)
    }
}
