//! HTML parsing for IAPD pages
//!
//! This module extracts from the site's ASP.NET pages:
//! - Hidden form state that has to be echoed back on every postback
//! - Search result cards and the "next page" link
//! - Filing links on firm and individual profiles
//!
//! Every function takes the raw body and returns owned data, so no parsed
//! document is held across an await point.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

pub const NEXT_PAGE_ID: &str = "ctl00_cphMain_ucSearchPagerTop_pageNext";
pub const ADV_ONE_HREF_ID: &str = "ctl00_cphMain_landing_pdfLink";
pub const ADV_TWO_HREF_ID: &str = "ctl00_cphMain_landing_p2BrochureLink";
pub const ADV_TWO_BROCHURE_ID: &str = "ctl00_cphMain_part2_dgBrchr_ctrl0_hlBrochureName";
pub const COMPANY_NAME_ID: &str = "ctl00_cphMain_landing_lblActiveOrgName";
pub const DETAILED_REPORT_ID: &str = "ctl00_cphMain_btnGetReport";

static CRD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CRD# (\d+)").expect("valid CRD regex"));

static SEC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SEC# ([\d-]+)").expect("valid SEC regex"));

static ADDRESS_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ctl00_cphMain_rptrSearchResult_ctl\d{2,}_uc(Firm|Indvl)Item_divAddress")
        .expect("valid address id regex")
});

static TYPE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ctl00_cphMain_rptrSearchResult_ctl\d{2,}_uc(Firm|Indvl)Item_div\w{2,4}$")
        .expect("valid type id regex")
});

static STATUS_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"ctl00_cphMain_rptrSearchResult_ctl\d{2,}_uc(Firm|Indvl)Item_div\w{2,4}(Inactive|NotLicensed)",
    )
    .expect("valid status id regex")
});

/// One matched firm or individual from a search results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Profile link, absolute when it points into the IAPD site
    pub url: String,
    pub name: String,
    pub crd: Option<u64>,
    pub sec: Option<String>,
    pub alternate_names: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub registrations: Vec<Registration>,
}

/// A registration type shown on a result card (e.g. "IA", "BD")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    /// False when the card marks the registration Inactive or NotLicensed
    pub active: bool,
}

/// ASP.NET hidden fields required to post back to a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub view_state: String,
    pub view_state_generator: String,
    pub event_validation: String,
}

/// Everything read from one search results page
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub has_next: bool,
    pub form_state: Option<FormState>,
}

/// Links and name found on a firm profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmPage {
    pub firm_name: Option<String>,
    pub adv_form_href: Option<String>,
    pub brochures_href: Option<String>,
}

impl FirmPage {
    /// A profile with none of the expected elements is not a firm page
    pub fn is_empty(&self) -> bool {
        self.firm_name.is_none() && self.adv_form_href.is_none() && self.brochures_href.is_none()
    }
}

/// Reads the hidden form state from any IAPD page
pub fn parse_form_state(html: &str) -> Option<FormState> {
    let document = Html::parse_document(html);
    form_state(&document)
}

/// Parses a search results page
pub fn parse_search_page(html: &str, base_url: &Url) -> SearchPage {
    let document = Html::parse_document(html);

    let results = match Selector::parse("a.alinkborder") {
        Ok(card_selector) => document
            .select(&card_selector)
            .map(|card| parse_result_card(card, base_url))
            .collect(),
        Err(_) => Vec::new(),
    };

    SearchPage {
        results,
        has_next: find_by_id(&document, NEXT_PAGE_ID).is_some(),
        form_state: form_state(&document),
    }
}

/// Parses a firm profile page
pub fn parse_firm_page(html: &str) -> FirmPage {
    let document = Html::parse_document(html);

    FirmPage {
        firm_name: find_by_id(&document, COMPANY_NAME_ID)
            .map(element_text)
            .filter(|name| !name.is_empty()),
        adv_form_href: href_by_id(&document, ADV_ONE_HREF_ID),
        brochures_href: href_by_id(&document, ADV_TWO_HREF_ID),
    }
}

/// Extracts the first brochure link from the Part 2 brochure listing
pub fn parse_brochure_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    href_by_id(&document, ADV_TWO_BROCHURE_ID)
}

/// Extracts the detailed report link from an individual profile
pub fn parse_report_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    href_by_id(&document, DETAILED_REPORT_ID)
}

fn form_state(document: &Html) -> Option<FormState> {
    Some(FormState {
        view_state: input_value(document, "__VIEWSTATE")?,
        view_state_generator: input_value(document, "__VIEWSTATEGENERATOR")?,
        event_validation: input_value(document, "__EVENTVALIDATION")?,
    })
}

fn input_value(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("input[name='{}']", name)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!("[id='{}']", id)).ok()?;
    document.select(&selector).next()
}

fn href_by_id(document: &Html, id: &str) -> Option<String> {
    find_by_id(document, id)
        .and_then(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

fn parse_result_card(card: ElementRef<'_>, base_url: &Url) -> SearchResult {
    let href = card.value().attr("href").unwrap_or_default().trim();
    let display_crd = select_text(card, "span.displaycrd").unwrap_or_default();

    SearchResult {
        url: resolve_profile_url(href, base_url),
        name: select_text(card, "span.displayname").unwrap_or_default(),
        crd: CRD_PATTERN
            .captures(&display_crd)
            .and_then(|caps| caps[1].parse().ok()),
        sec: SEC_PATTERN
            .captures(&display_crd)
            .map(|caps| caps[1].to_string()),
        alternate_names: select_text(card, "span.names").filter(|names| !names.is_empty()),
        address: divs_matching(card, &ADDRESS_ID_PATTERN)
            .next()
            .map(element_text)
            .filter(|address| !address.is_empty()),
        registrations: divs_matching(card, &TYPE_ID_PATTERN)
            .map(|div| Registration {
                name: own_text(div),
                active: divs_matching(div, &STATUS_ID_PATTERN).next().is_none(),
            })
            .collect(),
    }
}

/// Site-relative profile links are made absolute; anything else is kept
fn resolve_profile_url(href: &str, base_url: &Url) -> String {
    if href.starts_with("/Firm") || href.starts_with("/Individual") {
        if let Ok(url) = base_url.join(href) {
            return url.to_string();
        }
    }
    href.to_string()
}

fn select_text(element: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next().map(element_text)
}

fn divs_matching<'a>(
    element: ElementRef<'a>,
    pattern: &'a Regex,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let selector = Selector::parse("div[id]").ok();
    selector
        .into_iter()
        .flat_map(move |selector| element.select(&selector).collect::<Vec<_>>())
        .filter(move |div| {
            div.value()
                .attr("id")
                .is_some_and(|id| pattern.is_match(id))
        })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First non-blank text node directly inside the element
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}
