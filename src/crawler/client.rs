//! The IAPD client

use crate::config::{validate, Config};
use crate::download::{default_output_dir, download_form, ExistingFilePolicy};
use crate::session::{IapdSession, LANDING_PATH};
use crate::{IapdError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

pub(crate) const SEARCH_PATH: &str = "/IAPD/IAPDSearch.aspx";
pub(crate) const FIRM_PATH: &str = "/Firm/";
pub(crate) const INDIVIDUAL_PATH: &str = "/Individual/";

/// What a filing lookup points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// CRD number, resolved to the profile URL on the configured site
    Crd(u64),
    /// Profile URL as returned in a search result
    Url(String),
}

impl Target {
    /// Profile URL for this target; `kind_path` is `/Firm/` or `/Individual/`
    pub(crate) fn profile_url(&self, base_url: &Url, kind_path: &str) -> Result<String> {
        match self {
            Target::Crd(crd) => Ok(base_url.join(&format!("{}{}", kind_path, crd))?.to_string()),
            Target::Url(url) => Ok(Url::parse(url)?.to_string()),
        }
    }

    /// Error reported when the site has no profile for this target
    pub(crate) fn not_found(&self, url: &str) -> IapdError {
        match self {
            Target::Crd(crd) => IapdError::UnknownCrd { crd: *crd },
            Target::Url(_) => IapdError::NotFound {
                url: url.to_string(),
            },
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Crd(crd) => write!(f, "CRD# {}", crd),
            Target::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Client for https://adviserinfo.sec.gov
///
/// Holds one throttled HTTP session; all requests made through the same
/// `Iapd` share its cookies and politeness delay.
#[derive(Debug)]
pub struct Iapd {
    session: IapdSession,
    base_url: Url,
    existing_files: ExistingFilePolicy,
    output_dir: Option<PathBuf>,
}

impl Iapd {
    /// Creates a client from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Iapd)` - Client ready to issue requests
    /// * `Err(IapdError::Config)` - The configuration fails validation
    /// * `Err(IapdError)` - HTTP client failure
    pub fn new(config: &Config) -> Result<Self> {
        validate(config)?;
        Ok(Self {
            session: IapdSession::new(&config.session, &config.site)?,
            base_url: Url::parse(&config.site.base_url)?,
            existing_files: config.download.existing_files,
            output_dir: config.download.output_dir.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn session(&self) -> &IapdSession {
        &self.session
    }

    /// Resolves a site path or link against the base URL
    pub(crate) fn resolve(&self, href: &str) -> Result<String> {
        Ok(self.base_url.join(href)?.to_string())
    }

    pub(crate) fn landing_url(&self) -> Result<String> {
        self.resolve(LANDING_PATH)
    }

    pub(crate) fn search_url(&self) -> Result<String> {
        self.resolve(SEARCH_PATH)
    }

    /// Whether `url` points into the configured IAPD site
    pub fn is_iapd_url(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|parsed| parsed.origin() == self.base_url.origin())
            .unwrap_or(false)
    }

    /// Fetches a profile page, reporting a 404 as an unknown target
    pub(crate) async fn fetch_profile(&self, target: &Target, url: &str) -> Result<String> {
        match self.session.get_text(url).await {
            Err(IapdError::Status { status: 404, .. }) => Err(target.not_found(url)),
            other => other,
        }
    }

    /// Directory for downloads: the caller's, then the configured one, then a temp dir
    pub(crate) fn output_dir(&self, requested: Option<&Path>) -> PathBuf {
        requested
            .map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(default_output_dir)
    }

    /// Downloads `url` when present
    pub(crate) async fn download_optional(
        &self,
        url: Option<&str>,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        match url {
            Some(url) => Ok(Some(
                download_form(&self.session, url, output_dir, self.existing_files).await?,
            )),
            None => Ok(None),
        }
    }
}
