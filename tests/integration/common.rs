//! Shared fixtures for the integration tests

use iapd_crawler::config::Config;
use iapd_crawler::{ExistingFilePolicy, Iapd};
use wiremock::MockServer;

/// Config pointed at the mock server, with no politeness delay
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.site.base_url = server.uri();
    config.site.https_only = false;
    config.session.min_delay_ms = 0;
    config.session.max_delay_ms = 0;
    config.session.timeout_secs = 5;
    config.retry.delay_ms = 1;
    config
}

pub fn test_client(server: &MockServer) -> Iapd {
    Iapd::new(&test_config(server)).expect("Failed to build client")
}

pub fn test_client_with_policy(server: &MockServer, policy: ExistingFilePolicy) -> Iapd {
    let mut config = test_config(server);
    config.download.existing_files = policy;
    Iapd::new(&config).expect("Failed to build client")
}

pub fn hidden_fields(view_state: &str) -> String {
    format!(
        r#"<input type="hidden" name="__VIEWSTATE" value="{}" />
        <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
        <input type="hidden" name="__EVENTVALIDATION" value="ev" />"#,
        view_state
    )
}

pub fn landing_page() -> String {
    format!(
        "<html><body><form>{}</form></body></html>",
        hidden_fields("vs-landing")
    )
}

/// A result card as rendered by the search page
pub fn result_card(index: usize, name: &str, crd: u64) -> String {
    format!(
        r#"<a class="alinkborder" href="/Firm/{crd}">
          <span class="displayname">{name}</span>
          <span class="displaycrd">(CRD# {crd})</span>
          <div id="ctl00_cphMain_rptrSearchResult_ctl{index:02}_ucFirmItem_divIA">IA</div>
        </a>"#,
        crd = crd,
        name = name,
        index = index
    )
}

/// A results page; `view_state` is echoed back when asking for the next page
pub fn results_page(cards: &[String], view_state: &str, has_next: bool) -> String {
    let next = if has_next {
        r#"<a id="ctl00_cphMain_ucSearchPagerTop_pageNext" href="javascript:__doPostBack()">Next</a>"#
    } else {
        ""
    };
    format!(
        "<html><body><form>{}{}{}</form></body></html>",
        hidden_fields(view_state),
        cards.join("\n"),
        next
    )
}
