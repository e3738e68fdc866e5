use crate::common::{test_client, test_client_with_policy};
use iapd_crawler::download::file_name_for;
use iapd_crawler::{ExistingFilePolicy, IapdError, Target};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADV_BYTES: &[u8] = b"%PDF-1.4 form adv";
const BROCHURE_BYTES: &[u8] = b"%PDF-1.4 part 2 brochure";

fn firm_page() -> String {
    r#"<html><body>
        <span id="ctl00_cphMain_landing_lblActiveOrgName">ACME CAPITAL MANAGEMENT</span>
        <a id="ctl00_cphMain_landing_pdfLink" href="/docs/adv.pdf">Form ADV</a>
        <a id="ctl00_cphMain_landing_p2BrochureLink" href="/IAPD/Part2Brochures.aspx?ORG_PK=160882">Part 2</a>
    </body></html>"#
        .to_string()
}

/// Mounts a firm profile, its brochure listing and both documents
async fn mount_firm(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Firm/160882"))
        .respond_with(ResponseTemplate::new(200).set_body_string(firm_page()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/IAPD/Part2Brochures.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a id="ctl00_cphMain_part2_dgBrchr_ctrl0_hlBrochureName" href="/docs/brochure.pdf">Brochure</a>"#,
        ))
        .mount(server)
        .await;
}

async fn mount_documents(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/docs/adv.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ADV_BYTES))
        .expect(expected_hits)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/brochure.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BROCHURE_BYTES))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_firm_filings_without_download() {
    let server = MockServer::start().await;
    mount_firm(&server).await;
    mount_documents(&server, 0).await;

    let iapd = test_client(&server);
    let filings = iapd
        .get_firm_filings(&Target::Crd(160882), false, None)
        .await
        .expect("Lookup failed");

    assert_eq!(filings.firm_name.as_deref(), Some("ACME CAPITAL MANAGEMENT"));
    assert_eq!(
        filings.adv_form_url,
        Some(format!("{}/docs/adv.pdf", server.uri()))
    );
    assert_eq!(
        filings.part_2_brochures_url,
        Some(format!("{}/docs/brochure.pdf", server.uri()))
    );
    assert!(filings.adv_form_local_path.is_none());
    assert!(filings.part_2_brochures_local_path.is_none());
}

#[tokio::test]
async fn test_firm_filings_download_creates_directory() {
    let server = MockServer::start().await;
    mount_firm(&server).await;
    mount_documents(&server, 1).await;

    let tmp = TempDir::new().unwrap();
    let output_dir = tmp.path().join("nested").join("filings");
    assert!(!output_dir.exists());

    let iapd = test_client(&server);
    let filings = iapd
        .get_firm_filings(&Target::Crd(160882), true, Some(output_dir.as_path()))
        .await
        .expect("Lookup failed");

    assert!(output_dir.is_dir());

    let adv_path = filings.adv_form_local_path.expect("ADV not saved");
    assert!(adv_path.starts_with(&output_dir));
    assert_eq!(std::fs::read(&adv_path).unwrap(), ADV_BYTES);
    assert!(std::fs::metadata(&adv_path).unwrap().len() > 0);

    let brochure_path = filings
        .part_2_brochures_local_path
        .expect("Brochure not saved");
    assert_eq!(std::fs::read(&brochure_path).unwrap(), BROCHURE_BYTES);
    assert_eq!(
        brochure_path.file_name().unwrap().to_string_lossy(),
        file_name_for(&format!("{}/docs/brochure.pdf", server.uri()))
    );
}

#[tokio::test]
async fn test_firm_filings_by_url() {
    let server = MockServer::start().await;
    mount_firm(&server).await;

    let iapd = test_client(&server);
    let target = Target::Url(format!("{}/Firm/160882", server.uri()));
    let filings = iapd.get_firm_filings(&target, false, None).await.unwrap();

    assert!(filings.adv_form_url.is_some());
}

#[tokio::test]
async fn test_direct_brochure_link_is_not_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Firm/77"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a id="ctl00_cphMain_landing_p2BrochureLink" href="/docs/direct.pdf">Part 2</a>"#,
        ))
        .mount(&server)
        .await;

    let iapd = test_client(&server);
    let filings = iapd
        .get_firm_filings(&Target::Crd(77), false, None)
        .await
        .unwrap();

    assert_eq!(filings.firm_name, None);
    assert_eq!(filings.adv_form_url, None);
    assert_eq!(
        filings.part_2_brochures_url,
        Some(format!("{}/docs/direct.pdf", server.uri()))
    );
}

#[tokio::test]
async fn test_unknown_crd_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Firm/999999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let iapd = test_client(&server);
    let result = iapd.get_firm_filings(&Target::Crd(999999), false, None).await;

    assert!(matches!(result, Err(IapdError::UnknownCrd { crd: 999999 })));
}

#[tokio::test]
async fn test_unknown_crd_empty_profile() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Firm/123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>No firm found.</p></body></html>"),
        )
        .mount(&server)
        .await;

    let iapd = test_client(&server);

    let result = iapd.get_firm_filings(&Target::Crd(123), false, None).await;
    assert!(matches!(result, Err(IapdError::UnknownCrd { crd: 123 })));

    let target = Target::Url(format!("{}/Firm/123", server.uri()));
    let result = iapd.get_firm_filings(&target, false, None).await;
    assert!(matches!(result, Err(IapdError::NotFound { .. })));
}

#[tokio::test]
async fn test_server_error_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Firm/5"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let iapd = test_client(&server);
    let result = iapd.get_firm_filings(&Target::Crd(5), false, None).await;

    assert!(matches!(result, Err(IapdError::Status { status: 502, .. })));
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    mount_firm(&server).await;

    Mock::given(method("GET"))
        .and(path("/docs/adv.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let iapd = test_client(&server);
    let result = iapd
        .get_firm_filings(&Target::Crd(160882), true, Some(tmp.path()))
        .await;

    assert!(matches!(result, Err(IapdError::Status { status: 500, .. })));
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_empty_document_is_an_error() {
    let server = MockServer::start().await;
    mount_firm(&server).await;

    Mock::given(method("GET"))
        .and(path("/docs/adv.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let iapd = test_client(&server);
    let result = iapd
        .get_firm_filings(&Target::Crd(160882), true, Some(tmp.path()))
        .await;

    assert!(matches!(result, Err(IapdError::UnexpectedResponse { .. })));
}

#[tokio::test]
async fn test_skip_policy_reuses_existing_files() {
    let server = MockServer::start().await;
    mount_firm(&server).await;
    mount_documents(&server, 0).await;

    let tmp = TempDir::new().unwrap();
    for doc in ["adv", "brochure"] {
        let name = file_name_for(&format!("{}/docs/{}.pdf", server.uri(), doc));
        std::fs::write(tmp.path().join(name), b"cached").unwrap();
    }

    let iapd = test_client_with_policy(&server, ExistingFilePolicy::Skip);
    let filings = iapd
        .get_firm_filings(&Target::Crd(160882), true, Some(tmp.path()))
        .await
        .unwrap();

    let adv_path = filings.adv_form_local_path.unwrap();
    assert_eq!(std::fs::read(adv_path).unwrap(), b"cached");
}

#[tokio::test]
async fn test_overwrite_policy_replaces_existing_files() {
    let server = MockServer::start().await;
    mount_firm(&server).await;
    mount_documents(&server, 1).await;

    let tmp = TempDir::new().unwrap();
    let name = file_name_for(&format!("{}/docs/adv.pdf", server.uri()));
    std::fs::write(tmp.path().join(&name), b"stale").unwrap();

    let iapd = test_client_with_policy(&server, ExistingFilePolicy::Overwrite);
    let filings = iapd
        .get_firm_filings(&Target::Crd(160882), true, Some(tmp.path()))
        .await
        .unwrap();

    assert_eq!(filings.adv_form_local_path, Some(tmp.path().join(&name)));
    assert_eq!(std::fs::read(tmp.path().join(&name)).unwrap(), ADV_BYTES);
}

#[tokio::test]
async fn test_individual_report_download() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Individual/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<a id="ctl00_cphMain_btnGetReport" href="{}/reports/42.pdf">Get Detailed Report</a>"#,
            server.uri()
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reports/42.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 report".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let iapd = test_client(&server);
    let report = iapd
        .get_individual_report(&Target::Crd(42), true, Some(tmp.path()))
        .await
        .unwrap();

    assert_eq!(
        report.detailed_report_url,
        Some(format!("{}/reports/42.pdf", server.uri()))
    );
    let saved = report.detailed_report_local_path.unwrap();
    assert!(std::fs::metadata(saved).unwrap().len() > 0);
}

#[tokio::test]
async fn test_individual_without_report_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Individual/43"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let iapd = test_client(&server);
    let result = iapd.get_individual_report(&Target::Crd(43), false, None).await;

    assert!(matches!(result, Err(IapdError::UnknownCrd { crd: 43 })));
}
