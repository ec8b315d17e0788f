//! Tests for the pagination module

use super::*;
use crate::error::Error;
use crate::test_support::test_session;
use serde_json::json;
use wiremock::matchers::{header, headers, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Prefer Header
// ============================================================================

#[test]
fn test_prefer_header_page_size_only() {
    let options = FetchOptions::default();
    assert_eq!(prefer_header(&options), "odata.maxpagesize=2000");
}

#[test]
fn test_prefer_header_with_formatted_values() {
    let options = FetchOptions::default()
        .with_page_size(500)
        .with_formatted_values(true);
    assert_eq!(
        prefer_header(&options),
        "odata.maxpagesize=500, odata.include-annotations=\"OData.Community.Display.V1.FormattedValue\""
    );
}

// ============================================================================
// Error Messages
// ============================================================================

#[test]
fn test_query_error_message_extracts_server_message() {
    let body = json!({"error": {"code": "0x80040217", "message": "contact With Id = 123 Does Not Exist"}});
    let message = query_error_message(404, &body.to_string());
    assert_eq!(message, "Received: 404 - contact With Id = 123 Does Not Exist");
}

#[test]
fn test_query_error_message_unknown_property_hint() {
    let body = json!({"error": {
        "code": "0x0",
        "message": "Could not find a property named 'fk_accountid' on type 'Microsoft.Dynamics.CRM.contact'."
    }});
    let message = query_error_message(400, &body.to_string());

    assert!(message.starts_with("Received: 400 - Could not find a property named 'fk_accountid'"));
    assert!(message.contains("Did you mean \"_accountid\"?"));
    assert!(message.contains("\"fk_accountid\" -> \"_accountid\""));
}

#[test]
fn test_query_error_message_unknown_property_without_fk() {
    let body = json!({"error": {
        "message": "Could not find a property named 'parentcustomerid' on type 'Microsoft.Dynamics.CRM.contact'."
    }});
    let message = query_error_message(400, &body.to_string());

    assert!(!message.contains("Did you mean"));
    assert!(message.contains("leading-underscore"));
}

#[test]
fn test_query_error_message_unquoted_property_still_hinted() {
    let body = json!({"error": {
        "message": "Could not find a property named fk_accountid on type contact."
    }});
    let message = query_error_message(400, &body.to_string());

    assert!(message.starts_with(
        "Received: 400 - Could not find a property named fk_accountid on type contact."
    ));
    assert!(!message.contains("Did you mean"));
    assert!(message.contains("leading-underscore"));
    assert!(message.contains("\"fk_accountid\" -> \"_accountid\""));
}

#[test]
fn test_query_error_message_non_json_body() {
    let message = query_error_message(502, "<html>Bad Gateway</html>");
    assert_eq!(message, "Received: 502 - <html>Bad Gateway</html>");
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn test_fetch_first_page_with_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts"))
        .and(query_param("$select", "fullname,emailaddress1"))
        .and(query_param("$filter", "statecode eq 0"))
        .and(header("Prefer", "odata.maxpagesize=2000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"contactid": "1", "fullname": "Ada"},
                {"contactid": "2", "fullname": "Grace"}
            ],
            "@odata.nextLink": format!("{}/contacts?$skiptoken=page2", mock_server.uri())
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server.uri());
    let page = fetch_page(
        &session,
        "contacts",
        "$select=fullname,emailaddress1&$filter=statecode eq 0",
        None,
        &FetchOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.records[1]["fullname"], "Grace");
    assert!(!page.is_last());
    assert!(page.next_cursor.unwrap().ends_with("$skiptoken=page2"));
}

#[tokio::test]
async fn test_fetch_with_cursor_ignores_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts"))
        .and(query_param("$skiptoken", "page2"))
        .and(query_param_is_missing("$select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"contactid": "3"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server.uri());
    let cursor = format!("{}/contacts?$skiptoken=page2", mock_server.uri());
    let page = fetch_page(
        &session,
        "contacts",
        "$select=fullname",
        Some(&cursor),
        &FetchOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(page.len(), 1);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_fetch_requests_formatted_values() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(headers(
            "Prefer",
            vec![
                "odata.maxpagesize=2000",
                "odata.include-annotations=\"OData.Community.Display.V1.FormattedValue\"",
            ],
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "accountid": "a1",
                "statuscode": 1,
                "statuscode@OData.Community.Display.V1.FormattedValue": "Active"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server.uri());
    let options = FetchOptions::default().with_formatted_values(true);
    let page = fetch_page(&session, "accounts", "", None, &options)
        .await
        .unwrap();

    assert_eq!(
        page.records[0]["statuscode@OData.Community.Display.V1.FormattedValue"],
        "Active"
    );
}

#[tokio::test]
async fn test_empty_next_link_means_last_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "@odata.nextLink": ""
        })))
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server.uri());
    let page = fetch_page(&session, "leads", "", None, &FetchOptions::default())
        .await
        .unwrap();

    assert!(page.is_empty());
    assert!(page.is_last());
}

#[tokio::test]
async fn test_cursor_chain_exhausts() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param_is_missing("$skiptoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"accountid": "1"}, {"accountid": "2"}],
            "@odata.nextLink": format!("{base}/accounts?$skiptoken=2")
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param("$skiptoken", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"accountid": "3"}],
            "@odata.nextLink": format!("{base}/accounts?$skiptoken=3")
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(query_param("$skiptoken", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"accountid": "4"}],
            "@odata.nextLink": null
        })))
        .mount(&mock_server)
        .await;

    let session = test_session(&base);
    let options = FetchOptions::default();

    let mut cursor: Option<String> = None;
    let mut pages = 0;
    let mut ids = Vec::new();
    loop {
        let page = fetch_page(&session, "accounts", "", cursor.as_deref(), &options)
            .await
            .unwrap();
        pages += 1;
        ids.extend(page.records.iter().map(|r| r["accountid"].as_str().unwrap().to_string()));
        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_fetch_failure_is_query_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contacts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Could not find a property named 'fk_parentcustomerid' on type 'Microsoft.Dynamics.CRM.contact'."}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server.uri());
    let err = fetch_page(
        &session,
        "contacts",
        "$select=fk_parentcustomerid",
        None,
        &FetchOptions::default(),
    )
    .await
    .unwrap_err();

    match err {
        Error::Query { endpoint, message } => {
            assert_eq!(endpoint, "contacts");
            assert!(message.contains("Received: 400"));
            assert!(message.contains("\"_parentcustomerid\""));
        }
        other => panic!("Expected query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_transport_failure_is_query_error() {
    let session = test_session("http://127.0.0.1:1");
    let err = fetch_page(&session, "contacts", "", None, &FetchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Query { .. }));
}
