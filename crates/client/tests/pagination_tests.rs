//! Integration tests for cursor pagination over a mock transport
//!
//! Drives a three-page result set forward and backward through opaque
//! tokens, checking the exact wire parameters each page produces.

mod common;

use common::MockTransport;
use futon_client::{Method, PageRequest, ViewClient, ViewQuery};
use serde_json::{json, Value};

fn query() -> ViewQuery {
    ViewQuery::new()
        .design_doc_id("reports")
        .view_name("by_name")
}

fn rows_body(range: std::ops::RangeInclusive<usize>, total: usize) -> String {
    let rows: Vec<String> = range
        .map(|i| format!(r#"{{"id":"d{i}","key":"k{i}","value":{i}}}"#))
        .collect();
    format!(
        r#"{{"total_rows":{total},"offset":0,"rows":[{}]}}"#,
        rows.join(",")
    )
}

#[test]
fn test_pages_forward_through_a_result_set() {
    let transport = MockTransport::new();
    let client = ViewClient::new(Box::new(transport.clone()), "people");

    // Page one: limit is page size + 1, no start bounds yet.
    transport.enqueue_ok(&rows_body(1..=3, 5));
    let page1 = client
        .query_page::<Value>(&query(), &PageRequest::first_page(2))
        .unwrap();

    let request = transport.last_request();
    assert_eq!(request.path, "/people/_design/reports/_view/by_name");
    assert_eq!(request.query, "limit=3");
    assert_eq!(page1.rows(), &[json!(1), json!(2)]);
    assert_eq!(page1.total_size(), 5);
    assert!(page1.has_next());
    assert!(!page1.has_previous());

    // Page two resumes at the trimmed extra row.
    transport.enqueue_ok(&rows_body(3..=5, 5));
    let page2 = client
        .query_page::<Value>(&query(), page1.next_request().unwrap())
        .unwrap();

    let request = transport.last_request();
    assert_eq!(
        request.query,
        "startkey=%22k3%22&startkey_docid=d3&limit=3"
    );
    assert_eq!(page2.rows(), &[json!(3), json!(4)]);
    assert!(page2.has_next());
    assert!(page2.has_previous());

    // Page three is short: no further page.
    transport.enqueue_ok(&rows_body(5..=5, 5));
    let page3 = client
        .query_page::<Value>(&query(), page2.next_request().unwrap())
        .unwrap();
    assert_eq!(page3.rows(), &[json!(5)]);
    assert!(!page3.has_next());
    assert!(page3.has_previous());
}

#[test]
fn test_pages_backward_through_tokens() {
    let transport = MockTransport::new();
    let client = ViewClient::new(Box::new(transport.clone()), "people");

    transport.enqueue_ok(&rows_body(1..=3, 5));
    let page1 = client
        .query_page::<Value>(&query(), &PageRequest::first_page(2))
        .unwrap();
    transport.enqueue_ok(&rows_body(3..=5, 5));
    let page2 = client
        .query_page::<Value>(&query(), page1.next_request().unwrap())
        .unwrap();

    // The previous link round-trips through its opaque token back to the
    // first-page cursor.
    let token = page2.previous_link().unwrap();
    let back = PageRequest::from_token(&token).unwrap();
    assert_eq!(back, PageRequest::first_page(2));

    transport.enqueue_ok(&rows_body(1..=3, 5));
    let replayed = client.query_page::<Value>(&query(), &back).unwrap();
    assert_eq!(replayed.rows(), page1.rows());
    assert_eq!(transport.last_request().query, "limit=3");
}

#[test]
fn test_cursor_tokens_survive_the_wire() {
    let transport = MockTransport::new();
    let client = ViewClient::new(Box::new(transport.clone()), "people");

    transport.enqueue_ok(&rows_body(1..=3, 5));
    let page1 = client
        .query_page::<Value>(&query(), &PageRequest::first_page(2))
        .unwrap();

    // A caller embeds the token in a link; the next request decodes it.
    let token = page1.next_link().unwrap();
    let resumed = PageRequest::from_token(&token).unwrap();

    transport.enqueue_ok(&rows_body(3..=5, 5));
    let page2 = client.query_page::<Value>(&query(), &resumed).unwrap();
    assert_eq!(page2.rows(), &[json!(3), json!(4)]);
    assert_eq!(
        transport.last_request().query,
        "startkey=%22k3%22&startkey_docid=d3&limit=3"
    );
}

#[test]
fn test_small_key_sets_ride_the_url() {
    let transport = MockTransport::new();
    let client = ViewClient::new(Box::new(transport.clone()), "people");

    transport.enqueue_ok(&rows_body(1..=2, 2));
    let keyed = query().keys(vec!["k1", "k2"]);
    client.query::<Value>(&keyed).unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Get);
    assert!(request.body.is_none());
    assert_eq!(request.query, "keys=%5B%22k1%22%2C%22k2%22%5D");
}

#[test]
fn test_oversized_key_sets_travel_as_post_body() {
    let transport = MockTransport::new();
    let client = ViewClient::new(Box::new(transport.clone()), "people");

    // Encoded keys array comfortably above the 3000-character threshold.
    let keys: Vec<String> = (0..300).map(|i| format!("key-{i:0>10}")).collect();
    let keyed = query().keys(keys.clone());

    transport.enqueue_ok(&rows_body(1..=2, 2));
    client.query::<Value>(&keyed).unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Post);
    assert!(request.query.is_empty());
    let body = request.body.expect("missing keys body");
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["keys"].as_array().unwrap().len(), 300);
    assert_eq!(parsed["keys"][0], json!("key-0000000000"));
}

#[test]
fn test_cache_eligibility_reaches_the_transport() {
    let transport = MockTransport::new();
    let client = ViewClient::new(Box::new(transport.clone()), "people");

    transport.enqueue_ok(&rows_body(1..=1, 1));
    client.query::<Value>(&query()).unwrap();
    assert!(!transport.last_request().cacheable);

    transport.enqueue_ok(&rows_body(1..=1, 1));
    client.query::<Value>(&query().cacheable(true)).unwrap();
    assert!(transport.last_request().cacheable);
}
