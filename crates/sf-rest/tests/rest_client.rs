//! RestClient behaviour against a local mock server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use mockito::{Matcher, Server};
use sf_rest_lite_client::{
    ClientConfiguration, ErrorKind, ProxyDescriptor, RestClient, StaticAccessToken,
    TransportOptions, JSON_CONTENT_TYPE,
};

fn config(instance_url: &str) -> ClientConfiguration {
    let token = StaticAccessToken::new("test-token");
    ClientConfiguration::new(instance_url, "58.0", 5_000, token)
}

fn read_all(mut body: impl Read) -> String {
    let mut text = String::new();
    body.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_describe() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/services/data/v58.0/sobjects/Account/describe")
        .match_query(Matcher::UrlEncoded("maxRecords".into(), "1".into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(r#"{"name":"Account"}"#)
        .create();

    let client = RestClient::new(config(&server.url())).unwrap();
    let body = client.describe("Account").unwrap();

    assert_eq!(read_all(body), r#"{"name":"Account"}"#);
    mock.assert();
}

#[test]
fn test_query_percent_encodes_soql() {
    let mut server = Server::new();
    let soql = "SELECT Id, Name FROM Account WHERE Name = 'O''Brien & Co' LIMIT 5";
    let mock = server
        .mock("GET", "/services/data/v58.0/query")
        .match_query(Matcher::UrlEncoded("q".into(), soql.into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(r#"{"totalSize":0,"done":true,"records":[]}"#)
        .create();

    let client = RestClient::new(config(&server.url())).unwrap();
    let body = client.query(soql).unwrap();

    assert!(read_all(body).contains("\"done\":true"));
    mock.assert();
}

#[test]
fn test_next_page_uses_path_verbatim() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/services/data/v47.0/query/01gAAA-2000")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(r#"{"done":true}"#)
        .create();

    // Configured for v58.0; the continuation path keeps its own version.
    let client = RestClient::new(config(&server.url())).unwrap();
    let page = "/services/data/v47.0/query/01gAAA-2000";
    let body = client.next_page(page).unwrap();

    assert_eq!(read_all(body), r#"{"done":true}"#);
    mock.assert();
}

#[test]
fn test_post_composite() {
    let mut server = Server::new();
    let payload =
        r#"{"records":[{"attributes":{"type":"Account","referenceId":"ref1"},"Name":"Acme"}]}"#;
    let created =
        r#"{"hasErrors":false,"results":[{"referenceId":"ref1","id":"001xx000003DGb2AAG"}]}"#;
    let mock = server
        .mock("POST", "/services/data/v58.0/composite/tree/Account")
        .match_header("authorization", "Bearer test-token")
        .match_header("content-type", JSON_CONTENT_TYPE)
        .match_body(payload)
        .with_status(201)
        .with_body(created)
        .create();

    let client = RestClient::new(config(&server.url())).unwrap();
    client.post_composite("Account", payload).unwrap();

    mock.assert();
}

#[test]
fn test_rejection_carries_status_and_body() {
    let mut server = Server::new();
    let _describe = server
        .mock("GET", "/services/data/v58.0/sobjects/Nope__c/describe")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":"bad"}"#)
        .create();
    let _composite = server
        .mock("POST", "/services/data/v58.0/composite/tree/Account")
        .with_status(400)
        .with_body(r#"{"error":"bad"}"#)
        .create();

    let client = RestClient::new(config(&server.url())).unwrap();

    for err in [
        client.describe("Nope__c").unwrap_err(),
        client.post_composite("Account", "{}").unwrap_err(),
    ] {
        assert!(err.is_rejected());
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(400));
        let message = err.to_string();
        assert!(message.contains("Invalid response [400]"), "{message}");
        assert!(message.contains(r#"{"error":"bad"}"#), "{message}");
    }
}

#[test]
fn test_unauthorized_is_a_rejection() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/services/data/v58.0/query")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"[{"message":"Session expired or invalid","errorCode":"INVALID_SESSION_ID"}]"#)
        .create();

    let client = RestClient::new(config(&server.url())).unwrap();
    let err = client.query("SELECT Id FROM Account").unwrap_err();

    match err.kind {
        ErrorKind::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert!(body.unwrap().contains("INVALID_SESSION_ID"));
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[test]
fn test_connection_refused_is_transport_failure() {
    let client = RestClient::new(config("http://127.0.0.1:1")).unwrap();
    let err = client.query("SELECT Id FROM Account").unwrap_err();

    assert!(err.is_transport());
    assert!(err.is_retryable());
    assert!(err.source.is_some());
    let url = "http://127.0.0.1:1/services/data/v58.0/query?q=SELECT%20Id%20FROM%20Account";
    let message = err.to_string();
    assert!(message.starts_with("Salesforce HTTP request failed ["), "{message}");
    assert!(message.contains(url), "{message}");
}

#[test]
fn test_invalid_instance_url_fails_on_use() {
    let client = RestClient::new(config("not a url")).unwrap();
    let err = client.describe("Account").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidUrl(_)));
}

#[test]
fn test_fresh_token_per_request() {
    let mut server = Server::new();
    let first = server
        .mock("GET", "/services/data/v58.0/query")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer token-0")
        .with_status(200)
        .expect(1)
        .create();
    let second = server
        .mock("GET", "/services/data/v58.0/query")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .expect(1)
        .create();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let config = ClientConfiguration::new(server.url(), "58.0", 5_000, move || {
        format!("token-{}", counter.fetch_add(1, Ordering::SeqCst))
    });
    let client = RestClient::new(config).unwrap();

    drop(client.query("SELECT Id FROM Account").unwrap());
    drop(client.query("SELECT Id FROM Account").unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    first.assert();
    second.assert();
}

#[test]
fn test_no_proxy_never_sends_proxy_authorization() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/services/data/v58.0/sobjects/Account/describe")
        .match_query(Matcher::Any)
        .match_header("proxy-authorization", Matcher::Missing)
        .with_status(407)
        .with_header("Proxy-Authenticate", "Basic realm=\"corp\"")
        .expect(1)
        .create();

    let client = RestClient::new(config(&server.url())).unwrap();
    let err = client.describe("Account").unwrap_err();

    assert_eq!(err.status(), Some(407));
    mock.assert();
}

#[test]
fn test_proxy_challenge_is_answered_once() {
    // The mock server plays the proxy for a plain-HTTP instance URL.
    let mut proxy = Server::new();
    let challenge = proxy
        .mock("GET", "/services/data/v58.0/sobjects/Account/describe")
        .match_query(Matcher::Any)
        .match_header("proxy-authorization", Matcher::Missing)
        .with_status(407)
        .with_header("Proxy-Authenticate", "Basic realm=\"corp\"")
        .expect(1)
        .create();
    let authorized = proxy
        .mock("GET", "/services/data/v58.0/sobjects/Account/describe")
        .match_query(Matcher::Any)
        .match_header("proxy-authorization", "Basic dXNlcjpwYXNz")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();

    let address = proxy.host_with_port();
    let (host, port) = address.rsplit_once(':').unwrap();
    let proxy = ProxyDescriptor::http(host, port.parse().unwrap());
    let options = TransportOptions::new().with_proxy(proxy.with_credentials("user", "pass"));
    let instance = config("http://na1.salesforce.invalid");
    let client = RestClient::with_options(instance, options).unwrap();

    let body = client.describe("Account").unwrap();
    assert_eq!(read_all(body), "{}");
    challenge.assert();
    authorized.assert();
}

/// Request line and `Proxy-Authorization` value of one CONNECT attempt.
type ConnectAttempt = (String, Option<String>);

/// An HTTP proxy that refuses every CONNECT with 407 and reports what each
/// attempt carried.
fn refusing_tunnel_proxy() -> (u16, mpsc::Receiver<ConnectAttempt>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (attempts, seen) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let Ok(read_half) = stream.try_clone() else {
                break;
            };
            let mut reader = BufReader::new(read_half);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
                continue;
            }
            let mut authorization = None;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("proxy-authorization") {
                        authorization = Some(value.trim().to_string());
                    }
                }
            }

            let _ = attempts.send((request_line.trim_end().to_string(), authorization));
            let _ = stream.write_all(
                b"HTTP/1.1 407 Proxy Authentication Required\r\n\
                  Proxy-Authenticate: Basic realm=\"corp\"\r\n\
                  Content-Length: 0\r\n\r\n",
            );
        }
    });

    (port, seen)
}

#[test]
fn test_tunnel_challenge_is_answered_once() {
    let (port, seen) = refusing_tunnel_proxy();
    let proxy = ProxyDescriptor::http("127.0.0.1", port).with_credentials("user", "pass");
    let options = TransportOptions::new().with_proxy(proxy);
    let instance = config("https://na1.salesforce.invalid");
    let client = RestClient::with_options(instance, options).unwrap();

    let err = client.describe("Account").unwrap_err();
    assert!(err.is_transport());

    let connect = "CONNECT na1.salesforce.invalid:443 HTTP/1.1".to_string();
    let attempts: Vec<_> = seen.try_iter().collect();
    assert_eq!(
        attempts,
        vec![
            (connect.clone(), None),
            (connect, Some("Basic dXNlcjpwYXNz".to_string())),
        ]
    );
}

#[test]
fn test_tunnel_challenge_without_credentials_fails() {
    let (port, seen) = refusing_tunnel_proxy();
    let options = TransportOptions::new().with_proxy(ProxyDescriptor::http("127.0.0.1", port));
    let instance = config("https://na1.salesforce.invalid");
    let client = RestClient::with_options(instance, options).unwrap();

    let err = client.describe("Account").unwrap_err();
    assert!(err.is_transport());

    let attempts: Vec<_> = seen.try_iter().collect();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].1, None);
}

#[test]
fn test_concurrent_requests_share_one_client() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/services/data/v58.0/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"done":true}"#)
        .expect(8)
        .create();

    let client = Arc::new(RestClient::new(config(&server.url())).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                let soql = format!("SELECT Id FROM Account LIMIT {i}");
                let body = client.query(&soql).unwrap();
                read_all(body)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), r#"{"done":true}"#);
    }
    mock.assert();
}
