//! Integration tests for hostscan.
//!
//! The pipeline runs against `wiremock` stand-ins for the DNS-over-HTTPS
//! and host intelligence services, so no external network is touched.
//! Binary tests only exercise paths that fail before any network call.

use std::path::PathBuf;
use std::process::Command;
use std::str;
use std::time::Duration;

use hostscan::assistant::ChatCompletionsClient;
use hostscan::config::AssistantConfig;
use hostscan::{
    ChatMessage, Config, EnrichmentRecord, ResolvedHost, RiskLevel, ScanError, ScanResult,
    Scanner, ask_about_scan, classify_risk, compose,
};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("hostscan");
    path
}

/// Scanner pointed at the mock servers with a short enrichment timeout.
fn scanner_for(dns: &MockServer, intel: &MockServer, timeout: Duration) -> Scanner {
    let mut config = Config::default();
    config.endpoints.dns_url = format!("{}/resolve", dns.uri());
    config.endpoints.intel_url = intel.uri();
    config.network.enrichment_timeout = timeout;
    config.network.dns_timeout = Duration::from_secs(2);
    Scanner::from_config(&config).unwrap()
}

async fn mount_intel(server: &MockServer, ip: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{ip}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Scenario A: literal IP, two ports, no vulns.
#[tokio::test]
async fn test_ip_literal_low_risk() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    mount_intel(&intel, "8.8.8.8", json!({"ip": "8.8.8.8", "ports": [53, 443], "vulns": []})).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&dns)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let result = scanner.run_scan("8.8.8.8").await.unwrap();

    assert_eq!(result.ip(), "8.8.8.8");
    assert_eq!(result.ports(), &[53, 443]);
    assert_eq!(result.risk_level(), RiskLevel::Low);
    assert!(
        result
            .summary()
            .contains("🔐 Vulnerabilities (CVEs): No known security flaws detected")
    );
    assert!(result.summary().ends_with("⚠️ Risk Level: Low"));
}

/// Scenario B: 12 ports and one vuln is High.
#[tokio::test]
async fn test_many_ports_high_risk() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    let ports: Vec<u16> = (1..=12).collect();
    mount_intel(&intel, "1.1.1.1", json!({"ports": ports, "vulns": ["CVE-1"]})).await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let result = scanner.run_scan("1.1.1.1").await.unwrap();
    assert_eq!(result.risk_level(), RiskLevel::High);
    assert!(result.summary().contains("1 security flaws found - CVE-1"));
}

/// Scenario C: ten vulns and no ports is Critical.
#[tokio::test]
async fn test_many_vulns_critical_risk() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    let vulns: Vec<String> = (0..10).map(|i| format!("CVE-2023-{i:04}")).collect();
    mount_intel(&intel, "9.9.9.9", json!({"ip": "9.9.9.9", "ports": [], "vulns": vulns})).await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let result = scanner.run_scan("9.9.9.9").await.unwrap();
    assert_eq!(result.risk_level(), RiskLevel::Critical);
    assert!(result.ports().is_empty());
    assert!(result.summary().contains("(+7 more)"));
}

/// Scenario D: 404 from the intelligence source is an empty, Low result.
#[tokio::test]
async fn test_not_found_is_empty_result() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.2.3.4"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "No information available"})),
        )
        .mount(&intel)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let result = scanner.run_scan("1.2.3.4").await.unwrap();
    assert_eq!(result.ip(), "1.2.3.4");
    assert!(result.ports().is_empty());
    assert!(result.vulns().is_empty());
    assert!(result.cpes().is_empty());
    assert!(result.hostnames().is_empty());
    assert!(result.tags().is_empty());
    assert_eq!(result.risk_level(), RiskLevel::Low);
}

/// Scenario E: a domain with zero answers fails resolution, naming the domain.
#[tokio::test]
async fn test_domain_without_answers_fails_resolution() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resolve"))
        .and(query_param("name", "nonexistent.invalid"))
        .and(query_param("type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": 3})))
        .expect(1)
        .mount(&dns)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let err = scanner.run_scan("nonexistent.invalid").await.unwrap_err();
    match &err {
        ScanError::ResolutionFailed { target, .. } => assert_eq!(target, "nonexistent.invalid"),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(err.to_string().contains("nonexistent.invalid"));
}

/// Scenario F: enrichment slower than the timeout is UpstreamUnavailable.
#[tokio::test]
async fn test_enrichment_timeout_is_unavailable() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/5.5.5.5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ports": [80]}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&intel)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_millis(200));
    match scanner.run_scan("5.5.5.5").await {
        Err(e @ ScanError::UpstreamUnavailable { .. }) => assert!(e.is_retryable()),
        other => panic!("unexpected: {other:?}"),
    }
}

/// Domain targets resolve through DoH and enrich the first A record.
#[tokio::test]
async fn test_domain_resolves_then_enriches() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resolve"))
        .and(query_param("name", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Answer": [
                {"name": "example.com.", "type": 1, "TTL": 300, "data": "93.184.216.34"},
                {"name": "example.com.", "type": 1, "TTL": 300, "data": "93.184.216.35"}
            ]
        })))
        .mount(&dns)
        .await;
    Mock::given(method("GET"))
        .and(path("/93.184.216.34"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "93.184.216.34",
            "ports": [80, 443],
            "hostnames": ["example.com"],
            "cpes": ["cpe:/a:apache:http_server"]
        })))
        .expect(1)
        .mount(&intel)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let result = scanner.run_scan(" Example.com ").await.unwrap();
    assert_eq!(result.ip(), "93.184.216.34");
    assert!(result.summary().contains("🌍 Hostnames: example.com"));
    assert!(result.summary().contains("🧩 CPE: cpe:/a:apache:http_server"));
}

/// DNS provider errors surface as ResolutionFailed.
#[tokio::test]
async fn test_dns_http_error_fails_resolution() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resolve"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&dns)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    assert!(matches!(
        scanner.run_scan("example.org").await,
        Err(ScanError::ResolutionFailed { .. })
    ));
}

/// Non-404 error statuses carry the status but not the body.
#[tokio::test]
async fn test_upstream_error_status() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/7.7.7.7"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited: internal-id-42"))
        .mount(&intel)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let err = scanner.run_scan("7.7.7.7").await.unwrap_err();
    match &err {
        ScanError::UpstreamError { status, detail, .. } => {
            assert_eq!(*status, 429);
            assert!(detail.contains("rate limited"));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(err.to_string().contains("429"));
    assert!(!err.to_string().contains("internal-id-42"));
    assert_eq!(err.http_status(), 502);
}

/// Non-JSON success bodies are MalformedUpstreamResponse.
#[tokio::test]
async fn test_malformed_body() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/6.6.6.6"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&intel)
        .await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    assert!(matches!(
        scanner.run_scan("6.6.6.6").await,
        Err(ScanError::MalformedUpstreamResponse { .. })
    ));
}

/// Unreachable intelligence service is UpstreamUnavailable.
#[tokio::test]
async fn test_unreachable_service() {
    let dns = MockServer::start().await;
    let mut config = Config::default();
    config.endpoints.dns_url = format!("{}/resolve", dns.uri());
    // Reserved port on localhost; nothing listens there.
    config.endpoints.intel_url = "http://127.0.0.1:9".to_string();
    let scanner = Scanner::from_config(&config).unwrap();
    assert!(matches!(
        scanner.run_scan("8.8.4.4").await,
        Err(ScanError::UpstreamUnavailable { .. })
    ));
}

/// Independent scans share one scanner without interfering.
#[tokio::test]
async fn test_concurrent_scans_are_independent() {
    let dns = MockServer::start().await;
    let intel = MockServer::start().await;
    mount_intel(&intel, "10.0.0.1", json!({"ports": [22]})).await;
    mount_intel(&intel, "10.0.0.2", json!({"vulns": ["CVE-A", "CVE-B", "CVE-C", "CVE-D", "CVE-E"]})).await;
    mount_intel(&intel, "10.0.0.3", json!({"ports": (1..=20).collect::<Vec<u16>>()})).await;

    let scanner = scanner_for(&dns, &intel, Duration::from_secs(5));
    let (a, b, c) = tokio::join!(
        scanner.run_scan("10.0.0.1"),
        scanner.run_scan("10.0.0.2"),
        scanner.run_scan("10.0.0.3"),
    );
    assert_eq!(a.unwrap().risk_level(), RiskLevel::Low);
    assert_eq!(b.unwrap().risk_level(), RiskLevel::High);
    let c = c.unwrap();
    assert_eq!(c.ip(), "10.0.0.3");
    assert_eq!(c.risk_level(), RiskLevel::Critical);
}

/// Chat client pointed at the mock server with a test key.
fn assistant_for(server: &MockServer, timeout: Duration) -> ChatCompletionsClient {
    let config = AssistantConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        timeout,
        ..Default::default()
    };
    ChatCompletionsClient::from_config(&config, "hostscan-test/1").unwrap()
}

fn telnet_host() -> ScanResult {
    let record = EnrichmentRecord {
        ip: "8.8.8.8".to_string(),
        ports: vec![23, 443],
        vulns: vec!["CVE-2020-10188".to_string()],
        ..Default::default()
    };
    let level = classify_risk(&record);
    compose(&ResolvedHost::parse("8.8.8.8").unwrap(), record, level)
}

async fn mount_completion(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(template)
        .mount(server)
        .await;
}

/// The request carries the key, the model settings and the scan as the system message.
#[tokio::test]
async fn test_assistant_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Disable telnet on port 23."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = assistant_for(&server, Duration::from_secs(5));
    let scan = telnet_host();
    let reply = ask_about_scan(&client, &[ChatMessage::user("What should I fix?")], Some(&scan))
        .await
        .unwrap();
    assert_eq!(reply, "Disable telnet on port 23.");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "deepseek/deepseek-r1-0528:free");
    assert_eq!(body["max_tokens"], 1000);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.contains("IP: 8.8.8.8"));
    assert!(system.contains("Open Ports: 23, 443"));
    assert!(system.contains("Risk Level: Medium"));
    assert_eq!(messages[1], json!({"role": "user", "content": "What should I fix?"}));
}

/// Error statuses become Assistant errors without leaking the body.
#[tokio::test]
async fn test_assistant_error_status() {
    let server = MockServer::start().await;
    mount_completion(
        &server,
        ResponseTemplate::new(500).set_body_string("provider trace 7f3a-secret"),
    )
    .await;

    let client = assistant_for(&server, Duration::from_secs(5));
    let err = ask_about_scan(&client, &[ChatMessage::user("hi")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Assistant { .. }));
    assert!(err.to_string().contains("500"));
    assert!(!err.to_string().contains("7f3a-secret"));
}

/// An empty choices list is an Assistant error.
#[tokio::test]
async fn test_assistant_no_choices() {
    let server = MockServer::start().await;
    mount_completion(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"choices": []})),
    )
    .await;

    let client = assistant_for(&server, Duration::from_secs(5));
    let err = ask_about_scan(&client, &[ChatMessage::user("hi")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Assistant { .. }));
    assert!(err.to_string().contains("no choices"));
}

/// A null reply content is an Assistant error, not a parse failure.
#[tokio::test]
async fn test_assistant_null_content() {
    let server = MockServer::start().await;
    mount_completion(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })),
    )
    .await;

    let client = assistant_for(&server, Duration::from_secs(5));
    let err = ask_about_scan(&client, &[ChatMessage::user("hi")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Assistant { .. }));
    assert!(err.to_string().contains("empty reply"));
}

/// A reply slower than the timeout is an Assistant error.
#[tokio::test]
async fn test_assistant_timeout() {
    let server = MockServer::start().await;
    mount_completion(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let client = assistant_for(&server, Duration::from_millis(200));
    let err = ask_about_scan(&client, &[ChatMessage::user("hi")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Assistant { .. }));
    assert!(err.to_string().contains("timed out"));
}

/// Invalid input is rejected by the binary before any network call.
#[test]
fn test_cli_invalid_target() {
    let output = Command::new(get_binary_path())
        .arg("not a host!")
        .arg("--plain")
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(
        stderr.contains("Invalid IP or domain"),
        "Should reject invalid target: {}",
        stderr
    );
}

/// Schema generation needs no target and no network.
#[test]
fn test_cli_generate_schema() {
    let output = Command::new(get_binary_path())
        .arg("--generate-schema")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    let schema: serde_json::Value = serde_json::from_str(stdout).unwrap();
    assert!(schema["properties"]["riskLevel"].is_object());
}
