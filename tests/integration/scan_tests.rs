//! Integration tests for the scanner
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full scan cycle end-to-end through the real HTTP fetcher.

use ripple_scan::config::{parse_config, FetcherConfig, ScannerConfig};
use ripple_scan::crawler::{scan, HtmlLinkExtractor, HttpFetcher};
use ripple_scan::output::ChannelObserver;
use ripple_scan::{
    Disposition, RunState, ScanError, ScanEvent, ScanOptions, Scanner, SiteStatus, StartOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn anchors(base: &str, routes: &[&str]) -> String {
    let links: String = routes
        .iter()
        .map(|r| format!(r#"<a href="{}{}">{}</a>"#, base, r, r))
        .collect();
    format!("<html><body>{}</body></html>", links)
}

fn http_scanner(fetcher: FetcherConfig) -> (Arc<Scanner>, UnboundedReceiver<ScanEvent>) {
    let (observer, events) = ChannelObserver::new();
    let scanner = Scanner::new(
        Arc::new(HttpFetcher::new(&fetcher).expect("Failed to build client")),
        Arc::new(HtmlLinkExtractor::new()),
        Arc::new(observer),
    )
    .with_pause_poll(Duration::from_millis(10));
    (Arc::new(scanner), events)
}

fn drain(events: &mut UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

fn completed(outcome: StartOutcome) -> ripple_scan::RunSummary {
    match outcome {
        StartOutcome::Completed(summary) => summary,
        other => panic!("expected a completed run, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_scan_over_http() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/", anchors(&base, &["/page1", "/page2"])).await;
    mount_page(
        &mock_server,
        "/page1",
        format!(
            "<html><body><p>the needle is here</p>{}</body></html>",
            anchors(&base, &["/"])
        ),
    )
    .await;
    mount_page(&mock_server, "/page2", anchors(&base, &["/page3", "/page1"])).await;
    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (scanner, mut events) = http_scanner(FetcherConfig::default());
    let seed = format!("{}/", base);
    let summary = completed(
        scanner
            .start(ScanOptions::new(seed.clone(), 4, "needle", 10))
            .await
            .expect("Scan failed"),
    );

    assert_eq!(summary.disposition, Disposition::Completed);
    assert_eq!(summary.handled.len(), 4);
    assert_eq!(summary.registered, 4);
    assert_eq!(summary.layers, 3);
    assert_eq!(summary.count(SiteStatus::Found), 1);
    assert_eq!(summary.count(SiteStatus::NotFound), 2);
    assert_eq!(summary.count(SiteStatus::Error), 1);
    assert_eq!(summary.found_urls(), vec![format!("{}/page1", base)]);

    let failed = summary
        .handled
        .iter()
        .find(|s| s.status == SiteStatus::Error)
        .unwrap();
    assert_eq!(failed.url, format!("{}/page3", base));
    assert_eq!(failed.error_text.as_deref(), Some("HTTP status 500"));

    // Every page fetched exactly once despite the back links
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);

    let events = drain(&mut events);
    assert_eq!(events.first(), Some(&ScanEvent::Reset));
    assert!(events.contains(&ScanEvent::Discovery {
        url: format!("{}/page1", base)
    }));
    assert_eq!(
        events.last(),
        Some(&ScanEvent::WorkCompleted {
            disposition: Disposition::Completed
        })
    );
}

#[tokio::test]
async fn test_scan_url_count_caps_requests() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let routes = ["/a", "/b", "/c", "/d", "/e"];
    mount_page(&mock_server, "/", anchors(&base, &routes)).await;
    for route in routes {
        mount_page(&mock_server, route, "<p>leaf</p>".to_string()).await;
    }

    let config = ScannerConfig::default();
    let summary = scan(&config, ScanOptions::new(format!("{}/", base), 2, "needle", 3))
        .await
        .expect("Scan failed");

    assert_eq!(summary.handled.len(), 3);
    assert_eq!(summary.registered, 3);

    // The first two links in document order win the remaining slots
    let mut urls: Vec<String> = summary.handled.iter().map(|s| s.url.clone()).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
        ]
    );

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_invalid_options_make_no_requests() {
    let mock_server = MockServer::start().await;

    let (scanner, mut events) = http_scanner(FetcherConfig::default());
    let result = scanner
        .start(ScanOptions::new(
            format!("ftp://{}/", mock_server.address()),
            0,
            "",
            0,
        ))
        .await;

    let err = match result {
        Err(ScanError::Config(err)) => err.to_string(),
        other => panic!("expected a configuration error, got {:?}", other),
    };
    assert_eq!(err.lines().count(), 4);

    assert_eq!(scanner.state(), RunState::Stopped);
    assert!(mock_server.received_requests().await.unwrap().is_empty());

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ScanEvent::Log { .. }));
}

#[tokio::test]
async fn test_slow_page_times_out_as_error() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/", anchors(&base, &["/slow"])).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("needle")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = parse_config(
        r#"
[fetcher]
timeout-secs = 1
connect-timeout-secs = 1
"#,
    )
    .expect("Failed to parse config");

    let (scanner, _events) = http_scanner(config.fetcher);
    let summary = completed(
        scanner
            .start(ScanOptions::new(format!("{}/", base), 2, "needle", 10))
            .await
            .expect("Scan failed"),
    );

    assert_eq!(summary.disposition, Disposition::Completed);
    let slow = summary
        .handled
        .iter()
        .find(|s| s.url.ends_with("/slow"))
        .unwrap();
    assert_eq!(slow.status, SiteStatus::Error);
    assert_eq!(slow.error_text.as_deref(), Some("Request timed out"));
}

#[tokio::test]
async fn test_stop_interrupts_slow_layer() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let routes = ["/s1", "/s2", "/s3"];
    mount_page(&mock_server, "/", anchors(&base, &routes)).await;
    for route in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("needle")
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&mock_server)
            .await;
    }

    let (scanner, mut events) = http_scanner(FetcherConfig::default());
    let run = {
        let scanner = scanner.clone();
        let seed = format!("{}/", base);
        tokio::spawn(async move { scanner.start(ScanOptions::new(seed, 3, "needle", 10)).await })
    };

    // Wait until the seed is handled and the slow layer is in flight
    let mut downloading = 0;
    while downloading < 4 {
        match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Some(ScanEvent::SiteDownloading { .. })) => downloading += 1,
            Ok(Some(_)) => {}
            other => panic!("scan stalled: {:?}", other),
        }
    }
    assert!(scanner.stop());

    let summary = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("stop did not interrupt the layer")
        .unwrap()
        .unwrap();
    let summary = completed(summary);

    assert_eq!(summary.disposition, Disposition::Canceled);
    assert_eq!(summary.handled.len(), 1);
    assert_eq!(summary.handled[0].id, 0);

    let rest = drain(&mut events);
    assert_eq!(
        rest.last(),
        Some(&ScanEvent::WorkCompleted {
            disposition: Disposition::Canceled
        })
    );
}
