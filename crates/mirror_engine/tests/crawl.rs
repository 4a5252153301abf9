use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mirror_core::HostPolicy;
use mirror_engine::{
    CrawlSummary, Crawler, FetchSettings, Frontier, MirrorWriter, ReqwestFetcher,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_crawl(seeds: &[Url], root: &Path, wait_ms: u64) -> CrawlSummary {
    engine_logging::initialize_for_tests();
    let policy = HostPolicy::from_seeds(seeds);
    let frontier = Arc::new(Frontier::new(100));
    for seed in seeds {
        frontier.enqueue(seed).await;
    }
    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
    let writer = MirrorWriter::new(root.to_path_buf());
    let crawler = Arc::new(Crawler::new(
        frontier,
        policy,
        fetcher,
        writer,
        Duration::from_millis(wait_ms),
    ));
    crawler.run().await
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn page_without_links_terminates_after_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solo.html"))
        .respond_with(html("<html><body>nothing to follow</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/solo.html", server.uri())).unwrap();
    let summary = run_crawl(&[seed], temp.path(), 5).await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(temp.path().join("solo.html").is_file());
}

#[tokio::test]
async fn linked_resources_are_mirrored_and_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(concat!(
            r#"<html><head>"#,
            r#"<link rel="stylesheet" href="style.css">"#,
            r#"<script src="app.js"></script>"#,
            r#"</head><body>"#,
            r#"<a href="page2.html">next</a>"#,
            r#"<a href="page2.html">next again</a>"#,
            r#"<img src="img/logo.gif">"#,
            r#"</body></html>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2.html"))
        .respond_with(html(r#"<html><body><a href="index.html">back</a></body></html>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"body { background: url("img/bg.png") no-repeat; }"#,
            "text/css",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("draw();", "text/javascript"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(&b"GIF89a"[..], "image/gif"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/bg.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(&b"\x89PNG"[..], "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/index.html", server.uri())).unwrap();
    let summary = run_crawl(&[seed], temp.path(), 5).await;

    assert_eq!(summary.fetched, 6);
    assert_eq!(summary.failed, 0);
    for mirrored in [
        "index.html",
        "page2.html",
        "style.css",
        "app.js",
        "img/logo.gif",
        "img/bg.png",
    ] {
        assert!(temp.path().join(mirrored).is_file(), "missing {mirrored}");
    }
}

#[tokio::test]
async fn off_host_references_never_reach_the_transport() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(&format!(
            r#"<html><body><a href="{}/other.html">away</a></body></html>"#,
            elsewhere.uri()
        )))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/index.html", server.uri())).unwrap();
    let summary = run_crawl(&[seed], temp.path(), 5).await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.skipped, 1);
    assert!(elsewhere.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn work_discovered_mid_flight_delays_completion() {
    let server = MockServer::start().await;
    // While this response is in transit the queue is empty; the crawl must
    // not declare completion until the discovered link is fetched too.
    Mock::given(method("GET"))
        .and(path("/slow.html"))
        .respond_with(
            html(r#"<html><body><a href="follow.html">later</a></body></html>"#)
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/follow.html"))
        .respond_with(html("<html><body>tail</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/slow.html", server.uri())).unwrap();
    let summary = run_crawl(&[seed], temp.path(), 10).await;

    assert_eq!(summary.fetched, 2);
    assert!(temp.path().join("slow.html").is_file());
    assert!(temp.path().join("follow.html").is_file());
}

#[tokio::test]
async fn failed_fetches_are_abandoned_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(concat!(
            r#"<html><body>"#,
            r#"<a href="missing.html">gone</a>"#,
            r#"<a href="ok.html">fine</a>"#,
            r#"</body></html>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok.html"))
        .respond_with(html("<html><body>fine</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/index.html", server.uri())).unwrap();
    let summary = run_crawl(&[seed], temp.path(), 5).await;

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.failed, 1);
    assert!(!temp.path().join("missing.html").exists());
}

#[tokio::test]
async fn redirected_pages_resolve_links_against_final_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/new/dir/page.html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/dir/page.html"))
        .respond_with(html(r#"<html><body><img src="pic.gif"></body></html>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/dir/pic.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(&b"GIF89a"[..], "image/gif"))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/old", server.uri())).unwrap();
    let summary = run_crawl(&[seed], temp.path(), 5).await;

    assert_eq!(summary.fetched, 2);
    // The page is mirrored where the redirect landed, not where it started.
    assert!(temp.path().join("new/dir/page.html").is_file());
    assert!(temp.path().join("new/dir/pic.gif").is_file());
    assert!(!temp.path().join("old").exists());
}

#[tokio::test]
async fn crawl_with_multiple_seed_hosts_visits_both() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a.html"))
        .respond_with(html("<html><body>first</body></html>"))
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.html"))
        .respond_with(html("<html><body>second</body></html>"))
        .expect(1)
        .mount(&second)
        .await;

    let temp = TempDir::new().unwrap();
    let seeds = vec![
        Url::parse(&format!("{}/a.html", first.uri())).unwrap(),
        Url::parse(&format!("{}/b.html", second.uri())).unwrap(),
    ];
    let summary = run_crawl(&seeds, temp.path(), 5).await;

    assert_eq!(summary.fetched, 2);
    assert!(temp.path().join("a.html").is_file());
    assert!(temp.path().join("b.html").is_file());
}
