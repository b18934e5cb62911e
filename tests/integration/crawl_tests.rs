//! End-to-end crawls against mock sites

use async_trait::async_trait;
use keyword_crawler::config::FetcherConfig;
use keyword_crawler::crawler::{
    CrawlEngine, EngineConfig, FetchError, HtmlLinkExtractor, HttpPageFetcher, PageFetcher,
};
use keyword_crawler::{CrawlJob, CrawlStatus, JobId};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_config() -> FetcherConfig {
    FetcherConfig {
        user_agent: "TestCrawler/1.0".to_string(),
        connect_timeout_ms: 1000,
        read_timeout_ms: 1000,
    }
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        workers: 4,
        crawl_timeout: Duration::from_secs(10),
        shutdown_grace: Duration::from_millis(500),
        milestone: 100,
    }
}

fn http_engine() -> CrawlEngine {
    CrawlEngine::new(
        Arc::new(HttpPageFetcher::new(&fetcher_config()).expect("Failed to build client")),
        Arc::new(HtmlLinkExtractor),
        engine_config(),
    )
}

async fn mount_page(server: &MockServer, page: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_finds_keyword_on_linked_page() {
    let server = MockServer::start().await;
    let base_url = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/match">Match</a>
            <a href="http://external.com">External</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/match", "<html>this page contains the KEYword</html>").await;

    let job = Arc::new(CrawlJob::new(JobId::from("test-job"), "keyword"));
    http_engine().run(&base_url, Arc::clone(&job)).await;

    let match_url = format!("{}/match", server.uri());
    assert_eq!(job.status(), CrawlStatus::Done);
    assert_eq!(job.matched_urls(), vec![match_url.clone()]);
    assert!(job.is_visited(&base_url));
    assert!(job.is_visited(&match_url));
}

#[tokio::test]
async fn test_crawl_without_matches() {
    let server = MockServer::start().await;
    let base_url = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        r#"<a href="/about">About</a><a href="/contact">Contact</a>"#,
    )
    .await;
    mount_page(&server, "/about", "<p>About us</p>").await;
    mount_page(&server, "/contact", "<p>Contact us</p>").await;

    let job = Arc::new(CrawlJob::new(JobId::from("no-match"), "missing"));
    http_engine().run(&base_url, Arc::clone(&job)).await;

    assert_eq!(job.status(), CrawlStatus::Done);
    assert_eq!(job.matched_count(), 0);
    assert_eq!(job.visited_count(), 3);
}

#[tokio::test]
async fn test_crawl_skips_external_hosts() {
    let server = MockServer::start().await;
    let base_url = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        r#"<a href="http://external.com/keyword">External</a><a href="/local">Local</a>"#,
    )
    .await;
    mount_page(&server, "/local", "no luck here").await;

    let job = Arc::new(CrawlJob::new(JobId::from("external-skip"), "keyword"));
    http_engine().run(&base_url, Arc::clone(&job)).await;

    assert_eq!(job.status(), CrawlStatus::Done);
    assert!(!job.is_matched("http://external.com/keyword"));
    assert!(job
        .visited_urls()
        .iter()
        .all(|url| !url.contains("external.com")));
}

#[tokio::test]
async fn test_crawl_survives_error_pages() {
    let server = MockServer::start().await;
    let base_url = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        r#"<a href="/broken">Broken</a><a href="/missing">Missing</a><a href="/good">Good</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("keyword"))
        .mount(&server)
        .await;
    mount_page(&server, "/good", "a keyword lives here").await;

    let job = Arc::new(CrawlJob::new(JobId::from("errors"), "keyword"));
    http_engine().run(&base_url, Arc::clone(&job)).await;

    let broken = format!("{}/broken", server.uri());
    let missing = format!("{}/missing", server.uri());
    let good = format!("{}/good", server.uri());

    assert_eq!(job.status(), CrawlStatus::Done);
    assert!(job.is_visited(&broken));
    assert!(job.is_visited(&missing));
    assert_eq!(job.matched_urls(), vec![good]);
}

#[tokio::test]
async fn test_crawl_fetches_each_page_once() {
    let server = MockServer::start().await;
    let base_url = format!("{}/", server.uri());

    for page in ["/", "/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<a href="/">home</a><a href="/a">a</a><a href="/b">b</a>"#),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let job = Arc::new(CrawlJob::new(JobId::from("cycles"), "keyword"));
    http_engine().run(&base_url, Arc::clone(&job)).await;

    assert_eq!(job.visited_count(), 3);
    server.verify().await;
}

/// Fetcher whose pages never arrive
struct HangingFetcher;

#[async_trait]
impl PageFetcher for HangingFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

#[tokio::test]
async fn test_timeout_still_reaches_done() {
    let engine = CrawlEngine::new(
        Arc::new(HangingFetcher),
        Arc::new(HtmlLinkExtractor),
        EngineConfig {
            crawl_timeout: Duration::from_millis(300),
            shutdown_grace: Duration::from_millis(100),
            ..engine_config()
        },
    );
    let job = Arc::new(CrawlJob::new(JobId::from("timeout"), "keyword"));

    tokio::time::timeout(
        Duration::from_secs(5),
        engine.run("https://example.com/", Arc::clone(&job)),
    )
    .await
    .expect("crawl must not outlive its ceiling");

    assert_eq!(job.status(), CrawlStatus::Done);
    assert_eq!(job.visited_urls(), vec!["https://example.com/"]);
    assert_eq!(job.matched_count(), 0);
}

#[tokio::test]
async fn test_timeout_keeps_partial_matches() {
    let server = MockServer::start().await;
    let base_url = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        r#"<p>keyword on the seed</p><a href="/slow">Slow</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("keyword, too late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let engine = CrawlEngine::new(
        Arc::new(HttpPageFetcher::new(&fetcher_config()).expect("Failed to build client")),
        Arc::new(HtmlLinkExtractor),
        EngineConfig {
            crawl_timeout: Duration::from_millis(500),
            shutdown_grace: Duration::from_millis(100),
            ..engine_config()
        },
    );
    let job = Arc::new(CrawlJob::new(JobId::from("partial"), "keyword"));
    engine.run(&base_url, Arc::clone(&job)).await;

    let slow = format!("{}/slow", server.uri());
    assert_eq!(job.status(), CrawlStatus::Done);
    assert_eq!(job.matched_urls(), vec![base_url.clone()]);
    assert!(job.is_visited(&base_url));
    assert!(job.is_visited(&slow));
}

#[tokio::test]
async fn test_malformed_seed_reaches_done() {
    let job = Arc::new(CrawlJob::new(JobId::from("bad-seed"), "keyword"));
    http_engine().run("://no-scheme", Arc::clone(&job)).await;

    assert_eq!(job.status(), CrawlStatus::Done);
    assert_eq!(job.visited_count(), 0);
}
