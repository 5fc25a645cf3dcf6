// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::engines::traits::ProbeResponse;
use crate::infrastructure::cache::cache_layer::CacheTtls;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// 按 URL 返回预设结果的探测引擎
#[derive(Default)]
struct ScriptedProbe {
    responses: HashMap<String, (u16, Option<&'static str>)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    fn respond(mut self, url: &str, status: u16, body: Option<&'static str>) -> Self {
        self.responses.insert(url.to_string(), (status, body));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpProbe for ScriptedProbe {
    async fn probe(&self, request: &ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        self.calls.lock().unwrap().push(request.url.clone());
        match self.responses.get(&request.url) {
            Some((status, body)) => Ok(ProbeResponse {
                status_code: *status,
                content_type: body.map(|_| "text/html; charset=utf-8".to_string()),
                body: body.map(str::to_string),
                response_time_ms: 5,
            }),
            None => Err(ProbeError::Connect("connection refused".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn checker(probe: Arc<ScriptedProbe>) -> LivenessChecker {
    LivenessChecker::new(
        probe,
        CacheLayer::in_memory(CacheTtls::default()),
        LivenessConfig::default(),
    )
}

#[tokio::test]
async fn test_https_success_with_title() {
    let probe = Arc::new(ScriptedProbe::default().respond(
        "https://example.com/",
        200,
        Some("<html><head><title>  Example\n Domain </title></head></html>"),
    ));

    let result = checker(probe.clone()).check("example.com").await;

    assert_eq!(result.http_status, 200);
    assert_eq!(result.protocol, Protocol::Https);
    assert_eq!(result.title.as_deref(), Some("Example Domain"));
    assert_eq!(probe.calls(), vec!["https://example.com/"]);
}

#[tokio::test(start_paused = true)]
async fn test_falls_back_to_http_after_delay() {
    let probe = Arc::new(ScriptedProbe::default().respond("http://example.com/", 404, None));

    let started = tokio::time::Instant::now();
    let result = checker(probe.clone()).check("example.com").await;

    assert_eq!(result.http_status, 404);
    assert_eq!(result.protocol, Protocol::Http);
    assert!(result.title.is_none());
    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(
        probe.calls(),
        vec!["https://example.com/", "http://example.com/"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_both_protocols_failing_is_unreachable() {
    let probe = Arc::new(ScriptedProbe::default());

    let result = checker(probe.clone()).check("example.com").await;

    assert_eq!(result, LivenessResult::unreachable());
    assert_eq!(probe.calls().len(), 2);
}

#[tokio::test]
async fn test_redirect_status_is_recorded_without_following() {
    let probe = Arc::new(ScriptedProbe::default().respond("https://example.com/", 301, None));

    let result = checker(probe.clone()).check("example.com").await;

    assert_eq!(result.http_status, 301);
    assert_eq!(probe.calls().len(), 1);
}

#[tokio::test]
async fn test_second_check_is_served_from_cache() {
    let probe = Arc::new(ScriptedProbe::default().respond(
        "https://example.com/",
        200,
        Some("<title>Cached</title>"),
    ));
    let checker = checker(probe.clone());

    let first = checker.check("example.com").await;
    let second = checker.check("example.com").await;

    assert_eq!(first, second);
    assert_eq!(probe.calls().len(), 1);
}

#[tokio::test]
async fn test_prefer_http_starts_with_http() {
    let probe = Arc::new(ScriptedProbe::default().respond("http://example.com/", 200, None));
    let checker = LivenessChecker::new(
        probe.clone(),
        CacheLayer::in_memory(CacheTtls::default()),
        LivenessConfig {
            prefer_https: false,
            ..LivenessConfig::default()
        },
    );

    let result = checker.check("example.com").await;

    assert_eq!(result.protocol, Protocol::Http);
    assert_eq!(probe.calls(), vec!["http://example.com/"]);
}

#[test]
fn test_title_falls_back_to_og_title() {
    let html = r#"<html><head><title>   </title>
        <meta property="og:title" content="Open Graph Title"></head></html>"#;
    assert_eq!(parse_page(html).0.as_deref(), Some("Open Graph Title"));
}

#[test]
fn test_title_missing() {
    let (title, meta) = parse_page("<html><body>no title</body></html>");
    assert_eq!(title, None);
    assert!(meta.is_empty());
}

#[test]
fn test_title_is_truncated() {
    let html = format!("<title>{}</title>", "a".repeat(2000));
    assert_eq!(parse_page(&html).0.unwrap().len(), MAX_TITLE_CHARS);
}

#[test]
fn test_meta_tags_are_extracted() {
    let html = r#"<html><head>
        <meta name="description" content="  An example
            site ">
        <meta name="keywords" content="example, domains">
        <meta property="og:description" content="Shared description">
        </head></html>"#;

    let (_, meta) = parse_page(html);

    assert_eq!(meta.description.as_deref(), Some("An example site"));
    assert_eq!(meta.keywords.as_deref(), Some("example, domains"));
    assert_eq!(meta.og_description.as_deref(), Some("Shared description"));
}

#[tokio::test]
async fn test_error_page_carries_no_meta() {
    let probe = Arc::new(ScriptedProbe::default().respond(
        "https://example.com/",
        500,
        Some(r#"<title>Oops</title><meta name="description" content="Server error">"#),
    ));

    let result = checker(probe).check("example.com").await;

    assert_eq!(result.http_status, 500);
    assert!(result.title.is_none());
    assert!(result.meta.is_empty());
}

#[tokio::test]
async fn test_meta_from_live_server() {
    use crate::engines::reqwest_engine::ReqwestProbe;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Shop</title>
            <meta name="description" content="Hand made goods">
            <meta name="keywords" content="shop, goods">
            <meta property="og:description" content="Goods for sale">
            </head></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let checker = LivenessChecker::new(
        Arc::new(ReqwestProbe::new("domainrs-test").unwrap()),
        CacheLayer::in_memory(CacheTtls::default()),
        LivenessConfig {
            prefer_https: false,
            ..LivenessConfig::default()
        },
    );

    let result = checker.check(&server.address().to_string()).await;

    assert_eq!(result.http_status, 200);
    assert_eq!(result.protocol, Protocol::Http);
    assert_eq!(result.title.as_deref(), Some("Shop"));
    assert_eq!(result.meta.description.as_deref(), Some("Hand made goods"));
    assert_eq!(result.meta.keywords.as_deref(), Some("shop, goods"));
    assert_eq!(result.meta.og_description.as_deref(), Some("Goods for sale"));
}
