use super::*;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn test_defaults_fill_missing_sections() {
    let file = write_config(
        r#"
[database]
url = "sqlite::memory:"
"#,
    );

    let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(settings.database.url, "sqlite::memory:");
    assert!(settings.redis.url.is_none());
    assert_eq!(settings.cache.backend, CacheBackend::Memory);
    assert_eq!(settings.cache.liveness_ttl_secs, 3600);
    assert_eq!(settings.cache.provider_ttl_secs, 30 * 24 * 3600);
    assert_eq!(settings.liveness.retry_delay_ms, 250);
    assert!(settings.liveness.prefer_https);
    assert!(!settings.availability.whois_for_unreachable);
    assert_eq!(settings.pipeline.unresolvable_status, DomainStatus::Dead);
    assert_eq!(settings.pipeline.metrics_retry.initial_backoff_secs, 300);
    assert_eq!(settings.pipeline.full_check_retry.max_backoff_secs, 300);
    assert_eq!(settings.workers.count, 5);
    assert_eq!(settings.pipeline.batch_concurrency, 8);
    assert_eq!(settings.metrics.listen_addr, "0.0.0.0:9000");
}

#[test]
fn test_provider_credentials_from_file() {
    let file = write_config(
        r#"
[providers]
daily_budget = 50

[providers.authority]
base_url = "http://127.0.0.1:1234"
api_key = "secret"

[providers.social]
base_url = "https://graph.facebook.com"
app_id = "app"
app_secret = "shh"
enabled = false

[pipeline]
unresolvable_status = "available"
"#,
    );

    let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(settings.providers.daily_budget, 50);
    assert_eq!(settings.providers.authority.base_url, "http://127.0.0.1:1234");
    assert_eq!(settings.providers.authority.api_key.as_deref(), Some("secret"));
    assert!(settings.providers.authority.enabled);
    assert!(!settings.providers.social.enabled);
    assert_eq!(settings.providers.social.app_id.as_deref(), Some("app"));
    assert!(settings.providers.seo_rank.api_key.is_none());
    assert_eq!(settings.pipeline.unresolvable_status, DomainStatus::Available);
}

#[test]
fn test_unknown_status_is_rejected() {
    let file = write_config(
        r#"
[pipeline]
unresolvable_status = "sleeping"
"#,
    );

    assert!(Settings::from_file(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_lookup_timeouts_must_fit_stage_budget() {
    let file = write_config(
        r#"
[availability]
dns_timeout_secs = 10
whois_timeout_secs = 25

[pipeline]
availability_timeout_secs = 30
"#,
    );

    let err = Settings::from_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("availability_timeout_secs"));
}

#[test]
fn test_request_timeouts_must_fit_liveness_budget() {
    let file = write_config(
        r#"
[liveness]
timeout_secs = 15

[pipeline]
liveness_timeout_secs = 30
"#,
    );

    let err = Settings::from_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("liveness_timeout_secs"));
}
