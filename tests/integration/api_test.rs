// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use super::helpers::{create_test_app, create_test_app_with, Stages};
use domainrs::domain::lookup::dns::DnsFields;
use domainrs::domain::models::check_job::JobStatus;
use domainrs::domain::repositories::check_job_repository::CheckJobRepository;
use domainrs::domain::repositories::domain_repository::DomainRepository;

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

/// 同步检查返回完整报告且不写数据库
#[tokio::test]
async fn test_check_domain_returns_report() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/domains/check")
        .json(&json!({ "domain": "HTTPS://WWW.Example.com/" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["domain"], "example.com");
    assert_eq!(body["status"], "occupied");
    assert_eq!(body["available"], false);
    assert_eq!(body["http_status"], 200);
    assert_eq!(body["title"], "Example Domain");
    assert_eq!(body["meta"]["description"], "Illustrative examples");
    assert_eq!(body["whois"]["registrar"], "Example Registrar");
    assert!(body["errors"].as_array().unwrap().is_empty());

    let stored = app
        .domains
        .find_by_name(Uuid::nil(), "example.com")
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_check_unresolvable_domain_reports_dead() {
    let app = create_test_app_with(Stages {
        http_status: None,
        dns: Ok(DnsFields::default()),
        ..Stages::default()
    })
    .await;

    let response = app
        .server
        .post("/v1/domains/check")
        .json(&json!({ "domain": "nothing-here-12345.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "dead");
    assert_eq!(body["http_status"], 0);
}

#[tokio::test]
async fn test_check_rejects_invalid_domain() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/domains/check")
        .json(&json!({ "domain": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/v1/domains/check")
        .json(&json!({ "domain": "not a domain" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"].as_str().unwrap().contains("invalid domain"));
}

#[tokio::test]
async fn test_enqueue_check_for_known_domain() {
    let app = create_test_app().await;
    let domain = app.seed_domain("example.com").await;

    let response = app
        .server
        .post(&format!("/v1/domains/{}/check", domain.id))
        .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["queued_count"], 1);

    let job_id = Uuid::parse_str(body["job_ids"][0].as_str().unwrap()).unwrap();
    let job = app.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.domain_id, domain.id);
    assert_eq!(job.status, JobStatus::Queued);
}

#[tokio::test]
async fn test_enqueue_check_for_unknown_domain_is_not_found() {
    let app = create_test_app().await;

    let response = app
        .server
        .post(&format!("/v1/domains/{}/check", Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

/// 批量入队：重复ID只入队一次，未知ID单独列出
#[tokio::test]
async fn test_enqueue_batch_reports_missing_ids() {
    let app = create_test_app().await;
    let a = app.seed_domain("a.com").await;
    let b = app.seed_domain("b.com").await;
    let unknown = Uuid::new_v4();

    let response = app
        .server
        .post("/v1/domains/check-batch")
        .json(&json!({ "domain_ids": [a.id, b.id, a.id, unknown] }))
        .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["queued_count"], 2);
    assert_eq!(body["job_ids"].as_array().unwrap().len(), 2);
    assert_eq!(body["missing"], json!([unknown]));
}

#[tokio::test]
async fn test_enqueue_batch_rejects_empty_list() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/domains/check-batch")
        .json(&json!({ "domain_ids": [] }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_domain() {
    let app = create_test_app().await;
    let domain = app.seed_domain("example.com").await;

    let response = app.server.get(&format!("/v1/domains/{}", domain.id)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["id"], domain.id.to_string());
    assert_eq!(body["name"], "example.com");
    assert_eq!(body["status"], "new");
    assert!(body["metric"].is_null());

    let response = app
        .server
        .get(&format!("/v1/domains/{}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalidate_cache() {
    let app = create_test_app().await;

    // Populate the liveness, DNS and WHOIS namespaces
    app.server
        .post("/v1/domains/check")
        .json(&json!({ "domain": "example.com" }))
        .await;

    let response = app.server.delete("/v1/cache/Example.com").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["domain"], "example.com");
    assert!(body["invalidated"].as_u64().unwrap() >= 1);
}

/// 批量同步检查：返回汇总计数，非法输入单独列出
#[tokio::test]
async fn test_batch_check_summarizes_results() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/domains/batch-check")
        .json(&json!({ "domains": ["https://www.example.com", "example.org", "not a domain"] }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["total"], 3);
    assert_eq!(body["active"], 2);
    assert_eq!(body["dead"], 0);
    assert_eq!(body["errors"], 1);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["domain"], "example.com");
    assert_eq!(results[0]["state"], "active");
    assert_eq!(results[1]["domain"], "example.org");
    assert_eq!(body["error_details"][0]["domain"], "not a domain");

    // Nothing is persisted
    let page = app
        .server
        .get("/v1/domains")
        .await
        .json::<serde_json::Value>();
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_batch_check_counts_dead_sites() {
    let app = create_test_app_with(Stages {
        http_status: Some(503),
        ..Stages::default()
    })
    .await;

    let response = app
        .server
        .post("/v1/domains/batch-check")
        .json(&json!({ "domains": ["down.com"] }))
        .await;

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["active"], 0);
    assert_eq!(body["dead"], 1);
    assert_eq!(body["results"][0]["state"], "dead");
    assert_eq!(body["results"][0]["http_status"], 503);
}

#[tokio::test]
async fn test_batch_check_rejects_empty_list() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/domains/batch-check")
        .json(&json!({ "domains": [] }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_domains_paginates_and_filters() {
    let app = create_test_app().await;
    for name in ["a.com", "b.com", "c.com"] {
        app.seed_domain(name).await;
    }

    let response = app
        .server
        .get("/v1/domains")
        .add_query_param("per_page", 2)
        .add_query_param("page", 2)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let body = app
        .server
        .get("/v1/domains")
        .add_query_param("status", "occupied")
        .await
        .json::<serde_json::Value>();
    assert_eq!(body["total"], 0);

    let response = app
        .server
        .get("/v1/domains")
        .add_query_param("per_page", 1000)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
