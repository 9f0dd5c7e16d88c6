//! Rackspace DNS driver against a mock DNS API

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use cloudgate_provider::{
    CreateRecordRequest, CreateZoneRequest, Credentials, DnsDriver, PollPolicy, ProviderError,
    RackspaceDnsDriver, Record, RecordType, UpdateRecordRequest, UpdateZoneRequest, Zone,
};
use common::{TEST_KEY, TEST_TOKEN, TEST_USER, account, mount_server_auth, options};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn driver(server: &MockServer) -> RackspaceDnsDriver {
    mount_server_auth(server).await;
    RackspaceDnsDriver::new(Credentials::new(TEST_USER, TEST_KEY), &options(server)).unwrap()
}

fn zone() -> Zone {
    Zone {
        id: "2946063".to_string(),
        domain: "foo4.bar.com".to_string(),
        zone_type: "master".to_string(),
        ttl: 3600,
        email: Some("hostmaster@foo4.bar.com".to_string()),
        comment: None,
    }
}

fn record() -> Record {
    Record {
        id: "A-7423034".to_string(),
        name: "test3.foo4.bar.com".to_string(),
        record_type: RecordType::A,
        data: "127.7.7.7".to_string(),
        zone_id: "2946063".to_string(),
        ttl: Some(777),
        comment: None,
    }
}

/// Initial `202` handing out `job_id`
fn accepted(job_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(202).set_body_json(json!({
        "jobId": job_id,
        "status": "RUNNING",
        "callbackUrl": format!("https://dns.api.rackspacecloud.com/v1.0/123456/status/{job_id}")
    }))
}

/// Job status answering `RUNNING` `running` times, then `last`
async fn mount_job(server: &MockServer, job_id: &str, running: u64, last: serde_json::Value) {
    let status_path = account(&format!("/status/{job_id}"));
    if running > 0 {
        Mock::given(method("GET"))
            .and(path(status_path.clone()))
            .and(query_param("showDetails", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jobId": job_id, "status": "RUNNING"})),
            )
            .up_to_n_times(running)
            .expect(running)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(status_path))
        .and(query_param("showDetails", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(last))
        .mount(server)
        .await;
}

// ==================== Reads ====================

#[tokio::test]
async fn test_list_zones_uses_rewritten_endpoint() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(account("/domains")))
        .and(header("x-auth-token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domains": [
                {"id": 2_946_063, "name": "foo4.bar.com", "ttl": 3600,
                 "emailAddress": "hostmaster@foo4.bar.com"},
                {"id": 2_946_064, "name": "example.org"}
            ],
            "totalEntries": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zones = require_ok!(driver.list_zones().await);
    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0], zone());
    assert_eq!(zones[1].ttl, 0);
}

#[tokio::test]
async fn test_get_zone_not_found() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(account("/domains/404")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404, "message": "Not found", "details": "Object not Found."
        })))
        .mount(&server)
        .await;

    let err = driver.get_zone("404").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ZoneNotFound { ref zone_id, .. } if zone_id == "404"
    ));
}

#[tokio::test]
async fn test_list_records() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(account("/domains/2946063")))
        .and(query_param("showRecord", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2_946_063,
            "name": "foo4.bar.com",
            "recordsList": {"records": [
                {"id": "A-7423034", "name": "test3.foo4.bar.com", "type": "A",
                 "data": "127.7.7.7", "ttl": 777},
                {"id": "MX-3963521", "name": "foo4.bar.com", "type": "MX",
                 "data": "mail.foo4.bar.com", "ttl": 3600}
            ]}
        })))
        .mount(&server)
        .await;

    let records = require_ok!(driver.list_records("2946063").await);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], record());
    assert_eq!(records[1].record_type, RecordType::Mx);
}

#[tokio::test]
async fn test_get_record_not_found() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(account("/domains/2946063")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 2_946_063, "name": "foo4.bar.com", "ttl": 3600})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(account("/domains/2946063/records/A-0")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = driver.get_record("2946063", "A-0").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::RecordNotFound { ref record_id, .. } if record_id == "A-0"
    ));
}

// ==================== Async mutations ====================

#[tokio::test]
async fn test_create_zone_polls_job() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("POST"))
        .and(path(account("/domains")))
        .and(body_json(json!({"domains": [{
            "name": "foo4.bar.com",
            "emailAddress": "hostmaster@foo4.bar.com",
            "recordsList": {"records": []},
            "ttl": 3600
        }]})))
        .respond_with(accepted("job-1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_job(
        &server,
        "job-1",
        2,
        json!({
            "jobId": "job-1",
            "status": "COMPLETED",
            "response": {"domains": [{
                "id": 2_946_063,
                "name": "foo4.bar.com",
                "ttl": 3600,
                "emailAddress": "hostmaster@foo4.bar.com"
            }]}
        }),
    )
    .await;

    let request = CreateZoneRequest {
        domain: "foo4.bar.com".to_string(),
        ttl: Some(3600),
        email: Some("hostmaster@foo4.bar.com".to_string()),
        comment: None,
    };
    let created = require_ok!(driver.create_zone(&request).await);
    assert_eq!(created, zone());
}

#[tokio::test]
async fn test_create_zone_requires_email() {
    let server = MockServer::start().await;
    let driver =
        RackspaceDnsDriver::new(Credentials::new(TEST_USER, TEST_KEY), &options(&server)).unwrap();

    let request = CreateZoneRequest {
        domain: "foo4.bar.com".to_string(),
        ..CreateZoneRequest::default()
    };
    let err = driver.create_zone(&request).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::InvalidParameter { ref param, .. } if param == "email"
    ));
    let received = require_some!(server.received_requests().await);
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_create_zone_job_error() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("POST"))
        .and(path(account("/domains")))
        .respond_with(accepted("job-2"))
        .mount(&server)
        .await;
    mount_job(
        &server,
        "job-2",
        0,
        json!({
            "jobId": "job-2",
            "status": "ERROR",
            "error": {"code": 409, "message": "Domain already exists", "details": "Conflict"}
        }),
    )
    .await;

    let request = CreateZoneRequest {
        domain: "foo4.bar.com".to_string(),
        email: Some("hostmaster@foo4.bar.com".to_string()),
        ..CreateZoneRequest::default()
    };
    let err = driver.create_zone(&request).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::AsyncJobFailed { ref job_id, ref raw_message, .. }
            if job_id == "job-2" && raw_message == "Domain already exists"
    ));
}

#[tokio::test]
async fn test_job_that_never_finishes_times_out() {
    let server = MockServer::start().await;
    mount_server_auth(&server).await;
    let options = options(&server).poll_policy(
        PollPolicy::default()
            .interval(Duration::from_millis(5))
            .max_attempts(3),
    );
    let driver = RackspaceDnsDriver::new(Credentials::new(TEST_USER, TEST_KEY), &options).unwrap();

    Mock::given(method("DELETE"))
        .and(path(account("/domains/2946063")))
        .respond_with(accepted("job-3"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(account("/status/job-3")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"jobId": "job-3", "status": "RUNNING"})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = driver.delete_zone(&zone()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout { .. }));
}

#[tokio::test]
async fn test_update_zone_merges_changes() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("PUT"))
        .and(path(account("/domains/2946063")))
        .and(body_json(json!({"ttl": 7200, "comment": "moved"})))
        .respond_with(accepted("job-4"))
        .expect(1)
        .mount(&server)
        .await;
    mount_job(
        &server,
        "job-4",
        0,
        json!({"jobId": "job-4", "status": "COMPLETED"}),
    )
    .await;

    let changes = UpdateZoneRequest {
        ttl: Some(7200),
        comment: Some("moved".to_string()),
        ..UpdateZoneRequest::default()
    };
    let updated = require_ok!(driver.update_zone(&zone(), &changes).await);
    assert_eq!(updated.ttl, 7200);
    assert_eq!(updated.comment.as_deref(), Some("moved"));
    assert_eq!(updated.email, zone().email);
    assert_eq!(updated.domain, "foo4.bar.com");
}

#[tokio::test]
async fn test_update_zone_rejects_rename() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    let changes = UpdateZoneRequest {
        domain: Some("other.com".to_string()),
        ..UpdateZoneRequest::default()
    };
    let err = driver.update_zone(&zone(), &changes).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::InvalidParameter { ref param, .. } if param == "domain"
    ));
}

#[tokio::test]
async fn test_create_record() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("POST"))
        .and(path(account("/domains/2946063/records")))
        .and(body_json(json!({"records": [{
            "name": "test3.foo4.bar.com",
            "type": "A",
            "data": "127.7.7.7",
            "ttl": 777
        }]})))
        .respond_with(accepted("job-5"))
        .mount(&server)
        .await;
    mount_job(
        &server,
        "job-5",
        1,
        json!({
            "jobId": "job-5",
            "status": "COMPLETED",
            "response": {"records": [{
                "id": "A-7423034", "name": "test3.foo4.bar.com", "type": "A",
                "data": "127.7.7.7", "ttl": 777
            }]}
        }),
    )
    .await;

    let request = CreateRecordRequest {
        name: "test3.foo4.bar.com".to_string(),
        record_type: RecordType::A,
        data: "127.7.7.7".to_string(),
        ttl: Some(777),
        comment: None,
    };
    let created = require_ok!(driver.create_record(&zone(), &request).await);
    assert_eq!(created, record());
}

#[tokio::test]
async fn test_update_record_sends_name() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("PUT"))
        .and(path(account("/domains/2946063/records/A-7423034")))
        .and(body_json(json!({"name": "test3.foo4.bar.com", "data": "127.3.3.3"})))
        .respond_with(accepted("job-6"))
        .expect(1)
        .mount(&server)
        .await;
    mount_job(
        &server,
        "job-6",
        0,
        json!({"jobId": "job-6", "status": "COMPLETED"}),
    )
    .await;

    let changes = UpdateRecordRequest {
        data: Some("127.3.3.3".to_string()),
        ..UpdateRecordRequest::default()
    };
    let updated = require_ok!(driver.update_record(&record(), &changes).await);
    assert_eq!(updated.data, "127.3.3.3");
    assert_eq!(updated.ttl, Some(777));
    assert_eq!(updated.record_type, RecordType::A);
}

#[tokio::test]
async fn test_delete_record_not_found() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("DELETE"))
        .and(path(account("/domains/2946063/records/A-7423034")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404, "message": "Not found", "details": "Object not Found."
        })))
        .mount(&server)
        .await;

    let err = driver.delete_record(&record()).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::RecordNotFound { ref record_id, ref raw_message, .. }
            if record_id == "A-7423034"
                && raw_message.as_deref() == Some("404 - Not found (Object not Found.)")
    ));
}

#[tokio::test]
async fn test_validation_errors_surface() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("POST"))
        .and(path(account("/domains/2946063/records")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "validationErrors": {"messages": ["Record name is invalid", "TTL is too low"]}
        })))
        .mount(&server)
        .await;

    let request = CreateRecordRequest {
        name: "bad name".to_string(),
        record_type: RecordType::A,
        data: "127.0.0.1".to_string(),
        ttl: Some(1),
        comment: None,
    };
    let err = driver.create_record(&zone(), &request).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Unknown { ref raw_message, .. }
            if raw_message == "Validation errors: Record name is invalid, TTL is too low"
    ));
}
