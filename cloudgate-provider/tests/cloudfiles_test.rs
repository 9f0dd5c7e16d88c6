//! Cloud Files driver against a mock storage API

#![allow(clippy::unwrap_used)]

mod common;

use std::collections::HashMap;

use cloudgate_provider::{
    CloudFilesDriver, Container, Credentials, DownloadOptions, ProviderError, StorageDriver,
    StorageObject,
};
use common::{TEST_KEY, TEST_TOKEN, TEST_USER, mount_storage_auth, options, storage};
use futures::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OBJECT_SIZE: usize = 20_000;

async fn driver(server: &MockServer) -> CloudFilesDriver {
    mount_storage_auth(server).await;
    CloudFilesDriver::new(Credentials::new(TEST_USER, TEST_KEY), &options(server)).unwrap()
}

fn backup_object(size: u64) -> StorageObject {
    StorageObject {
        name: "db.tar".to_string(),
        container: "backups".to_string(),
        size,
        hash: None,
        etag: None,
        content_type: None,
        last_modified: None,
        meta_data: HashMap::new(),
    }
}

async fn mount_object_body(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(storage("/backups/db.tar")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; OBJECT_SIZE]))
        .mount(server)
        .await;
}

// ==================== Account & listings ====================

#[tokio::test]
async fn test_list_containers() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(storage("")))
        .and(query_param("format", "json"))
        .and(header("x-auth-token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "backups", "count": 3, "bytes": 1_160_520},
            {"name": "logs", "count": 0, "bytes": 0}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let containers = require_ok!(driver.list_containers().await);
    assert_eq!(
        containers,
        vec![
            Container {
                name: "backups".to_string(),
                object_count: 3,
                size: 1_160_520,
            },
            Container {
                name: "logs".to_string(),
                object_count: 0,
                size: 0,
            },
        ]
    );
}

#[tokio::test]
async fn test_list_containers_empty_account() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(storage("")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let containers = require_ok!(driver.list_containers().await);
    assert!(containers.is_empty());
}

#[tokio::test]
async fn test_list_container_objects() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(storage("/backups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "db.tar",
            "bytes": 1_160_520,
            "hash": "16265549b5bda64ecdaa5156de4c97cc",
            "content_type": "application/x-tar",
            "last_modified": "2011-01-25T22:01:50.351810"
        }])))
        .mount(&server)
        .await;

    let objects = require_ok!(driver.list_container_objects("/backups").await);
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].container, "backups");
    assert_eq!(objects[0].size, 1_160_520);
    assert_eq!(
        objects[0].hash.as_deref(),
        Some("16265549b5bda64ecdaa5156de4c97cc")
    );
    assert_eq!(objects[0].content_type.as_deref(), Some("application/x-tar"));
}

#[tokio::test]
async fn test_get_meta_data() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("HEAD"))
        .and(path(storage("")))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("x-account-container-count", "12")
                .insert_header("x-account-object-count", "4045")
                .insert_header("x-account-bytes-used", "98765"),
        )
        .mount(&server)
        .await;

    let meta = require_ok!(driver.get_meta_data().await);
    assert_eq!(meta.container_count, 12);
    assert_eq!(meta.object_count, 4045);
    assert_eq!(meta.bytes_used, 98765);
}

#[tokio::test]
async fn test_cdn_management_url_from_bootstrap() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    let cdn = require_ok!(driver.cdn_management_url().await);
    let cdn = require_some!(cdn);
    assert_eq!(cdn.path(), "/cdn/AUTH_acct");
}

// ==================== Containers ====================

#[tokio::test]
async fn test_get_container() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("HEAD"))
        .and(path(storage("/backups")))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("x-container-object-count", "800")
                .insert_header("x-container-bytes-used", "1234568"),
        )
        .mount(&server)
        .await;

    let container = require_ok!(driver.get_container("backups").await);
    assert_eq!(container.name, "backups");
    assert_eq!(container.object_count, 800);
    assert_eq!(container.size, 1_234_568);
}

#[tokio::test]
async fn test_get_container_not_found() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("HEAD"))
        .and(path(storage("/missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = driver.get_container("missing").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ContainerNotFound { ref container, .. } if container == "missing"
    ));
}

#[tokio::test]
async fn test_create_container_strips_leading_slash() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("PUT"))
        .and(path(storage("/new-container")))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let container = require_ok!(driver.create_container("/new-container").await);
    assert_eq!(container.name, "new-container");
    assert_eq!((container.object_count, container.size), (0, 0));
}

#[tokio::test]
async fn test_create_container_already_exists() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("PUT"))
        .and(path(storage("/backups")))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let err = driver.create_container("backups").await.unwrap_err();
    assert!(matches!(err, ProviderError::ContainerAlreadyExists { .. }));
}

#[tokio::test]
async fn test_invalid_container_name_sends_nothing() {
    let server = MockServer::start().await;
    let driver =
        CloudFilesDriver::new(Credentials::new(TEST_USER, TEST_KEY), &common::options(&server))
            .unwrap();

    let err = driver.create_container("a/b").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::InvalidParameter { ref param, .. } if param == "container_name"
    ));
    let received = require_some!(server.received_requests().await);
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_delete_container_not_empty() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("DELETE"))
        .and(path(storage("/backups")))
        .respond_with(ResponseTemplate::new(409).set_body_string("There was a conflict"))
        .mount(&server)
        .await;

    let container = Container {
        name: "backups".to_string(),
        object_count: 3,
        size: 10,
    };
    let err = driver.delete_container(&container).await.unwrap_err();
    assert!(matches!(err, ProviderError::ContainerNotEmpty { .. }));
}

#[tokio::test]
async fn test_delete_container() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("DELETE"))
        .and(path(storage("/logs")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let container = Container {
        name: "logs".to_string(),
        object_count: 0,
        size: 0,
    };
    require_ok!(driver.delete_container(&container).await);
}

// ==================== Objects ====================

#[tokio::test]
async fn test_get_object_reads_headers() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("HEAD"))
        .and(path(storage("/backups")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(storage("/backups/db.tar")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("etag", "16265549b5bda64ecdaa5156de4c97cc")
                .insert_header("content-type", "application/x-tar")
                .insert_header("last-modified", "Tue, 25 Jan 2011 22:01:49 GMT")
                .insert_header("x-object-meta-owner", "ops"),
        )
        .mount(&server)
        .await;

    let object = require_ok!(driver.get_object("backups", "db.tar").await);
    assert_eq!(object.container, "backups");
    assert_eq!(
        object.etag.as_deref(),
        Some("16265549b5bda64ecdaa5156de4c97cc")
    );
    assert_eq!(object.content_type.as_deref(), Some("application/x-tar"));
    assert_eq!(object.meta_data.get("owner").map(String::as_str), Some("ops"));
}

#[tokio::test]
async fn test_get_object_not_found() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("HEAD"))
        .and(path(storage("/backups")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(storage("/backups/missing.tar")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = driver.get_object("backups", "missing.tar").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::ObjectNotFound { ref object, .. } if object == "missing.tar"
    ));
}

#[tokio::test]
async fn test_delete_object_not_found() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("DELETE"))
        .and(path(storage("/backups/db.tar")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = driver
        .delete_object(&backup_object(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ObjectNotFound { .. }));
}

#[tokio::test]
async fn test_delete_object_name_stays_in_container() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("DELETE"))
        .and(path(storage("/backups/..%2Flogs%2Fapp.log")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(storage("/logs/app.log")))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let object = StorageObject {
        name: "../logs/app.log".to_string(),
        ..backup_object(1)
    };
    require_ok!(driver.delete_object(&object).await);
}

#[tokio::test]
async fn test_dot_object_name_rejected() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    let object = StorageObject {
        name: "..".to_string(),
        ..backup_object(1)
    };
    let err = driver.delete_object(&object).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::InvalidParameter { ref param, .. } if param == "object_name"
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ==================== Streaming ====================

#[tokio::test]
async fn test_object_as_stream_default_chunks() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;
    mount_object_body(&server).await;

    let stream = require_ok!(
        driver
            .object_as_stream(&backup_object(OBJECT_SIZE as u64), None)
            .await
    );
    let chunks = require_ok!(stream.into_stream().try_collect::<Vec<_>>().await);
    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![8096, 8096, OBJECT_SIZE - 2 * 8096]);
}

#[tokio::test]
async fn test_download_into_directory() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;
    mount_object_body(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let saved = require_ok!(
        driver
            .download_object(
                &backup_object(OBJECT_SIZE as u64),
                dir.path(),
                DownloadOptions::default(),
            )
            .await
    );
    assert_eq!(saved, dir.path().join("db.tar"));
    assert_eq!(std::fs::read(&saved).unwrap().len(), OBJECT_SIZE);
}

#[tokio::test]
async fn test_download_size_mismatch_removes_file() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;
    mount_object_body(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("partial.tar");

    let err = driver
        .download_object(&backup_object(1_160_520), &target, DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Io { ref detail, .. } if detail.contains("1160520")
    ));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_download_missing_object() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;

    Mock::given(method("GET"))
        .and(path(storage("/backups/db.tar")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let err = driver
        .download_object(&backup_object(1), dir.path(), DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ObjectNotFound { .. }));
    assert!(!dir.path().join("db.tar").exists());
}

#[tokio::test]
async fn test_download_rejects_names_leaving_destination() {
    let server = MockServer::start().await;
    let driver = driver(&server).await;
    mount_object_body(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let absolute = elsewhere.path().join("escaped.bin");

    for name in [absolute.to_str().unwrap(), "../escaped.bin", "nested/../../escaped.bin"] {
        let object = StorageObject {
            name: name.to_string(),
            ..backup_object(OBJECT_SIZE as u64)
        };
        let err = driver
            .download_object(&object, dir.path(), DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                ProviderError::InvalidParameter { ref param, .. } if param == "object_name"
            ),
            "{name}: {err:?}"
        );
    }
    assert!(!absolute.exists());
    assert!(!dir.path().parent().unwrap().join("escaped.bin").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ==================== Auth ====================

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let driver =
        CloudFilesDriver::new(Credentials::new(TEST_USER, "wrong"), &options(&server)).unwrap();

    let err = driver.list_containers().await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidCredentials { .. }));
    assert!(err.is_expected());
}
