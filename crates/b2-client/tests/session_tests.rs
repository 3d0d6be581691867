//! Wire-level tests for the B2 client against a mock HTTP server
//!
//! Run with: cargo test --package b2-client --test session_tests

use b2_client::{
    BucketType, ClientError, Config, ErrorKind, FileAction, Session, UploadFile, UploadLease,
    VersionCursor,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

async fn authorized_session(server: &MockServer) -> Session {
    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_authorize_account"))
        .and(basic_auth("acct", "app-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "acct",
            "apiUrl": server.uri(),
            "authorizationToken": "session-token",
            "downloadUrl": server.uri(),
            "recommendedPartSize": 100000000,
        })))
        .mount(server)
        .await;

    Session::authenticate(&Config::new(server.uri()), "acct", "app-key")
        .await
        .unwrap()
}

fn bucket_json(id: &str, name: &str, bucket_type: &str) -> serde_json::Value {
    json!({
        "accountId": "acct",
        "bucketId": id,
        "bucketName": name,
        "bucketType": bucket_type,
    })
}

fn hello_info() -> serde_json::Value {
    json!({
        "accountId": "acct",
        "fileId": "4_zhello",
        "fileName": "dir/a b.txt",
        "bucketId": "bkt1",
        "contentLength": 5,
        "contentSha1": HELLO_SHA1,
        "contentType": "text/plain",
        "fileInfo": {"author": "alice"},
    })
}

fn lease(server: &MockServer) -> UploadLease {
    UploadLease {
        bucket_id: "bkt1".into(),
        upload_url: format!("{}/upload/bkt1", server.uri()),
        authorization_token: "upload-token".into(),
    }
}

// ==================== Credential Exchange ====================

#[test_log::test(tokio::test)]
async fn test_authenticate_populates_session() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    assert_eq!(session.account_id(), "acct");
    assert_eq!(session.api_url(), server.uri());
    assert_eq!(session.download_url(), server.uri());
    assert_eq!(session.authorization().authorization_token, "session-token");
    assert!(session.cached_upload_lease().is_none());
}

#[tokio::test]
async fn test_authenticate_wrong_credentials_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_authorize_account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "unauthorized",
            "message": "invalid application key",
            "status": 401,
        })))
        .mount(&server)
        .await;

    let err = Session::authenticate(&Config::new(server.uri()), "acct", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    let api = err.api_error().unwrap();
    assert!(!api.code.is_empty());
    assert_eq!(api.status, 401);
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Bind and release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = Session::authenticate(&Config::new(uri), "acct", "app-key")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_non_json_error_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_authorize_account"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let err = Session::authenticate(&Config::new(server.uri()), "acct", "app-key")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

// ==================== Buckets ====================

#[tokio::test]
async fn test_create_bucket_sends_query_parameters() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_create_bucket"))
        .and(header("authorization", "session-token"))
        .and(query_param("accountId", "acct"))
        .and(query_param("bucketName", "test-bucket"))
        .and(query_param("bucketType", "allPrivate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bucket_json("bkt1", "test-bucket", "allPrivate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bucket = session
        .create_bucket("test-bucket", BucketType::AllPrivate)
        .await
        .unwrap();
    assert_eq!(bucket.bucket_id, "bkt1");
    assert_eq!(bucket.bucket_type, BucketType::AllPrivate);

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.url.path() == "/b2api/v1/b2_create_bucket")
        .unwrap();
    assert!(create.body.is_empty());
}

#[tokio::test]
async fn test_delete_and_update_bucket_use_json_body() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_delete_bucket"))
        .and(body_json(json!({"accountId": "acct", "bucketId": "bkt1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bucket_json("bkt1", "test-bucket", "allPrivate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_update_bucket"))
        .and(body_json(json!({"accountId": "acct", "bucketId": "bkt2", "bucketType": "allPublic"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bucket_json("bkt2", "renamed", "allPublic")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let deleted = session.delete_bucket("bkt1").await.unwrap();
    assert_eq!(deleted.bucket_name, "test-bucket");

    let mut handle = session.bucket(b2_client::Bucket {
        account_id: "acct".into(),
        bucket_id: "bkt2".into(),
        bucket_name: "stale".into(),
        bucket_type: BucketType::AllPrivate,
    });
    handle.update(BucketType::AllPublic).await.unwrap();
    assert_eq!(handle.bucket_name, "renamed");
    assert_eq!(handle.bucket_type, BucketType::AllPublic);
}

#[tokio::test]
async fn test_list_buckets_keeps_service_order() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_list_buckets"))
        .and(body_json(json!({"accountId": "acct"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buckets": [
                bucket_json("b-2", "zeta", "allPublic"),
                bucket_json("b-1", "alpha", "allPrivate"),
            ]
        })))
        .mount(&server)
        .await;

    let buckets = session.list_buckets().await.unwrap();
    let ids: Vec<_> = buckets.iter().map(|b| b.bucket_id.as_str()).collect();
    assert_eq!(ids, ["b-2", "b-1"]);
}

// ==================== Listing ====================

#[tokio::test]
async fn test_list_file_names_omits_unset_fields_and_returns_cursor() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_list_file_names"))
        .and(body_json(json!({"bucketId": "bkt1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "fileId": "4_za",
                "fileName": "a.txt",
                "action": "upload",
                "size": 5,
                "uploadTimestamp": 1700000000000i64,
            }],
            "nextFileName": "b \u{e9}.txt",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_list_file_names"))
        .and(body_json(json!({"bucketId": "bkt1", "startFileName": "b \u{e9}.txt", "maxFileCount": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [],
            "nextFileName": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let first = session.list_file_names("bkt1", Some(""), Some(0)).await.unwrap();
    assert_eq!(first.files.len(), 1);
    assert_eq!(first.files[0].action, FileAction::Upload);
    assert_eq!(first.next_file_name.as_deref(), Some("b \u{e9}.txt"));

    let second = session
        .list_file_names("bkt1", first.next_file_name.as_deref(), Some(10))
        .await
        .unwrap();
    assert!(second.is_last());
}

#[tokio::test]
async fn test_list_file_versions_round_trips_cursor() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_list_file_versions"))
        .and(body_json(json!({
            "bucketId": "bkt1",
            "startFileName": "a.txt",
            "startFileId": "4_za2",
            "maxFileCount": 1,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "fileId": "4_za2",
                "fileName": "a.txt",
                "action": "hide",
                "size": 0,
                "uploadTimestamp": 1700000000001i64,
            }],
            "nextFileName": "a.txt",
            "nextFileId": "4_za1",
        })))
        .mount(&server)
        .await;

    let start = VersionCursor::new("a.txt", "4_za2");
    let page = session
        .list_file_versions("bkt1", Some(&start), Some(1))
        .await
        .unwrap();
    assert_eq!(page.files[0].action, FileAction::Hide);
    assert_eq!(page.next, Some(VersionCursor::new("a.txt", "4_za1")));
}

#[tokio::test]
async fn test_mixed_version_cursor_is_rejected_locally() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_list_file_versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = session
        .list_file_versions_from("bkt1", Some("a.txt"), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// ==================== Upload ====================

#[tokio::test]
async fn test_upload_without_lease_is_configuration_error() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    let err = session
        .upload(None, &b"hello"[..], UploadFile::new("a.txt", 5, HELLO_SHA1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[tokio::test]
async fn test_upload_sends_lease_token_and_file_headers() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/bkt1"))
        .and(header("authorization", "upload-token"))
        .and(header("X-Bz-File-Name", "dir/a%20b.txt"))
        .and(header("Content-Type", "b2/x-auto"))
        .and(header("X-Bz-Content-Sha1", HELLO_SHA1))
        .and(header("X-Bz-Info-author", "alice"))
        .and(header("Content-Length", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hello_info()))
        .expect(1)
        .mount(&server)
        .await;

    let lease = lease(&server);
    let file = UploadFile::new("dir/a b.txt", 5, HELLO_SHA1).with_info("author", "alice");
    let info = session.upload(Some(&lease), &b"hello"[..], file).await.unwrap();

    assert_eq!(info.file_id, "4_zhello");
    assert_eq!(info.content_sha1, HELLO_SHA1);

    let requests = server.received_requests().await.unwrap();
    let upload = requests.iter().find(|r| r.url.path() == "/upload/bkt1").unwrap();
    assert_eq!(upload.body, b"hello");
    assert!(!upload.headers.contains_key("x-bz-info-src_last_modified_millis"));
}

#[tokio::test]
async fn test_upload_uses_cached_session_lease() {
    let server = MockServer::start().await;
    let mut session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/bkt1"))
        .and(header("authorization", "upload-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hello_info()))
        .expect(2)
        .mount(&server)
        .await;

    assert!(session.cache_upload_lease(lease(&server)).is_none());
    for _ in 0..2 {
        session
            .upload(None, &b"hello"[..], UploadFile::new("a.txt", 5, HELLO_SHA1))
            .await
            .unwrap();
    }
    assert!(session.take_upload_lease().is_some());
}

#[tokio::test]
async fn test_bucket_handle_leases_once_and_reuses() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_get_upload_url"))
        .and(header("authorization", "session-token"))
        .and(body_json(json!({"bucketId": "bkt1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bucketId": "bkt1",
            "uploadUrl": format!("{}/upload/bkt1", server.uri()),
            "authorizationToken": "upload-token",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload/bkt1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hello_info()))
        .expect(3)
        .mount(&server)
        .await;

    let mut bucket = session.bucket(b2_client::Bucket {
        account_id: "acct".into(),
        bucket_id: "bkt1".into(),
        bucket_name: "test-bucket".into(),
        bucket_type: BucketType::AllPrivate,
    });

    for name in ["a.txt", "b.txt", "c.txt"] {
        bucket
            .upload_file(&b"hello"[..], UploadFile::new(name, 5, HELLO_SHA1))
            .await
            .unwrap();
    }
    assert_eq!(bucket.upload_lease().unwrap().bucket_id, "bkt1");
}

#[tokio::test]
async fn test_rejected_lease_is_not_renewed() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/bkt1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "expired_auth_token",
            "message": "upload token expired",
            "status": 401,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_get_upload_url"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let bucket = session.bucket(b2_client::Bucket {
        account_id: "acct".into(),
        bucket_id: "bkt1".into(),
        bucket_name: "test-bucket".into(),
        bucket_type: BucketType::AllPrivate,
    });
    let mut bucket = bucket.with_upload_lease(lease(&server)).unwrap();

    let err = bucket
        .upload_file(&b"hello"[..], UploadFile::new("a.txt", 5, HELLO_SHA1))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(bucket.upload_lease().is_some());
    assert!(bucket.reset_upload_lease().is_some());
    assert!(bucket.upload_lease().is_none());
}

// ==================== Download ====================

#[tokio::test]
async fn test_download_by_id_streams_and_rebuilds_metadata() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_download_file_by_id"))
        .and(query_param("fileId", "4_zhello"))
        .and(header("authorization", "session-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/plain")
                .insert_header("X-Bz-File-Id", "4_zhello")
                .insert_header("X-Bz-File-Name", "dir/a%20b.txt")
                .insert_header("X-Bz-Content-Sha1", HELLO_SHA1)
                .insert_header("X-Bz-Info-author", "alice")
                .set_body_bytes(b"hello".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("hello.txt");
    let mut file = tokio::fs::File::create(&target).await.unwrap();

    let info = session.download_by_id("4_zhello", &mut file).await.unwrap();
    drop(file);

    assert_eq!(tokio::fs::read(&target).await.unwrap(), b"hello");
    assert_eq!(info.file_id, "4_zhello");
    assert_eq!(info.file_name, "dir/a b.txt");
    assert_eq!(info.content_length, 5);
    assert_eq!(info.content_type, "text/plain");
    assert_eq!(info.content_sha1, HELLO_SHA1);
    assert_eq!(info.info["author"], "alice");
    assert_eq!(info.account_id, "acct");
}

#[tokio::test]
async fn test_download_by_name_encodes_path() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/file/test-bucket/dir/a%20b.txt"))
        .and(header("authorization", "session-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/plain")
                .insert_header("X-Bz-File-Id", "4_zhello")
                .insert_header("X-Bz-File-Name", "dir/a%20b.txt")
                .insert_header("X-Bz-Content-Sha1", HELLO_SHA1)
                .set_body_bytes(b"hello".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut sink = Vec::new();
    let info = session
        .download_by_name("test-bucket", "dir/a b.txt", &mut sink)
        .await
        .unwrap();
    assert_eq!(sink, b"hello");
    assert_eq!(info.file_name, "dir/a b.txt");
    assert!(info.info.is_empty());
}

#[tokio::test]
async fn test_download_error_writes_nothing() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_download_file_by_id"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not_found",
            "message": "file not present: 4_zmissing",
            "status": 404,
        })))
        .mount(&server)
        .await;

    let mut sink = Vec::new();
    let err = session.download_by_id("4_zmissing", &mut sink).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_slow_download_has_no_default_deadline() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/b2api/v1/b2_download_file_by_id"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/plain")
                .insert_header("X-Bz-File-Id", "4_zhello")
                .insert_header("X-Bz-File-Name", "a.txt")
                .insert_header("X-Bz-Content-Sha1", HELLO_SHA1)
                .set_body_bytes(b"hello".to_vec())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    assert!(Config::default().timeout.is_none());
    let mut sink = Vec::new();
    session.download_by_id("4_zhello", &mut sink).await.unwrap();
    assert_eq!(sink, b"hello");

    // An explicit deadline still applies
    let config = Config::new(server.uri()).with_timeout(Duration::from_millis(200));
    let bounded =
        Session::from_authorization(&config, session.authorization().clone(), "app-key").unwrap();
    let mut sink = Vec::new();
    let err = bounded.download_by_id("4_zhello", &mut sink).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(sink.is_empty());
}

// ==================== File Metadata ====================

#[tokio::test]
async fn test_file_metadata_calls() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_get_file_info"))
        .and(body_json(json!({"fileId": "4_zhello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(hello_info()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_delete_file_version"))
        .and(body_json(json!({"fileName": "dir/a b.txt", "fileId": "4_zhello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(hello_info()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b2api/v1/b2_hide_file"))
        .and(body_json(json!({"bucketId": "bkt1", "fileName": "dir/a b.txt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileId": "4_zhide",
            "fileName": "dir/a b.txt",
            "action": "hide",
            "size": 0,
            "uploadTimestamp": 1700000000002i64,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = session.get_file_info("4_zhello").await.unwrap();
    assert_eq!(info.content_sha1, HELLO_SHA1);

    let handle = session.handle(info);
    let hidden = handle.hide().await.unwrap();
    assert_eq!(hidden.action, FileAction::Hide);

    let deleted = handle.delete().await.unwrap();
    assert_eq!(deleted.file_id, "4_zhello");
}
