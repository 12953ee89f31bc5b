use std::time::Duration;

use listingd::config::IndexCredentials;
use listingd::search::{HttpIndexService, IndexRequest, IndexService, ProviderError, ACTIVE_FILTER};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one canned HTTP response and hand back the raw request.
async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        // read until the JSON body closes
        loop {
            let n = sock.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some((_, body)) = text.split_once("\r\n\r\n") {
                if body.ends_with('}') {
                    break;
                }
            }
        }
        let resp = format!(
            "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
    });
    (format!("http://{addr}"), rx)
}

fn creds() -> IndexCredentials {
    IndexCredentials {
        app_id: "APP".into(),
        api_key: "admin-key".into(),
    }
}

fn request() -> IndexRequest {
    IndexRequest {
        index_name: "listings".into(),
        query: "arepas".into(),
        page: 0,
        hits_per_page: 12,
        filters: ACTIVE_FILTER.into(),
    }
}

#[tokio::test]
async fn posts_multi_query_with_credentials() {
    let (base, seen) = one_shot_server(
        "HTTP/1.1 200 OK",
        r#"{"results":[{"hits":[{"objectID":"l-1"}],"nbHits":1,"page":0,"nbPages":1,"hitsPerPage":12,"processingTimeMS":2}]}"#,
    )
    .await;
    let svc = HttpIndexService::new(Some(base), Duration::from_secs(5)).unwrap();

    let resp = svc.search(&creds(), &request()).await.expect("index answers");
    let env = resp.into_first().unwrap();
    assert_eq!(env.nb_hits, 1);
    assert_eq!(env.hits[0]["objectID"], "l-1");
    assert_eq!(env.processing_time_ms, 2);

    let raw = seen.await.unwrap().to_ascii_lowercase();
    assert!(raw.starts_with("post /1/indexes/*/queries "));
    assert!(raw.contains("x-algolia-application-id: app"));
    assert!(raw.contains("x-algolia-api-key: admin-key"));
    assert!(raw.contains("\"filters\":\"status:active\""));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (base, _seen) =
        one_shot_server("HTTP/1.1 403 Forbidden", r#"{"message":"Invalid Application-ID or API key"}"#).await;
    let svc = HttpIndexService::new(Some(base), Duration::from_secs(5)).unwrap();

    let err = svc.search(&creds(), &request()).await.unwrap_err();
    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Invalid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn garbage_body_is_a_decode_error() {
    let (base, _seen) = one_shot_server("HTTP/1.1 200 OK", r#"{"results": 5}"#).await;
    let svc = HttpIndexService::new(Some(base), Duration::from_secs(5)).unwrap();

    let err = svc.search(&creds(), &request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let svc = HttpIndexService::new(Some(format!("http://{addr}")), Duration::from_secs(2)).unwrap();

    let err = svc.search(&creds(), &request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}
