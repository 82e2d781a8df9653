use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::anyhow;
use axum::{http::StatusCode, routing::get, Json, Router};
use catalog::FilterField;
use shared::{
    domain::{Difficulty, ItemId, LengthCategory},
    error::ErrorCode,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

fn sample() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            id: ItemId("1".into()),
            title: "CSS Basics".into(),
            description: "Selectors and the box model".into(),
            topic: Some("Design".into()),
            difficulty: Some(Difficulty::Beginner),
            length_category: Some(LengthCategory::Short),
            thumbnail: None,
        },
        CatalogItem {
            id: ItemId("2".into()),
            title: "Advanced Node".into(),
            description: "Streams and workers".into(),
            topic: Some("Development".into()),
            difficulty: Some(Difficulty::Advanced),
            length_category: Some(LengthCategory::Long),
            thumbnail: None,
        },
    ]
}

struct CountingSource {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl CatalogSource for CountingSource {
    async fn fetch_items(&self) -> Result<Vec<CatalogItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        Ok(sample())
    }
}

async fn spawn_catalog_server(router: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn mount_fetches_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut view = CatalogView::new(CountingSource {
        calls: calls.clone(),
        fail: false,
    });

    view.mount().await;
    view.mount().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(view.is_mounted());
    assert!(!view.store().is_loading());
    assert_eq!(view.visible().len(), 2);
}

#[tokio::test]
async fn failed_fetch_shows_empty_catalog() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut view = CatalogView::new(CountingSource {
        calls: calls.clone(),
        fail: true,
    });

    view.mount().await;
    view.mount().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(view.visible().is_empty());
    assert!(view.store().is_empty_result());
}

#[tokio::test]
async fn dispatch_filters_mounted_catalog() {
    let mut view = CatalogView::new(CountingSource {
        calls: Arc::new(AtomicUsize::new(0)),
        fail: false,
    });
    view.mount().await;

    view.dispatch(FilterAction::Toggle {
        field: FilterField::Topic,
        value: "Design".into(),
    });
    let titles: Vec<&str> = view.visible().iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["CSS Basics"]);

    view.dispatch(FilterAction::Clear);
    assert_eq!(view.visible().len(), 2);
}

#[tokio::test]
async fn http_source_reads_tutorials_route() {
    let router = Router::new().route("/api/tutorials", get(|| async { Json(sample()) }));
    let server_url = spawn_catalog_server(router).await.expect("spawn server");

    let source = HttpCatalogSource::new(&format!("{server_url}/api")).expect("source");
    assert_eq!(
        source.tutorials_url().expect("url").path(),
        "/api/tutorials"
    );
    let items = source.fetch_items().await.expect("fetch");
    assert_eq!(items, sample());
}

#[tokio::test]
async fn http_source_surfaces_api_errors() {
    let router = Router::new().route(
        "/tutorials",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(shared::error::ApiError::new(
                    ErrorCode::Internal,
                    "database offline",
                )),
            )
        }),
    );
    let server_url = spawn_catalog_server(router).await.expect("spawn server");

    let source = HttpCatalogSource::new(&server_url).expect("source");
    let err = source.get_tutorials().await.expect_err("server error");
    match err {
        ClientError::Server {
            status,
            message,
            api_error,
        } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message, "database offline");
            assert_eq!(api_error.map(|e| e.code), Some(ErrorCode::Internal));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_source_keeps_records_with_unreadable_labels() {
    let payload = r#"[
        {"_id":"1","title":"CSS Basics","topic":"Design","difficulty":"beginner","lengthCategory":"Short"},
        {"_id":"2","title":"Advanced Node","topic":"Development","difficulty":"Advanced","lengthCategory":""}
    ]"#;
    let router = Router::new().route(
        "/tutorials",
        get(move || async move { ([("content-type", "application/json")], payload) }),
    );
    let server_url = spawn_catalog_server(router).await.expect("spawn server");

    let mut view = CatalogView::new(HttpCatalogSource::new(&server_url).expect("source"));
    view.mount().await;
    assert_eq!(view.visible().len(), 2);

    view.dispatch(FilterAction::Toggle {
        field: FilterField::Difficulty,
        value: "Beginner".into(),
    });
    let titles: Vec<&str> = view.visible().iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["CSS Basics"]);
    assert_eq!(view.store().items()[1].length_category, None);
}

#[tokio::test]
async fn truncated_error_body_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\r\n{\"code\":",
            )
            .await;
        let _ = socket.shutdown().await;
    });

    let source = HttpCatalogSource::new(&format!("http://{addr}")).expect("source");
    let err = source.get_tutorials().await.expect_err("truncated body");
    assert!(
        matches!(err, ClientError::Transport { .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn unreachable_server_leaves_view_empty() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let source = HttpCatalogSource::new(&format!("http://{addr}")).expect("source");
    let mut view = CatalogView::new(source);
    view.mount().await;
    assert!(view.visible().is_empty());
    assert!(!view.store().is_loading());
}

#[test]
fn rejects_malformed_server_url() {
    assert!(matches!(
        HttpCatalogSource::new("not a url"),
        Err(ClientError::InvalidServerUrl { .. })
    ));
}
