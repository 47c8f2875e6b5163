use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use douggle_core::{Document, IdentityNormalizer, SearchEngine, StemmingNormalizer};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn tiny_app() -> Router {
    let docs = vec![
        Document::new("doc0.txt", "Rust is great. Rust systems programming."),
        Document::new("doc1.txt", "Learning rust and other languages."),
        Document::new("doc2.txt", "Gardening tips for spring."),
    ];
    let engine = SearchEngine::build(docs, Arc::new(StemmingNormalizer::english())).unwrap();
    server::build_app(Arc::new(engine))
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (status, json) = call(tiny_app(), "/search?q=rust&k=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"], "doc0.txt");
    assert_eq!(arr[1]["doc_id"], "doc1.txt");
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());
    assert!(arr[0]["snippet"].as_str().unwrap().contains("<em>Rust</em>"));
}

#[tokio::test]
async fn unknown_terms_give_no_results() {
    let (status, json) = call(tiny_app(), "/search?q=zzzz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn doc_lookup_and_stats() {
    let (status, json) = call(tiny_app(), "/doc/doc2.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "Gardening tips for spring.");

    let (status, _) = call(tiny_app(), "/doc/missing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = call(tiny_app(), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"].as_u64().unwrap(), 3);
    assert_eq!(json["from_cache"], false);
    assert_eq!(json["normalizer"], "snowball-english");
}

#[tokio::test]
async fn missing_collection_serves_empty_engine() {
    let dir = tempdir().unwrap();
    let engine = server::load_engine(
        dir.path().join("no-data").to_str().unwrap(),
        dir.path().join("cache").to_str().unwrap(),
        "test",
        Arc::new(IdentityNormalizer),
    )
    .unwrap();
    assert_eq!(engine.num_docs(), 0);
    let (status, json) = call(server::build_app(Arc::new(engine)), "/search?q=anything").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 0);
}

#[tokio::test]
async fn load_engine_reads_folder_through_cache() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("a.txt"), "cat dog").unwrap();
    fs::write(data.join("b.txt"), "dog bird").unwrap();

    let engine = server::load_engine(
        data.to_str().unwrap(),
        dir.path().join("cache").to_str().unwrap(),
        "test",
        Arc::new(IdentityNormalizer),
    )
    .unwrap();
    assert_eq!(engine.num_docs(), 2);
    assert!(!engine.was_cached());
    assert_eq!(engine.search("bird", 1)[0].doc_id, "b.txt");
}
