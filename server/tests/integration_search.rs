use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use posidx_core::persist::write_index;
use posidx_core::tokenizer::Tokenizer;
use posidx_core::{IndexPaths, MemoryIndex};
use posidx_server::{build_app, load_index, IndexSource};
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let mut index = MemoryIndex::new();
    let docs = [(0, "doc0", "rust is great rust systems programming"), (1, "doc1", "learning rust"), (2, "doc2", "great systems")];
    for (doc_id, name, text) in docs {
        index.register_document(doc_id, name).unwrap();
        for (term, pos) in Tokenizer::plain().tokenize(text) {
            index.insert(&term, doc_id, pos).unwrap();
        }
    }
    write_index(&index, &IndexPaths::new(dir)).unwrap();
}

fn app_for(dir: &std::path::Path) -> Router {
    let index = load_index(&IndexSource::Disk(dir.to_string_lossy().to_string()), Tokenizer::plain()).unwrap();
    build_app(index, Tokenizer::plain())
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn doc_ids(json: &Value) -> Vec<u64> {
    json["results"].as_array().unwrap().iter().map(|h| h["doc_id"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, json) = call(app_for(dir.path()), "/search?q=rust&k=2").await;
    assert_eq!(status, StatusCode::OK);
    // doc0 has tf 2 over 6 words, doc1 tf 1 over 2 words
    assert_eq!(doc_ids(&json), vec![1, 0]);
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"][0]["name"], "doc1");
}

#[tokio::test]
async fn search_modes_are_selectable() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (_, json) = call(app_for(dir.path()), "/search?q=great+systems&mode=phrase").await;
    assert_eq!(doc_ids(&json), vec![2]);
    let (_, json) = call(app_for(dir.path()), "/search?q=great+systems&mode=intersection").await;
    assert_eq!(doc_ids(&json), vec![0, 2]);
    let (status, json) = call(app_for(dir.path()), "/search?q=rust&mode=fuzzy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
    assert!(json["mode"].is_null());
}

#[tokio::test]
async fn doc_lookup_and_not_found() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, json) = call(app_for(dir.path()), "/doc/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "doc1");
    assert_eq!(json["word_count"], 2);
    let (status, _) = call(app_for(dir.path()), "/doc/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn live_index_serves_without_persisting() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("docs.jsonl");
    fs::write(&input, "{\"id\":\"a\",\"body\":\"the cat sat\"}\n{\"id\":\"b\",\"body\":\"the dog sat\"}\n").unwrap();
    let index = load_index(&IndexSource::Live(input.to_string_lossy().to_string()), Tokenizer::plain()).unwrap();
    let app = build_app(index, Tokenizer::plain());

    let (_, json) = call(app, "/search?q=the+cat&mode=phrase").await;
    assert_eq!(doc_ids(&json), vec![0]);
    assert_eq!(json["results"][0]["name"], "a");
    assert!(!dir.path().join("meta.json").exists());
}

#[tokio::test]
async fn default_tokenizer_phrases_span_stopwords() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("docs.jsonl");
    fs::write(&input, "{\"id\":\"mat\",\"body\":\"the cat sat on the mat\"}\n{\"id\":\"rug\",\"body\":\"a cat sat on the big mat\"}\n").unwrap();
    let index = load_index(&IndexSource::Live(input.to_string_lossy().to_string()), Tokenizer::default()).unwrap();
    let app = build_app(index, Tokenizer::default());

    let (_, json) = call(app.clone(), "/search?q=sat+on+the+mat&mode=phrase").await;
    assert_eq!(json["terms"], serde_json::json!(["sat", "mat"]));
    assert_eq!(doc_ids(&json), vec![0]);
    let (_, json) = call(app, "/search?q=cat+mat&mode=phrase").await;
    assert!(doc_ids(&json).is_empty());
}
