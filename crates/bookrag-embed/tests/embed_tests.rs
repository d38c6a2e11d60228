use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use bookrag_core::error::Error;
use bookrag_core::traits::TextEmbedder;
use bookrag_embed::{FakeEmbedder, OpenAiEmbedder};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

/// Answers in reverse order so the client has to sort by `index`.
async fn embeddings(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    assert_eq!(body["model"], "text-embedding-ada-002");
    assert_eq!(body["encoding_format"], "float");
    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(i, text)| {
            let len = text.as_str().unwrap_or_default().len() as f32;
            json!({ "object": "embedding", "index": i, "embedding": [i as f32, len] })
        })
        .collect();
    Ok(Json(json!({ "object": "list", "data": data, "model": body["model"] })))
}

#[tokio::test]
async fn openai_embedder_preserves_input_order() {
    let base = spawn(Router::new().route("/v1/embeddings", post(embeddings))).await;
    let embedder = OpenAiEmbedder::new(&base, "sk-test", "text-embedding-ada-002");

    let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];
    let vectors = embedder.embed_documents(&texts).await.expect("embed");
    assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 3.0], vec![2.0, 2.0]]);

    let q = embedder.embed_query("dddd").await.expect("query");
    assert_eq!(q, vec![0.0, 4.0]);
    assert_eq!(embedder.model_id(), "text-embedding-ada-002");
}

#[tokio::test]
async fn openai_embedder_surfaces_api_errors() {
    let base = spawn(Router::new().route("/v1/embeddings", post(embeddings))).await;
    let embedder = OpenAiEmbedder::new(&base, "sk-wrong", "text-embedding-ada-002");
    let err = embedder.embed_query("hello").await.unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
    assert!(err.is_remote());
    assert!(err.to_string().contains("401"), "{err}");
}

#[tokio::test]
async fn openai_error_envelope_message_is_reported() {
    let router = Router::new().route(
        "/v1/embeddings",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": { "message": "Rate limit reached", "type": "requests" } })),
            )
        }),
    );
    let base = spawn(router).await;
    let embedder = OpenAiEmbedder::new(&base, "sk-test", "text-embedding-ada-002");
    let err = embedder.embed_documents(&["x".to_string()]).await.unwrap_err();
    assert!(err.to_string().contains("Rate limit reached"), "{err}");
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    // Nothing listens here; a request would fail.
    let embedder = OpenAiEmbedder::new("http://127.0.0.1:9/v1", "sk-test", "m");
    assert!(embedder.embed_documents(&[]).await.expect("empty").is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_an_embedding_error() {
    let embedder = OpenAiEmbedder::new("http://127.0.0.1:9/v1", "sk-test", "m");
    let err = embedder.embed_query("hello").await.unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(64);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_documents(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64);
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
    assert_eq!(embedder.embed_query("hello world").await.unwrap(), *v1);
}
