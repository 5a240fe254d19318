//! HTTP client tests against a mock server

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rag_chatbot::config::{LlmConfig, SearchConfig};
use rag_chatbot::error::Error;
use rag_chatbot::providers::{
    ChatMessage, ChatOptions, EmbeddingProvider, HttpPageFetcher, LlmProvider, OpenAiClient,
    PageFetcher, SerpApiClient, WebSearchProvider,
};

fn openai(server: &MockServer) -> OpenAiClient {
    let config = LlmConfig {
        base_url: format!("{}/v1", server.uri()),
        api_key: Some("sk-test".to_string()),
        max_retries: 2,
        embed_batch_size: 2,
        ..Default::default()
    };
    OpenAiClient::new(&config)
        .unwrap()
        .with_retry_delay(Duration::from_millis(5))
}

fn serpapi(server: &MockServer, num: usize) -> SerpApiClient {
    let config = SearchConfig {
        base_url: server.uri(),
        api_key: Some("serp-test".to_string()),
        num,
        max_per_domain: 5,
        retries: 2,
        ..Default::default()
    };
    SerpApiClient::new(&config)
        .unwrap()
        .with_retry_delay(Duration::from_millis(5))
}

fn chat_reply(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
    })
}

#[tokio::test]
async fn test_chat_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "response_format": {"type": "json_object"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("  {\"label\":\"IN\"}  ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = openai(&server);
    let output = client
        .chat(
            &[ChatMessage::user("質問")],
            &ChatOptions::new("gpt-4o-mini").json(),
        )
        .await
        .unwrap();

    assert_eq!(output.text, "{\"label\":\"IN\"}");
    assert_eq!(output.meta.finish_reason.as_deref(), Some("stop"));
    assert_eq!(output.meta.usage.unwrap()["total_tokens"], 13);
}

#[tokio::test]
async fn test_chat_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = openai(&server)
        .chat(&[ChatMessage::user("q")], &ChatOptions::new("gpt-4o-mini"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Llm(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_embeddings_batched_and_ordered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({"input": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({"input": ["c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.5, 0.5]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = openai(&server).embed_batch(&texts).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]);
}

#[tokio::test]
async fn test_serpapi_pages_and_dedups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .and(query_param("api_key", "serp-test"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {"position": 1, "title": "A", "link": "https://a.go.jp/x?utm=1", "snippet": "a"},
                {"position": 2, "title": "B", "link": "https://b.go.jp/y"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {"position": 3, "title": "A again", "link": "https://a.go.jp/x"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = serpapi(&server, 2).search("IT導入補助金", 3).await.unwrap();
    let urls: Vec<_> = hits.iter().filter_map(|h| h.url.as_deref()).collect();
    assert_eq!(urls, vec!["https://a.go.jp/x?utm=1", "https://b.go.jp/y"]);
}

#[tokio::test]
async fn test_serpapi_retries_then_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let err = serpapi(&server, 10).search("補助金", 1).await.unwrap_err();
    assert!(matches!(err, Error::Search(_)));
}

#[tokio::test]
async fn test_page_fetcher_extracts_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><script>var x;</script></head><body><h1>補助金</h1><p>上限450万円</p></body></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(
            "<html><body><p>ページが見つかりません</p></body></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(5).unwrap();
    assert_eq!(
        fetcher.fetch_text(&format!("{}/page", server.uri())).await,
        "補助金\n上限450万円"
    );
    assert_eq!(
        fetcher.fetch_text(&format!("{}/missing", server.uri())).await,
        "ページが見つかりません"
    );
    assert_eq!(fetcher.fetch_text(&format!("{}/empty", server.uri())).await, "");
}
