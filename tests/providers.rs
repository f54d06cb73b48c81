//! Provider HTTP tests against a mock server speaking SSE.

use promptlab::{
    Client, Error, FinishReason, FunctionRegistry, GenerationRequest, GoogleProvider, InputItem,
    OpenAIProvider, TextProvider,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(events: &[&str]) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str("data: ");
        body.push_str(event);
        body.push_str("\n\n");
    }
    body
}

#[tokio::test]
async fn test_openai_streams_text() {
    let mock_server = MockServer::start().await;

    let expected_body = json!({
        "model": "gpt-3.5-turbo",
        "messages": [
            {"role": "user", "content": "What is the tallest mountain on Earth?"}
        ],
        "stream": true,
        "stream_options": {"include_usage": true}
    });

    let body = sse_body(&[
        r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"Mount"},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{"content":" Everest"},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":9,"completion_tokens":3}}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        OpenAIProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let request = GenerationRequest::new(
        "gpt-3.5-turbo",
        vec![InputItem::user("What is the tallest mountain on Earth?")],
    );

    let response = provider.generate(&request).await.unwrap();
    let complete = response.buffer().await.unwrap();

    assert_eq!(complete.text(), "Mount Everest");
    assert_eq!(complete.finish_reason, FinishReason::Stop);
    assert_eq!(complete.usage.input_tokens, 9);
    assert_eq!(complete.usage.output_tokens, 3);
}

#[tokio::test]
async fn test_openai_function_calling() {
    let mock_server = MockServer::start().await;

    let body = sse_body(&[
        r#"{"choices":[{"index":0,"delta":{"role":"assistant","tool_calls":[{"index":0,"id":"call_abc","function":{"name":"multiply","arguments":""}}]},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"a\":5,"}}]},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"b\":3}"}}]},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":20,"completion_tokens":10}}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        OpenAIProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let registry = FunctionRegistry::calculator();
    let request = GenerationRequest::new(
        "gpt-3.5-turbo",
        vec![InputItem::user("What is 5 times 3?")],
    )
    .with_tools(registry.tools());

    let complete = provider
        .generate(&request)
        .await
        .unwrap()
        .buffer()
        .await
        .unwrap();

    assert_eq!(complete.finish_reason, FinishReason::ToolCalls);
    let calls = complete.function_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "multiply");
    assert_eq!(calls[0].call_id, "call_abc");

    // The streamed fragments reassemble into arguments the registry can run
    let item = registry.execute(calls[0]).unwrap();
    match item {
        InputItem::FunctionCallOutput { call_id, output } => {
            assert_eq!(call_id, "call_abc");
            assert!(output.contains("15"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let provider =
        OpenAIProvider::new_with_base_url("bad-key".to_string(), mock_server.uri()).unwrap();
    let request = GenerationRequest::new("gpt-3.5-turbo", vec![InputItem::user("hi")]);

    let err = provider.generate(&request).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn test_openai_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;

    let provider =
        OpenAIProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let request = GenerationRequest::new("gpt-3.5-turbo", vec![InputItem::user("hi")]);

    let err = provider.generate(&request).await.unwrap_err();
    assert!(matches!(err, Error::RateLimit));
}

#[tokio::test]
async fn test_google_streams_text() {
    let mock_server = MockServer::start().await;

    let body = sse_body(&[
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Mount"}]}}]}"#,
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":" Everest"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":12,"candidatesTokenCount":4,"totalTokenCount":16}}"#,
    ]);

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        GoogleProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let request = GenerationRequest::new(
        "gemini-2.0-flash",
        vec![InputItem::user("What is the tallest mountain on Earth?")],
    );

    let complete = provider
        .generate(&request)
        .await
        .unwrap()
        .buffer()
        .await
        .unwrap();

    assert_eq!(complete.text(), "Mount Everest");
    assert_eq!(complete.finish_reason, FinishReason::Stop);
    assert_eq!(complete.usage.input_tokens, 12);
    assert_eq!(complete.usage.output_tokens, 4);
}

#[tokio::test]
async fn test_google_function_calling() {
    let mock_server = MockServer::start().await;

    let body = sse_body(&[
        r#"{"candidates":[{"content":{"role":"model","parts":[{"functionCall":{"name":"multiply","args":{"a":5,"b":3}}}]},"finishReason":"STOP"}]}"#,
    ]);

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let provider =
        GoogleProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let registry = FunctionRegistry::calculator();
    let request = GenerationRequest::new(
        "gemini-2.0-flash",
        vec![InputItem::user("What is 5 times 3?")],
    )
    .with_tools(registry.tools());

    let complete = provider
        .generate(&request)
        .await
        .unwrap()
        .buffer()
        .await
        .unwrap();

    assert_eq!(complete.finish_reason, FinishReason::ToolCalls);
    let calls = complete.function_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "multiply");
    assert!(calls[0].call_id.starts_with("call_"));

    let item = registry.execute(calls[0]).unwrap();
    match item {
        InputItem::FunctionCallOutput { output, .. } => assert!(output.contains("15")),
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_google_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&mock_server)
        .await;

    let provider =
        GoogleProvider::new_with_base_url("bad-key".to_string(), mock_server.uri()).unwrap();
    let request = GenerationRequest::new("gemini-2.0-flash", vec![InputItem::user("hi")]);

    let err = provider.generate(&request).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn test_client_few_shot_over_http() {
    let mock_server = MockServer::start().await;

    let body = sse_body(&[
        r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"Mount Everest"},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":30,"completion_tokens":2}}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        OpenAIProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let client = Client::new(Box::new(provider), "gpt-3.5-turbo");

    let examples = vec![
        promptlab::Example::new("What is the capital of France?", "Paris"),
        promptlab::Example::new("Who wrote Hamlet?", "William Shakespeare"),
    ];
    let answer = client
        .few_shot("What is the tallest mountain on Earth?", &examples)
        .await
        .unwrap();

    assert_eq!(answer, "Mount Everest");

    // The outgoing prompt carried the rendered Q/A pairs
    let requests = mock_server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = sent["messages"][0]["content"].as_str().unwrap();
    assert!(content.starts_with("Q: What is the capital of France?\nA: Paris\n"));
    assert!(content.ends_with("Q: What is the tallest mountain on Earth?\nA:"));
}

#[tokio::test]
async fn test_client_structured_json_over_http() {
    let mock_server = MockServer::start().await;

    // The model wraps its JSON in a code fence, which the client strips
    let body = sse_body(&[
        r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"```json\n{\"answer\": \"Alexander Fleming\"}\n```"},"finish_reason":null}]}"#,
        r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":25,"completion_tokens":12}}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let provider =
        OpenAIProvider::new_with_base_url("test-api-key".to_string(), mock_server.uri()).unwrap();
    let client = Client::new(Box::new(provider), "gpt-3.5-turbo");

    let value = client
        .structured_json("Who discovered penicillin?")
        .await
        .unwrap();
    assert_eq!(value["answer"], "Alexander Fleming");
}
