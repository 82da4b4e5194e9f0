//! Tests for LLM client implementations
//!
//! These tests verify provider selection and the OpenAI-compatible client
//! against a local mock server.

use ragsearch::llm::Provider;

#[test]
fn test_provider_enum_variants() {
    let provider = Provider::OpenAI {
        api_key: "test-key".to_string(),
        api_base: "https://api.openai.com/v1".to_string(),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.2,
        max_tokens: 256,
    };

    match provider {
        Provider::OpenAI {
            ref api_key,
            ref api_base,
            ref model,
            temperature,
            max_tokens,
        } => {
            assert_eq!(api_key, "test-key");
            assert_eq!(api_base, "https://api.openai.com/v1");
            assert_eq!(model, "gpt-4o-mini");
            assert_eq!(temperature, 0.2);
            assert_eq!(max_tokens, 256);
        }
        _ => panic!("Expected OpenAI provider"),
    }
    assert_eq!(provider.name(), "OpenAI");
    assert_eq!(provider.is_enabled(), cfg!(feature = "openai"));
}

#[cfg(feature = "openai")]
mod openai {
    use ragsearch::llm::Provider;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_provider_creates_working_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-42",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "openai/gpt-oss-120b",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "42" },
                    "finish_reason": "stop",
                    "logprobs": null
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::OpenAI {
            api_key: "gsk-test".to_string(),
            api_base: format!("{}/openai/v1", server.uri()),
            model: "openai/gpt-oss-120b".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
        };

        let client = provider.create_client().await.unwrap();
        assert_eq!(client.model_name(), "openai/gpt-oss-120b");
        assert_eq!(
            client
                .generate("Answer with a number. 6 * 7?")
                .await
                .unwrap(),
            "42"
        );
    }
}
