use async_trait::async_trait;
use market_core::{MarketError, TextGenerator};
use serde::Serialize;
use serde_json::Value;

use crate::error::{GenerationError, GenerationResult};
use crate::GenerationConfig;

#[derive(Debug, Clone, Serialize)]
struct GenerationParameters {
    max_length: u32,
    temperature: f64,
    do_sample: bool,
    top_p: f64,
    return_full_text: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: GenerationOptions,
}

#[derive(Clone)]
pub struct HuggingFaceClient {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HuggingFaceClient {
    pub fn new(config: GenerationConfig) -> GenerationResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request<'a>(&self, prompt: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_length: self.config.max_length,
                temperature: self.config.temperature,
                do_sample: true,
                top_p: self.config.top_p,
                return_full_text: false,
            },
            options: GenerationOptions {
                wait_for_model: true,
            },
        }
    }

    /// Run one generation call and return the raw generated text.
    ///
    /// The text may be empty when the model answers with an unexpected shape.
    pub async fn generate_text(&self, prompt: &str) -> GenerationResult<String> {
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.json::<Value>().await?;
        Ok(extract_generated_text(&body))
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<String, MarketError> {
        self.generate_text(prompt)
            .await
            .map_err(|e| MarketError::GenerationError(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "huggingface"
    }
}

/// Pull `generated_text` out of either `[{generated_text}, ...]` or `{generated_text}`.
pub fn extract_generated_text(body: &Value) -> String {
    let candidate = match body {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        Value::Object(_) => body.get("generated_text"),
        _ => None,
    };

    candidate
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn config() -> GenerationConfig {
        GenerationConfig::from_token(Some("hf_test".to_string())).unwrap()
    }

    #[test]
    fn test_extract_from_array() {
        let body = json!([{"generated_text": "first"}, {"generated_text": "second"}]);
        assert_eq!(extract_generated_text(&body), "first");
    }

    #[test]
    fn test_extract_from_object() {
        let body = json!({"generated_text": "solo"});
        assert_eq!(extract_generated_text(&body), "solo");
    }

    #[test]
    fn test_extract_unexpected_shapes() {
        assert_eq!(extract_generated_text(&json!([])), "");
        assert_eq!(extract_generated_text(&json!({"error": "loading"})), "");
        assert_eq!(extract_generated_text(&json!([{"generated_text": 42}])), "");
        assert_eq!(extract_generated_text(&json!("plain")), "");
    }

    #[test]
    fn test_request_body_shape() {
        let client = HuggingFaceClient::new(config()).unwrap();
        let body = serde_json::to_value(client.build_request("hello")).unwrap();

        assert_eq!(
            body,
            json!({
                "inputs": "hello",
                "parameters": {
                    "max_length": 200,
                    "temperature": 0.9,
                    "do_sample": true,
                    "top_p": 0.95,
                    "return_full_text": false
                },
                "options": {"wait_for_model": true}
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_generation_error() {
        let config = config()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let client = HuggingFaceClient::new(config).unwrap();

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, MarketError::GenerationError(_)));
    }
}
